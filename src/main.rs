mod db;
mod error;
mod error_log;
mod fetch;
mod images;
mod parser;
mod pipeline;
mod record;
mod settings;

use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use error_log::{ErrorEntry, ErrorLog};
use pipeline::Pipeline;
use record::{ApiResponse, ProductRecord};
use settings::Settings;

#[derive(Parser)]
#[command(name = "shop_scraper", about = "Product page scraper with local image staging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one product page and print it as JSON
    Extract {
        url: String,
        /// Also store the product in the local database
        #[arg(long)]
        save: bool,
    },
    /// Scrape every URL listed in a file (one per line)
    Batch {
        file: std::path::PathBuf,
        /// Also store the products in the local database
        #[arg(long)]
        save: bool,
    },
    /// Move staged images into the products directory
    Promote {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Stored products overview
    Products {
        /// Filter by brand (case-insensitive)
        #[arg(short, long)]
        brand: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Brands with product counts
    Brands,
    /// Show storage statistics
    Stats,
    /// Inspect or clear the error log
    Errors {
        #[command(subcommand)]
        action: ErrorsAction,
    },
}

#[derive(Subcommand)]
enum ErrorsAction {
    /// Print every logged error
    List,
    /// Empty the error log
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Extract { url, save } => {
            let pipeline = Pipeline::new(&settings).await?;
            let log = ErrorLog::new(&settings.error_log_path);
            let conn = if save { Some(open_db(&settings)?) } else { None };

            let response = match pipeline.run(&url).await {
                Ok(product) => {
                    if let Some(conn) = &conn {
                        let id = db::save_product(conn, &url, &product)?;
                        println!("Saved product #{}", id);
                    }
                    ApiResponse::created(product)
                }
                Err(e) => {
                    record_failure(&log, &url, &e);
                    ApiResponse::<ProductRecord>::failure(&e)
                }
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Batch { file, save } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let urls = parse_url_list(&raw);
            if urls.is_empty() {
                println!("No URLs in {}.", file.display());
                return Ok(());
            }

            let pipeline = Pipeline::new(&settings).await?;
            let log = ErrorLog::new(&settings.error_log_path);
            let conn = if save { Some(open_db(&settings)?) } else { None };

            println!("Scraping {} product pages...", urls.len());
            let stats = run_batch(&pipeline, &log, conn.as_ref(), &urls).await?;
            println!(
                "Done: {} pages ({} ok, {} errors, {} images).",
                stats.total, stats.ok, stats.errors, stats.images
            );
            Ok(())
        }
        Commands::Promote { files } => {
            let client = fetch::build_client(&settings)?;
            let store = images::ImageStore::open(client, &settings).await?;
            for name in &files {
                let dest = store.promote(name).await?;
                println!("{}", dest);
            }
            Ok(())
        }
        Commands::Products { brand, limit } => {
            let conn = open_db(&settings)?;
            let rows = db::fetch_products(&conn, brand.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No products found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<40} | {:<16} | {:>10} | {:<10} | {:>3}",
                "#", "Title", "Brand", "Price", "Stock", "Img"
            );
            println!("{}", "-".repeat(98));
            for r in &rows {
                println!(
                    "{:>4} | {:<40} | {:<16} | {:>10} | {:<10} | {:>3}",
                    r.id,
                    truncate(&r.title, 40),
                    truncate(&r.brand, 16),
                    r.price,
                    truncate(&r.stock, 10),
                    r.image_count
                );
            }
            println!("\n{} products", rows.len());
            Ok(())
        }
        Commands::Brands => {
            let conn = open_db(&settings)?;
            let rows = db::fetch_brands(&conn)?;
            if rows.is_empty() {
                println!("No brands yet.");
                return Ok(());
            }
            for r in &rows {
                println!("{:<32} {:>5}", truncate(&r.name, 32), r.products);
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = open_db(&settings)?;
            let s = db::get_stats(&conn)?;
            println!("Products:        {}", s.products);
            println!("Brands:          {}", s.brands);
            println!("Images:          {}", s.images);
            println!("Characteristics: {}", s.characteristics);
            println!("Without price:   {}", s.without_price);
            Ok(())
        }
        Commands::Errors { action } => {
            let log = ErrorLog::new(&settings.error_log_path);
            match action {
                ErrorsAction::List => {
                    let entries = log.read_all()?;
                    if entries.is_empty() {
                        println!("Error log is empty.");
                    }
                    for e in &entries {
                        println!("{} [{}] {}: {}", e.timestamp, e.status, e.url, e.message);
                    }
                }
                ErrorsAction::Clear => {
                    log.clear()?;
                    println!("Cleared {}", log.path().display());
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_db(settings: &Settings) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// A failed page is logged, never fatal to the caller's run.
fn record_failure(log: &ErrorLog, url: &str, err: &error::ScrapeError) {
    warn!("Scrape failed for {}: {}", url, err);
    if let Err(e) = log.append(ErrorEntry::from_scrape(url, err)) {
        warn!("Could not write error log {}: {:#}", log.path().display(), e);
    }
}

struct BatchStats {
    total: usize,
    ok: usize,
    errors: usize,
    images: usize,
}

async fn run_batch(
    pipeline: &Pipeline,
    log: &ErrorLog,
    conn: Option<&rusqlite::Connection>,
    urls: &[String],
) -> anyhow::Result<BatchStats> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut stats = BatchStats {
        total: urls.len(),
        ok: 0,
        errors: 0,
        images: 0,
    };

    // Pages run one after another; images inside a page are sequential too.
    for url in urls {
        match pipeline.run(url).await {
            Ok(product) => {
                stats.ok += 1;
                stats.images += product.images.len();
                if let Some(conn) = conn {
                    db::save_product(conn, url, &product)?;
                }
            }
            Err(e) => {
                stats.errors += 1;
                pb.suspend(|| record_failure(log, url, &e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(stats)
}

/// Non-empty lines that are not `#` comments.
fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_skips_blanks_and_comments() {
        let raw = "https://shop.example.com/p/1\n\n  # drills\n  https://shop.example.com/p/2  \n";
        assert_eq!(
            parse_url_list(raw),
            vec!["https://shop.example.com/p/1", "https://shop.example.com/p/2"]
        );
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Дрель", 10), "Дрель");
        assert_eq!(truncate("Cordless Drill", 8), "Cordless...");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["shop_scraper", "extract", "https://x.test/p", "--save"]).unwrap();
        assert!(matches!(cli.command, Commands::Extract { save: true, .. }));

        let cli = Cli::try_parse_from(["shop_scraper", "errors", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Errors {
                action: ErrorsAction::Clear
            }
        ));

        assert!(Cli::try_parse_from(["shop_scraper", "promote"]).is_err());
    }
}
