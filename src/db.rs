use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::record::ProductRecord;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id          INTEGER PRIMARY KEY,
            source_url  TEXT UNIQUE NOT NULL,
            title       TEXT NOT NULL,
            brand       TEXT NOT NULL,
            price       TEXT NOT NULL,
            stock       TEXT NOT NULL,
            description TEXT NOT NULL,
            code        TEXT NOT NULL,
            article     TEXT NOT NULL,
            scraped_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);

        CREATE TABLE IF NOT EXISTS product_characteristics (
            id           INTEGER PRIMARY KEY,
            product_id   INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            group_pos    INTEGER NOT NULL,
            group_title  TEXT NOT NULL,
            option_pos   INTEGER,
            option_title TEXT,
            option_value TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_chars_product ON product_characteristics(product_id);

        CREATE TABLE IF NOT EXISTS product_images (
            id          INTEGER PRIMARY KEY,
            product_id  INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            source_url  TEXT NOT NULL,
            local_path  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_images_product ON product_images(product_id);
        ",
    )?;
    Ok(())
}

// ── Products ──

/// Insert or replace the product scraped from `source_url`. Child rows are
/// rewritten so they always mirror the latest scrape.
pub fn save_product(conn: &Connection, source_url: &str, p: &ProductRecord) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    let id: i64 = tx.query_row(
        "INSERT INTO products (source_url, title, brand, price, stock, description, code, article)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(source_url) DO UPDATE SET
            title = excluded.title, brand = excluded.brand, price = excluded.price,
            stock = excluded.stock, description = excluded.description,
            code = excluded.code, article = excluded.article,
            scraped_at = datetime('now')
         RETURNING id",
        rusqlite::params![
            source_url, p.title, p.brand, p.price, p.stock, p.description, p.code, p.article,
        ],
        |row| row.get(0),
    )?;

    tx.execute("DELETE FROM product_characteristics WHERE product_id = ?1", [id])?;
    tx.execute("DELETE FROM product_images WHERE product_id = ?1", [id])?;
    {
        let mut c_stmt = tx.prepare(
            "INSERT INTO product_characteristics
             (product_id, group_pos, group_title, option_pos, option_title, option_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (gi, group) in p.characteristics.iter().enumerate() {
            if group.options.is_empty() {
                // Keep empty groups so they survive a round trip.
                c_stmt.execute(rusqlite::params![
                    id, gi, group.title, None::<i64>, None::<String>, None::<String>,
                ])?;
            }
            for (oi, opt) in group.options.iter().enumerate() {
                c_stmt.execute(rusqlite::params![id, gi, group.title, oi, opt.title, opt.value])?;
            }
        }

        let mut i_stmt = tx.prepare(
            "INSERT INTO product_images (product_id, position, source_url, local_path)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (pos, img) in p.images.iter().enumerate() {
            i_stmt.execute(rusqlite::params![id, pos, img.source_url, img.local_path])?;
        }
    }
    tx.commit()?;
    Ok(id)
}

// ── Overview ──

pub struct OverviewRow {
    pub id: i64,
    pub title: String,
    pub brand: String,
    pub price: String,
    pub stock: String,
    pub image_count: i64,
}

pub fn fetch_products(
    conn: &Connection,
    brand: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let where_clause = if brand.is_some() {
        " WHERE p.brand = ?1 COLLATE NOCASE"
    } else {
        ""
    };
    let sql = format!(
        "SELECT p.id, p.title, p.brand, p.price, p.stock,
                (SELECT COUNT(*) FROM product_images i WHERE i.product_id = p.id)
         FROM products p{}
         ORDER BY p.scraped_at DESC, p.id DESC
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = match brand {
        Some(b) => stmt.query_map([b], overview_row)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], overview_row)?.collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

fn overview_row(row: &rusqlite::Row) -> rusqlite::Result<OverviewRow> {
    Ok(OverviewRow {
        id: row.get(0)?,
        title: row.get(1)?,
        brand: row.get(2)?,
        price: row.get(3)?,
        stock: row.get(4)?,
        image_count: row.get(5)?,
    })
}

pub struct BrandRow {
    pub name: String,
    pub products: usize,
}

pub fn fetch_brands(conn: &Connection) -> Result<Vec<BrandRow>> {
    let mut stmt = conn.prepare(
        "SELECT brand, COUNT(*) FROM products
         GROUP BY brand
         ORDER BY COUNT(*) DESC, brand",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BrandRow {
                name: row.get(0)?,
                products: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub products: usize,
    pub brands: usize,
    pub images: usize,
    pub characteristics: usize,
    pub without_price: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let products: usize = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    let brands: usize =
        conn.query_row("SELECT COUNT(DISTINCT brand) FROM products", [], |r| r.get(0))?;
    let images: usize = conn.query_row("SELECT COUNT(*) FROM product_images", [], |r| r.get(0))?;
    let characteristics: usize = conn.query_row(
        "SELECT COUNT(*) FROM product_characteristics WHERE option_title IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let without_price: usize =
        conn.query_row("SELECT COUNT(*) FROM products WHERE price = ''", [], |r| r.get(0))?;
    Ok(Stats {
        products,
        brands,
        images,
        characteristics,
        without_price,
    })
}
