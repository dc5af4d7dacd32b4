use reqwest::Client;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::settings::Settings;

/// Build the shared HTTP client: browser-like identity plus a hard per-request timeout.
pub fn build_client(settings: &Settings) -> Result<Client, ScrapeError> {
    let client = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout())
        .build()?;
    Ok(client)
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET `url` once and return the body.
    ///
    /// `None` means nothing usable came back (network, TLS, timeout or non-2xx);
    /// an empty but successful page is `Some("")`.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Fetch of {} returned {}", url, status);
            return None;
        }

        match response.text().await {
            Ok(body) => {
                info!("Fetched {} ({} bytes)", url, body.len());
                Some(body)
            }
            Err(e) => {
                warn!("Reading body of {} failed: {}", url, e);
                None
            }
        }
    }
}
