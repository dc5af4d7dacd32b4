pub mod extract;
pub mod selectors;

use scraper::Html;
use tracing::debug;

use crate::error::ScrapeError;
use selectors::{SelectorConfig, Selectors};

/// Product-page extractor: selectors compiled once, reused for every page.
pub struct Extractor {
    config: SelectorConfig,
    selectors: Selectors,
    origin: String,
}

impl Extractor {
    pub fn new(config: &SelectorConfig, origin: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            config: config.clone(),
            selectors: Selectors::compile(config)?,
            origin: origin.to_string(),
        })
    }

    /// Parse `html` and pull every product field out of it.
    ///
    /// Missing fields degrade to defaults; only a body with no document at
    /// all is rejected.
    pub fn extract(&self, html: &str) -> Result<extract::Extraction, ScrapeError> {
        if html.trim().is_empty() {
            return Err(ScrapeError::EmptyDocument);
        }
        let doc = Html::parse_document(html);
        let extraction = extract::extract_all(&doc, &self.selectors, &self.config, &self.origin);
        debug!(
            title = %extraction.record.title,
            groups = extraction.record.characteristics.len(),
            images = extraction.image_urls.len(),
            "extracted product page"
        );
        Ok(extraction)
    }
}
