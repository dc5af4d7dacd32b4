//! Selector table for the product detail page.
//!
//! All markup knowledge lives here as data. A layout change on the shop side
//! is fixed by editing `shop_scraper.toml`, not the extraction code.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: String,
    /// Element whose `content` attribute holds the raw price.
    pub price: String,
    /// Exact `title` attribute of the availability element.
    pub availability_title: String,
    pub stock_prefix: String,
    pub stock_suffix: String,
    /// Logo image whose `alt` names the brand.
    pub brand_logo: String,
    pub article: String,
    /// Containers scanned for `code_label`; the value is the next sibling element.
    pub code_label_container: String,
    pub code_label: String,
    pub description: String,
    pub characteristics_table: String,
    pub image_container: String,
    pub image: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: "h1.product-title".to_string(),
            price: "[itemprop=\"price\"]".to_string(),
            availability_title: "Availability".to_string(),
            stock_prefix: "In stock: ".to_string(),
            stock_suffix: " pcs".to_string(),
            brand_logo: ".product-header__brand img".to_string(),
            article: ".product-header__article span".to_string(),
            code_label_container: ".product-header__prop".to_string(),
            code_label: "Code:".to_string(),
            description: ".product-description__content".to_string(),
            characteristics_table: "table.characteristics".to_string(),
            image_container: ".product-gallery__thumbs".to_string(),
            image: "img.product-gallery__thumb".to_string(),
        }
    }
}

/// Compiled form of [`SelectorConfig`], built once per extractor.
#[derive(Debug)]
pub struct Selectors {
    pub title: Selector,
    pub price: Selector,
    pub availability: Selector,
    pub brand_logo: Selector,
    pub article: Selector,
    pub code_label_container: Selector,
    pub description: Selector,
    pub characteristics_table: Selector,
    pub row: Selector,
    pub header_cell: Selector,
    pub cell: Selector,
    pub image_container: Selector,
    pub image: Selector,
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ScrapeError> {
        let availability = format!(
            "[title=\"{}\"]",
            config.availability_title.replace('"', "\\\"")
        );
        Ok(Self {
            title: compile("title", &config.title)?,
            price: compile("price", &config.price)?,
            availability: compile("availability_title", &availability)?,
            brand_logo: compile("brand_logo", &config.brand_logo)?,
            article: compile("article", &config.article)?,
            code_label_container: compile("code_label_container", &config.code_label_container)?,
            description: compile("description", &config.description)?,
            characteristics_table: compile("characteristics_table", &config.characteristics_table)?,
            row: compile("row", "tr")?,
            header_cell: compile("header_cell", "th")?,
            cell: compile("cell", "td")?,
            image_container: compile("image_container", &config.image_container)?,
            image: compile("image", &config.image)?,
        })
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        field,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
