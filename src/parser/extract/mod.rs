pub mod characteristics;
pub mod fields;
pub mod gallery;

use scraper::Html;

use super::selectors::{SelectorConfig, Selectors};
use crate::record::ProductRecord;

/// Everything pulled out of one page. Images are still remote at this point.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ProductRecord,
    pub image_urls: Vec<String>,
}

pub fn extract_all(
    doc: &Html,
    sel: &Selectors,
    config: &SelectorConfig,
    origin: &str,
) -> Extraction {
    let record = ProductRecord {
        title: fields::title(doc, sel),
        brand: fields::brand(doc, sel),
        price: fields::price(doc, sel),
        stock: fields::stock(doc, sel, &config.stock_prefix, &config.stock_suffix),
        description: fields::description(doc, sel),
        code: fields::code(doc, sel, &config.code_label),
        article: fields::article(doc, sel),
        characteristics: characteristics::extract(doc, sel),
        images: Vec::new(),
    };

    Extraction {
        record,
        image_urls: gallery::extract(doc, sel, origin),
    }
}

// ── Tests ──
