use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Placeholder brand when the page has no logo alt text.
pub const UNKNOWN_BRAND: &str = "unknown";

/// One scraped product page. Every field starts at its default and is only
/// overwritten when the matching selector hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub brand: String,
    pub price: String,
    pub stock: String,
    pub description: String,
    pub code: String,
    pub article: String,
    pub characteristics: Vec<CharacteristicGroup>,
    pub images: Vec<StoredImage>,
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            brand: UNKNOWN_BRAND.to_string(),
            price: String::new(),
            stock: String::new(),
            description: String::new(),
            code: String::new(),
            article: String::new(),
            characteristics: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicGroup {
    pub title: String,
    pub options: Vec<CharacteristicOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicOption {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub source_url: String,
    /// Relative to the public directory, e.g. `images/temp/1700000000000_Drill.jpg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

/// `{ data, error, status }` envelope handed back to callers.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: u16,
}

impl<T> ApiResponse<T> {
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: 201,
        }
    }

    pub fn failure(err: &ScrapeError) -> Self {
        Self {
            data: None,
            error: Some(err.to_string()),
            status: err.status_code(),
        }
    }
}
