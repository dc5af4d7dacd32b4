use thiserror::Error;

/// Errors visible to whoever asked for a product page.
///
/// Selector misses are never errors; only a missing page, an unusable
/// document, or a broken local setup end up here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not retrieve page {url}")]
    PageUnavailable { url: String },

    #[error("response body is not an HTML document")]
    EmptyDocument,

    #[error("invalid selector for {field} ({selector}): {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("filesystem: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Status code the response envelope carries for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ScrapeError::PageUnavailable { .. } | ScrapeError::EmptyDocument => 400,
            ScrapeError::InvalidSelector { .. } | ScrapeError::Http(_) | ScrapeError::Io(_) => 500,
        }
    }
}
