use scraper::Html;
use url::Url;

use crate::parser::selectors::Selectors;

/// Thumbnail `src` values from the first gallery container, in document
/// order, resolved against `origin`. Repeated URLs are kept.
pub fn extract(doc: &Html, sel: &Selectors, origin: &str) -> Vec<String> {
    let Some(container) = doc.select(&sel.image_container).next() else {
        return Vec::new();
    };
    container
        .select(&sel.image)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(|src| resolve(origin, src))
        .collect()
}

/// Root-relative paths are appended to the origin as written. Absolute URLs
/// come back untouched; anything else is joined onto the origin.
pub fn resolve(origin: &str, src: &str) -> String {
    if src.starts_with('/') && !src.starts_with("//") {
        return format!("{}{}", origin.trim_end_matches('/'), src);
    }
    if Url::parse(src).is_ok() {
        return src.to_string();
    }
    match Url::parse(origin).and_then(|base| base.join(src)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!("{}{}", origin.trim_end_matches('/'), src),
    }
}
