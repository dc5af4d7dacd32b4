use scraper::{ElementRef, Html, Selector};

use crate::parser::selectors::Selectors;
use crate::record::UNKNOWN_BRAND;

pub fn title(doc: &Html, sel: &Selectors) -> String {
    first_text(doc, &sel.title)
}

/// Raw price from the microdata `content` attribute, not the visible text.
pub fn price(doc: &Html, sel: &Selectors) -> String {
    first_attr(doc, &sel.price, "content")
}

pub fn stock(doc: &Html, sel: &Selectors, prefix: &str, suffix: &str) -> String {
    let raw = first_text(doc, &sel.availability);
    strip_stock(&raw, prefix, suffix)
}

pub fn brand(doc: &Html, sel: &Selectors) -> String {
    let alt = first_attr(doc, &sel.brand_logo, "alt");
    if alt.is_empty() {
        UNKNOWN_BRAND.to_string()
    } else {
        alt
    }
}

pub fn article(doc: &Html, sel: &Selectors) -> String {
    first_text(doc, &sel.article)
}

/// Value next to the container whose whole text is exactly `label`.
pub fn code(doc: &Html, sel: &Selectors, label: &str) -> String {
    doc.select(&sel.code_label_container)
        .find(|el| element_text(el) == label)
        .and_then(|el| el.next_siblings().find_map(ElementRef::wrap))
        .map(|value| element_text(&value))
        .unwrap_or_default()
}

pub fn description(doc: &Html, sel: &Selectors) -> String {
    first_text(doc, &sel.description)
}

fn strip_stock(raw: &str, prefix: &str, suffix: &str) -> String {
    let mut s = raw.to_string();
    if !prefix.is_empty() {
        s = s.replace(prefix, "");
    }
    if !suffix.is_empty() {
        s = s.replace(suffix, "");
    }
    s.trim().to_string()
}

pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> String {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::selectors::SelectorConfig;

    fn sel() -> Selectors {
        Selectors::compile(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn price_reads_attribute_not_text() {
        let doc = Html::parse_document(
            r#"<span itemprop="price" content="1299.50">1 299,50 $</span>"#,
        );
        assert_eq!(price(&doc, &sel()), "1299.50");
    }

    #[test]
    fn stock_strips_prefix_and_suffix() {
        let doc = Html::parse_document(r#"<div title="Availability"> In stock: 15 pcs </div>"#);
        assert_eq!(stock(&doc, &sel(), "In stock: ", " pcs"), "15");
    }

    #[test]
    fn stock_without_markers_is_kept() {
        assert_eq!(strip_stock("on request", "In stock: ", " pcs"), "on request");
    }

    #[test]
    fn brand_falls_back_to_sentinel() {
        let doc = Html::parse_document(
            r#"<div class="product-header__brand"><img src="/logo.png" alt=""></div>"#,
        );
        assert_eq!(brand(&doc, &sel()), "unknown");

        let doc = Html::parse_document(
            r#"<div class="product-header__brand"><img src="/logo.png" alt="Makita"></div>"#,
        );
        assert_eq!(brand(&doc, &sel()), "Makita");
    }

    #[test]
    fn code_uses_next_sibling_of_exact_label() {
        let doc = Html::parse_document(
            r#"<div class="product-header">
                 <div class="product-header__prop"> Code: </div>
                 <div class="product-header__value">A-7781</div>
               </div>"#,
        );
        assert_eq!(code(&doc, &sel(), "Code:"), "A-7781");
    }

    #[test]
    fn code_ignores_partial_label_match() {
        let doc = Html::parse_document(
            r#"<div class="product-header">
                 <div class="product-header__prop">Barcode: </div>
                 <div class="product-header__value">460000000</div>
                 <div class="product-header__prop">Code: extra</div>
                 <div class="product-header__value">nope</div>
               </div>"#,
        );
        assert_eq!(code(&doc, &sel(), "Code:"), "");
    }

    #[test]
    fn title_is_trimmed_first_match() {
        let doc = Html::parse_document(
            r#"<h1 class="product-title">
                 Cordless Drill
               </h1><h1 class="product-title">Second</h1>"#,
        );
        assert_eq!(title(&doc, &sel()), "Cordless Drill");
    }
}
