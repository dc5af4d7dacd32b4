use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::parser::extract::fields::element_text;
use crate::parser::selectors::Selectors;
use crate::record::{CharacteristicGroup, CharacteristicOption};

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Walk every characteristics table row by row.
///
/// A row with a header cell opens a new group; a row with exactly two data
/// cells adds an option to the open group. Each group is pushed exactly once,
/// either when the next header arrives or when its table ends.
pub fn extract(doc: &Html, sel: &Selectors) -> Vec<CharacteristicGroup> {
    let mut groups = Vec::new();

    for table in doc.select(&sel.characteristics_table) {
        let mut current: Option<CharacteristicGroup> = None;

        for row in table.select(&sel.row) {
            if let Some(header) = row.select(&sel.header_cell).next() {
                if let Some(done) = current.take() {
                    groups.push(done);
                }
                current = Some(CharacteristicGroup {
                    title: element_text(&header),
                    options: Vec::new(),
                });
                continue;
            }

            let cells: Vec<ElementRef> = row.select(&sel.cell).collect();
            if let (Some(group), [name, value]) = (current.as_mut(), cells.as_slice()) {
                group.options.push(CharacteristicOption {
                    title: element_text(name),
                    value: html_with_breaks(value),
                });
            }
        }

        if let Some(done) = current.take() {
            groups.push(done);
        }
    }

    groups
}

/// Cell inner HTML with every `<br>` turned into a literal newline.
/// Other markup and entities are kept as they are.
pub fn html_with_breaks(el: &ElementRef) -> String {
    BREAK_RE
        .replace_all(&el.inner_html(), "\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::selectors::SelectorConfig;
    use scraper::Selector;

    fn groups(html: &str) -> Vec<CharacteristicGroup> {
        let sel = Selectors::compile(&SelectorConfig::default()).unwrap();
        extract(&Html::parse_document(html), &sel)
    }

    #[test]
    fn groups_follow_headers_in_order() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th colspan="2">General</th></tr>
                 <tr><td>Weight</td><td>1.2 kg</td></tr>
                 <tr><td>Color</td><td>Blue</td></tr>
                 <tr><th colspan="2">Battery</th></tr>
                 <tr><th colspan="2">Warranty</th></tr>
                 <tr><td>Term</td><td>2 years</td></tr>
               </table>"#,
        );
        let titles: Vec<&str> = g.iter().map(|x| x.title.as_str()).collect();
        assert_eq!(titles, vec!["General", "Battery", "Warranty"]);
        assert_eq!(g[0].options.len(), 2);
        assert!(g[1].options.is_empty(), "header-only group is still emitted");
        assert_eq!(g[2].options[0].title, "Term");
        assert_eq!(g[2].options[0].value, "2 years");
    }

    #[test]
    fn line_breaks_become_newlines() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th>Kit</th></tr>
                 <tr><td>Contents</td><td>Line1<br>Line2</td></tr>
               </table>"#,
        );
        assert_eq!(g[0].options[0].value, "Line1\nLine2");
    }

    #[test]
    fn value_keeps_markup_around_breaks() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th>Kit</th></tr>
                 <tr><td>Contents</td><td><b>Drill</b><br/>2 &amp; 3 bits<BR />Case</td></tr>
               </table>"#,
        );
        assert_eq!(g[0].options[0].value, "<b>Drill</b>\n2 &amp; 3 bits\nCase");
    }

    #[test]
    fn break_variants_are_all_converted() {
        let doc = Html::parse_fragment("<table><tr><td>a<br>b<br/>c<br >d</td></tr></table>");
        let td = Selector::parse("td").unwrap();
        let cell = doc.select(&td).next().unwrap();
        assert_eq!(html_with_breaks(&cell), "a\nb\nc\nd");
        assert_eq!(BREAK_RE.replace_all("x<BR/>y<br />z", "\n"), "x\ny\nz");
    }

    #[test]
    fn rows_before_first_header_are_dropped() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><td>Orphan</td><td>value</td></tr>
                 <tr><th>Main</th></tr>
                 <tr><td>Only</td><td>row</td></tr>
               </table>"#,
        );
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].options.len(), 1);
        assert_eq!(g[0].options[0].title, "Only");
    }

    #[test]
    fn rows_with_other_cell_counts_are_skipped() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th>Main</th></tr>
                 <tr><td>Single</td></tr>
                 <tr><td>a</td><td>b</td><td>c</td></tr>
                 <tr><td>Power</td><td>18 V</td></tr>
               </table>"#,
        );
        assert_eq!(g[0].options.len(), 1);
        assert_eq!(g[0].options[0].value, "18 V");
    }

    #[test]
    fn each_table_flushes_its_own_last_group() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th>A</th></tr><tr><td>x</td><td>1</td></tr>
               </table>
               <table class="characteristics">
                 <tr><td>stray</td><td>row</td></tr>
                 <tr><th>B</th></tr><tr><td>y</td><td>2</td></tr>
               </table>"#,
        );
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].title, "A");
        assert_eq!(g[0].options.len(), 1, "stray row in second table must not leak into A");
        assert_eq!(g[1].title, "B");
    }

    #[test]
    fn repeated_titles_are_not_deduplicated() {
        let g = groups(
            r#"<table class="characteristics">
                 <tr><th>Size</th></tr><tr><th>Size</th></tr>
               </table>"#,
        );
        assert_eq!(g.len(), 2);
    }
}
