//! Word-compatible export: the document view wrapped in a standalone HTML page.

use scraper::{Html, Selector};

use crate::steps::preview::{escape_html, DOCUMENT_ROOT_ID};
use crate::steps::DocumentView;

pub const WORD_MIME: &str = "application/msword";

const WORD_STYLE: &str = "body { font-family: Arial, sans-serif; margin: 40px; }
table { width: 100%; border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 8px; }
th { background-color: #f2f2f2; }";

/// Outer markup of the document root, or the whole view when it has none.
fn document_markup(view: &DocumentView) -> String {
    let fragment = Html::parse_fragment(&view.html);
    let selector = match Selector::parse(&format!("#{}", DOCUMENT_ROOT_ID)) {
        Ok(s) => s,
        Err(_) => return view.html.clone(),
    };
    fragment
        .select(&selector)
        .next()
        .map(|root| root.html())
        .unwrap_or_else(|| view.html.clone())
}

pub fn word_document(view: &DocumentView) -> String {
    format!(
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Quotation {}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(&view.quotation_number),
        WORD_STYLE,
        document_markup(view)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_document_root() {
        let view = DocumentView {
            quotation_number: "QT-2610-007".into(),
            html: r#"<div id="quotation-document"><h1>Quotation</h1><p>Acme &amp; Sons</p></div>"#.into(),
        };
        let doc = word_document(&view);
        assert!(doc.starts_with("<html>"));
        assert!(doc.contains("<meta charset=\"utf-8\">"));
        assert!(doc.contains("<title>Quotation QT-2610-007</title>"));
        assert!(doc.contains("border-collapse: collapse"));
        assert!(doc.contains(r#"<div id="quotation-document"><h1>Quotation</h1>"#));
        assert!(doc.contains("Acme &amp; Sons"));
        assert!(doc.trim_end().ends_with("</html>"));
    }

    #[test]
    fn falls_back_to_raw_markup() {
        let view = DocumentView {
            quotation_number: "QT-2610-008".into(),
            html: "<p>loose</p>".into(),
        };
        assert!(word_document(&view).contains("<p>loose</p>"));
    }
}
