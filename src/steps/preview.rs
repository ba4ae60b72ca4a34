//! Preview step: renders the finished quotation as an HTML document view
//! (the input of the export pipeline) and as plain text for the terminal.

use crate::format::{format_amount, format_date};
use crate::model::{ImageAttachment, QuotationDocument};

/// Element id of the root of a rendered quotation
pub const DOCUMENT_ROOT_ID: &str = "quotation-document";

/// A rendered quotation: the markup of the `#quotation-document` subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub quotation_number: String,
    pub html: String,
}

/// Escape text for inclusion in element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn image_tag(attachment: &ImageAttachment, alt: &str, class: &str) -> String {
    format!(
        r#"<img class="{}" src="{}" alt="{}" width="80" height="80">"#,
        class,
        attachment.data_url(),
        alt
    )
}

#[derive(Debug, Clone)]
pub struct PreviewStep {
    currency: String,
}

impl PreviewStep {
    pub fn new(currency: impl Into<String>) -> Self {
        Self { currency: currency.into() }
    }

    /// Render the quotation markup.
    pub fn render(&self, doc: &QuotationDocument) -> DocumentView {
        let info = &doc.customer_info;
        let cur = escape_html(&self.currency);
        let mut html = String::new();

        html.push_str(&format!(r#"<div id="{}" class="quotation">"#, DOCUMENT_ROOT_ID));

        html.push_str(r#"<div class="header">"#);
        if let Some(logo) = &info.logo {
            html.push_str(&image_tag(logo, "Company Logo", "logo"));
        }
        if !info.company_name.is_empty() {
            html.push_str(&format!(r#"<h2 class="text-right">{}</h2>"#, escape_html(&info.company_name)));
        }
        html.push_str("</div>");

        html.push_str(&format!(
            r#"<div class="title text-center"><h1>Quotation</h1><p class="number">{}</p></div>"#,
            escape_html(&doc.quotation_number)
        ));

        html.push_str(r#"<div class="parties">"#);
        html.push_str(&format!("<h3>Customer</h3><p>{}</p>", escape_html(&info.customer_name)));
        html.push_str(&format!(
            r#"<p class="text-right"><b>Date: </b>{}</p><p class="text-right"><b>Valid Until: </b>{}</p>"#,
            format_date(&doc.creation_date),
            format_date(&doc.valid_until)
        ));
        html.push_str("</div>");

        html.push_str("<table><thead><tr>");
        html.push_str(&format!(
            r#"<th>Item</th><th>Description</th><th class="text-right">Quantity</th><th class="text-right">Unit Price ({c})</th><th class="text-right">Total ({c})</th>"#,
            c = cur
        ));
        html.push_str("</tr></thead><tbody>");
        for item in &doc.items {
            html.push_str(&format!(
                r#"<tr><td>{}</td><td>{}</td><td class="text-right">{}</td><td class="text-right">{}</td><td class="text-right">{}</td></tr>"#,
                escape_html(&item.name),
                escape_html(&item.description),
                item.quantity,
                format_amount(item.unit_price),
                format_amount(item.total())
            ));
        }
        html.push_str(&format!(
            r#"<tr class="grand-total"><td colspan="4" class="text-right">Grand Total:</td><td class="text-right">{} {}</td></tr>"#,
            format_amount(doc.grand_total()),
            cur
        ));
        html.push_str("</tbody></table>");

        if !doc.notes.is_empty() {
            html.push_str(r#"<div class="notes"><h3>Notes</h3>"#);
            for line in doc.notes.lines() {
                html.push_str(&format!("<p>{}</p>", escape_html(line)));
            }
            html.push_str("</div>");
        }

        if let Some(signature) = &info.signature {
            html.push_str(r#"<div class="signature text-right">"#);
            html.push_str(&image_tag(signature, "Signature", "signature"));
            html.push_str("</div>");
        }

        html.push_str("</div>");

        DocumentView {
            quotation_number: doc.quotation_number.clone(),
            html,
        }
    }

    /// Plain-text rendition for printing to a terminal.
    pub fn render_text(&self, doc: &QuotationDocument) -> String {
        let info = &doc.customer_info;
        let mut out = String::new();
        if !info.company_name.is_empty() {
            out.push_str(&format!("{:>72}\n", info.company_name));
        }
        if info.logo.is_some() {
            out.push_str("[logo]\n");
        }
        out.push_str(&format!("{:^72}\n{:^72}\n\n", "QUOTATION", doc.quotation_number));
        out.push_str(&format!("Customer: {}\n", info.customer_name));
        out.push_str(&format!("Date:        {}\n", format_date(&doc.creation_date)));
        out.push_str(&format!("Valid Until: {}\n\n", format_date(&doc.valid_until)));

        out.push_str(&format!(
            "{:<24} {:<20} {:>6} {:>9} {:>9}\n",
            "Item", "Description", "Qty", "Unit", "Total"
        ));
        out.push_str(&format!("{}\n", "-".repeat(72)));
        for item in &doc.items {
            out.push_str(&format!(
                "{:<24} {:<20} {:>6} {:>9} {:>9}\n",
                item.name,
                item.description,
                item.quantity,
                format_amount(item.unit_price),
                format_amount(item.total())
            ));
        }
        out.push_str(&format!("{}\n", "-".repeat(72)));
        out.push_str(&format!(
            "{:>72}\n",
            format!("Grand Total: {} {}", format_amount(doc.grand_total()), self.currency)
        ));

        if !doc.notes.is_empty() {
            out.push_str(&format!("\nNotes\n{}\n", doc.notes));
        }
        if info.signature.is_some() {
            out.push_str(&format!("{:>72}\n", "[signature]"));
        }
        out
    }
}
