//! Document field parser.
//!
//! Pulls structured fields out of recognized invoice/receipt text with fixed
//! patterns. Tolerant by construction: a field whose pattern does not match
//! is simply absent, and the caller degrades per field.

use crate::types::DocumentFields;
use regex::Regex;

/// Characters of raw text kept as the excerpt on [`DocumentFields`]
const RAW_TEXT_EXCERPT: usize = 500;

pub struct FieldParser {
    invoice: Regex,
    amount: Regex,
    tax_id: Regex,
    date: Regex,
    vendor: Regex,
    any_number: Regex,
}

impl FieldParser {
    pub fn new() -> Self {
        // GST layout: 2-digit state, 5+4+1 PAN, entity code, 'Z', check digit
        Self {
            invoice: Regex::new(r"(?i)(?:INV|INVOICE|BILL|RECEIPT)[\s\-#:]*([A-Z0-9\-/]+)")
                .expect("invoice pattern"),
            amount: Regex::new(
                r"(?i)(?:total|amount|grand\s*total|net\s*amount|payable)[\s:₹$]*([0-9,]+\.?\d*)",
            )
            .expect("amount pattern"),
            tax_id: Regex::new(r"\b\d{2}[A-Z]{5}\d{4}[A-Z][A-Z\d]Z[A-Z\d]\b").expect("gst pattern"),
            date: Regex::new(r"(\d{1,2}[\-/\.]\d{1,2}[\-/\.]\d{2,4})").expect("date pattern"),
            vendor: Regex::new(r"(?i)(?:from|vendor|supplier|company|firm|m/s)[\s:]*([A-Za-z\s&.]+)")
                .expect("vendor pattern"),
            any_number: Regex::new(r"[\d,]+\.?\d+").expect("number pattern"),
        }
    }

    /// Parse recognized text into document fields. Absent fields stay `None`.
    pub fn parse(&self, text: &str) -> DocumentFields {
        let mut fields = DocumentFields {
            raw_text: text.chars().take(RAW_TEXT_EXCERPT).collect(),
            ..DocumentFields::default()
        };

        if text.is_empty() {
            return fields;
        }

        if let Some(caps) = self.invoice.captures(text) {
            fields.invoice_number = Some(caps[1].trim().to_string());
        }

        fields.amount = self
            .amount
            .captures(text)
            .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
            // Fallback: the largest number on the document is the likely total
            .or_else(|| {
                self.any_number
                    .find_iter(text)
                    .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
                    .fold(None, |acc: Option<f64>, n| {
                        Some(acc.map_or(n, |a| a.max(n)))
                    })
            });

        if let Some(m) = self.tax_id.find(text) {
            fields.tax_id = Some(m.as_str().to_string());
        }

        if let Some(caps) = self.date.captures(text) {
            fields.date = Some(caps[1].to_string());
        }

        if let Some(caps) = self.vendor.captures(text) {
            let name: String = caps[1].trim().chars().take(60).collect();
            if !name.is_empty() {
                fields.vendor_name = Some(name);
            }
        }

        fields
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
INV-2024/0042\n\
M/s Alpha Construction\n\
GSTIN: 27ABCDE1234F1Z5\n\
Date: 12/03/2024\n\
CGST 9% SGST 9%\n\
Grand Total: ₹45,000.00\n";

    #[test]
    fn parses_all_fields_from_invoice_text() {
        let parser = FieldParser::new();
        let fields = parser.parse(SAMPLE);

        assert_eq!(fields.invoice_number.as_deref(), Some("2024/0042"));
        assert_eq!(fields.amount, Some(45000.0));
        assert_eq!(fields.tax_id.as_deref(), Some("27ABCDE1234F1Z5"));
        assert_eq!(fields.date.as_deref(), Some("12/03/2024"));
        assert!(fields
            .vendor_name
            .as_deref()
            .unwrap()
            .contains("Alpha Construction"));
    }

    #[test]
    fn amount_falls_back_to_largest_number() {
        let parser = FieldParser::new();
        let fields = parser.parse("item 120.50\nitem 89.00\n1,200.00");
        assert_eq!(fields.amount, Some(1200.0));
    }

    #[test]
    fn empty_text_yields_empty_fields() {
        let parser = FieldParser::new();
        let fields = parser.parse("");
        assert_eq!(fields, DocumentFields::default());
    }

    #[test]
    fn malformed_gst_is_not_extracted_as_tax_id() {
        let parser = FieldParser::new();
        let fields = parser.parse("GSTIN: INVALID-GST-NUMBER\nTotal: 100");
        assert!(fields.tax_id.is_none());
    }

    #[test]
    fn raw_text_excerpt_is_capped() {
        let parser = FieldParser::new();
        let long = "a".repeat(2000);
        let fields = parser.parse(&long);
        assert_eq!(fields.raw_text.len(), 500);
    }
}
