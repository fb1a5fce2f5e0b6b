//! Textual field anomaly detection over claim data and extracted fields

use crate::signals;
use crate::types::{ClaimContext, DocumentFields, Signal};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::debug;

/// Days after which a document date is considered stale
const STALE_AFTER_DAYS: i64 = 365;

/// Vendor redlist and registration roster, injected from configuration.
#[derive(Debug, Default)]
pub struct VendorRegistry {
    redlist: HashSet<String>,
    registered: HashSet<String>,
}

impl VendorRegistry {
    pub fn new(redlist: Vec<String>, registered: Vec<String>) -> Self {
        Self {
            redlist: redlist.into_iter().collect(),
            registered: registered.into_iter().collect(),
        }
    }

    pub fn is_redlisted(&self, vendor: &str) -> bool {
        self.redlist.contains(vendor)
    }

    pub fn is_registered(&self, vendor: &str) -> bool {
        self.registered.contains(vendor)
    }
}

/// Process-lifetime set of invoice ids already assessed.
///
/// Check-and-record happens under one lock so two concurrent submissions of
/// the same id cannot both pass as first-seen.
#[derive(Debug, Default)]
pub struct SeenInvoices {
    inner: Mutex<HashSet<String>>,
}

impl SeenInvoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was already recorded; records it otherwise.
    pub fn check_and_record(&self, invoice_id: &str) -> bool {
        let mut seen = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if seen.contains(invoice_id) {
            true
        } else {
            seen.insert(invoice_id.to_string());
            false
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns structured document fields plus claim context into catalog signals.
pub struct FieldAnomalyDetector {
    registry: std::sync::Arc<VendorRegistry>,
    seen: std::sync::Arc<SeenInvoices>,
    /// Per-issue weight for the metadata group (20 in the simple profile,
    /// 15 in the document-analysis profile)
    metadata_issue_weight: u32,
    tax_id_format: Regex,
}

impl FieldAnomalyDetector {
    pub fn new(
        registry: std::sync::Arc<VendorRegistry>,
        seen: std::sync::Arc<SeenInvoices>,
        metadata_issue_weight: u32,
    ) -> Self {
        Self {
            registry,
            seen,
            metadata_issue_weight,
            tax_id_format: Regex::new(r"^\d{2}[A-Z]{5}\d{4}[A-Z][A-Z\d]Z[A-Z\d]$")
                .expect("tax id pattern"),
        }
    }

    /// Run all field rules. `fields` is `None` for claim-only submissions,
    /// in which case the document metadata checks are skipped entirely.
    pub fn scan(&self, claim: &ClaimContext, fields: Option<&DocumentFields>) -> Vec<Signal> {
        let mut out = Vec::new();

        self.check_budget(claim, &mut out);
        let redlisted = self.check_vendor(claim, &mut out);
        self.check_duplicate_id(claim, &mut out);

        if let Some(fields) = fields {
            self.check_metadata(claim, fields, &mut out);
        }

        debug!(
            claim_id = %claim.claim_id,
            signals = out.len(),
            redlisted,
            "field anomaly scan complete"
        );
        out
    }

    fn check_budget(&self, claim: &ClaimContext, out: &mut Vec<Signal>) {
        if claim.project_budget <= 0.0 {
            return;
        }
        // Mutually exclusive: only the higher-severity rule fires
        if claim.amount > claim.project_budget {
            out.push(signals::OVER_BUDGET.signal(format!(
                "Invoice amount ({}) exceeds project budget ({})",
                claim.amount, claim.project_budget
            )));
        } else if claim.amount > claim.project_budget * 0.8 {
            out.push(signals::NEAR_BUDGET.signal(format!(
                "Invoice amount ({}) is >80% of project budget ({})",
                claim.amount, claim.project_budget
            )));
        }
    }

    /// Returns whether the vendor is redlisted. Redlisting dominates: the
    /// unregistered signal is suppressed for a redlisted vendor.
    fn check_vendor(&self, claim: &ClaimContext, out: &mut Vec<Signal>) -> bool {
        let redlisted = claim.flags.redlisted.unwrap_or(false)
            || self.registry.is_redlisted(&claim.vendor_name);

        if redlisted {
            out.push(signals::VENDOR_REDLISTED.signal(format!(
                "Vendor '{}' is REDLISTED",
                claim.vendor_name
            )));
        } else if !self.registry.is_registered(&claim.vendor_name) {
            out.push(signals::VENDOR_UNREGISTERED.signal(format!(
                "Vendor '{}' is not a registered vendor",
                claim.vendor_name
            )));
        }
        redlisted
    }

    fn check_duplicate_id(&self, claim: &ClaimContext, out: &mut Vec<Signal>) {
        // Short-circuit keeps a caller-flagged id out of the seen set
        let flagged = claim.flags.duplicate_invoice.unwrap_or(false);
        if flagged || self.seen.check_and_record(&claim.claim_id) {
            out.push(signals::DUPLICATE_INVOICE_ID.signal(format!(
                "Duplicate invoice number: {}",
                claim.claim_id
            )));
        }
    }

    fn check_metadata(&self, claim: &ClaimContext, fields: &DocumentFields, out: &mut Vec<Signal>) {
        let w = self.metadata_issue_weight;

        self.check_document_amount(claim, fields, out);

        if fields.invoice_number.is_none() {
            out.push(signals::METADATA_ISSUE.signal_weighted(
                w,
                "No invoice number detected - document may be informal",
            ));
        }

        match &fields.tax_id {
            None => out.push(signals::METADATA_ISSUE.signal_weighted(
                w,
                "Missing GST number - no tax registration found",
            )),
            Some(tax_id) => {
                if !self.tax_id_format.is_match(tax_id) {
                    out.push(
                        signals::INVALID_TAX_ID
                            .signal_weighted(w, format!("GST format invalid: {tax_id}")),
                    );
                }
            }
        }

        let raw = fields.raw_text.to_lowercase();
        let has_tax_terms = ["cgst", "sgst", "igst", "tax", "gst"]
            .iter()
            .any(|t| raw.contains(t));
        if !has_tax_terms {
            out.push(signals::METADATA_ISSUE.signal_weighted(
                w,
                "Missing tax breakdown (no CGST/SGST/IGST found)",
            ));
        }

        match fields.date.as_deref().and_then(parse_document_date) {
            None => out.push(
                signals::METADATA_ISSUE.signal_weighted(w, "No date found on document"),
            ),
            Some(date) => {
                let age_days = (Utc::now().date_naive() - date).num_days();
                if age_days > STALE_AFTER_DAYS {
                    out.push(signals::STALE_DOCUMENT_DATE.signal_weighted(
                        w,
                        format!("Document date {date} is {age_days} days old"),
                    ));
                }
            }
        }

        if let Some(doc_vendor) = &fields.vendor_name {
            let claimed = claim.vendor_name.to_lowercase();
            let on_doc = doc_vendor.to_lowercase();
            if !claimed.is_empty()
                && !on_doc.is_empty()
                && !claimed.contains(&on_doc)
                && !on_doc.contains(&claimed)
            {
                out.push(signals::VENDOR_NAME_MISMATCH.signal_weighted(
                    w,
                    format!(
                        "Vendor name mismatch: document says '{}', expected '{}'",
                        doc_vendor, claim.vendor_name
                    ),
                ));
            }
        }
    }

    /// Cross-checks the amount printed on the document against the claim.
    fn check_document_amount(
        &self,
        claim: &ClaimContext,
        fields: &DocumentFields,
        out: &mut Vec<Signal>,
    ) {
        let Some(doc_amount) = fields.amount else {
            return;
        };
        if doc_amount <= 0.0 {
            return;
        }
        let w = self.metadata_issue_weight;

        if claim.amount > 0.0 && doc_amount > claim.amount {
            let pct = (doc_amount - claim.amount) / claim.amount * 100.0;
            out.push(signals::AMOUNT_MISMATCH.signal_weighted(
                w,
                format!(
                    "Document amount ({doc_amount}) exceeds claimed amount ({}) by {pct:.0}%",
                    claim.amount
                ),
            ));
        }

        if claim.project_budget > 0.0 && doc_amount > claim.project_budget * 0.5 {
            out.push(signals::BUDGET_SHARE_EXCEEDED.signal_weighted(
                w,
                "Single invoice exceeds 50% of project budget",
            ));
        }
    }
}

/// Accepts `D[-/.]M[-/.]YY[YY]`, day first.
fn parse_document_date(s: &str) -> Option<NaiveDate> {
    for sep in ['-', '/', '.'] {
        for fmt_year in ["%Y", "%y"] {
            let fmt = format!("%d{sep}%m{sep}{fmt_year}");
            if let Ok(date) = NaiveDate::parse_from_str(s, &fmt) {
                return Some(date);
            }
        }
    }
    None
}
