//! NATS message consumer for incoming claim submissions.
//!
//! The consumer owns the wire format: subscribers get typed
//! [`SubmissionRequest`]s and never see raw payloads. Malformed messages are
//! logged and dropped here so the engine only runs on well-formed input.

use crate::types::SubmissionRequest;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{info, warn};

/// Consumer for receiving claim submissions from NATS
pub struct SubmissionConsumer {
    client: Client,
    subject: String,
}

impl SubmissionConsumer {
    /// Create a new submission consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the submission subject
    pub async fn subscribe(&self) -> Result<SubmissionStream> {
        let inner = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to submission subject");
        Ok(SubmissionStream {
            inner,
            subject: self.subject.clone(),
        })
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Typed view over the raw subscription.
pub struct SubmissionStream {
    inner: Subscriber,
    subject: String,
}

impl SubmissionStream {
    /// Next well-formed submission, or `None` when the subscription ends.
    /// Payloads that fail to decode are logged and skipped.
    pub async fn next_submission(&mut self) -> Option<SubmissionRequest> {
        while let Some(message) = self.inner.next().await {
            match decode_submission(&message.payload) {
                Ok(request) => return Some(request),
                Err(e) => {
                    warn!(
                        subject = %self.subject,
                        error = %e,
                        payload_bytes = message.payload.len(),
                        "Discarding malformed submission"
                    );
                }
            }
        }
        None
    }
}

fn decode_submission(payload: &[u8]) -> serde_json::Result<SubmissionRequest> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_payload_decodes() {
        let payload = br#"{
            "claim": {
                "claim_id": "INV-1",
                "amount": 500.0,
                "project_budget": 10000.0,
                "vendor_name": "Good Supplies Inc"
            },
            "ocr_text": "Grand Total: 500.00"
        }"#;
        let request = decode_submission(payload).unwrap();
        assert_eq!(request.claim.claim_id, "INV-1");
        assert_eq!(request.ocr_text.as_deref(), Some("Grand Total: 500.00"));
        assert!(request.image_path.is_none());
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(decode_submission(b"not json").is_err());
        // A claim missing its required fields is malformed too
        assert!(decode_submission(br#"{"claim": {"claim_id": "INV-2"}}"#).is_err());
    }
}
