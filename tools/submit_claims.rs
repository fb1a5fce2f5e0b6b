//! Test Claim Producer
//!
//! Generates and publishes test claim submissions to NATS for pipeline
//! testing.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Submission structure matching the pipeline's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Submission {
    claim: Claim,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocr_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forensics: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claim {
    claim_id: String,
    amount: f64,
    project_budget: f64,
    vendor_name: String,
    flags: serde_json::Value,
}

const VENDORS: &[&str] = &[
    "Good Supplies Inc",
    "Alpha Construction",
    "Sharma Traders",
    "Metro Cement Works",
];

const SUSPICIOUS_VENDORS: &[&str] = &["Shady Vendors Ltd", "Phantom Procurement Co"];

/// Claim generator for testing
struct ClaimGenerator {
    rng: rand::rngs::ThreadRng,
    claim_counter: u64,
}

impl ClaimGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            claim_counter: 0,
        }
    }

    /// Generate a clean, in-budget claim with well-formed document text
    fn generate_clean(&mut self) -> Submission {
        self.claim_counter += 1;
        let budget = self.rng.gen_range(50_000.0..500_000.0_f64).round();
        let amount = (budget * self.rng.gen_range(0.1..0.7)).round();
        let vendor = self.random_choice(VENDORS);
        let claim_id = format!("INV-{:06}", self.claim_counter);

        let ocr_text = format!(
            "{claim_id}\n{vendor}\nGSTIN: 27ABCDE1234F1Z5\nDate: 01/06/2026\n\
             CGST 9% SGST 9%\nGrand Total: {amount:.2}\n"
        );

        Submission {
            claim: Claim {
                claim_id,
                amount,
                project_budget: budget,
                vendor_name: vendor.to_string(),
                flags: json!({}),
            },
            ocr_text: Some(ocr_text),
            forensics: Some(json!({
                "signature": { "present": true, "quality": "Clear", "forgery_risk": "Low" },
                "qr": { "found": true, "valid": true },
                "tampering": { "is_tampered": false, "notes": [] }
            })),
        }
    }

    /// Generate a suspicious claim: over budget, unknown vendor, malformed
    /// document, weak signature
    fn generate_suspicious(&mut self) -> Submission {
        self.claim_counter += 1;
        let budget = self.rng.gen_range(50_000.0..200_000.0_f64).round();
        let amount = (budget * self.rng.gen_range(1.1..2.5)).round(); // Over budget
        let vendor = self.random_choice(SUSPICIOUS_VENDORS);
        let claim_id = format!("INV-{:06}", self.claim_counter);

        // Informal document: no GST, no tax breakdown, stale date
        let ocr_text = format!(
            "{claim_id}\n{vendor}\nDate: 15/03/2024\nTotal: {amount:.2}\n"
        );

        Submission {
            claim: Claim {
                claim_id,
                amount,
                project_budget: budget,
                vendor_name: vendor.to_string(),
                flags: json!({ "image_has_gps": false }),
            },
            ocr_text: Some(ocr_text),
            forensics: Some(json!({
                "signature": {
                    "present": self.rng.gen_bool(0.5),
                    "quality": "Blurred",
                    "forgery_risk": "Medium (Possible Digital Overlay)"
                },
                "qr": { "found": true, "valid": false },
                "tampering": {
                    "is_tampered": true,
                    "notes": ["Inconsistent noise pattern in 'Total Amount' region"]
                }
            })),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("submit_claims=info".parse()?),
        )
        .init();

    info!("Starting Test Claim Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("claims.submissions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish claims
    let mut generator = ClaimGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} claims...", count);

    let mut clean_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let submission = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            clean_count += 1;
            generator.generate_clean()
        };

        let payload = serde_json::to_vec(&submission)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} claims ({} clean, {} suspicious)",
                i + 1,
                count,
                clean_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} claims ({} clean, {} suspicious)",
        count, clean_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ClaimGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let submission = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_clean()
        };

        let json = serde_json::to_string_pretty(&submission)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample submission {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
