//! Invoice Risk Pipeline - Main Entry Point
//!
//! Consumes claim submissions from NATS, runs the risk fusion engine, and
//! publishes risk assessments. Supports parallel submission processing.

use anyhow::Result;
use invoice_risk_pipeline::{
    config::AppConfig,
    consumer::SubmissionConsumer,
    detectors::{DuplicateIndex, FieldAnomalyDetector, SeenInvoices, VendorRegistry},
    engine::RiskFusionEngine,
    metrics::{MetricsReporter, PipelineMetrics},
    model::{AnomalyScorer, FraudClassifier, ModelLoader, OutlierModel},
    producer::AssessmentProducer,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("invoice_risk_pipeline={}", config.logging.level).parse()?,
    );
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Invoice Risk Pipeline");
    info!(
        "Verdict profile: {:?}, scoring law: {:?}",
        config.detection.verdict_profile, config.detection.scoring_law
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Initialize detectors
    let registry = Arc::new(VendorRegistry::new(
        config.detectors.redlist.clone(),
        config.detectors.registered_vendors.clone(),
    ));
    let seen_invoices = Arc::new(SeenInvoices::new());
    let field_detector = FieldAnomalyDetector::new(
        registry,
        seen_invoices,
        config.detection.metadata_issue_weight,
    );

    let hash_log = Path::new(&config.detectors.hash_log);
    if let Some(parent) = hash_log.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let duplicates = Arc::new(DuplicateIndex::open(
        hash_log,
        config.detectors.duplicate_threshold,
    )?);
    info!(
        "Duplicate index opened at {} ({} known hashes)",
        config.detectors.hash_log,
        duplicates.len()
    );

    // Load optional ONNX models; absence means rule-only scoring
    let loader = ModelLoader::new(config.models.onnx_threads)?;
    let models_dir = Path::new(&config.models.models_dir);
    let outlier = loader
        .load_optional(
            &models_dir.join(&config.models.outlier_model),
            "amount-outlier",
            &config.models.version,
        )
        .map(|m| Arc::new(m) as Arc<dyn OutlierModel>);
    let classifier = loader
        .load_optional(
            &models_dir.join(&config.models.classifier_model),
            "fraud-classifier",
            &config.models.version,
        )
        .map(|m| Arc::new(m) as Arc<dyn FraudClassifier>);
    let scorer = AnomalyScorer::new(outlier, classifier);
    info!(hybrid = scorer.has_classifier(), "Anomaly scorer ready");

    // Assemble the fusion engine. OCR and CV evidence arrives pre-extracted
    // on the submission message.
    let engine = Arc::new(
        RiskFusionEngine::new(
            config.detection.verdict_profile.clone(),
            config.detection.scoring_law.clone(),
            field_detector,
            duplicates,
            scorer,
        )
        .with_metrics(metrics.clone()),
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = SubmissionConsumer::new(client.clone(), &config.nats.submission_subject);
    let producer = Arc::new(AssessmentProducer::new(
        client.clone(),
        &config.nats.assessment_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting submission processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.submission_subject);
    info!("Publishing assessments to: {}", config.nats.assessment_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process submissions in parallel. The consumer drops malformed
    // payloads, so every yielded request is already typed.
    let mut submissions = consumer.subscribe().await?;

    while let Some(request) = submissions.next_submission().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let claim_id = request.claim.claim_id.clone();
            let assessment = engine.assess(&request);
            let processing_time = start_time.elapsed();

            metrics.record_assessment(
                processing_time,
                assessment.score,
                &format!("{:?}", assessment.verdict).to_uppercase(),
                assessment.model.is_some(),
            );

            if let Err(e) = producer.publish(&assessment).await {
                error!(
                    claim_id = %claim_id,
                    error = %e,
                    "Failed to publish assessment"
                );
            } else {
                debug!(
                    claim_id = %claim_id,
                    score = assessment.score,
                    verdict = ?assessment.verdict,
                    processing_time_us = processing_time.as_micros(),
                    "Assessment published"
                );
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

            // Log progress every 100 submissions
            if count % 100 == 0 {
                let throughput = metrics.get_throughput();
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} /s", throughput),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
