//! Performance metrics and statistics tracking for the invoice risk pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total submissions assessed
    pub submissions_processed: AtomicU64,
    /// Assessments that used the hybrid classifier score
    pub hybrid_assessments: AtomicU64,
    /// Assessments by verdict
    verdicts: RwLock<HashMap<String, u64>>,
    /// Detector failures by detector name
    detector_failures: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Risk score distribution buckets (0-9, 10-19, ... 90-100)
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            submissions_processed: AtomicU64::new(0),
            hybrid_assessments: AtomicU64::new(0),
            verdicts: RwLock::new(HashMap::new()),
            detector_failures: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one completed assessment
    pub fn record_assessment(
        &self,
        processing_time: Duration,
        score: u32,
        verdict: &str,
        hybrid: bool,
    ) {
        self.submissions_processed.fetch_add(1, Ordering::Relaxed);
        if hybrid {
            self.hybrid_assessments.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = ((score / 10).min(9)) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut verdicts) = self.verdicts.write() {
            *verdicts.entry(verdict.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a detector failure (the assessment still completed)
    pub fn record_detector_failure(&self, detector: &str) {
        if let Ok(mut failures) = self.detector_failures.write() {
            *failures.entry(detector.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (submissions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.submissions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Get assessments by verdict
    pub fn get_verdicts(&self) -> HashMap<String, u64> {
        self.verdicts.read().unwrap().clone()
    }

    /// Get detector failures
    pub fn get_detector_failures(&self) -> HashMap<String, u64> {
        self.detector_failures.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let total = self.submissions_processed.load(Ordering::Relaxed);
        let hybrid = self.hybrid_assessments.load(Ordering::Relaxed);
        let hybrid_rate = if total > 0 {
            (hybrid as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let verdicts = self.get_verdicts();
        let failures = self.get_detector_failures();
        let score_dist = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║           INVOICE RISK PIPELINE - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Submissions Assessed: {:>8}  │  Throughput: {:>6.1} /s     ║",
            total, throughput
        );
        info!(
            "║ Hybrid Assessments:   {:>8}  │  Hybrid Rate: {:>5.1}%      ║",
            hybrid, hybrid_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Verdicts:                                                    ║");
        for (verdict, count) in &verdicts {
            let pct = if total > 0 {
                (*count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:12}: {:>6} ({:>5.1}%)                              ║", verdict, count, pct);
        }
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Detector Failures:                                           ║");
            for (detector, count) in &failures {
                info!("║   {:16}: {:>6}                                    ║", detector, count);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Risk Score Distribution:                                     ║");
        let dist_total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if dist_total > 0 {
                (count as f64 / dist_total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:>2}-{:>3}: {:>6} ({:>5.1}%) {}",
                i * 10,
                if i == 9 { 100 } else { i * 10 + 9 },
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 15, "SAFE", false);
        metrics.record_assessment(Duration::from_micros(200), 82, "FLAGGED", true);
        metrics.record_detector_failure("duplicate-index");

        assert_eq!(metrics.submissions_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.hybrid_assessments.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_verdicts().get("FLAGGED"), Some(&1));
        assert_eq!(metrics.get_detector_failures().get("duplicate-index"), Some(&1));
    }

    #[test]
    fn test_score_buckets() {
        let metrics = PipelineMetrics::new();
        metrics.record_assessment(Duration::from_micros(50), 0, "SAFE", false);
        metrics.record_assessment(Duration::from_micros(50), 95, "RED", false);
        metrics.record_assessment(Duration::from_micros(50), 100, "RED", false);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[9], 2);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100u64, 200, 300, 400, 500] {
            metrics.record_assessment(Duration::from_micros(us), 10, "SAFE", false);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean_us, 300);
        assert_eq!(stats.max_us, 500);
    }
}
