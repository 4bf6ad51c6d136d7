//! Observability metrics: query latency, upload counts, skipped vectors.

use std::time::Duration;

/// Collects runtime metrics for the search engine.
#[derive(Debug)]
pub struct MetricsCollector {
    query_latencies_us: Vec<f64>,
    total_queries: u64,
    total_uploads: u64,
    total_skipped_incompatible: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            query_latencies_us: Vec::new(),
            total_queries: 0,
            total_uploads: 0,
            total_skipped_incompatible: 0,
        }
    }

    /// Record a query with its duration and skipped-record count.
    pub fn record_query(&mut self, duration: Duration, skipped_incompatible: usize) {
        self.total_queries += 1;
        self.total_skipped_incompatible += skipped_incompatible as u64;
        self.query_latencies_us.push(duration.as_micros() as f64);
    }

    /// Record an upload operation.
    pub fn record_upload(&mut self) {
        self.total_uploads += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    pub fn total_uploads(&self) -> u64 {
        self.total_uploads
    }

    /// Running total of records skipped by the compatibility filter.
    pub fn total_skipped_incompatible(&self) -> u64 {
        self.total_skipped_incompatible
    }

    /// Average query latency in microseconds.
    pub fn avg_query_latency_us(&self) -> f64 {
        if self.query_latencies_us.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.query_latencies_us.iter().sum();
        sum / self.query_latencies_us.len() as f64
    }

    /// Get a percentile of query latency (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_query_latency_us(&self, percentile: f64) -> f64 {
        if self.query_latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted = self.query_latencies_us.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
