/// Metrics and telemetry for Earl Box
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Upload outcomes and bytes accepted
/// - File responses by status
/// - Compensating deletes after failed metadata inserts
/// - Background job execution and orphan blob removal

use crate::error::{AppError, AppResult};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== Upload Metrics ==========

    /// Uploads by outcome: success, rejected (validation) or failed (storage)
    pub static ref UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "earl_uploads_total",
        "Total number of upload attempts",
        &["outcome"]
    )
    .unwrap();

    /// Decoded bytes of committed uploads
    pub static ref UPLOAD_BYTES_TOTAL: IntCounter = register_int_counter!(
        "earl_upload_bytes_total",
        "Total decoded bytes of committed uploads"
    )
    .unwrap();

    /// Compensating blob deletes by outcome
    pub static ref COMPENSATING_DELETES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "earl_compensating_deletes_total",
        "Blob deletes issued after a failed metadata insert",
        &["outcome"]
    )
    .unwrap();

    // ========== Serving Metrics ==========

    /// File responses by HTTP status
    pub static ref FILE_RESPONSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "earl_file_responses_total",
        "Total number of GET /file responses",
        &["status"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "earl_background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "earl_background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();

    /// Orphan blobs removed by the sweeper
    pub static ref ORPHAN_BLOBS_REMOVED_TOTAL: IntCounter = register_int_counter!(
        "earl_orphan_blobs_removed_total",
        "Blobs without a metadata row removed by the orphan sweep"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> AppResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| AppError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

/// Record an upload outcome
pub fn record_upload(outcome: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
    if outcome == "success" {
        UPLOAD_BYTES_TOTAL.inc_by(bytes);
    }
}

/// Record a compensating delete
pub fn record_compensating_delete(succeeded: bool) {
    COMPENSATING_DELETES_TOTAL
        .with_label_values(&[if succeeded { "deleted" } else { "failed" }])
        .inc();
}

/// Record a file response status
pub fn record_file_response(status: u16) {
    FILE_RESPONSES_TOTAL
        .with_label_values(&[&status.to_string()])
        .inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Record orphan blobs removed in one sweep
pub fn record_orphans_removed(count: u64) {
    ORPHAN_BLOBS_REMOVED_TOTAL.inc_by(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upload() {
        record_upload("success", 17);
        record_upload("rejected", 0);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("earl_uploads_total"));
        assert!(metrics.contains("earl_upload_bytes_total"));
    }

    #[test]
    fn test_record_file_response() {
        record_file_response(304);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("earl_file_responses_total"));
        assert!(metrics.contains("status=\"304\""));
    }

    #[test]
    fn test_record_background_job() {
        record_background_job("orphan_sweep", "success", 0.2);
        record_orphans_removed(2);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("earl_background_jobs_total"));
        assert!(metrics.contains("earl_background_job_duration_seconds"));
        assert!(metrics.contains("earl_orphan_blobs_removed_total"));
    }
}
