use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Session store Metrics (Redis)
    pub static ref SESSION_STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "session_store_operations_total",
        "Total number of session store operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref SESSION_STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "session_store_operation_duration_seconds",
        "Session store operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .unwrap();

    // Business Metrics
    pub static ref QUIZZES_STARTED_TOTAL: IntCounter = register_int_counter!(
        "quizzes_started_total",
        "Total number of quizzes started"
    )
    .unwrap();

    pub static ref QUIZZES_COMPLETED_TOTAL: IntCounter = register_int_counter!(
        "quizzes_completed_total",
        "Total number of quizzes completed"
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounter = register_int_counter!(
        "answers_submitted_total",
        "Total number of answers submitted"
    )
    .unwrap();

    pub static ref ANSWERS_SCORED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_scored_total",
        "Total number of answers scored at result time",
        &["correct"]
    )
    .unwrap();

    pub static ref EXPLANATIONS_SERVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "explanations_served_total",
        "Total number of explanations served",
        &["source"]
    )
    .unwrap();

    pub static ref CHAT_TURNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chat_turns_total",
        "Total number of follow-up chat turns",
        &["outcome"]
    )
    .unwrap();

    // LLM provider Metrics
    pub static ref LLM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "llm_requests_total",
        "Total number of LLM chat-completion requests",
        &["outcome"]
    )
    .unwrap();

    pub static ref LLM_REQUEST_DURATION_SECONDS: Histogram = register_histogram!(
        "llm_request_duration_seconds",
        "LLM chat-completion request duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track a session store operation with metrics
pub async fn track_session_store_operation<F, T>(
    operation: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    SESSION_STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    SESSION_STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Just verify that all metrics are properly registered
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = EXPLANATIONS_SERVED_TOTAL.with_label_values(&["llm"]).get();
    }

    #[test]
    fn test_render_metrics() {
        // Increment a counter to ensure we have some data
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let result = render_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("http_requests_total"));
    }
}
