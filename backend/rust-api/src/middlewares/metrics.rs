use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Middleware collecting HTTP metrics (latency, request count)
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Execute the request
    let response = next.run(req).await;

    // Record metrics
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    // Record request count
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    // Record request duration
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Normalize URL path to avoid cardinality explosion: numeric question
/// ids/indexes become `{id}`, the free-form subject segment of the
/// explanation and chat routes becomes `{subject}`.
fn normalize_path(path: &str) -> String {
    let mut normalized: Vec<String> = path
        .split('/')
        .map(|segment| {
            if is_numeric_id(segment) {
                "{id}".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();

    let subject_position = if path.starts_with("/explanation/") {
        Some(3)
    } else if path.starts_with("/chat/submit/") {
        Some(4)
    } else {
        None
    };

    if let Some(i) = subject_position {
        if i < normalized.len() {
            normalized[i] = "{subject}".to_string();
        }
    }

    normalized.join("/")
}

/// Check if string is a numeric ID
fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/quiz/questions/2"), "/quiz/questions/{id}");
        assert_eq!(normalize_path("/quiz/answer/0"), "/quiz/answer/{id}");
        assert_eq!(
            normalize_path("/explanation/17/Algebra"),
            "/explanation/{id}/{subject}"
        );
        assert_eq!(
            normalize_path("/chat/submit/17/Plane%20Geometry"),
            "/chat/submit/{id}/{subject}"
        );
        assert_eq!(normalize_path("/quiz/result"), "/quiz/result");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("123"));
        assert!(is_numeric_id("0"));
        assert!(!is_numeric_id("abc"));
        assert!(!is_numeric_id(""));
    }
}
