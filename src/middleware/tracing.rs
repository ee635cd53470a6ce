// ABOUTME: Request ID propagation and per-request tracing spans
// ABOUTME: Reuses or generates x-request-id, exposes it to handlers, error bodies and responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderValue;
use tracing::Span;
use uuid::Uuid;

/// Header carrying the request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID for one request, available as `Extension<RequestId>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The ID as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RequestId;
}

/// ID of the request being served on this task, if any
///
/// Set for the duration of [`request_id_middleware`]'s inner service call.
#[must_use]
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(|id| id.0.clone()).ok()
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attach a [`RequestId`] to the request and echo it on the response
///
/// Must wrap the trace layer so that request spans carry the ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map_or_else(RequestId::generate, |v| RequestId(v.to_owned()));

    let header_value = HeaderValue::from_str(request_id.as_str()).ok();
    // Inner layers (the trace span among them) read the ID from the header
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    request.extensions_mut().insert(request_id.clone());

    // Error responses rendered downstream pick the ID up from the task
    let mut response = CURRENT_REQUEST_ID.scope(request_id, next.run(request)).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Create a tracing span for HTTP requests
pub fn create_request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        status_code = tracing::field::Empty,
    )
}

/// Record the final status code on the request span
pub fn record_response_status(response: &Response, _latency: Duration, span: &Span) {
    span.record("status_code", response.status().as_u16());
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_request_span_records_status_code() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_span_events(FmtSpan::CLOSE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let request = Request::builder()
                .uri("/posts/missing")
                .header(REQUEST_ID_HEADER, "span-1")
                .body(Body::empty())
                .unwrap();
            let response = Response::builder()
                .status(404)
                .body(Body::empty())
                .unwrap();

            let span = create_request_span(&request);
            record_response_status(&response, Duration::from_millis(3), &span);
            drop(span);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("request_id=span-1"), "{output}");
        assert!(output.contains("status_code=404"), "{output}");
    }

    #[test]
    fn test_no_request_id_outside_a_request() {
        assert_eq!(current_request_id(), None);
    }

    #[tokio::test]
    async fn test_request_id_visible_inside_scope() {
        let id = CURRENT_REQUEST_ID
            .scope(RequestId("abc-123".into()), async { current_request_id() })
            .await;
        assert_eq!(id.as_deref(), Some("abc-123"));
    }
}
