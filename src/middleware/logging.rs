use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    middleware::Next,
    response::Response,
};

/// Middleware assigning each request an id and logging the outcome.
///
/// Error response bodies are logged (truncated) so a rejected webhook or
/// quota denial can be diagnosed from the logs alone; success bodies are
/// not, they may carry approval URLs.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::info!(request_id = %request_id, method = %method, uri = %uri, "→ Request");

    let response = next.run(request).await;

    let status = response.status();
    let latency = start.elapsed();

    if status.is_client_error() || status.is_server_error() {
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, 64 * 1024).await.unwrap_or_default();
        let body_text = truncate_body(&String::from_utf8_lossy(&bytes), 2000);

        tracing::warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            body = %body_text,
            "← Response"
        );
        return Response::from_parts(parts, Body::from(bytes));
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "← Response"
    );
    response
}

fn truncate_body(body: &str, max_len: usize) -> String {
    let body = body.trim();
    if body.len() <= max_len {
        return body.to_string();
    }
    // Back up to a char boundary; slicing mid-character panics
    let mut cut = max_len;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}...[truncated, {} bytes total]",
        &body[..cut],
        body.len()
    )
}
