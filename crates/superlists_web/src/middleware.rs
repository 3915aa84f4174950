//! Request logging.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Logs one metadata-only line per routed request.
///
/// The matched route template is logged instead of the raw path so emails
/// in `/lists/users/{email}/` never reach the log.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!(
            "event=http_request module=web status=error method={method} route={route} http_status={} elapsed_ms={elapsed_ms}",
            status.as_u16()
        );
    } else {
        info!(
            "event=http_request module=web status=ok method={method} route={route} http_status={} elapsed_ms={elapsed_ms}",
            status.as_u16()
        );
    }
    response
}
