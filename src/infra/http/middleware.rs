use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, field::Empty, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

/// Wrap each request in a span keyed by the matched route.
///
/// Handlers fill in `slug` and `locale` on the current span. Failed responses
/// are logged with the `ErrorReport` their handler attached, which is then
/// dropped so it never leaves the process.
pub async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let span = info_span!(
        "http_request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        route = %route,
        slug = Empty,
        locale = Empty,
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            parent: &span,
            target = "sanluis::http::response",
            status = status.as_u16(),
            elapsed_ms,
            "request served",
        );
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("axum", Vec::new()),
    };
    let detail = chain.first().map(String::as_str).unwrap_or("rejected before a handler ran");

    if status.is_server_error() {
        error!(
            parent: &span,
            target = "sanluis::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            "request failed",
        );
    } else {
        warn!(
            parent: &span,
            target = "sanluis::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            "request rejected",
        );
    }

    response
}
