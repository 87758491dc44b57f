use std::time::Instant;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use tracing::{Level, debug, event};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const METRIC_HTTP_REQUESTS: &str = "stipple_http_requests_total";
const METRIC_HTTP_LATENCY_MS: &str = "stipple_http_request_ms";

/// Per-request id, visible to handlers and to the logging layer.
#[derive(Debug, Clone)]
pub struct RequestId(pub Uuid);

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(id);
    response
}

/// One line per request. Failures carry the handler's [`ErrorReport`], which
/// is taken out of the response so it never leaves the process.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0);
    let started = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    counter!(METRIC_HTTP_REQUESTS, "status" => status.as_u16().to_string()).increment(1);
    histogram!(METRIC_HTTP_LATENCY_MS).record(elapsed_ms);

    let line = ResponseLine {
        status,
        method: &method,
        path: &path,
        elapsed_ms,
        request_id,
    };
    if status.is_client_error() || status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        line.failed(report);
    } else {
        line.served();
    }

    response
}

struct ResponseLine<'a> {
    status: StatusCode,
    method: &'a Method,
    path: &'a str,
    elapsed_ms: f64,
    request_id: Option<Uuid>,
}

impl ResponseLine<'_> {
    fn served(&self) {
        debug!(
            target = "stipple::http::response",
            status = self.status.as_u16(),
            method = %self.method,
            path = self.path,
            elapsed_ms = self.elapsed_ms,
            request_id = ?self.request_id,
            "request served",
        );
    }

    fn failed(&self, report: Option<ErrorReport>) {
        let (source, chain) = report
            .map(|report| (report.source, report.messages))
            .unwrap_or(("unknown", Vec::new()));
        let detail = chain.first().map(String::as_str).unwrap_or("no diagnostic");

        let status = self.status.as_u16();
        let method = self.method;
        let path = self.path;
        let elapsed_ms = self.elapsed_ms;
        let request_id = self.request_id;

        macro_rules! emit {
            ($level:expr, $message:literal) => {
                event!(
                    $level,
                    target = "stipple::http::response",
                    status,
                    method = %method,
                    path,
                    elapsed_ms,
                    source,
                    detail,
                    chain = ?chain,
                    request_id = ?request_id,
                    $message,
                )
            };
        }

        // Level must be a constant for `event!`.
        if self.status.is_server_error() {
            emit!(Level::ERROR, "request failed");
        } else {
            emit!(Level::WARN, "client request error");
        }
    }
}
