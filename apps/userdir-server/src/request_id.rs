use axum::http::{HeaderName, Request};
use axum::{body::Body, middleware::Next, response::Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

/// Request id as seen by handlers.
#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

fn request_id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

/// Stores the request id in the request extensions and records it on the current span.
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = request_id_of(&req).to_owned();
    req.extensions_mut().insert(XRequestId(rid.clone()));
    tracing::Span::current().record("request_id", tracing::field::display(&rid));
    next.run(req).await
}

#[allow(clippy::type_complexity)]
pub fn create_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            version = ?req.version(),
            request_id = %request_id_of(req),
            status = Empty,
            latency_ms = Empty
        )
    })
}
