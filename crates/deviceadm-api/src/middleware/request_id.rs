//! Request ID layers: assign an ID to requests arriving without one, echo
//! it on the response and record it on the request span.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::set_header::SetRequestHeaderLayer;
use tower_http::trace::{HttpMakeClassifier, TraceLayer};
use tracing::{Span, info_span};

use deviceadm_core::context::REQUEST_ID_HEADER;

fn header_name() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Sets `x-request-id` to a fresh UUID unless the caller sent one.
pub fn set_request_id_layer()
-> SetRequestHeaderLayer<fn(&Request<Body>) -> Option<HeaderValue>> {
    SetRequestHeaderLayer::if_not_present(header_name(), generate as fn(&Request<Body>) -> _)
}

fn generate(_request: &Request<Body>) -> Option<HeaderValue> {
    HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok()
}

/// Copies `x-request-id` from the request onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name())
}

/// HTTP trace layer whose spans carry the request ID.
pub fn trace_layer() -> TraceLayer<HttpMakeClassifier, fn(&Request<Body>) -> Span> {
    TraceLayer::new_for_http().make_span_with(make_span as fn(&Request<Body>) -> Span)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http-request",
        method = %request.method(),
        path = request.uri().path(),
        request_id
    )
}
