//! Request gate and the permissive CORS headers every response carries.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::Response,
};

/// What the gate decided for an inbound method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Preflight,
    MethodNotAllowed,
    Proceed,
}

/// `OPTIONS` is answered before anything else is read; only `POST` proceeds.
pub fn gate(method: &Method) -> Disposition {
    if method == Method::OPTIONS {
        Disposition::Preflight
    } else if method != Method::POST {
        Disposition::MethodNotAllowed
    } else {
        Disposition::Proceed
    }
}

/// Attach `Access-Control-Allow-*` headers.
pub fn apply(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
}

/// 200 with an empty body.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    apply(response.headers_mut());
    response
}
