//! Success envelopes. Errors are shaped by `AppError`.

use crate::{handlers::cors, models::target::UploadOutcome};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Which success body a route answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{success, path, name}`
    Standard,
    /// `{success, message, path, fileName}`
    Legacy { message: &'static str },
}

#[derive(Serialize)]
struct StandardBody<'a> {
    success: bool,
    path: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBody<'a> {
    success: bool,
    message: &'a str,
    path: &'a str,
    file_name: &'a str,
}

pub fn success(shape: ResponseShape, outcome: &UploadOutcome) -> Response {
    let mut response = match shape {
        ResponseShape::Standard => (
            StatusCode::OK,
            Json(StandardBody {
                success: true,
                path: &outcome.path,
                name: &outcome.name,
            }),
        )
            .into_response(),
        ResponseShape::Legacy { message } => (
            StatusCode::OK,
            Json(LegacyBody {
                success: true,
                message,
                path: &outcome.path,
                file_name: &outcome.name,
            }),
        )
            .into_response(),
    };
    cors::apply(response.headers_mut());
    response
}
