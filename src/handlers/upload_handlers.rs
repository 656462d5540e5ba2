//! HTTP handlers for the upload routes.
//!
//! Every route runs the same sequence: gate, extract, name, transfer,
//! notify, respond. Routes differ only in their `UploadRoute` wiring.

use crate::{
    config::UploadConfig,
    errors::{AppError, UploadError},
    handlers::{
        cors::{self, Disposition},
        response::{self, ResponseShape},
    },
    models::payload::UploadRequest,
    services::{
        destinations::{DestinationAdapter, DestinationKind},
        extractor::ExtractMode,
        pipeline::RelayService,
    },
};
use axum::{
    body::{Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Static wiring of one upload endpoint.
#[derive(Debug, Clone, Copy)]
pub struct UploadRoute {
    pub destination: DestinationKind,
    pub extraction: ExtractMode,
    pub shape: ResponseShape,
    /// `error` field of 500 responses.
    pub failure_label: &'static str,
}

/// JSON body, Dropbox content call, overwrite.
pub const DROPBOX_HTTP_ROUTE: UploadRoute = UploadRoute {
    destination: DestinationKind::DropboxHttp,
    extraction: ExtractMode::Json,
    shape: ResponseShape::Standard,
    failure_label: "Failed to upload file to Dropbox",
};

/// Multipart body, typed Dropbox client, add + autorename.
pub const DROPBOX_SDK_ROUTE: UploadRoute = UploadRoute {
    destination: DestinationKind::DropboxSdk,
    extraction: ExtractMode::Multipart,
    shape: ResponseShape::Legacy {
        message: "File uploaded to Dropbox successfully",
    },
    failure_label: "Failed to upload file to Dropbox",
};

/// JSON body, SFTP or FTP with a fixed file name.
pub const FTP_ROUTE: UploadRoute = UploadRoute {
    destination: DestinationKind::RemoteFile,
    extraction: ExtractMode::Json,
    shape: ResponseShape::Standard,
    failure_label: "Failed to upload file to FTP server",
};

/// Header that marks a base64 transport-encoded body.
pub const TRANSFER_ENCODING_HEADER: &str = "content-transfer-encoding";

/// `ANY /upload-dropbox`
pub async fn upload_dropbox(State(service): State<RelayService>, request: Request) -> Response {
    serve(&service, &DROPBOX_HTTP_ROUTE, request).await
}

/// `ANY /upload-dropbox-node`
pub async fn upload_dropbox_node(
    State(service): State<RelayService>,
    request: Request,
) -> Response {
    serve(&service, &DROPBOX_SDK_ROUTE, request).await
}

/// `ANY /upload-ftp`
pub async fn upload_ftp(State(service): State<RelayService>, request: Request) -> Response {
    serve(&service, &FTP_ROUTE, request).await
}

/// Convert the axum request and run the pipeline inside a request span.
/// The body is only buffered for requests that pass the gate.
async fn serve(service: &RelayService, route: &UploadRoute, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("upload", %request_id, destination = ?route.destination);

    async move {
        let (parts, body) = request.into_parts();

        let body = if cors::gate(&parts.method) == Disposition::Proceed {
            match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("failed to read request body: {}", err);
                    return AppError::new(StatusCode::BAD_REQUEST, "Failed to read request body")
                        .into_response();
                }
            }
        } else {
            Bytes::new()
        };

        let upload_request = UploadRequest {
            method: parts.method,
            content_type: parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            is_base64_encoded: is_base64_encoded(&parts.headers),
            body,
        };

        respond(service, route, upload_request).await
    }
    .instrument(span)
    .await
}

/// Gate, upload and format: the full contract of one route.
pub async fn respond(service: &RelayService, route: &UploadRoute, request: UploadRequest) -> Response {
    respond_with(service, route, request, |config| {
        route.destination.adapter(config, service.http())
    })
    .await
}

/// `respond` with a caller-supplied adapter.
pub async fn respond_with<F>(
    service: &RelayService,
    route: &UploadRoute,
    request: UploadRequest,
    build: F,
) -> Response
where
    F: FnOnce(&UploadConfig) -> Result<Box<dyn DestinationAdapter>, UploadError>,
{
    match cors::gate(&request.method) {
        Disposition::Preflight => return cors::preflight(),
        Disposition::MethodNotAllowed => {
            warn!(method = %request.method, "method not allowed");
            return UploadError::MethodNotAllowed
                .into_app_error(route.failure_label)
                .into_response();
        }
        Disposition::Proceed => {}
    }

    match service.upload(route.extraction, &request, build).await {
        Ok(outcome) => {
            info!(path = %outcome.path, name = %outcome.name, "upload succeeded");
            response::success(route.shape, &outcome)
        }
        Err(err) if err.is_client_error() => {
            warn!(error = %err, "upload rejected");
            err.into_app_error(route.failure_label).into_response()
        }
        Err(err) => {
            error!(error = %err, "upload failed");
            err.into_app_error(route.failure_label).into_response()
        }
    }
}

fn is_base64_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(TRANSFER_ENCODING_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn base64_flag_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        assert!(!is_base64_encoded(&headers));
        headers.insert(TRANSFER_ENCODING_HEADER, HeaderValue::from_static("BASE64"));
        assert!(is_base64_encoded(&headers));
        headers.insert(TRANSFER_ENCODING_HEADER, HeaderValue::from_static("binary"));
        assert!(!is_base64_encoded(&headers));
    }
}
