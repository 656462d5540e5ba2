//! Defines routes for the upload handlers.
//!
//! ## Structure
//! - **Upload endpoints** (any method; the gate answers `OPTIONS` and
//!   rejects everything but `POST`)
//!   - `/upload-dropbox`: JSON body to Dropbox, overwrite
//!   - `/upload-dropbox-node`: multipart body to Dropbox, add + autorename
//!   - `/upload-ftp`: JSON body to SFTP/FTP, fixed file name
//!
//! Each upload endpoint is also reachable under `/api/` and
//! `/.netlify/functions/` so existing frontends keep their URLs.
//!
//! - **Health**
//!   - `GET /healthz`

use crate::{
    handlers::{
        health_handlers::healthz,
        upload_handlers::{upload_dropbox, upload_dropbox_node, upload_ftp},
    },
    services::pipeline::RelayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};

const PREFIXES: [&str; 3] = ["", "/api", "/.netlify/functions"];

/// Build and return the router for all upload routes.
///
/// The router carries shared state (`RelayService`) to all handlers. No body
/// size limit is applied.
pub fn routes() -> Router<RelayService> {
    let mut router = Router::new().route("/healthz", get(healthz));

    for prefix in PREFIXES {
        router = router
            .route(&format!("{prefix}/upload-dropbox"), any(upload_dropbox))
            .route(&format!("{prefix}/upload-dropbox-node"), any(upload_dropbox_node))
            .route(&format!("{prefix}/upload-ftp"), any(upload_ftp));
    }

    router.layer(DefaultBodyLimit::disable())
}
