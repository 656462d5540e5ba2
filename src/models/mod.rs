//! Request-scoped data models for the upload relay.
//!
//! Nothing here outlives a single request: an inbound `UploadRequest` is
//! reduced to a `FilePayload`, named into a `DestinationTarget`, and the
//! transfer produces an `UploadOutcome` for the response formatter.

pub mod payload;
pub mod target;
