pub mod cors;
pub mod health_handlers;
pub mod response;
pub mod upload_handlers;
