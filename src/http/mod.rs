//! # HTTP service (`with-http` feature)
//!
//! JSON endpoints over the verification engine:
//! * `POST /api/check-email`: find the address of a person at a domain
//! * `POST /api/validate-email`: check a single address
//! * `GET /healthz`
//!
//! Every API request is counted by the [`RequestRateLimiter`](crate::ratelimit::RequestRateLimiter)
//! before its body is even parsed.

mod app;
mod errors;
mod handlers;
mod types;

pub use app::{AppState, build_app, serve};
pub use errors::ApiError;
pub use handlers::client_key;
pub use types::{
    CheckEmailRequest, CheckEmailResponse, ErrorBody, ValidateEmailRequest, ValidateEmailResponse,
};
