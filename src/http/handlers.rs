use std::net::SocketAddr;

use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
};
use tracing::{debug, info};

use super::app::AppState;
use super::errors::ApiError;
use super::types::{
    CheckEmailRequest, CheckEmailResponse, ValidateEmailRequest, ValidateEmailResponse,
};
use crate::finder::{FindReport, MISSING_INPUT, VerifyError};
use crate::mx::LookupMx;
use crate::smtp_verify::MailboxProber;
use crate::validator::validate_email;

pub const FOUND_MESSAGE: &str = "ok";
pub const NOT_FOUND_MESSAGE: &str = "No valid email found";
pub const SHORT_NAME_MESSAGE: &str = "Name must contain at least a first and last name";
pub const UNUSABLE_NAME_MESSAGE: &str = "Name contains no characters usable in an email address";
pub const MISSING_EMAIL_MESSAGE: &str = "Missing or invalid email";
pub const BAD_SYNTAX_MESSAGE: &str = "Invalid email syntax";

/// First `X-Forwarded-For` entry, else the peer address, else `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn admit<R, P>(
    state: &AppState<R, P>,
    headers: &HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
) -> Result<(), ApiError> {
    let client = client_key(headers, connect.map(|ConnectInfo(addr)| addr));
    state
        .limiter
        .check(&client)
        .map_err(|limited| ApiError::RateLimited(limited.retry_after))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn check_email<R, P>(
    State(state): State<AppState<R, P>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckEmailResponse>, ApiError>
where
    R: LookupMx + Send + Sync + 'static,
    P: MailboxProber + Send + Sync + 'static,
{
    admit(&state, &headers, connect)?;

    let request: CheckEmailRequest = serde_json::from_slice(&body).map_err(|err| {
        debug!(error = %err, "unreadable check-email payload");
        ApiError::bad_request(MISSING_INPUT)
    })?;
    let (Some(name), Some(domain)) = (non_empty(request.name), non_empty(request.domain)) else {
        return Err(ApiError::bad_request(MISSING_INPUT));
    };

    let report = state.verifier.find(&name, &domain).await.map_err(|err| match err {
        VerifyError::InputInvalid(message) => ApiError::BadRequest(message),
        VerifyError::Internal(detail) => ApiError::Internal(detail),
    })?;

    let response = match report {
        FindReport::Found {
            verdict,
            checked,
            total,
        } => CheckEmailResponse {
            success: true,
            email: Some(verdict.address),
            message: FOUND_MESSAGE.to_string(),
            method: Some(verdict.method),
            confidence: Some(verdict.confidence),
            checked_count: Some(checked),
            total_patterns: Some(total),
            ..CheckEmailResponse::default()
        },
        FindReport::InsufficientName => CheckEmailResponse {
            success: false,
            message: SHORT_NAME_MESSAGE.to_string(),
            total_patterns: Some(0),
            ..CheckEmailResponse::default()
        },
        FindReport::NoUsablePattern { .. } => CheckEmailResponse {
            success: false,
            message: UNUSABLE_NAME_MESSAGE.to_string(),
            total_patterns: Some(0),
            ..CheckEmailResponse::default()
        },
        FindReport::NotFound {
            attempts,
            total,
            suggestions,
        } => CheckEmailResponse {
            success: false,
            message: NOT_FOUND_MESSAGE.to_string(),
            checked_count: Some(attempts.len()),
            total_patterns: Some(total),
            attempts: Some(attempts),
            suggestions: Some(suggestions),
            ..CheckEmailResponse::default()
        },
    };
    info!(domain = %domain, success = response.success, "check-email answered");
    Ok(Json(response))
}

pub async fn validate_email_handler<R, P>(
    State(state): State<AppState<R, P>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ValidateEmailResponse>, ApiError>
where
    R: LookupMx + Send + Sync + 'static,
    P: MailboxProber + Send + Sync + 'static,
{
    admit(&state, &headers, connect)?;

    let request: ValidateEmailRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request(MISSING_EMAIL_MESSAGE))?;
    let Some(email) = non_empty(request.email) else {
        return Err(ApiError::bad_request(MISSING_EMAIL_MESSAGE));
    };
    if !validate_email(&email).ok {
        return Err(ApiError::bad_request(BAD_SYNTAX_MESSAGE));
    }

    let verdict = state.verifier.validate(&email).await;
    info!(
        outcome = %verdict.outcome,
        confidence = verdict.confidence,
        "validate-email answered"
    );
    Ok(Json(ValidateEmailResponse::from(verdict)))
}

pub async fn healthz() -> &'static str {
    "ok"
}
