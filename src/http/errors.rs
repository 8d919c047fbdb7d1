use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::types::ErrorBody;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("rate limited, retry after {}s", .0.as_secs())]
    RateLimited(Duration),
    /// The text is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(message) => message.clone(),
            Self::RateLimited(_) => RATE_LIMITED_MESSAGE.to_string(),
            Self::Internal(detail) => {
                error!(%detail, "request failed");
                INTERNAL_MESSAGE.to_string()
            }
        };
        let body = Json(ErrorBody {
            success: false,
            message,
        });

        let mut response = (status, body).into_response();
        if let Self::RateLimited(retry_after) = self {
            // au moins une seconde, sinon le client réessaie immédiatement
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
