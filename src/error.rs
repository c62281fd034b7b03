use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// Quota exhausted for the calling client. Expected and frequent.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The caller's network address could not be determined. The limiter
    /// fails closed rather than guess an identity and charge the wrong
    /// client's quota.
    #[error("unable to determine client address")]
    IdentityExtraction,

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::IdentityExtraction => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Error::RateLimited => "too many requests",
            Error::IdentityExtraction => "unable to determine client address",
            Error::Config(_) => "internal server error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message() }));
        (self.status_code(), body).into_response()
    }
}
