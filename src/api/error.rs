//! Error responses for the HTTP channels

use crate::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// An [`Error`] rendered as `{"code", "message", "data": {"status"}}`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to show the caller; server-side failures stay generic
    pub fn public_message(&self) -> String {
        match &self.0 {
            Error::Database(_) => "Database error".to_string(),
            e if e.status() >= 500 => "Internal error".to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = json!({
            "code": self.0.code(),
            "message": self.public_message(),
            "data": { "status": status.as_u16() },
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_details_are_hidden() {
        let err = ApiError(Error::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Database error");

        let err = ApiError(Error::InvalidUrl("https://evil.com/: cross-domain".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().contains("cross-domain"));
    }
}
