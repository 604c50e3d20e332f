//! HTTP mapping of gateway errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatehouse_runtime::GatewayError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed `x-user-id`.
    #[error("missing or invalid user identity")]
    Unauthorized,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Gateway(e) => match e {
                GatewayError::Authorization(_) | GatewayError::RowNotFound => StatusCode::NOT_FOUND,
                GatewayError::Routing(_) => StatusCode::CONFLICT,
                GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
                GatewayError::Execution(_) => StatusCode::BAD_GATEWAY,
                GatewayError::Credential(_) | GatewayError::Catalog(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Gateway(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_runtime::DriverError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GatewayError::Authorization("x".into()), StatusCode::NOT_FOUND),
            (GatewayError::Routing("x".into()), StatusCode::CONFLICT),
            (
                GatewayError::Credential("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GatewayError::Catalog("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GatewayError::Execution(DriverError::new("boom")),
                StatusCode::BAD_GATEWAY,
            ),
            (GatewayError::RowNotFound, StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
