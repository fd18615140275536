use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::customer::errors::CustomerError;
use tracing::{error, warn};

/// JSON error body: `{"error": <title>, "message": <detail>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "request failed");
        } else {
            warn!(status = %self.status, detail = ?self.detail, "request rejected");
        }
        let body = serde_json::json!({ "error": self.title, "message": self.detail });
        (self.status, Json(body)).into_response()
    }
}

impl From<CustomerError> for JsonApiError {
    fn from(e: CustomerError) -> Self {
        let (status, title) = match &e {
            CustomerError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            CustomerError::InvalidId(_) => (StatusCode::BAD_REQUEST, "Invalid Id"),
            CustomerError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email Already Exists"),
            CustomerError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            CustomerError::InvalidToken => (StatusCode::NOT_FOUND, "Invalid Token"),
            CustomerError::Timeout(_) | CustomerError::HashError(_) | CustomerError::Repository(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid Body", Some(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        let cases = [
            (CustomerError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CustomerError::InvalidId("x".into()), StatusCode::BAD_REQUEST),
            (CustomerError::EmailAlreadyExists, StatusCode::CONFLICT),
            (CustomerError::NotFound, StatusCode::NOT_FOUND),
            (CustomerError::InvalidToken, StatusCode::NOT_FOUND),
            (CustomerError::Timeout(Duration::from_secs(10)), StatusCode::INTERNAL_SERVER_ERROR),
            (CustomerError::Repository("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_message_is_exposed() {
        let e = JsonApiError::from(CustomerError::Repository("connection refused".into()));
        assert_eq!(e.detail.as_deref(), Some("repository error: connection refused"));
    }
}
