//! Server-side response construction.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::envelope::Envelope;

/// A generation-2 response: status plus envelope.
#[derive(Debug, Clone)]
pub struct V2Response<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T> V2Response<T> {
    /// `200 {"data": ...}`
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::data(data),
        }
    }

    /// `<status> {"error": {...}}`
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope: Envelope::error(status.as_u16(), message),
        }
    }

    /// `<status> {"error": {...}, "data": ...}`
    pub fn error_with_data(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            envelope: Envelope::error(status.as_u16(), message).with_data(data),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn envelope(&self) -> &Envelope<T> {
        &self.envelope
    }
}

impl<T: Serialize> IntoResponse for V2Response<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Generation-2 error with no data.
pub fn v2_error(status: StatusCode, message: impl Into<String>) -> Response {
    V2Response::<()>::error(status, message).into_response()
}

/// Generation-1 success: the payload itself.
pub fn v1_ok<T: Serialize>(data: T) -> Response {
    Json(data).into_response()
}

/// Generation-1 failure: `"<code> <reason>"` or `"<code> <reason> - <message>"`.
pub fn v1_error(status: StatusCode, message: &str) -> Response {
    let line = status_line(status);
    let body = if message.is_empty() {
        line
    } else {
        format!("{line} - {message}")
    };
    (status, body).into_response()
}

/// Security and CSRF rejections share this plain-text 403.
pub fn forbidden(message: &str) -> Response {
    v1_error(StatusCode::FORBIDDEN, message)
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_v1_error_text() {
        let response = v1_error(StatusCode::BAD_REQUEST, "rawtx is required");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "400 Bad Request - rawtx is required"
        );

        let response = v1_error(StatusCode::NOT_FOUND, "");
        assert_eq!(body_string(response).await, "404 Not Found");
    }

    #[tokio::test]
    async fn test_v2_error_with_data_response() {
        let response = V2Response::error_with_data(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid",
            json!({"detail": "checksum"}),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["message"], "invalid");
        assert_eq!(body["error"]["code"], 422);
        assert_eq!(body["data"]["detail"], "checksum");
    }
}
