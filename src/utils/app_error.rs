use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

/// Error returned to the HTTP caller. Every rejected operation maps to one
/// of four classes : validation (400), not found (404), unauthenticated
/// (401) and unexpected (500, no body).
#[derive(Debug)]
pub struct AppError {
    pub status_code: StatusCode,
    pub message: Option<String>,
}

impl AppError {
    pub fn new(status_code: StatusCode, message: Option<impl Into<String>>) -> Self {
        Self {
            status_code,
            message: message.map(Into::into),
        }
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None::<String>)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(message))
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(message))
    }

    pub fn you_have_to_be_connected_to_perform_this_action_error() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            Some("Vous devez être connecté pour effectuer cette action."),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (self.status_code, message).into_response(),
            None => self.status_code.into_response(),
        }
    }
}
