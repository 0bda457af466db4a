//! Mapping from registry errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fabula::{GameError, RegistryError};
use serde::{Deserialize, Serialize};

/// JSON body of every failed request
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable code, e.g. `validation.wrong_phase`
    pub code: String,
}

/// A failed room operation, ready to be returned from a handler.
#[derive(Debug)]
pub struct ApiError(pub RegistryError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RegistryError::Game(GameError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::Game(GameError::NotFound(_)) => StatusCode::NOT_FOUND,
            RegistryError::Game(GameError::State(_)) => StatusCode::CONFLICT,
            RegistryError::RoomClosed(_) | RegistryError::Store(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RegistryError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> String {
        error_code(&self.0)
    }
}

/// Stable code for any registry failure, shared by HTTP and WebSocket replies.
pub fn error_code(err: &RegistryError) -> String {
    match err {
        RegistryError::Game(err) => err.code(),
        RegistryError::RoomClosed(_) => "unavailable.room_closed".to_string(),
        RegistryError::Store(_) => "unavailable.store".to_string(),
        RegistryError::InvalidConfig(_) => "internal.invalid_config".to_string(),
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Room operation failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
