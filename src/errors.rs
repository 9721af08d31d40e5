// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Błąd SQLx: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Nie znaleziono zasobu")]
    NotFound,

    #[error("Błędy walidacji")]
    ValidationError(#[from] ValidationErrors),

    #[error("Nieprawidłowe dane wejściowe: {0}")]
    UnprocessableEntity(String),

    #[error("Email już istnieje: {0}")]
    EmailAlreadyExists(String),

    #[error("Nieprawidłowe dane logowania")]
    InvalidLoginCredentials,

    #[error("Brak wymaganego tokenu: {0}")]
    MissingToken(String),

    #[error("Token wygasł")]
    TokenExpired,

    #[error("Nieprawidłowy token: {0}")]
    InvalidToken(String),

    #[error("Błąd generowania hasła")]
    PasswordHashingError,

    #[error("Nieautoryzowany dostęp: {0}")]
    UnauthorizedAccess(String),

    #[error("Wewnętrzny błąd serwera")]
    InternalServerError(String),

    #[error("Niepoprawne żądanie")]
    BadRequest(String),

    #[error("Wystąpił konflikt")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::SqlxError(sqlx_error) => {
                // Szczegóły błędu bazy tylko w logach, nigdy w odpowiedzi.
                if let Some(db_err) = sqlx_error.as_database_error() {
                    if db_err.code().as_deref() == Some("23505") {
                        tracing::warn!("Naruszenie unikalności: {:?}", db_err);
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({
                                "success": false,
                                "message": "Taki rekord już istnieje"
                            })),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Błąd SQLx: {:?}", sqlx_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Wystąpił wewnętrzny błąd serwera (baza danych)".to_string(),
                )
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Nie znaleziono zasobu".to_string()),
            AppError::ValidationError(errors) => {
                let mut messages = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let msg = error.message.as_ref().map_or_else(
                            || format!("Pole '{}' jest nieprawidłowe", field),
                            |m| format!("Pole '{}': {}", field, m),
                        );
                        messages.push(msg);
                    }
                }
                (StatusCode::UNPROCESSABLE_ENTITY, messages.join("; "))
            }
            AppError::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::EmailAlreadyExists(message) => (StatusCode::CONFLICT, message),
            AppError::InvalidLoginCredentials => (
                StatusCode::UNAUTHORIZED,
                "Nieprawidłowy email lub hasło".to_string(),
            ),
            AppError::MissingToken(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token wygasł".to_string()),
            AppError::InvalidToken(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::PasswordHashingError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Błąd podczas przetwarzania hasła".to_string(),
            ),
            AppError::UnauthorizedAccess(message) => (StatusCode::FORBIDDEN, message),
            AppError::InternalServerError(message) => {
                tracing::error!("Wewnętrzny błąd serwera: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Wystąpił wewnętrzny błąd serwera".to_string(),
                )
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
        };

        // Jednolity kształt odpowiedzi dla wszystkich błędów mutacji.
        let body = Json(json!({ "success": false, "message": error_message }));
        (status, body).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken("Token JWT jest nieprawidłowy lub uszkodzony".to_string()),
        }
    }
}
