// src/middleware.rs
use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use std::sync::Arc;

use crate::{auth::verify_jwt, auth_models::TokenClaims, errors::AppError, state::AppState};

impl FromRequestParts<Arc<AppState>> for TokenClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Wyciągnij TypedHeader<Authorization<Bearer>>
        // To automatycznie sprawdzi, czy nagłówek istnieje i czy jest poprawnym Bearer tokenem.
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                tracing::warn!("Nie udało się wyciągnąć tokenu Bearer: {:?}", e);
                AppError::MissingToken("Brak lub niepoprawny nagłówek Authorization".into())
            })?;

        let token = bearer.token();

        let claims = verify_jwt(token, &state.jwt_secret).map_err(|e| {
            tracing::warn!("Nieprawidłowy token: {:?}", e);
            AppError::InvalidToken("Token jest nieprawidłowy lub wygasł".into())
        })?;

        Ok(claims.claims)
    }
}

/// Wymaga roli administratora. Zwraca 403 dla zwykłego klienta.
pub fn require_admin(claims: &TokenClaims) -> Result<(), AppError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::UnauthorizedAccess(
            "Wymagane uprawnienia administratora".to_string(),
        ))
    }
}
