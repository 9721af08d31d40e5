// src/extractor.rs

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    extract::cookie::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::{auth::verify_jwt, auth_models::TokenClaims, state::AppState};

/// Nazwa ciasteczka z identyfikatorem koszyka sesji (gościa).
pub const SESSION_CART_COOKIE: &str = "session_cart_id";

/// Ekstraktor, który zawiera `Some(TokenClaims)`, jeśli token jest obecny
/// i poprawny, lub `None` w każdym innym przypadku. Nigdy nie odrzuca żądania.
pub struct OptionalTokenClaims(pub Option<TokenClaims>);

impl<S> FromRequestParts<S> for OptionalTokenClaims
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let typed_header_result = parts.extract::<TypedHeader<Authorization<Bearer>>>().await;

        let token = match typed_header_result {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_owned(),
            Err(_) => return Ok(OptionalTokenClaims(None)),
        };

        let app_state = Arc::<AppState>::from_ref(state);

        match verify_jwt(&token, &app_state.jwt_secret) {
            Ok(token_data) => Ok(OptionalTokenClaims(Some(token_data.claims))),
            Err(_) => Ok(OptionalTokenClaims(None)),
        }
    }
}

/// Nagłówek `X-Session-Cart-Id` dla klientów, którzy nie przesyłają ciasteczek
/// (np. aplikacje mobilne).
#[derive(Debug, Clone)]
pub struct XSessionCartId(pub Uuid);

impl axum_extra::headers::Header for XSessionCartId {
    fn name() -> &'static axum::http::HeaderName {
        static NAME: once_cell::sync::Lazy<axum::http::HeaderName> =
            once_cell::sync::Lazy::new(|| axum::http::HeaderName::from_static("x-session-cart-id"));
        &NAME
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, axum_extra::headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values
            .next()
            .ok_or_else(axum_extra::headers::Error::invalid)?;
        let uuid = Uuid::parse_str(
            value
                .to_str()
                .map_err(|_| axum_extra::headers::Error::invalid())?,
        )
        .map_err(|_| axum_extra::headers::Error::invalid())?;
        Ok(XSessionCartId(uuid))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = axum::http::HeaderValue::from_str(&self.0.to_string()) {
            values.extend(std::iter::once(value));
        }
    }
}

/// Tożsamość koszyka sesji: najpierw ciasteczko, potem nagłówek X-Session-Cart-Id.
/// `None` oznacza, że klient nie zainicjował jeszcze sesji koszyka.
pub struct SessionCartId(pub Option<Uuid>);

impl<S> FromRequestParts<S> for SessionCartId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = match parts.extract::<CookieJar>().await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        if let Some(cookie) = jar.get(SESSION_CART_COOKIE) {
            if let Ok(id) = Uuid::parse_str(cookie.value()) {
                return Ok(SessionCartId(Some(id)));
            }
        }

        match parts.extract::<TypedHeader<XSessionCartId>>().await {
            Ok(TypedHeader(XSessionCartId(id))) => Ok(SessionCartId(Some(id))),
            Err(_) => Ok(SessionCartId(None)),
        }
    }
}
