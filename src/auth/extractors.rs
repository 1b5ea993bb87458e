use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::TokenKind, cookies::read_cookie, error::AuthError};
use crate::state::AppState;

/// Authenticated caller, resolved from the `access_token` cookie or a Bearer header.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, TokenKind::Access.cookie_name())
            .or_else(|| bearer_token(parts))
            .ok_or(AuthError::AccessDenied)?;

        let claims = state
            .auth
            .tokens()
            .verify_kind(&token, TokenKind::Access)
            .map_err(|e| {
                warn!(error = %e, "invalid or expired access token");
                AuthError::AccessDenied
            })?;

        Ok(AuthUser(claims.sub))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}
