use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::TokenKind,
        cookies::{read_cookie, ResponseCookies},
        dto::{LoginRequest, PublicUser, SignupRequest},
        error::AuthError,
        extractors::AuthUser,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, HeaderMap), AuthError> {
    let mut cookies = ResponseCookies::new();
    state.auth.login(payload, &mut cookies).await?;
    Ok((StatusCode::OK, cookies.into_headers()))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = state.auth.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap), AuthError> {
    let token = read_cookie(&headers, TokenKind::Refresh.cookie_name());
    let mut cookies = ResponseCookies::new();
    state.auth.refresh(token.as_deref(), &mut cookies).await?;
    Ok((StatusCode::OK, cookies.into_headers()))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (StatusCode, HeaderMap) {
    let mut cookies = ResponseCookies::new();
    state.auth.logout(&mut cookies);
    (StatusCode::NO_CONTENT, cookies.into_headers())
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(state.auth.me(user_id).await?))
}
