use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ChartQuery, ChartResponse, CreateModuleRequest, CreateSessionRequest},
    error::StudyError,
    repo_types::{Module, StudySession},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    dashboard::{render, ChartProps},
    state::AppState,
};

const SVG_WIDTH: u32 = 720;
const SVG_HEIGHT: u32 = 360;

pub fn study_routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules).post(create_module))
        .route("/sessions", post(create_session))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/chart", get(get_chart))
        .route("/dashboard/chart.svg", get(get_chart_svg))
}

#[instrument(skip(state))]
pub async fn list_modules(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Module>>, StudyError> {
    Ok(Json(state.study.list_modules(user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_module(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateModuleRequest>,
) -> Result<(StatusCode, Json<Module>), StudyError> {
    let module = services::create_module(state.study.as_ref(), user_id, body).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

#[instrument(skip(state, body))]
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<StudySession>), StudyError> {
    let session = services::create_session(state.study.as_ref(), user_id, body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state))]
pub async fn get_chart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ChartQuery>,
) -> Result<Json<ChartResponse>, StudyError> {
    let (_, chart) = services::chart(state.study.as_ref(), user_id, &q).await?;
    Ok(Json(chart))
}

#[instrument(skip(state))]
pub async fn get_chart_svg(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ChartQuery>,
) -> Result<impl IntoResponse, StudyError> {
    let (range, chart) = services::chart(state.study.as_ref(), user_id, &q).await?;
    let view = render(&ChartProps {
        chart_data: &chart.chart_data,
        chart_config: &chart.chart_config,
        modules: &chart.modules,
        range: &range,
    });
    Ok((
        [(CONTENT_TYPE, "image/svg+xml")],
        view.to_svg(SVG_WIDTH, SVG_HEIGHT),
    ))
}
