use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{NewScene, Production, Scene, SceneId},
    error::{ApiError, ErrorCode},
    protocol::{MoveSceneRequest, ReorderAck, ReorderSceneRequest, UpdateSceneRequest},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

mod api;
mod app_state;
mod book;
mod config;

use api::ApiContext;
use app_state::AppState;
use book::SceneBook;
use config::{load_seed, load_settings};

const MAX_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let seed = load_seed(settings.seed_path.as_deref())?;
    let state = AppState {
        api: ApiContext {
            book: SceneBook::new(seed),
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "scene server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/productions", get(http_list_productions))
        .route("/scenes", get(http_list_scenes).post(http_create_scene))
        .route(
            "/scenes/:scene_id",
            post(http_update_scene).patch(http_move_scene),
        )
        .route("/scenes/:scene_id/reorder", post(http_reorder_scene))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    if status.is_server_error() {
        warn!(code = ?err.code, message = %err.message, "scene api request failed");
    }
    (status, Json(err))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_productions(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Production>> {
    api::list_productions(&state.api).await.map(Json).map_err(reject)
}

async fn http_list_scenes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Scene>> {
    api::list_scenes(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_scene(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewScene>,
) -> Result<(StatusCode, Json<Scene>), (StatusCode, Json<ApiError>)> {
    let scene = api::create_scene(&state.api, req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(scene)))
}

async fn http_move_scene(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<String>,
    Json(req): Json<MoveSceneRequest>,
) -> ApiResult<Scene> {
    api::move_scene(&state.api, &SceneId::from(scene_id), req)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_update_scene(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<String>,
    Json(req): Json<UpdateSceneRequest>,
) -> ApiResult<Scene> {
    api::update_scene(&state.api, &SceneId::from(scene_id), req)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_reorder_scene(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<String>,
    Json(req): Json<ReorderSceneRequest>,
) -> ApiResult<ReorderAck> {
    api::reorder_scene(&state.api, &SceneId::from(scene_id), req)
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
