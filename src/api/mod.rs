use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::core::{ContributionSolveConfig, FireProfile, simulate, solve_required_contribution};
use crate::store::{ProfileId, ProfileStore};

mod error;
mod validate;

pub use error::ApiError;
pub use validate::{ValidationError, validate_profile};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ProfileStore>,
    start_year: Option<i32>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            start_year: None,
        }
    }

    /// Pins the calendar year of row 0 instead of reading the clock.
    pub fn with_start_year(mut self, start_year: Option<i32>) -> Self {
        self.start_year = start_year;
        self
    }

    fn projection_start_year(&self) -> i32 {
        self.start_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolvePayload {
    #[serde(flatten)]
    profile: FireProfile,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/fire/profiles",
            get(list_profiles_handler).post(create_profile_handler),
        )
        .route(
            "/api/fire/profiles/:id",
            get(get_profile_handler).put(update_profile_handler),
        )
        .route("/api/fire/projection/simulate", post(simulate_handler))
        .route("/api/fire/projection/solve", post(solve_handler))
        .route(
            "/api/fire/projection/:profile_id",
            get(stored_projection_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.bind, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE projection API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FIRE projection API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn list_profiles_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.store.list().await)
}

async fn get_profile_handler(
    State(state): State<AppState>,
    id: Result<Path<ProfileId>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let stored = state.store.get(id).await?;
    Ok(json_response(StatusCode::OK, stored))
}

async fn create_profile_handler(
    State(state): State<AppState>,
    profile: Result<Json<FireProfile>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(profile) = profile?;
    validate_profile(&profile)?;
    let stored = state.store.create(profile).await;
    Ok(json_response(StatusCode::CREATED, stored))
}

async fn update_profile_handler(
    State(state): State<AppState>,
    id: Result<Path<ProfileId>, PathRejection>,
    profile: Result<Json<FireProfile>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let Json(profile) = profile?;
    validate_profile(&profile)?;
    let stored = state.store.update(id, profile).await?;
    Ok(json_response(StatusCode::OK, stored))
}

async fn simulate_handler(
    State(state): State<AppState>,
    profile: Result<Json<FireProfile>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(profile) = profile?;
    validate_profile(&profile)?;
    Ok(projection_response(&state, &profile))
}

async fn stored_projection_handler(
    State(state): State<AppState>,
    profile_id: Result<Path<ProfileId>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(profile_id) = profile_id?;
    let stored = state.store.get(profile_id).await?;
    debug!(profile_id, "projecting stored profile");
    Ok(projection_response(&state, &stored.profile))
}

async fn solve_handler(
    State(state): State<AppState>,
    payload: Result<Json<SolvePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_profile(&payload.profile)?;
    let target_age = payload
        .profile
        .target_retirement_age
        .ok_or(ApiError::MissingTargetAge)?;

    let mut config = ContributionSolveConfig::for_target_age(target_age);
    if let Some(v) = payload.search_min {
        config.search_min = v;
    }
    if let Some(v) = payload.search_max {
        config.search_max = v;
    }
    if let Some(v) = payload.tolerance {
        config.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        config.max_iterations = v;
    }

    let result =
        solve_required_contribution(&payload.profile, config, state.projection_start_year())?;
    debug!(
        target_age,
        feasible = result.feasible,
        solved = ?result.solved_monthly_contribution,
        "solved required contribution"
    );
    Ok(json_response(StatusCode::OK, result))
}

fn projection_response(state: &AppState, profile: &FireProfile) -> Response {
    let projection = simulate(profile, state.projection_start_year());
    debug!(
        current_age = profile.current_age,
        fire_age = ?projection.fire_age,
        years = projection.yearly_projections.len(),
        "simulated projection"
    );
    json_response(StatusCode::OK, projection)
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
