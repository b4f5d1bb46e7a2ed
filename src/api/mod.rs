//! HTTP API - router, shared state and the auth extractor
//!
//! The API layer is a thin collaborator around the workout core: token
//! verification resolves the caller to a user id, request bodies are
//! validated before core logic runs, and handlers hold the database
//! mutex only for the duration of their store work.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::assistant::GeminiClient;
use crate::auth::TokenKeys;
use crate::db::Database;
use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Single-writer connection: holding the lock across a mutation
    /// sequence is what serializes concurrent requests
    pub db: Arc<Mutex<Database>>,
    pub tokens: TokenKeys,
    /// Absent when no API key is configured; the coach endpoint then fails
    pub coach: Option<GeminiClient>,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenKeys, coach: Option<GeminiClient>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tokens,
            coach,
        }
    }
}

/// Authenticated caller, resolved from the bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthUser {
            user_id: claims.user_id,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/api/muscle-groups", get(handlers::list_muscle_groups))
        .route(
            "/api/exercises",
            get(handlers::list_exercises).post(handlers::create_exercise),
        )
        .route(
            "/api/exercises/:id",
            get(handlers::get_exercise).put(handlers::edit_exercise),
        )
        .route(
            "/api/exercises/:id/weight-history",
            get(handlers::weight_history),
        )
        .route(
            "/api/exercises/:id/load-history",
            get(handlers::load_history),
        )
        .route(
            "/api/workouts",
            get(handlers::list_workouts).post(handlers::create_workout),
        )
        .route(
            "/api/workouts/:id",
            get(handlers::get_workout)
                .put(handlers::edit_workout)
                .delete(handlers::delete_workout),
        )
        .route("/api/workouts/:id/reorder", post(handlers::reorder_sets))
        .route("/api/sets", post(handlers::add_set))
        .route(
            "/api/sets/:id",
            put(handlers::edit_set).delete(handlers::delete_set),
        )
        .route("/api/coach", post(handlers::coach_turn))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
