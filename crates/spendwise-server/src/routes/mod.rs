mod auth;
mod dashboard;
mod expense;
mod income;


use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::auth::middleware::require_auth;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: TokenService,
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/upload-image", post(auth::upload_image));

    let protected = Router::new()
        // Auth
        .route("/getUser", get(auth::get_user))
        // Income
        .route("/income", get(income::list).post(income::add))
        .route("/income/download", get(income::download))
        .route("/income/{id}", delete(income::remove))
        // Expense
        .route("/expense", get(expense::list).post(expense::add))
        .route("/expense/download", get(expense::download))
        .route("/expense/{id}", delete(expense::remove))
        // Dashboard
        .route("/dashboard", get(dashboard::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .with_state(state)
}

/// Normalizes an optional client-supplied record date to the stored
/// timestamp format. Accepts RFC 3339 or a bare YYYY-MM-DD; defaults to now.
pub(crate) fn parse_record_date(input: Option<&str>) -> Result<String, AppError> {
    let Some(raw) = input.filter(|s| !s.is_empty()) else {
        return Ok(chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string());
    };

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string());
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")));
    }

    Err(AppError::BadRequest("Invalid date".to_string()))
}
