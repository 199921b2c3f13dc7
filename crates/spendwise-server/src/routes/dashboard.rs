use axum::{extract::State, Extension, Json};

use crate::error::AppResult;
use crate::models::User;
use crate::routes::AppState;
use crate::services::dashboard::{self, DashboardData};

/// GET /dashboard — read-only aggregation over the caller's own records,
/// recomputed per request.
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<DashboardData>> {
    let data = dashboard::build_dashboard(&state.db, &user.id)?;
    Ok(Json(data))
}
