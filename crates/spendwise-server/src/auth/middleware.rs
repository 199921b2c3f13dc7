use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::User;
use crate::routes::AppState;

/// Bearer-token gate for protected routes. Verifies the token, resolves the
/// embedded user id and attaches the user record to the request. Failure is
/// terminal for the request; the downstream handler never runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let user_id = state.tokens.verify(&token)?;

    let conn = state.db.get()?;
    let user = conn
        .query_row(
            "SELECT id, full_name, email, password_hash, profile_image_url, created_at, updated_at
             FROM users WHERE id = ?1",
            rusqlite::params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    email: row.get(2)?,
                    password_hash: row.get(3)?,
                    profile_image_url: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::Unauthorized("Not authorized, token failed".to_string())
            }
            e => AppError::Database(e),
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
