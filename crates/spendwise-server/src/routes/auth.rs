use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password;
use crate::error::{AppError, AppResult};
use crate::models::{User, UserPublic};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: String,
    pub user: UserPublic,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let full_name = body.full_name.unwrap_or_default();
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    if full_name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Please fill all fields".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let password_hash = password::hash_password(&password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let conn = state.db.get()?;
    let result = conn.execute(
        "INSERT INTO users (id, full_name, email, password_hash, profile_image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user_id,
            full_name,
            email,
            password_hash,
            body.profile_image_url,
            now,
            now
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    let token = state.tokens.issue(&user_id)?;
    let user = UserPublic {
        id: user_id.clone(),
        full_name,
        email,
        profile_image_url: body.profile_image_url,
        created_at: now.clone(),
        updated_at: now,
    };

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user_id,
            user,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Please fill all fields".to_string()));
    }

    let conn = state.db.get()?;
    let user_result = conn.query_row(
        "SELECT id, full_name, email, password_hash, profile_image_url, created_at, updated_at
         FROM users WHERE email = ?1",
        rusqlite::params![email],
        row_to_user,
    );

    // Unknown email and wrong password answer identically so a caller cannot
    // probe which emails are registered.
    let user = match user_result {
        Ok(u) => u,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    if !password::verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = state.tokens.issue(&user.id)?;

    Ok(Json(AuthResponse {
        id: user.id.clone(),
        user: user.into(),
        token,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<UserPublic>> {
    let conn = state.db.get()?;
    let user = conn
        .query_row(
            "SELECT id, full_name, email, password_hash, profile_image_url, created_at, updated_at
             FROM users WHERE id = ?1",
            rusqlite::params![user.id],
            row_to_user,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("User not found".to_string()),
            e => AppError::Database(e),
        })?;

    Ok(Json(user.into()))
}

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let mut saved: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        // A field with no filename carries no file
        let Some(file_name) = field
            .file_name()
            .map(str::to_owned)
            .filter(|name| !name.is_empty())
        else {
            break;
        };
        let ext = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !matches!(ext.as_str(), "png" | "jpg" | "jpeg") {
            return Err(AppError::BadRequest(
                "Only .jpeg, .jpg and .png formats are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        tokio::fs::create_dir_all(&state.config.uploads_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create uploads dir: {e}")))?;

        let name = format!("{}.{ext}", Uuid::new_v4());
        let path = Path::new(&state.config.uploads_dir).join(&name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

        saved = Some(name);
        break;
    }

    let name = saved.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let image_url = format!("{}/uploads/{name}", state.config.app_url);

    Ok(Json(serde_json::json!({ "imageUrl": image_url })))
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        profile_image_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
