use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Income, User};
use crate::routes::{parse_record_date, AppState};
use crate::services::spreadsheet::{self, SheetRow};

const INCOME_COLS: &str = "id, user_id, source, amount, date, icon, created_at, updated_at";

fn row_to_income(row: &rusqlite::Row) -> rusqlite::Result<Income> {
    Ok(Income {
        id: row.get(0)?,
        user_id: row.get(1)?,
        source: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateIncomeRequest {
    pub source: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub icon: Option<String>,
}

pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<CreateIncomeRequest>,
) -> AppResult<(StatusCode, Json<Income>)> {
    let source = body.source.unwrap_or_default();
    let Some(amount) = body.amount else {
        return Err(AppError::BadRequest("Please fill all fields".to_string()));
    };
    if source.is_empty() {
        return Err(AppError::BadRequest("Please fill all fields".to_string()));
    }
    if !(amount > 0.0) {
        return Err(AppError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }

    let date = parse_record_date(body.date.as_deref())?;
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let conn = state.db.get()?;
    conn.execute(
        "INSERT INTO incomes (id, user_id, source, amount, date, icon, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![id, user.id, source, amount, date, body.icon, now, now],
    )?;

    let income = Income {
        id,
        user_id: user.id,
        source,
        amount,
        date,
        icon: body.icon,
        created_at: now.clone(),
        updated_at: now,
    };

    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Income>>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCOME_COLS} FROM incomes WHERE user_id = ?1 ORDER BY date DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user.id], row_to_income)?;
    let data: Result<Vec<_>, _> = rows.collect();

    Ok(Json(data?))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    // Owner filter: a record belonging to someone else reads as not found
    let affected = conn.execute(
        "DELETE FROM incomes WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![id, user.id],
    )?;

    if affected == 0 {
        return Err(AppError::NotFound("Income not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Income deleted successfully"
    })))
}

pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCOME_COLS} FROM incomes WHERE user_id = ?1 ORDER BY date DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user.id], row_to_income)?;
    let incomes: Result<Vec<_>, _> = rows.collect();

    let sheet_rows: Vec<SheetRow> = incomes?
        .into_iter()
        .map(|income| SheetRow {
            label: income.source,
            amount: income.amount,
            date: spreadsheet::date_only(&income.date),
        })
        .collect();

    let bytes = spreadsheet::build_workbook("Incomes", "Source", &sheet_rows)?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"incomes.xlsx\"".to_string(),
            ),
        ],
        bytes,
    ))
}
