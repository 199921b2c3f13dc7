use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Expense, User};
use crate::routes::{parse_record_date, AppState};
use crate::services::spreadsheet::{self, SheetRow};

const EXPENSE_COLS: &str = "id, user_id, category, amount, date, icon, created_at, updated_at";

fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub icon: Option<String>,
}

pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    let category = body.category.unwrap_or_default();
    let Some(amount) = body.amount else {
        return Err(AppError::BadRequest("Please fill all fields".to_string()));
    };
    if category.is_empty() {
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
        "INSERT INTO expenses (id, user_id, category, amount, date, icon, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![id, user.id, category, amount, date, body.icon, now, now],
    )?;

    let expense = Expense {
        id,
        user_id: user.id,
        category,
        amount,
        date,
        icon: body.icon,
        created_at: now.clone(),
        updated_at: now,
    };

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Expense>>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLS} FROM expenses WHERE user_id = ?1 ORDER BY date DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user.id], row_to_expense)?;
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
        "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![id, user.id],
    )?;

    if affected == 0 {
        return Err(AppError::NotFound("Expense not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Expense deleted successfully"
    })))
}

pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLS} FROM expenses WHERE user_id = ?1 ORDER BY date DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user.id], row_to_expense)?;
    let expenses: Result<Vec<_>, _> = rows.collect();

    let sheet_rows: Vec<SheetRow> = expenses?
        .into_iter()
        .map(|expense| SheetRow {
            label: expense.category,
            amount: expense.amount,
            date: spreadsheet::date_only(&expense.date),
        })
        .collect();

    let bytes = spreadsheet::build_workbook("Expenses", "Category", &sheet_rows)?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.xlsx\"".to_string(),
            ),
        ],
        bytes,
    ))
}
