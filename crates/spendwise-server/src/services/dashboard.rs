use chrono::{Duration, Utc};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{Expense, Income};

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub last_60_days_income: WindowTotals<Income>,
    pub last_30_days_expenses: WindowTotals<Expense>,
    pub recent_transactions: Vec<RecentTransaction>,
}

#[derive(Debug, Serialize)]
pub struct WindowTotals<T> {
    pub total: f64,
    pub transactions: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: f64,
    pub date: String,
    pub icon: Option<String>,
}

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

/// Aggregates the caller's records: overall totals, a 60-day income window,
/// a 30-day expense window, and the most recent transactions of each type
/// merged and sorted by date descending. No state is persisted.
pub fn build_dashboard(pool: &DbPool, user_id: &str) -> AppResult<DashboardData> {
    let conn = pool.get()?;

    let total_income: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM incomes WHERE user_id = ?1",
        rusqlite::params![user_id],
        |row| row.get(0),
    )?;
    let total_expense: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE user_id = ?1",
        rusqlite::params![user_id],
        |row| row.get(0),
    )?;

    // Stored timestamps are fixed-width ISO strings, so lexicographic
    // comparison matches chronological order.
    let income_cutoff = (Utc::now() - Duration::days(60))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
    let expense_cutoff = (Utc::now() - Duration::days(30))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let mut stmt = conn.prepare(
        "SELECT id, user_id, source, amount, date, icon, created_at, updated_at
         FROM incomes WHERE user_id = ?1 AND date >= ?2 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, income_cutoff], row_to_income)?;
    let window_incomes: Vec<Income> = rows.collect::<Result<_, _>>()?;
    let window_income_total = window_incomes.iter().map(|i| i.amount).sum();

    let mut stmt = conn.prepare(
        "SELECT id, user_id, category, amount, date, icon, created_at, updated_at
         FROM expenses WHERE user_id = ?1 AND date >= ?2 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, expense_cutoff], row_to_expense)?;
    let window_expenses: Vec<Expense> = rows.collect::<Result<_, _>>()?;
    let window_expense_total = window_expenses.iter().map(|e| e.amount).sum();

    let mut stmt = conn.prepare(
        "SELECT id, user_id, source, amount, date, icon, created_at, updated_at
         FROM incomes WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, RECENT_LIMIT], row_to_income)?;
    let recent_incomes: Vec<Income> = rows.collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, user_id, category, amount, date, icon, created_at, updated_at
         FROM expenses WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, RECENT_LIMIT], row_to_expense)?;
    let recent_expenses: Vec<Expense> = rows.collect::<Result<_, _>>()?;

    let mut recent_transactions: Vec<RecentTransaction> = recent_incomes
        .into_iter()
        .map(|income| RecentTransaction {
            id: income.id,
            tx_type: "income",
            source: Some(income.source),
            category: None,
            amount: income.amount,
            date: income.date,
            icon: income.icon,
        })
        .chain(recent_expenses.into_iter().map(|expense| RecentTransaction {
            id: expense.id,
            tx_type: "expense",
            source: None,
            category: Some(expense.category),
            amount: expense.amount,
            date: expense.date,
            icon: expense.icon,
        }))
        .collect();
    recent_transactions.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(DashboardData {
        total_balance: total_income - total_expense,
        total_income,
        total_expense,
        last_60_days_income: WindowTotals {
            total: window_income_total,
            transactions: window_incomes,
        },
        last_30_days_expenses: WindowTotals {
            total: window_expense_total,
            transactions: window_expenses,
        },
        recent_transactions,
    })
}
