mod migrations;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;

use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

// One pooled connection per in-flight request is plenty for this workload;
// WAL keeps concurrent readers off the write lock.
const POOL_SIZE: u32 = 10;

/// Opens the SQLite database named in the config, creating its data
/// directory on first run, and applies the schema.
pub fn create_pool(config: &Config) -> DbPool {
    let db_path = Path::new(&config.sqlite_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .expect("Failed to create database pool");

    let conn = pool
        .get()
        .expect("Failed to get connection for schema setup");
    migrations::run(&conn).expect("Failed to apply schema");

    pool
}
