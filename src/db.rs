use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::auth::hash_password;
use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
    password_hash TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
";

pub const DEFAULT_PASSWORD: &str = "password123";

// (username, display name, role)
const DEFAULT_USERS: &[(&str, &str, &str)] = &[
    ("admin", "SR Admin", "admin"),
    ("staff", "SR Staff", "staff"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM users", [], |row| row.get(0))?;
    if count == 0 {
        for (username, name, role) in DEFAULT_USERS {
            conn.execute(
                "INSERT INTO users (id, username, name, role, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    uuid::Uuid::new_v4().to_string(),
                    username,
                    name,
                    role,
                    hash_password(DEFAULT_PASSWORD),
                ],
            )?;
        }
    }
    Ok(())
}

/// Open the database under `data_dir`, creating tables on first use.
pub fn open_data_dir(data_dir: &Path) -> Result<Connection> {
    std::fs::create_dir_all(data_dir)?;
    let conn = get_connection(&crate::settings::db_path(data_dir))?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn get_kv(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?)
}

pub fn set_kv(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, value],
    )?;
    Ok(())
}
