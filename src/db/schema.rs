//! SQL DDL for initializing the application tables.

/// SQLite schema:
/// - `user`: one row per registered account; `username` and `email` UNIQUE
/// - `dataset`: one row per uploaded file, FK to the owning user
/// - `status`-free by design; rows are never updated or deleted
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dataset (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES user(id)
);

CREATE INDEX IF NOT EXISTS idx_dataset_user_id ON dataset(user_id);
"#;
