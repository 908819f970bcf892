//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: pooled storage handle and queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Dataset, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::DeckError;

/// Open (creating if needed) the SQLite database and run the bundled DDL.
pub async fn connect(database_url: &str) -> Result<Storage, DeckError> {
    let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    let storage = Storage::new(pool);
    storage.init_schema().await?;
    Ok(storage)
}
