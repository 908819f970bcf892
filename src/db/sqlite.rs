use sqlx::{Pool, Sqlite};

use crate::db::models::{Dataset, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::DeckError;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), DeckError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a new user. Uniqueness of username/email is enforced by the
    /// schema; violations surface as `DeckError::Database`.
    pub async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, DeckError> {
        let res = sqlx::query("INSERT INTO user (username, email, password) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(password)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, DeckError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password FROM user WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, DeckError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password FROM user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn insert_dataset(
        &self,
        name: &str,
        file_path: &str,
        user_id: i64,
    ) -> Result<i64, DeckError> {
        let res = sqlx::query("INSERT INTO dataset (name, file_path, user_id) VALUES (?, ?, ?)")
            .bind(name)
            .bind(file_path)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn dataset_by_id(&self, id: i64) -> Result<Option<Dataset>, DeckError> {
        let dataset = sqlx::query_as::<_, Dataset>(
            "SELECT id, name, file_path, user_id FROM dataset WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dataset)
    }

    pub async fn datasets_by_user(&self, user_id: i64) -> Result<Vec<Dataset>, DeckError> {
        let datasets = sqlx::query_as::<_, Dataset>(
            "SELECT id, name, file_path, user_id FROM dataset WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(datasets)
    }
}
