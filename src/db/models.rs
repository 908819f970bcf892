use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Stored as entered at registration; compared verbatim on login.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub file_path: String,
    pub user_id: i64,
}
