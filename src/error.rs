use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::pages;

#[derive(Debug, ThisError)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("malformed table: {0}")]
    Table(String),

    #[error("plot rendering error: {0}")]
    Plot(String),
}

impl DeckError {
    /// Wrap a plotters backend error, which is not `'static`-friendly enough
    /// to carry by value.
    pub fn plot(e: impl std::fmt::Display) -> Self {
        DeckError::Plot(e.to_string())
    }
}

impl IntoResponse for DeckError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            DeckError::Multipart(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            DeckError::Io(_) | DeckError::Database(_) | DeckError::Plot(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
            DeckError::Table(_) => {
                error!(error = %self, "unhandled table error reached the response layer");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };
        (status, pages::error_page(status, &message)).into_response()
    }
}
