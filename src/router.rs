use std::path::PathBuf;

use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum_extra::extract::cookie::Key;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::db::Storage;
use crate::handlers::{auth, datasets, plots};

/// Uploaded CSVs can be a lot bigger than the axum default body limit.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct DeckState {
    pub storage: Storage,
    pub upload_dir: PathBuf,
    pub results_dir: PathBuf,
    key: Key,
}

impl DeckState {
    pub fn new(storage: Storage, cfg: &Config, key: Key) -> Self {
        Self {
            storage,
            upload_dir: cfg.upload_dir.clone(),
            results_dir: cfg.results_dir.clone(),
            key,
        }
    }
}

impl FromRef<DeckState> for Key {
    fn from_ref(state: &DeckState) -> Key {
        state.key.clone()
    }
}

pub fn deck_router(state: DeckState) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(datasets::dashboard))
        .route("/upload", get(datasets::upload_page).post(datasets::upload))
        .route("/visualize", get(datasets::visualize))
        .route("/select_features/{id}", get(plots::select_features))
        .route("/plot_result/{id}", post(plots::plot_result))
        .route("/result", get(plots::result_page))
        .nest_service("/plots", ServeDir::new(&state.results_dir))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}
