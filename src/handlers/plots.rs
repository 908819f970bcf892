use axum::Form;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::Dataset;
use crate::error::DeckError;
use crate::pages;
use crate::plot::{self, PlotKind};
use crate::router::DeckState;
use crate::session::{self, SessionUser};
use crate::table::DataTable;

#[derive(Debug, Deserialize)]
pub struct PlotForm {
    pub feature_x: String,
    pub feature_y: String,
    pub plot_type: u8,
}

pub async fn select_features(
    State(state): State<DeckState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<i64>,
    jar: PrivateCookieJar,
) -> Result<Response, DeckError> {
    let Some(dataset) = owned_dataset(&state, user_id, id).await? else {
        return Ok(flash_to(jar, "danger", "Dataset not found.", "/dashboard"));
    };

    let table = match load_table(&dataset) {
        Ok(table) => table,
        Err(msg) => return Ok(flash_to(jar, "danger", &msg, "/dashboard")),
    };

    let feature_options: String = table
        .headers()
        .iter()
        .map(|h| format!("<option value=\"{0}\">{0}</option>", pages::escape(h)))
        .collect();
    let plot_options: String = PlotKind::all()
        .iter()
        .map(|k| format!("<option value=\"{}\">{}</option>", k.code(), k.label()))
        .collect();

    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/select_features.html"),
        &[
            ("flashes", pages::flash_block(&flashes)),
            ("dataset_name", pages::escape(&dataset.name)),
            ("dataset_id", dataset.id.to_string()),
            ("feature_options", feature_options),
            ("plot_options", plot_options),
        ],
    );
    Ok((jar, page).into_response())
}

pub async fn plot_result(
    State(state): State<DeckState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<i64>,
    jar: PrivateCookieJar,
    Form(form): Form<PlotForm>,
) -> Result<Response, DeckError> {
    let Some(dataset) = owned_dataset(&state, user_id, id).await? else {
        return Ok(flash_to(jar, "danger", "Dataset not found.", "/dashboard"));
    };
    let select_page = format!("/select_features/{}", dataset.id);

    let Some(kind) = PlotKind::from_code(form.plot_type) else {
        return Ok(flash_to(jar, "danger", "Invalid plot selection.", &select_page));
    };

    let table = match load_table(&dataset) {
        Ok(table) => table,
        Err(msg) => return Ok(flash_to(jar, "danger", &msg, "/dashboard")),
    };

    if table.column_index(&form.feature_x).is_none()
        || table.column_index(&form.feature_y).is_none()
    {
        return Ok(flash_to(
            jar,
            "danger",
            "Please choose two columns present in the dataset.",
            &select_page,
        ));
    }

    match plot::render_plot(
        &table,
        &form.feature_x,
        &form.feature_y,
        kind,
        std::path::Path::new(&dataset.file_path),
        &state.results_dir,
    ) {
        Ok(file) => {
            info!(
                user_id,
                dataset_id = dataset.id,
                x = %form.feature_x,
                y = %form.feature_y,
                code = kind.code(),
                file = %file,
                "plot rendered"
            );
            let jar = session::remember_plot(jar, &file);
            Ok((jar, Redirect::to("/result")).into_response())
        }
        Err(DeckError::Table(msg)) => Ok(flash_to(jar, "danger", &msg, &select_page)),
        Err(e) => Err(e),
    }
}

pub async fn result_page(_user: SessionUser, jar: PrivateCookieJar) -> Response {
    match session::last_plot(&jar) {
        Some(file) => {
            let (jar, flashes) = session::take_flash(jar);
            let page = pages::render(
                include_str!("../static/result.html"),
                &[
                    ("flashes", pages::flash_block(&flashes)),
                    ("file", pages::escape(&file)),
                ],
            );
            (jar, page).into_response()
        }
        None => flash_to(jar, "danger", "No plot to show.", "/dashboard"),
    }
}

async fn owned_dataset(
    state: &DeckState,
    user_id: i64,
    id: i64,
) -> Result<Option<Dataset>, DeckError> {
    Ok(state
        .storage
        .dataset_by_id(id)
        .await?
        .filter(|d| d.user_id == user_id))
}

/// Read the stored CSV; user-facing failures come back as a flash message.
fn load_table(dataset: &Dataset) -> Result<DataTable, String> {
    match DataTable::load_csv(std::path::Path::new(&dataset.file_path)) {
        Ok(table) => Ok(table),
        Err(DeckError::Table(msg)) => Err(msg),
        Err(e) => {
            warn!(dataset_id = dataset.id, error = %e, "stored dataset file unreadable");
            Err("Dataset file could not be read.".to_string())
        }
    }
}

fn flash_to(jar: PrivateCookieJar, category: &str, message: &str, target: &str) -> Response {
    let jar = session::push_flash(jar, category, message);
    (jar, Redirect::to(target)).into_response()
}
