use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::info;

use crate::db::Dataset;
use crate::error::DeckError;
use crate::pages;
use crate::router::DeckState;
use crate::session::{self, SessionUser};

pub async fn dashboard(
    State(state): State<DeckState>,
    SessionUser(user_id): SessionUser,
    jar: PrivateCookieJar,
) -> Result<Response, DeckError> {
    let Some(user) = state.storage.user_by_id(user_id).await? else {
        // stale session cookie pointing at a row that no longer exists
        let jar = session::sign_out(jar);
        return Ok((jar, Redirect::to("/login")).into_response());
    };
    let datasets = state.storage.datasets_by_user(user_id).await?;
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/dashboard.html"),
        &[
            ("flashes", pages::flash_block(&flashes)),
            ("username", pages::escape(&user.username)),
            ("dataset_table", dataset_table(&datasets)),
        ],
    );
    Ok((jar, page).into_response())
}

pub async fn upload_page(_user: SessionUser, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/upload.html"),
        &[("flashes", pages::flash_block(&flashes))],
    );
    (jar, page)
}

/// Multipart form with a display name and the CSV file. The file lands in
/// the upload directory under its sanitized client name; an upload with the
/// same name overwrites the previous one.
pub async fn upload(
    State(state): State<DeckState>,
    SessionUser(user_id): SessionUser,
    jar: PrivateCookieJar,
    mut multipart: Multipart,
) -> Result<Response, DeckError> {
    let mut name = String::new();
    let mut client_file = None;
    let mut data = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = field.text().await?,
            "file" => {
                client_file = field.file_name().map(|s| s.to_string());
                data = field.bytes().await?.to_vec();
            }
            _ => {}
        }
    }

    let name = name.trim().to_string();
    let file_name = client_file.as_deref().map(sanitize_filename).unwrap_or_default();
    if name.is_empty() || file_name.is_empty() || data.is_empty() {
        let jar = session::push_flash(
            jar,
            "danger",
            "A dataset name and a non-empty file are required.",
        );
        return Ok((jar, Redirect::to("/upload")).into_response());
    }

    let dest = state.upload_dir.join(&file_name);
    std::fs::write(&dest, &data)?;

    let file_path = dest.to_string_lossy().into_owned();
    let id = state.storage.insert_dataset(&name, &file_path, user_id).await?;
    info!(user_id, dataset_id = id, file = %file_name, bytes = data.len(), "dataset uploaded");

    let jar = session::push_flash(jar, "success", "Dataset uploaded successfully!");
    Ok((jar, Redirect::to("/dashboard")).into_response())
}

pub async fn visualize(
    State(state): State<DeckState>,
    SessionUser(user_id): SessionUser,
    jar: PrivateCookieJar,
) -> Result<Response, DeckError> {
    let datasets = state.storage.datasets_by_user(user_id).await?;
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/visualize.html"),
        &[
            ("flashes", pages::flash_block(&flashes)),
            ("dataset_table", dataset_table(&datasets)),
        ],
    );
    Ok((jar, page).into_response())
}

fn dataset_table(datasets: &[Dataset]) -> String {
    if datasets.is_empty() {
        return r#"<p>No datasets yet. <a href="/upload">Upload one.</a></p>"#.to_string();
    }
    let mut out = String::from("<table>\n<tr><th>Name</th><th></th></tr>\n");
    for ds in datasets {
        out.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"/select_features/{}\">visualize</a></td></tr>\n",
            pages::escape(&ds.name),
            ds.id
        ));
    }
    out.push_str("</table>");
    out
}

/// Drop any path components from the client-supplied filename, fold
/// whitespace to underscores, and restrict the alphabet. A name that
/// sanitizes to nothing (or to dots only) is rejected by the caller.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        String::new()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\temp\data.csv"), "data.csv");
    }

    #[test]
    fn folds_whitespace_and_drops_odd_characters() {
        assert_eq!(sanitize_filename("my data (1).csv"), "my_data_1.csv");
    }

    #[test]
    fn dot_only_names_are_rejected() {
        assert_eq!(sanitize_filename("..."), "");
        assert_eq!(sanitize_filename(""), "");
    }
}
