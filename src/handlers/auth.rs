use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::info;

use crate::error::DeckError;
use crate::pages;
use crate::router::DeckState;
use crate::session;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn home(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/home.html"),
        &[("flashes", pages::flash_block(&flashes))],
    );
    (jar, page)
}

pub async fn register_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/register.html"),
        &[("flashes", pages::flash_block(&flashes))],
    );
    (jar, page)
}

/// Create the account and send the browser to the dashboard. Registration
/// does not sign the user in; the session gate forwards to `/login` with
/// the success flash intact.
pub async fn register(
    State(state): State<DeckState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, DeckError> {
    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        let jar = session::push_flash(jar, "danger", "All fields are required.");
        return Ok((jar, Redirect::to("/register")).into_response());
    }

    match state.storage.insert_user(username, email, &form.password).await {
        Ok(id) => {
            info!(user_id = id, "account created");
            let jar = session::push_flash(jar, "success", "Account created!");
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(DeckError::Database(sqlx::Error::Database(db))) if db.is_unique_violation() => {
            let jar = session::push_flash(jar, "danger", "Username or email is already taken.");
            Ok((jar, Redirect::to("/register")).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn login_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flash(jar);
    let page = pages::render(
        include_str!("../static/login.html"),
        &[("flashes", pages::flash_block(&flashes))],
    );
    (jar, page)
}

pub async fn login(
    State(state): State<DeckState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, DeckError> {
    let user = state.storage.user_by_email(form.email.trim()).await?;
    let authorized = user
        .as_ref()
        .map(|u| bool::from(u.password.as_bytes().ct_eq(form.password.as_bytes())))
        .unwrap_or(false);

    if let (true, Some(user)) = (authorized, user) {
        info!(user_id = user.id, "login");
        let jar = session::sign_in(jar, user.id);
        Ok((jar, Redirect::to("/dashboard")).into_response())
    } else {
        let jar = session::push_flash(
            jar,
            "danger",
            "Login unsuccessful. Please check email and password.",
        );
        Ok((jar, Redirect::to("/login")).into_response())
    }
}

pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (session::sign_out(jar), Redirect::to("/login"))
}
