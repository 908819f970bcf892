//! Cookie-backed session state: the signed-in user id, one-shot flash
//! messages, and the most recently rendered plot. Everything rides a
//! `PrivateCookieJar`, so values are encrypted and authenticated.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::router::DeckState;

const SESSION_COOKIE: &str = "deck_session";
const FLASH_COOKIE: &str = "deck_flash";
const LAST_PLOT_COOKIE: &str = "deck_last_plot";

/// One-shot message rendered at the top of the next page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

pub fn sign_in(jar: PrivateCookieJar, user_id: i64) -> PrivateCookieJar {
    jar.add(build_cookie(SESSION_COOKIE, user_id.to_string()))
}

pub fn sign_out(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(SESSION_COOKIE))
        .remove(clear_cookie(LAST_PLOT_COOKIE))
}

pub fn user_id(jar: &PrivateCookieJar) -> Option<i64> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<i64>().ok())
}

/// Append a flash to the pending list; the whole list is serialized into a
/// single cookie and consumed by the next rendered page.
pub fn push_flash(jar: PrivateCookieJar, category: &str, message: &str) -> PrivateCookieJar {
    let mut flashes = pending_flashes(&jar);
    flashes.push(Flash {
        category: category.to_string(),
        message: message.to_string(),
    });
    let value = serde_json::to_string(&flashes).unwrap_or_default();
    // flashes are for the next page load; don't let stale ones linger
    jar.add(
        Cookie::build(Cookie::new(FLASH_COOKIE.to_string(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::minutes(30))
            .build(),
    )
}

/// Remove and return all pending flashes.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Flash>) {
    let flashes = pending_flashes(&jar);
    let jar = jar.remove(clear_cookie(FLASH_COOKIE));
    (jar, flashes)
}

fn pending_flashes(jar: &PrivateCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .unwrap_or_default()
}

/// Remember the filename of the plot just rendered for `/result`.
pub fn remember_plot(jar: PrivateCookieJar, file: &str) -> PrivateCookieJar {
    jar.add(build_cookie(LAST_PLOT_COOKIE, file.to_string()))
}

pub fn last_plot(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(LAST_PLOT_COOKIE).map(|c| c.value().to_string())
}

fn build_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Session gate: extracting this in a handler requires a signed-in user.
/// Absence of the session cookie rejects with a redirect to `/login`.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub i64);

impl FromRequestParts<DeckState> for SessionUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &DeckState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        match user_id(&jar) {
            Some(id) => Ok(SessionUser(id)),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}
