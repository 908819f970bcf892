use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use axum_extra::extract::cookie::Key;
use tower::ServiceExt;

struct TestEnv {
    app: Router,
    results_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

async fn test_env() -> TestEnv {
    let tmp = tempfile::tempdir().expect("temp dir");
    let upload_dir = tmp.path().join("uploads");
    let results_dir = tmp.path().join("plots");
    fs::create_dir_all(&upload_dir).expect("upload dir");
    fs::create_dir_all(&results_dir).expect("results dir");

    let db_path = tmp.path().join("deck.sqlite");
    let storage = plotdeck::db::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("open database");

    let cfg = plotdeck::config::Config {
        upload_dir,
        results_dir: results_dir.clone(),
        ..plotdeck::config::Config::default()
    };
    let state = plotdeck::router::DeckState::new(storage, &cfg, Key::generate());
    TestEnv {
        app: plotdeck::router::deck_router(state),
        results_dir,
        _tmp: tmp,
    }
}

/// Browser-side cookie jar: absorbs Set-Cookie headers and replays them.
#[derive(Default)]
struct Session {
    cookies: HashMap<String, String>,
}

impl Session {
    fn absorb(&mut self, resp: &Response<Body>) {
        for value in resp.headers().get_all(header::SET_COOKIE) {
            let Ok(s) = value.to_str() else { continue };
            let pair = s.split(';').next().unwrap_or(s);
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

async fn send(app: &Router, session: &mut Session, req: Request<Body>) -> Response<Body> {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request failed");
    session.absorb(&resp);
    resp
}

async fn get(app: &Router, session: &mut Session, path: &str) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookies) = session.header() {
        builder = builder.header(header::COOKIE, cookies);
    }
    let req = builder.body(Body::empty()).expect("build request");
    send(app, session, req).await
}

async fn post_form(
    app: &Router,
    session: &mut Session,
    path: &str,
    body: &str,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookies) = session.header() {
        builder = builder.header(header::COOKIE, cookies);
    }
    let req = builder
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, session, req).await
}

async fn post_upload(
    app: &Router,
    session: &mut Session,
    name: &str,
    filename: &str,
    contents: &str,
) -> Response<Body> {
    const BOUNDARY: &str = "deck-test-boundary";
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         {name}\r\n\
         --{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    );
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookies) = session.header() {
        builder = builder.header(header::COOKIE, cookies);
    }
    let req = builder.body(Body::from(body)).expect("build request");
    send(app, session, req).await
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

async fn sign_up_and_login(
    app: &Router,
    session: &mut Session,
    username: &str,
    email: &str,
    password: &str,
) {
    let resp = post_form(
        app,
        session,
        "/register",
        &format!("username={username}&email={email}&password={password}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = post_form(
        app,
        session,
        "/login",
        &format!("email={email}&password={password}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
}

const NUMERIC_CSV: &str = "x,y\n1,10\n2,18\n3,14\n4,25\n5,22\n6,31\n";

#[tokio::test]
async fn dashboard_requires_login() {
    let env = test_env().await;
    let mut session = Session::default();

    let resp = get(&env.app, &mut session, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn register_flashes_and_login_reaches_dashboard() {
    let env = test_env().await;
    let mut session = Session::default();

    let resp = post_form(
        &env.app,
        &mut session,
        "/register",
        "username=alice&email=alice@example.com&password=hunter2",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    // not signed in yet: the gate forwards to /login, where the flash shows
    let resp = get(&env.app, &mut session, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let login_page = body_text(get(&env.app, &mut session, "/login").await).await;
    assert!(login_page.contains("Account created!"));

    let resp = post_form(
        &env.app,
        &mut session,
        "/login",
        "email=alice@example.com&password=hunter2",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let dashboard = body_text(get(&env.app, &mut session, "/dashboard").await).await;
    assert!(dashboard.contains("Welcome, alice"));
}

#[tokio::test]
async fn wrong_password_flashes_an_error() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;

    let mut fresh = Session::default();
    let resp = post_form(
        &env.app,
        &mut fresh,
        "/login",
        "email=alice@example.com&password=wrong",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    let login_page = body_text(get(&env.app, &mut fresh, "/login").await).await;
    assert!(login_page.contains("Login unsuccessful"));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;

    let mut other = Session::default();
    let resp = post_form(
        &env.app,
        &mut other,
        "/register",
        "username=alice&email=other@example.com&password=pw",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/register");
    let register_page = body_text(get(&env.app, &mut other, "/register").await).await;
    assert!(register_page.contains("already taken"));
}

#[tokio::test]
async fn uploaded_dataset_is_listed_for_owner_only() {
    let env = test_env().await;

    let mut alice = Session::default();
    sign_up_and_login(&env.app, &mut alice, "alice", "alice@example.com", "pw").await;
    let resp = post_upload(&env.app, &mut alice, "Iris Data", "iris.csv", NUMERIC_CSV).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let dashboard = body_text(get(&env.app, &mut alice, "/dashboard").await).await;
    assert!(dashboard.contains("Dataset uploaded successfully!"));
    assert!(dashboard.contains("Iris Data"));

    let mut bob = Session::default();
    sign_up_and_login(&env.app, &mut bob, "bob", "bob@example.com", "pw").await;
    let dashboard = body_text(get(&env.app, &mut bob, "/dashboard").await).await;
    assert!(!dashboard.contains("Iris Data"));
}

#[tokio::test]
async fn invalid_dataset_id_redirects_to_dashboard_with_flash() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;

    let resp = get(&env.app, &mut session, "/select_features/999").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let dashboard = body_text(get(&env.app, &mut session, "/dashboard").await).await;
    assert!(dashboard.contains("Dataset not found."));
}

#[tokio::test]
async fn another_users_dataset_is_not_reachable() {
    let env = test_env().await;

    let mut alice = Session::default();
    sign_up_and_login(&env.app, &mut alice, "alice", "alice@example.com", "pw").await;
    post_upload(&env.app, &mut alice, "Iris", "iris.csv", NUMERIC_CSV).await;

    let mut bob = Session::default();
    sign_up_and_login(&env.app, &mut bob, "bob", "bob@example.com", "pw").await;
    let resp = get(&env.app, &mut bob, "/select_features/1").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
}

#[tokio::test]
async fn select_features_lists_columns_and_plot_types() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;
    post_upload(&env.app, &mut session, "Iris", "iris.csv", NUMERIC_CSV).await;

    let page = body_text(get(&env.app, &mut session, "/select_features/1").await).await;
    assert!(page.contains(r#"<option value="x">x</option>"#));
    assert!(page.contains(r#"<option value="y">y</option>"#));
    assert!(page.contains("Scatter Plot"));
    assert!(page.contains("Pair Plot"));
}

#[tokio::test]
async fn plotting_two_columns_produces_a_nonempty_png() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;
    post_upload(&env.app, &mut session, "Iris", "iris.csv", NUMERIC_CSV).await;

    let resp = post_form(
        &env.app,
        &mut session,
        "/plot_result/1",
        "feature_x=x&feature_y=y&plot_type=1",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/result");

    let result_page = body_text(get(&env.app, &mut session, "/result").await).await;
    assert!(result_page.contains("/plots/"));
    assert!(result_page.contains("iris_x_vs_y_1_"));

    let rendered: Vec<_> = fs::read_dir(&env.results_dir)
        .expect("read results dir")
        .filter_map(Result::ok)
        .collect();
    assert_eq!(rendered.len(), 1);
    let size = rendered[0].metadata().expect("metadata").len();
    assert!(size > 0, "rendered plot file is empty");
}

#[tokio::test]
async fn non_numeric_column_flashes_back_to_selection() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;
    post_upload(
        &env.app,
        &mut session,
        "Fruit",
        "fruit.csv",
        "x,label\n1,apple\n2,pear\n",
    )
    .await;

    let resp = post_form(
        &env.app,
        &mut session,
        "/plot_result/1",
        "feature_x=x&feature_y=label&plot_type=2",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/select_features/1");

    let page = body_text(get(&env.app, &mut session, "/select_features/1").await).await;
    assert!(page.contains("not numeric"));
}

#[tokio::test]
async fn invalid_plot_code_flashes_back_to_selection() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;
    post_upload(&env.app, &mut session, "Iris", "iris.csv", NUMERIC_CSV).await;

    let resp = post_form(
        &env.app,
        &mut session,
        "/plot_result/1",
        "feature_x=x&feature_y=y&plot_type=9",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/select_features/1");
}

#[tokio::test]
async fn result_without_a_plot_redirects_to_dashboard() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;

    let resp = get(&env.app, &mut session, "/result").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let dashboard = body_text(get(&env.app, &mut session, "/dashboard").await).await;
    assert!(dashboard.contains("No plot to show."));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let env = test_env().await;
    let mut session = Session::default();
    sign_up_and_login(&env.app, &mut session, "alice", "alice@example.com", "pw").await;

    let resp = get(&env.app, &mut session, "/logout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let resp = get(&env.app, &mut session, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}
