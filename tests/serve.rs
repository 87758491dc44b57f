use std::fs;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use stipple::infra::http::{HttpState, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

fn output_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("posts/2016/05/03")).expect("mkdir");
    fs::create_dir_all(root.join("styles")).expect("mkdir");
    fs::write(root.join("index.html"), "<h1>home</h1>").expect("write");
    fs::write(root.join("posts/index.html"), "<h1>posts</h1>").expect("write");
    fs::write(
        root.join("posts/2016/05/03/dithered-webgl.html"),
        "<h1>dithered</h1>",
    )
    .expect("write");
    fs::write(root.join("styles/main.css"), "body{}").expect("write");
    dir
}

async fn get(dir: &TempDir, uri: &str) -> (StatusCode, Option<String>, String) {
    let router = build_router(HttpState::new(dir.path()));
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("router responds");

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn root_serves_index() {
    let dir = output_dir();
    let (status, content_type, body) = get(&dir, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, "<h1>home</h1>");
}

#[tokio::test]
async fn files_and_directories_resolve() {
    let dir = output_dir();

    let (status, _, body) = get(&dir, "/posts/2016/05/03/dithered-webgl.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>dithered</h1>");

    let (status, content_type, _) = get(&dir, "/styles/main.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/css"));

    let (_, _, slash) = get(&dir, "/posts/").await;
    let (_, _, bare) = get(&dir, "/posts").await;
    assert_eq!(slash, "<h1>posts</h1>");
    assert_eq!(bare, "<h1>posts</h1>");
}

#[tokio::test]
async fn missing_files_answer_file_not_found() {
    let dir = output_dir();
    let (status, _, body) = get(&dir, "/nope.html").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "File not found");
}

#[tokio::test]
async fn parent_traversal_is_refused() {
    let dir = output_dir();
    let (status, _, body) = get(&dir, "/posts/../../etc/passwd").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "File not found");
}
