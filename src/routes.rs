use std::path::Path;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use crate::handlers::{device, points, AppState};

pub fn router(state: AppState, static_dir: &Path) -> Router {
    // unknown paths land on the map page
    let ui = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/points", get(points::list_samples).post(points::submit))
        .route("/data", post(points::submit))
        .route("/gps", post(points::submit))
        .route("/esp32", get(device::list_payloads).post(device::submit_payload))
        .fallback_service(ui)
        .with_state(state)
        // logging so we can see whats going on
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use crate::models::error::StoreError;
    use crate::models::geo_sample::GeoSample;
    use crate::store::device_log::DeviceLog;
    use crate::store::record_store::{FileRecordStore, RecordStore};

    struct Fixture {
        dir: TempDir,
        app: Router,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let samples = FileRecordStore::open(dir.path().join("clicks.txt"), 16).await.unwrap();
        let devices = DeviceLog::open(dir.path().join("pos.txt"), 16).await.unwrap();
        let app = router(AppState::new(Arc::new(samples), Arc::new(devices)), &dir.path().join("static"));
        Fixture { dir, app }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn list(app: &Router) -> Vec<Value> {
        let (status, body) = send_json(app, get_request("/points")).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let f = fixture().await;

        assert_eq!(list(&f.app).await, Vec::<Value>::new());
    }

    #[rstest]
    #[case(r#"{"lat": 48.85, "lon": 2.35, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 0, "lon": 2.35, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 48.85, "lon": 0, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 48.85, "lon": 2.35, "timestamp": 0}"#)]
    #[tokio::test]
    async fn zero_values_are_accepted(#[case] body: &str) {
        let f = fixture().await;

        let (status, ack) = send_json(&f.app, post_json("/points", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, json!({"status": "OK"}));
        assert_eq!(list(&f.app).await.len(), 1);
    }

    #[tokio::test]
    async fn null_island_is_recorded_but_not_listed() {
        let f = fixture().await;

        let (status, _) = send(&f.app, post_json("/points", r#"{"lat": 0, "lon": 0, "timestamp": 0}"#)).await;

        assert_eq!(status, StatusCode::OK);
        let raw = tokio::fs::read_to_string(f.dir.path().join("clicks.txt")).await.unwrap();
        assert_eq!(raw, "{\"lat\":0.0,\"lon\":0.0,\"timestamp\":0}\n");
        assert_eq!(list(&f.app).await, Vec::<Value>::new());
    }

    #[rstest]
    #[case(r#"{"lon": 2.35, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 48.85, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 48.85, "lon": 2.35}"#)]
    #[case(r#"{"lat": "abc", "lon": 2.35, "timestamp": 1000}"#)]
    #[case(r#"{"lat": 48.85, "lon": 2.35, "timestamp": "#)]
    #[case(r#"[]"#)]
    #[tokio::test]
    async fn invalid_bodies_are_rejected_without_append(#[case] body: &str) {
        let f = fixture().await;
        send(&f.app, post_json("/points", r#"{"lat": 1, "lon": 1, "timestamp": 1}"#)).await;

        let (status, error) = send_json(&f.app, post_json("/points", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["status"], json!("fail"));
        assert_eq!(list(&f.app).await.len(), 1);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_client_error() {
        let f = fixture().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/points")
            .body(Body::from(r#"{"lat": 1, "lon": 1, "timestamp": 1}"#))
            .unwrap();

        let (status, _) = send(&f.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn new_sample_is_listed_after_previous_ones() {
        let f = fixture().await;
        send(&f.app, post_json("/points", r#"{"lat": 10, "lon": 20, "timestamp": 1}"#)).await;
        send(&f.app, post_json("/gps", r#"{"lat": 11, "lon": 21, "timestamp": 2}"#)).await;

        let (status, _) = send(&f.app, post_json("/data", r#"{"lat": 48.85, "lon": 2.35, "timestamp": 1000, "rssi_avg": -58}"#)).await;

        assert_eq!(status, StatusCode::OK);
        let listed = list(&f.app).await;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2], json!({"lat": 48.85, "lon": 2.35, "timestamp": 1000, "rssi_avg": -58}));
        assert_eq!(listed.iter().filter(|s| s["timestamp"] == json!(1000)).count(), 1);
    }

    #[tokio::test]
    async fn listing_is_idempotent() {
        let f = fixture().await;
        send(&f.app, post_json("/points", r#"{"lat": 10, "lon": 20, "timestamp": 1}"#)).await;

        assert_eq!(list(&f.app).await, list(&f.app).await);
    }

    #[tokio::test]
    async fn stored_records_without_coordinates_are_not_listed() {
        let f = fixture().await;
        send(&f.app, post_json("/points", r#"{"lat": 10, "lon": 20, "timestamp": 1}"#)).await;
        let path = f.dir.path().join("clicks.txt");
        let mut raw = tokio::fs::read_to_string(&path).await.unwrap();
        raw.push_str("{\"timestamp\":2,\"lon\":3}\n{\"timestamp\":3,\"lat\":3}\n");
        tokio::fs::write(&path, raw).await.unwrap();

        let listed = list(&f.app).await;

        assert_eq!(listed, vec![json!({"lat": 10.0, "lon": 20.0, "timestamp": 1})]);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_all_listed() {
        let f = fixture().await;

        let submissions = (0..32).map(|i| {
            let app = f.app.clone();
            tokio::spawn(async move {
                let body = json!({"lat": 45.0, "lon": 5.0, "timestamp": i}).to_string();
                app.oneshot(post_json("/points", &body)).await.unwrap().status()
            })
        });
        for status in futures::future::join_all(submissions).await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        let mut timestamps: Vec<i64> = list(&f.app).await
            .iter()
            .map(|sample| sample["timestamp"].as_i64().unwrap())
            .collect();
        timestamps.sort();
        assert_eq!(timestamps, (0..32).collect::<Vec<i64>>());
    }

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn append(&self, _sample: &GeoSample) -> Result<(), StoreError> {
            Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
        }

        async fn read_all(&self) -> Result<Vec<GeoSample>, StoreError> {
            Err(StoreError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "unreadable")))
        }
    }

    #[tokio::test]
    async fn store_failures_are_server_errors() {
        let dir = TempDir::new().unwrap();
        let devices = DeviceLog::open(dir.path().join("pos.txt"), 4).await.unwrap();
        let app = router(AppState::new(Arc::new(BrokenStore), Arc::new(devices)), dir.path());

        let (status, error) = send_json(&app, post_json("/points", r#"{"lat": 1, "lon": 1, "timestamp": 1}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["status"], json!("fail"));

        let (status, _) = send(&app, get_request("/points")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn device_payloads_are_logged_opaquely() {
        let f = fixture().await;

        let (status, _) = send(&f.app, post_json("/esp32", r#"{"data": {"networks": [{"bssid": "aa:bb", "rssi_avg": -70}]}}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&f.app, post_json("/esp32", r#"{"payload": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, logged) = send_json(&f.app, get_request("/esp32")).await;
        assert_eq!(status, StatusCode::OK);
        let logged = logged.as_array().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0]["data"], json!({"networks": [{"bssid": "aa:bb", "rssi_avg": -70}]}));
        assert!(logged[0]["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(list(&f.app).await, Vec::<Value>::new());
    }

    #[tokio::test]
    async fn unknown_paths_serve_the_map_page() {
        let f = fixture().await;
        let static_dir = f.dir.path().join("static");
        tokio::fs::create_dir(&static_dir).await.unwrap();
        tokio::fs::write(static_dir.join("index.html"), "<div id=\"map\"></div>").await.unwrap();
        tokio::fs::write(static_dir.join("map.js"), "// map").await.unwrap();

        let (status, body) = send(&f.app, get_request("/map.js")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"// map".to_vec());

        let (status, body) = send(&f.app, get_request("/somewhere/else")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<div id=\"map\"></div>".to_vec());
    }
}
