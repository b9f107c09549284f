use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use time::OffsetDateTime;
use tower::ServiceExt;

use mycowood_server::models::TelemetryRecord;
use mycowood_server::services::LOG_HEADER;

use crate::common::mock_app::MockApp;

mod common;

fn record(temperature: f64) -> TelemetryRecord {
    TelemetryRecord {
        mode: Some("Colonization".to_string()),
        temperature,
        humidity: 90.5,
        soil_moisture: 60.0,
        alarm_state: Some("NONE".to_string()),
        muted: Some(false),
        temp_alert: Some(false),
        hum_alert: Some(false),
        soil_alert: Some(false),
        captured_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn test_get_logs_returns_header_for_fresh_dataset() {
    let app = MockApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert_eq!(text, format!("{LOG_HEADER}\n"));
}

#[tokio::test]
async fn test_get_logs_reflects_appended_records() {
    let app = MockApp::new().await;

    app.log_service.append(&record(21.5));
    app.log_service.append(&record(22.0));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], LOG_HEADER);
    assert!(lines[1].contains(r#""Colonization",21.5,90.5,60,"NONE""#));
    assert!(lines[2].contains(r#""Colonization",22,90.5,60,"NONE""#));
}

#[tokio::test]
async fn test_published_records_reach_live_subscribers() {
    let app = MockApp::new().await;

    let (_id, mut records) = app.hub.subscribe().await;
    app.hub.publish(record(23.4)).await;

    assert_eq!(records.recv().await.unwrap().temperature, 23.4);
}

#[tokio::test]
async fn test_commands_require_a_connected_device() {
    let app = MockApp::new().await;

    assert!(app.commands.send("MUTE").await.is_err());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = MockApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
