mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use common::{
    multipart_body, multipart_content_type, service_with, StubRecommender, StubReply, BALANCED_CSV,
    BOUNDARY, LAND_PURCHASE_CSV,
};
use ledger_audit::config::ServerConfig;
use ledger_audit::server::{create_router, AppState};

fn router_with(config: &ServerConfig) -> Router {
    let service = service_with(StubRecommender::new(StubReply::Text("- Review large entries")));
    create_router(
        AppState {
            service: Arc::new(service),
        },
        config,
    )
}

fn router() -> Router {
    router_with(&ServerConfig::default())
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-csv")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "ledger-audit");
}

#[tokio::test]
async fn upload_returns_audit_response() {
    let response = router()
        .oneshot(upload_request(multipart_body("ledger.csv", LAND_PURCHASE_CSV)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json["balance_status"],
        "Unbalanced: Total Debit = 17030.00, Total Credit = 2030.00"
    );
    assert_eq!(json["anomalies"].as_array().unwrap().len(), 1);
    assert_eq!(json["anomalies"][0]["items"], "Land purchase");
    assert_eq!(json["recommendations"], "- Review large entries");
}

#[tokio::test]
async fn non_csv_upload_is_a_bad_request() {
    let response = router()
        .oneshot(upload_request(multipart_body("ledger.txt", BALANCED_CSV)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Only CSV files are allowed"));
}

#[tokio::test]
async fn schema_violation_is_a_bad_request() {
    let response = router()
        .oneshot(upload_request(multipart_body(
            "ledger.csv",
            "description,debit,credit\nRent,500,0\n",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["detail"],
        "CSV must have columns: items, debit, credit (found: description, debit, credit)"
    );
}

#[tokio::test]
async fn totals_past_the_decimal_limit_are_a_bad_request() {
    let response = router()
        .oneshot(upload_request(multipart_body(
            "ledger.csv",
            "items,debit,credit\n\
             Land,50000000000000000000000000000,0\n\
             Building,50000000000000000000000000000,0\n",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["detail"],
        "Total of debit exceeds the supported range at line 3"
    );
}

#[tokio::test]
async fn missing_file_field_is_a_bad_request() {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"document\"; filename=\"ledger.csv\"\r\n\r\n\
         {BALANCED_CSV}\r\n\
         --{BOUNDARY}--\r\n"
    );
    let response = router()
        .oneshot(upload_request(body.into_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["detail"], "Missing 'file' field in upload");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let response = router_with(&config)
        .oneshot(upload_request(multipart_body("ledger.csv", LAND_PURCHASE_CSV)))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn cors_allows_configured_origins_only() {
    let allowed = router()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let denied = router()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(denied
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn get_on_upload_route_is_not_allowed() {
    let response = router()
        .oneshot(Request::get("/upload-csv").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
