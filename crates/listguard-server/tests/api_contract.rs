//! API contract tests: drive the router in-process and check response shapes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use listguard_core::{FilterSettings, ListguardConfig};
use listguard_escalate::{DisabledAdjudicator, EscalationConfig, Escalator};
use listguard_rules::RuleRegistry;
use listguard_server::{build_router, AppState};

fn config() -> ListguardConfig {
    ListguardConfig {
        port: 0,
        rules_path: None,
        data_dir: PathBuf::from("/nonexistent"),
        filters: FilterSettings::default(),
    }
}

fn app_with(registry: RuleRegistry) -> Router {
    let escalator = Escalator::new(Arc::new(DisabledAdjudicator), EscalationConfig::default());
    let state = AppState::with_parts(config(), Arc::new(registry), escalator);
    build_router(Arc::new(state))
}

fn app() -> Router {
    app_with(RuleRegistry::builtin().unwrap())
}

async fn send(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_shape() {
    let (status, json) = send(app(), "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["rulesVersion"], 1);
    assert!(json["categories"].as_u64().unwrap() >= 7);
    assert_eq!(json["escalationActive"], false);
}

#[tokio::test]
async fn test_validate_contract() {
    let body = serde_json::json!({
        "listings": [
            {"id": "wb-1", "title": "Игровая консоль Sony PlayStation 5 Pro 2TB", "price": 72000, "category": "playstation", "query": "ps5 pro", "source": "wb"},
            {"title": "Зарядная станция для PlayStation 5 Pro", "price": 2500, "category": "playstation", "query": "ps5 pro", "source": "wb"},
            {"title": "PlayStation 5 Slim Digital", "price": 45000, "category": "playstation", "query": "ps5 pro", "source": "ozon"},
            {"title": "RTX 5070", "category": "videocards", "query": "5070", "source": "ozon"},
            {"title": "Робот-пылесос", "price": 20000, "category": "vacuums", "query": "roborock", "source": "ozon"}
        ]
    });
    let (status, json) = send(app(), "POST", "/api/validate", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 5);

    let codes: Vec<&str> = records.iter().map(|r| r["reasonCode"].as_str().unwrap()).collect();
    assert_eq!(
        codes,
        vec![
            "MODEL_MATCH",
            "ACCESSORY",
            "OTHER_MODEL_CONFLICT",
            "MALFORMED_LISTING",
            "CATEGORY_UNCONFIGURED",
        ]
    );

    let first = &records[0];
    assert_eq!(first["listingRef"], "wb-1");
    assert_eq!(first["isValid"], true);
    assert_eq!(first["stage"], "matcher");
    assert!(first["confidence"].is_number());
    assert!(first.get("aiReason").is_none());
    assert_eq!(records[1]["listingRef"], "#1");

    assert!(json["batchId"].is_string());
    assert_eq!(json["summary"]["total"], 5);
    assert!(json["completedAt"].is_string());
}

#[tokio::test]
async fn test_validate_rejects_bad_body() {
    let (status, _) = send(app(), "POST", "/api/validate", Some(serde_json::json!({"items": []}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_categories() {
    let (status, json) = send(app(), "GET", "/api/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"videocards"));
    assert!(keys.contains(&"iphone"));

    let (status, json) = send(app(), "GET", "/api/categories/playstation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "playstation");
    assert_eq!(json["strictMode"], true);
    assert!(json["grammar"].is_array());

    let (status, json) = send(app(), "GET", "/api/categories/vacuums", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["reasonCode"], "CATEGORY_UNCONFIGURED");
}

#[tokio::test]
async fn test_reload_keeps_previous_rules_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(
        &path,
        r#"{"includeBuiltin": true, "categories": [{"key": "cameras", "displayName": "Cameras"}]}"#,
    )
    .unwrap();

    let registry = RuleRegistry::from_path(Some(&path)).unwrap();
    let app = app_with(registry);

    std::fs::write(&path, "{ broken").unwrap();
    let (status, json) = send(app.clone(), "POST", "/api/rules/reload", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
    assert_eq!(json["version"], 1);

    let (status, _) = send(app.clone(), "GET", "/api/categories/cameras", None).await;
    assert_eq!(status, StatusCode::OK);

    std::fs::write(&path, r#"{"categories": [{"key": "cameras", "enabled": false}]}"#).unwrap();
    let (status, json) = send(app.clone(), "POST", "/api/rules/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], 2);

    let body = serde_json::json!({
        "listings": [{"title": "Canon EOS R8", "price": 150000, "category": "cameras", "query": "eos r8"}]
    });
    let (_, json) = send(app, "POST", "/api/validate", Some(body)).await;
    assert_eq!(json["records"][0]["reasonCode"], "CATEGORY_DISABLED");
}

#[tokio::test]
async fn test_escalation_status_hides_keys() {
    let (status, json) = send(app(), "GET", "/api/escalation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["adjudicator"], "disabled");
    assert_eq!(json["active"], false);
    assert_eq!(json["status"]["keyConfigured"], false);
    assert_eq!(json["status"]["model"], "gpt-4o-mini");
    assert!(json["settings"].get("apiKey").is_none());
    assert_eq!(json["settings"]["maxBatchSize"], 20);
    assert_eq!(json["settings"]["timeoutMs"], 30000);
    assert_eq!(json["filters"]["enableSoftFilter"], true);
}
