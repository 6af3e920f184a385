use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use orbsmith::controller::Controller;
use orbsmith::data::persist::StateStore;
use orbsmith::editor::template::TemplateCatalog;
use orbsmith::editor::AppState;
use orbsmith::server::routes::{route_request, HttpResponse};
use orbsmith::solver::SolverClient;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_with_solver(dir: &tempfile::TempDir, solver_url: &str) -> Arc<Controller> {
    let solver = SolverClient::new(solver_url, Duration::from_secs(5)).expect("client builds");
    Arc::new(Controller::with_parts(
        StateStore::new(dir.path().join("state.json")),
        TemplateCatalog::default(),
        solver,
        AppState::default(),
    ))
}

fn controller(dir: &tempfile::TempDir) -> Arc<Controller> {
    controller_with_solver(dir, "http://127.0.0.1:9")
}

fn json_body(response: &HttpResponse) -> Value {
    serde_json::from_str(&response.body).expect("response should be valid json")
}

#[tokio::test]
async fn health_endpoint_returns_ok_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    let response = route_request(&ctl, "GET", "/api/health", "").await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "application/json");
    let payload = json_body(&response);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["running"], false);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    let response = route_request(&ctl, "GET", "/api/nope", "").await;
    assert_eq!(response.status_code, 404);
    assert_eq!(json_body(&response)["status"], "error");
}

#[tokio::test]
async fn shareable_category_edit_reaches_every_profile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    for _ in 0..3 {
        assert_eq!(route_request(&ctl, "POST", "/api/profiles", "").await.status_code, 200);
    }
    let toggled = route_request(&ctl, "POST", "/api/shareable/Soul%20Gem", "").await;
    assert_eq!(json_body(&toggled)["state"]["shareable"], json!(["Soul Gem"]));

    let response = route_request(
        &ctl,
        "PUT",
        "/api/profiles/1/categories/Soul%20Gem",
        r#"{"rarity":"Mythic"}"#,
    )
    .await;
    assert_eq!(response.status_code, 200);
    let state = &json_body(&response)["state"];
    for profile in state["profiles"].as_array().expect("profiles") {
        assert_eq!(profile["categories"]["Soul Gem"], "Mythic");
    }

    let response = route_request(&ctl, "PUT", "/api/profiles/1/categories/Wings", r#"{"rarity":"Epic"}"#).await;
    let state = &json_body(&response)["state"];
    assert_eq!(state["profiles"][1]["categories"]["Wings"], "Epic");
    assert!(state["profiles"][0]["categories"].get("Wings").is_none());

    let response = route_request(&ctl, "PUT", "/api/profiles/0/categories/Soul%20Gem", r#"{"rarity":null}"#).await;
    let state = &json_body(&response)["state"];
    for profile in state["profiles"].as_array().expect("profiles") {
        assert!(profile["categories"].get("Soul Gem").is_none());
    }
}

#[tokio::test]
async fn out_of_range_index_is_404_and_state_is_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    route_request(&ctl, "POST", "/api/profiles", "").await;
    let before = ctl.snapshot();

    let response = route_request(&ctl, "PUT", "/api/profiles/4/categories/Soul", r#"{"rarity":"Epic"}"#).await;
    assert_eq!(response.status_code, 404);
    let response = route_request(&ctl, "DELETE", "/api/profiles/x", "").await;
    assert_eq!(response.status_code, 400);
    assert_eq!(ctl.snapshot(), before);
}

#[tokio::test]
async fn template_route_resets_profile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    route_request(&ctl, "POST", "/api/profiles", "").await;
    route_request(
        &ctl,
        "PATCH",
        "/api/profiles/0",
        r#"{"field":"map_entry","value":{"map":"set_priority","key":"Satan","value":9}}"#,
    )
    .await;
    route_request(&ctl, "PATCH", "/api/profiles/0", r#"{"field":"weight","value":0.25}"#).await;

    let response = route_request(&ctl, "POST", "/api/profiles/0/template", r#"{"template":"type-stacker"}"#).await;
    assert_eq!(response.status_code, 200);
    let profile = &json_body(&response)["state"]["profiles"][0];
    assert_eq!(profile["set_priority"], json!({}));
    assert_eq!(profile["objective"], "types-first");
    assert_eq!(profile["weight"], 0.25);

    let response = route_request(&ctl, "POST", "/api/profiles/0/template", r#"{"template":"missing"}"#).await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn rename_rejects_blank_and_taken_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    route_request(&ctl, "POST", "/api/profiles", "").await;
    route_request(&ctl, "POST", "/api/profiles", "").await;

    let response = route_request(&ctl, "PATCH", "/api/profiles/1", r#"{"field":"name","value":" Profile 1 "}"#).await;
    assert_eq!(response.status_code, 409);
    let response = route_request(&ctl, "PATCH", "/api/profiles/1", r#"{"field":"name","value":"  "}"#).await;
    assert_eq!(response.status_code, 400);
    let names: Vec<String> = ctl.snapshot().profiles.into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["Profile 1", "Profile 2"]);

    let response = route_request(&ctl, "PATCH", "/api/profiles/1", r#"{"field":"name","value":" PVE "}"#).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(json_body(&response)["state"]["profiles"][1]["name"], "PVE");
}

#[tokio::test]
async fn orb_import_rejection_keeps_existing_orbs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    let response = route_request(&ctl, "POST", "/api/orbs/import", r#"[{"type":"Flame","set":"Lucifer","level":99}]"#).await;
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response);
    assert_eq!(payload["imported"], 1);
    assert_eq!(payload["clipped_levels"], 1);

    let response = route_request(&ctl, "POST", "/api/orbs/import", r#"{"orbs":"nope"}"#).await;
    assert_eq!(response.status_code, 400);
    let response = route_request(&ctl, "POST", "/api/orbs/import", r#"[{"value":3}]"#).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(ctl.snapshot().orbs.len(), 1);

    let response = route_request(&ctl, "DELETE", "/api/orbs/0", "").await;
    assert_eq!(json_body(&response)["state"]["orbs"], json!([]));
}

#[tokio::test]
async fn mutations_persist_and_reset_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    route_request(&ctl, "POST", "/api/orbs", r#"{"type":"Wind","set":"Asmodeus","rarity":"Epic","value":"3%"}"#).await;
    let saved = StateStore::new(dir.path().join("state.json")).load().expect("state saved");
    assert_eq!(saved.orbs[0].value, 3.0);

    let response = route_request(&ctl, "DELETE", "/api/state", "").await;
    assert_eq!(response.status_code, 200);
    assert!(ctl.snapshot().orbs.is_empty());
    let response = route_request(&ctl, "POST", "/api/state/load", "").await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn optimize_stores_parsed_outcome_with_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/optimize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "summary": {"combined_score": 4},
                "raw": {
                    "combined_score": 4,
                    "profiles": [{"name": "Profile 1", "score": 4, "assignments": {
                        "Soul": [{"type": "Steel", "set": "Beezlebub", "rarity": "Epic", "value": 2, "level": 3}]
                    }}]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller_with_solver(&dir, &server.uri());
    route_request(&ctl, "POST", "/api/profiles", "").await;

    let response = route_request(&ctl, "POST", "/api/optimize", r#"{"topk":3}"#).await;
    assert_eq!(response.status_code, 200);
    let outcome = &json_body(&response)["outcome"];
    assert_eq!(outcome["kind"], "parsed");
    assert_eq!(outcome["result"]["combined_score"], 4.0);
    assert_eq!(outcome["report"][0]["active_sets"][0]["set"], "Beezlebub");

    let response = route_request(&ctl, "GET", "/api/result", "").await;
    assert_eq!(json_body(&response)["outcome"]["kind"], "parsed");
}

#[tokio::test]
async fn solver_error_is_502_and_keeps_previous_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/optimize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller_with_solver(&dir, &server.uri());
    let response = route_request(&ctl, "POST", "/api/optimize", "").await;
    assert_eq!(response.status_code, 502);
    let message = json_body(&response)["message"].as_str().unwrap_or_default().to_string();
    assert!(message.contains("500"));
    assert!(message.contains("boom"));

    let response = route_request(&ctl, "GET", "/api/result", "").await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn router_serves_api_and_console_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = orbsmith::server::router(controller(&dir), dir.path());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/templates").body(Body::empty()).expect("request"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(payload["templates"].as_array().map(Vec::len), Some(3));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_keep_file_in_step_with_memory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctl = controller(&dir);
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move {
                for _ in 0..5 {
                    let response = route_request(&ctl, "POST", "/api/profiles", "").await;
                    assert_eq!(response.status_code, 200);
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("task completes");
    }

    let response = route_request(&ctl, "GET", "/api/health", "").await;
    assert_eq!(response.status_code, 200);
    let on_disk = StateStore::new(dir.path().join("state.json"))
        .load()
        .expect("state saved");
    assert_eq!(on_disk.profiles.len(), 80);
    assert_eq!(on_disk, ctl.snapshot());
}
