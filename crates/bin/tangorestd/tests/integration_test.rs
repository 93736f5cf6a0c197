//! End-to-end smoke tests for the full tangorestd stack.
//!
//! Each test spins up the complete application (virtual control system, real
//! dispatcher, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tangorest_adapter_http_axum::router;
use tangorest_adapter_http_axum::state::AppState;
use tangorest_adapter_virtual::VirtualControlSystem;
use tangorest_app::services::dispatcher::ResourceDispatcher;
use tangorest_app::services::locator::ResourceLocator;
use tower::ServiceExt;

/// Build a fully-wired router backed by a fresh virtual control system.
fn app_with_prefix(prefix: &str) -> axum::Router {
    let model = VirtualControlSystem::new().expect("built-in devices should be valid");
    let dispatcher = ResourceDispatcher::new(model, ResourceLocator::new(prefix));
    router::build(AppState::new(dispatcher))
}

fn app() -> axum::Router {
    app_with_prefix("/rest")
}

async fn call(app: axum::Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body: Value =
        serde_json::from_slice(&resp.into_body().collect().await.unwrap().to_bytes()).unwrap();
    (status, body)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    call(app(), "GET", uri, "").await
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_state_representation_for_database_device() {
    let (status, body) = get("/rest/v1/devices/sys/database/2/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "state": "ON",
            "status": "Device is OK",
            "_links": {
                "_parent": "/rest/v1/devices/sys/database/2",
                "_self": "/rest/v1/devices/sys/database/2/attributes/State",
                "_state": "/rest/v1/devices/sys/database/2/attributes/State",
                "_status": "/rest/v1/devices/sys/database/2/attributes/Status"
            }
        })
    );
}

#[tokio::test]
async fn should_navigate_from_root_to_an_attribute_by_following_links() {
    let (status, root) = get("/rest/v1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(root["_links"].get("_parent").is_none());

    let devices_uri = root["_links"]["_devices"].as_str().unwrap().to_string();
    let (_, devices) = get(&devices_uri).await;
    let children = devices["_links"]["_children"].as_array().unwrap();
    assert_eq!(children.len(), 4);

    let tg_test = children
        .iter()
        .filter_map(Value::as_str)
        .find(|uri| uri.ends_with("/sys/tg_test/1"))
        .unwrap()
        .to_string();
    let (_, device) = get(&tg_test).await;
    assert_eq!(device["state"], "RUNNING");

    let attributes_uri = device["_links"]["_attributes"].as_str().unwrap().to_string();
    let (_, attributes) = get(&attributes_uri).await;
    let double_scalar = attributes["_links"]["_children"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .find(|uri| uri.ends_with("/double_scalar"))
        .unwrap()
        .to_string();

    let (status, reading) = get(&double_scalar).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reading["value"], 1.5);
    assert_eq!(reading["_links"]["_parent"], attributes_uri);
}

#[tokio::test]
async fn should_canonicalise_case_in_self_link() {
    let (status, body) = get("/rest/v1/devices/SYS/TG_TEST/1/attributes/DOUBLE_SCALAR").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["_links"]["_self"],
        "/rest/v1/devices/sys/tg_test/1/attributes/double_scalar"
    );
}

#[tokio::test]
async fn should_filter_device_list_by_wildcard() {
    let (status, body) = get("/rest/v1/devices?wildcard=test/*").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["devices"], json!(["test/motor/1", "test/offline/1"]));
}

#[tokio::test]
async fn should_serve_api_under_custom_prefix() {
    let (status, body) = call(
        app_with_prefix("/tango/rest"),
        "GET",
        "/tango/rest/v1/devices/sys/database/2",
        "",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_links"]["_parent"], "/tango/rest/v1/devices");

    let (status, _) = call(
        app_with_prefix("/tango/rest"),
        "GET",
        "/rest/v1/devices",
        "",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_write_attribute_and_read_back_written_value() {
    let app = app();
    let uri = "/rest/v1/devices/test/motor/1/attributes/Position";

    let (status, written) = call(app.clone(), "PUT", uri, r#"{"value": 42}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written["value"], 42.0);

    let (_, read) = call(app, "GET", uri, "").await;
    assert_eq!(read["value"], 42.0);
    assert_eq!(read["w_value"], 42.0);
}

#[tokio::test]
async fn should_execute_command_and_change_device_state() {
    let app = app();

    let (status, result) = call(
        app.clone(),
        "POST",
        "/rest/v1/devices/test/motor/1/commands/On",
        "",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["name"], "On");

    let (_, state) = call(app, "GET", "/rest/v1/devices/test/motor/1/state", "").await;
    assert_eq!(state["state"], "ON");
}

#[tokio::test]
async fn should_update_device_property() {
    let app = app();
    let uri = "/rest/v1/devices/sys/tg_test/1/properties/Sleep_period";

    let (status, _) = call(app.clone(), "PUT", uri, r#"{"values": ["100"]}"#).await;
    assert_eq!(status, StatusCode::OK);

    let (_, property) = call(app, "GET", uri, "").await;
    assert_eq!(property["values"], json!(["100"]));
}

#[tokio::test]
async fn should_configure_attribute_and_read_back_its_info() {
    let app = app();
    let uri = "/rest/v1/devices/sys/tg_test/1/attributes/ampli/info";

    let (status, info) = call(app.clone(), "PUT", uri, r#"{"unit": "mm"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["unit"], "mm");
    assert_eq!(info["data_type"], "DevDouble");

    let (_, info) = call(app, "GET", uri, "").await;
    assert_eq!(info["unit"], "mm");
}

#[tokio::test]
async fn should_write_attributes_through_collection() {
    let app = app();
    let (status, body) = call(
        app.clone(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/attributes",
        r#"{"ampli": 2, "long_scalar": 5}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"][0]["name"], "ampli");
    assert_eq!(body["attributes"][0]["value"], 2.0);
    assert_eq!(body["attributes"][1]["value"], 5);

    let (_, reading) = call(
        app,
        "GET",
        "/rest/v1/devices/sys/tg_test/1/attributes/ampli",
        "",
    )
    .await;
    assert_eq!(reading["value"], 2.0);
}

#[tokio::test]
async fn should_write_properties_through_collection() {
    let app = app();
    let (status, body) = call(
        app.clone(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/properties",
        r#"{"sleep_period": ["100"], "Extra": ["a", "b"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["properties"],
        json!([
            {"name": "Extra", "values": ["a", "b"]},
            {"name": "Sleep_period", "values": ["100"]}
        ])
    );

    let (_, listed) = call(app, "GET", "/rest/v1/devices/sys/tg_test/1/properties", "").await;
    assert_eq!(
        listed["properties"],
        json!(["Mthreaded_impl", "Sleep_period", "UShort_image_ro_size", "Extra"])
    );
}

#[tokio::test]
async fn should_filter_properties_by_wildcard() {
    let (status, body) = get("/rest/v1/devices/sys/tg_test/1/properties?wildcard=Sleep*").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"], json!(["Sleep_period"]));
    assert_eq!(
        body["_links"]["_children"],
        json!(["/rest/v1/devices/sys/tg_test/1/properties/Sleep_period"])
    );
}

#[tokio::test]
async fn should_describe_commands_when_listing_them() {
    let (status, body) = get("/rest/v1/devices/sys/tg_test/1/commands").await;
    assert_eq!(status, StatusCode::OK);
    let dev_double = body["commands"]
        .as_array()
        .unwrap()
        .iter()
        .find(|command| command["name"] == "DevDouble")
        .unwrap();
    assert_eq!(dev_double["in_type"], "DevDouble");
    assert_eq!(dev_double["out_type"], "DevDouble");
}

#[tokio::test]
async fn should_list_member_names_on_device() {
    let (status, body) = get("/rest/v1/devices/test/motor/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"], json!(["State", "Status", "Position", "Velocity"]));
    assert_eq!(body["properties"], json!(["Acceleration"]));
    let commands = body["commands"].as_array().unwrap();
    assert!(commands.contains(&json!("Stop")));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_not_found_for_unknown_device() {
    let (status, body) = get("/rest/v1/devices/sys/nothing/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NotFound");
    assert!(body.get("_links").is_none());
}

#[tokio::test]
async fn should_return_method_not_allowed_for_put_on_command() {
    let (status, body) = call(
        app(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/commands/On",
        r#"{"value": 1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["kind"], "MethodNotAllowed");
}

#[tokio::test]
async fn should_return_bad_gateway_without_links_for_offline_device() {
    let (status, body) = get("/rest/v1/devices/test/offline/1/state").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "UpstreamUnreachable");
    assert!(body.get("_links").is_none());
}

#[tokio::test]
async fn should_return_forbidden_for_protected_attribute() {
    let (status, body) = call(
        app(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/attributes/secret_scalar",
        r#"{"value": 1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "UpstreamPermissionDenied");
}

#[tokio::test]
async fn should_return_unprocessable_for_type_mismatch() {
    let (status, body) = call(
        app(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/attributes/long_scalar",
        r#"{"value": "many"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["kind"], "UpstreamRejected");
}

#[tokio::test]
async fn should_return_bad_request_for_malformed_body() {
    let (status, body) = call(
        app(),
        "PUT",
        "/rest/v1/devices/sys/tg_test/1/attributes/long_scalar",
        "{value: 1}",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "MalformedRequestBody");
}

#[tokio::test]
async fn should_reject_traversal_and_unknown_versions_as_unresolvable() {
    for uri in [
        "/rest/v1/devices/sys/%2E%2E/1",
        "/rest/v2/devices",
        "/rest/v1/devices/sys/tg_test/1/unknown",
        "/rest/v1/devices/sys//1",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["kind"], "Unresolvable", "{uri}");
    }
}
