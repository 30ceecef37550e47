//! Stub backend for HTTP client tests
//!
//! Spawns a small axum server on an ephemeral port that mimics the admin
//! backend's envelopes and records what the client sent.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use tokio::net::TcpListener;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub const VALID_PASSWORD: &str = "correct-horse";
pub const BUSY_EMAIL: &str = "busy@x.com";
pub const ACCESS_TOKEN: &str = "token-1";

/// A request as seen by the stub
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
    pub bearer: Option<String>,
}

#[derive(Default)]
pub struct StubState {
    pub requests: Mutex<Vec<Recorded>>,
}

impl StubState {
    fn record(&self, path: &str, headers: &HeaderMap, body: Value) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            path: path.to_string(),
            body,
            bearer,
        });
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

pub struct TestBackend {
    pub base_url: String,
    pub state: Arc<StubState>,
}

fn user() -> Value {
    json!({
        "strUserGUID": "u-1",
        "strName": "Ada Admin",
        "strEmailId": "a@x.com",
        "bolIsSuperAdmin": true,
        "bolIsActive": true
    })
}

async fn login(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record("/auth/login", &headers, body.clone());

    if body["strPassword"] != VALID_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid email or password" })),
        );
    }

    if body["strEmailId"] == BUSY_EMAIL && body["bolIsForce"] != true {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "success": false,
                "message": "Active session exists",
                "data": { "hasActiveSession": true }
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "data": { "token": ACCESS_TOKEN, "refreshToken": "refresh-1", "user": user() }
        })),
    )
}

async fn profile(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record("/auth/profile", &headers, Value::Null);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer token-1");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Token expired" })),
        );
    }
    (StatusCode::OK, Json(json!({ "success": true, "data": user() })))
}

async fn logout(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.record("/auth/logout", &headers, body);
    StatusCode::OK
}

async fn roles(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record("/roles", &headers, json!(params));
    if params.get("bolIsActive").map(String::as_str) == Some("true") {
        // Single-object answer for a single match
        return Json(json!({
            "success": true,
            "data": { "strRoleGUID": "r-1", "strRoleName": "Administrator", "bolIsActive": true }
        }));
    }
    Json(json!({
        "success": true,
        "data": [
            { "strRoleGUID": "r-1", "strRoleName": "Administrator", "bolIsActive": true,
              "dtCreatedOn": "2024-01-05T08:30:00Z" },
            { "strRoleGUID": "r-2", "strRoleName": "Auditor", "bolIsActive": false }
        ],
        "pagination": { "total": 2, "page": 1, "limit": 10, "totalPages": 1 }
    }))
}

async fn delete_role(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": format!("Role {} is still assigned to users", id) })),
    )
}

async fn menus() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "strMenuGUID": "m-1", "strMenuName": "Dashboard", "dblSeqNo": 1.0, "strPath": "/" },
            { "strMenuGUID": "m-2", "strMenuName": "Reports", "dblSeqNo": 2.0, "strPath": "/reports" }
        ]
    }))
}

async fn rights_by_role(Path(role_id): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "strUserRightsGUID": "ur-1", "strRoleGUID": role_id, "strMenuGUID": "m-2",
              "bolCanView": true, "menu": { "strMenuName": "Reports", "strPath": "/reports" } }
        ]
    }))
}

async fn bulk_rights(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("/user-rights/bulk", &headers, body);
    Json(json!({ "success": true, "message": "Permissions updated successfully" }))
}

async fn check_permission(Json(body): Json<Value>) -> Json<Value> {
    let allowed = body["strMenuGUID"] == "m-2" && body["permissionType"] == "bolCanView";
    Json(json!({ "success": true, "data": allowed }))
}

async fn soft_failure() -> Json<Value> {
    Json(json!({ "success": false, "message": "Reset token has expired" }))
}

/// Spawn the stub backend and return its base URL
pub async fn spawn_backend() -> TestBackend {
    LazyLock::force(&TRACING);

    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/reset-password", post(soft_failure))
        .route("/api/roles", get(roles))
        .route("/api/roles/{id}", delete(delete_role))
        .route("/api/menus", get(menus))
        .route("/api/user-rights/role/{role_id}", get(rights_by_role))
        .route("/api/user-rights/bulk", post(bulk_rights))
        .route("/api/user-rights/check", post(check_permission))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub backend failed");
    });

    TestBackend {
        base_url: format!("http://127.0.0.1:{}/api", port),
        state,
    }
}
