//! Axum route handlers for the model registry HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`                         - Returns `{"status": "ok", "version": ...}`
//! - `GET  /capabilities`                   - Aggregated capability descriptors
//! - `GET  /models`                         - Registered models
//! - `POST /models`                         - Register a model from `{"handle": ...}`
//! - `GET  /models/:key/readonly-paths`     - Read-only paths of one model
//! - `GET  /models/:key/is-read-only?path=` - Classify a concrete path
//! - `POST /normalize`                      - Wildcard the key values of `{"path": ...}`

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::registry::{ModelEntry, ModelRegistry};
use crate::schema::normalize;

type ApiError = (StatusCode, Json<Value>);

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/capabilities", get(capabilities_handler))
        .route("/models", get(list_models_handler).post(register_model_handler))
        .route("/models/:key/readonly-paths", get(read_only_paths_handler))
        .route("/models/:key/is-read-only", get(is_read_only_handler))
        .route("/normalize", post(normalize_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: String) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}

fn lookup(state: &AppState, key: &str) -> Result<Arc<ModelEntry>, ApiError> {
    state
        .registry
        .model(key)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Model not found: {}", key)))
}

/// GET /health - liveness probe.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "models": state.registry.len(),
    }))
}

/// GET /capabilities - descriptors of all supported models, order unspecified.
async fn capabilities_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "models": state.registry.capabilities() }))
}

/// GET /models - registered models with their read-only path counts.
async fn list_models_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.registry.snapshot();
    let mut models: Vec<Value> = snapshot
        .values()
        .map(|entry| {
            serde_json::json!({
                "key": entry.key(),
                "name": entry.identity().name,
                "version": entry.identity().version,
                "read_only_paths": entry.read_only_paths().len(),
            })
        })
        .collect();
    models.sort_by(|a, b| a["key"].as_str().cmp(&b["key"].as_str()));
    Json(serde_json::json!({ "models": models }))
}

/// POST /models - register a model plugin by handle.
///
/// Opening a definition file touches the disk, so registration runs on the
/// blocking pool.
async fn register_model_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let registry = Arc::clone(&state.registry);
    let handle = request.handle;
    let task_handle = handle.clone();
    let result = tokio::task::spawn_blocking(move || registry.register_model(&task_handle))
        .await
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Registration task failed: {}", e),
            )
        })?;

    match result {
        Ok(identity) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "key": identity.key(),
                "name": identity.name,
                "version": identity.version,
            })),
        )),
        Err(e) => {
            // Loader errors can quote file contents; keep them in the log.
            tracing::warn!(handle = %handle, error = %e, "Model registration request failed");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Unable to load model plugin {}", handle),
            ))
        }
    }
}

/// GET /models/:key/readonly-paths
async fn read_only_paths_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let entry = lookup(&state, &key)?;
    Ok(Json(serde_json::json!({
        "key": key,
        "paths": entry.read_only_paths(),
    })))
}

/// GET /models/:key/is-read-only?path=...
async fn is_read_only_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PathRequest>,
) -> Result<Json<Value>, ApiError> {
    let entry = lookup(&state, &key)?;
    Ok(Json(serde_json::json!({
        "path": query.path,
        "normalized": normalize(&query.path),
        "read_only": entry.is_read_only(&query.path),
        "state": entry.is_state_path(&query.path),
    })))
}

/// POST /normalize
async fn normalize_handler(Json(request): Json<PathRequest>) -> impl IntoResponse {
    Json(serde_json::json!({ "path": normalize(&request.path) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::plugin::PluginLoader;

    const DEFINITION: &str = r#"
model:
  name: devicesim
  version: 1.0.0
  descriptors:
    - name: openconfig-interfaces
      version: 2.4.1
      organization: OpenConfig working group
schema:
  Device:
    kind: container
    children:
      - name: interfaces
        kind: container
        children:
          - name: interface
            kind: list
            key: name
            children:
              - name: state
                kind: container
                config: read_only
"#;

    fn state_with_model() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devicesim.yaml");
        std::fs::write(&path, DEFINITION).unwrap();

        let registry = ModelRegistry::new(PluginLoader::new());
        registry.register_model(path.to_str().unwrap()).unwrap();
        (AppState::new(registry), dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _dir) = state_with_model();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["models"], 1);
    }

    #[tokio::test]
    async fn test_capabilities_endpoint() {
        let (state, _dir) = state_with_model();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/capabilities")
            .body(Body::empty())
            .unwrap();
        let json = body_json(app.oneshot(request).await.unwrap()).await;
        assert_eq!(json["models"][0]["name"], "openconfig-interfaces");
        assert_eq!(json["models"][0]["version"], "2.4.1");
    }

    #[tokio::test]
    async fn test_read_only_paths_endpoint() {
        let (state, _dir) = state_with_model();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/models/devicesim_1.0.0/readonly-paths")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["paths"], serde_json::json!(["/interfaces/interface[name=*]/state"]));

        let request = Request::builder()
            .uri("/models/unknown_1/readonly-paths")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_is_read_only_endpoint() {
        let (state, _dir) = state_with_model();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/models/devicesim_1.0.0/is-read-only?path=/interfaces/interface%5Bname%3Deth0%5D/state/counters")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["normalized"], "/interfaces/interface[name=*]/state/counters");
        assert_eq!(json["read_only"], false);
        assert_eq!(json["state"], true);
    }

    #[tokio::test]
    async fn test_register_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devicesim.yaml");
        std::fs::write(&path, DEFINITION).unwrap();

        let state = AppState::new(ModelRegistry::new(PluginLoader::new()));
        let app = app_router(state.clone());

        let body = serde_json::json!({ "handle": path.to_str().unwrap() });
        let request = Request::builder()
            .method("POST")
            .uri("/models")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["key"], "devicesim_1.0.0");
        assert_eq!(state.registry.len(), 1);

        let request = Request::builder()
            .method("POST")
            .uri("/models")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"handle": "builtin:missing"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("builtin:missing"));
    }

    #[tokio::test]
    async fn test_register_error_hides_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.conf");
        std::fs::write(&path, "db_password=hunter2-TOPSECRET api_key=abc123").unwrap();
        let handle = path.to_str().unwrap().to_string();

        let state = AppState::new(ModelRegistry::new(PluginLoader::new()));
        let app = app_router(state.clone());

        let body = serde_json::json!({ "handle": handle });
        let request = Request::builder()
            .method("POST")
            .uri("/models")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        let error = json["error"].as_str().unwrap();
        assert_eq!(error, format!("Unable to load model plugin {}", handle));
        assert!(!error.contains("hunter2"));
        assert!(!error.contains("api_key"));
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_list_models_endpoint() {
        const SECOND: &str = r#"
model:
  name: alphadevice
  version: 0.9.0
schema:
  Device:
    kind: container
    children:
      - name: system
        kind: container
        children:
          - name: uptime
            kind: leaf
            config: read_only
          - name: state
            kind: container
            config: read_only
"#;
        let (state, dir) = state_with_model();
        let second = dir.path().join("alphadevice.yaml");
        std::fs::write(&second, SECOND).unwrap();
        state
            .registry
            .register_model(second.to_str().unwrap())
            .unwrap();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/models")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            json["models"],
            serde_json::json!([
                {
                    "key": "alphadevice_0.9.0",
                    "name": "alphadevice",
                    "version": "0.9.0",
                    "read_only_paths": 2,
                },
                {
                    "key": "devicesim_1.0.0",
                    "name": "devicesim",
                    "version": "1.0.0",
                    "read_only_paths": 1,
                },
            ])
        );
    }

    #[tokio::test]
    async fn test_normalize_endpoint() {
        let app = app_router(AppState::new(ModelRegistry::new(PluginLoader::new())));

        let request = Request::builder()
            .method("POST")
            .uri("/normalize")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"path": "/a/b[k=v]/c[j=w]"}"#))
            .unwrap();
        let json = body_json(app.oneshot(request).await.unwrap()).await;
        assert_eq!(json["path"], "/a/b[k=*]/c[j=*]");
    }
}
