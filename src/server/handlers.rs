use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::model::{Service, ServiceState};
use crate::platform::PlatformError;
use crate::reconcile::{DeleteReport, NetworkOutcome, ReconcileError};
use crate::server::state::AppState;

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub transient: bool,
}

/// A reconcile error on its way to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ReconcileError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ReconcileError::InvalidService(_) => StatusCode::BAD_REQUEST,
            ReconcileError::PlatformUnavailable(_)
            | ReconcileError::ServiceRemoveFailed {
                source: PlatformError::Unavailable(_),
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            ReconcileError::ServiceCreateFailed {
                source: PlatformError::Conflict(_),
                ..
            } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = %status, "Request failed: {}", self.0);
        let body = ErrorBody {
            error: self.0.to_string(),
            transient: self.0.is_transient(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub name: String,
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkRemovedResponse {
    pub name: String,
    pub removed: bool,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Declared services
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.reconciler.list().await?))
}

/// Observed replica state per service
pub async fn list_service_states(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceState>>, ApiError> {
    Ok(Json(state.reconciler.list_states().await?))
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(service): Json<Service>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.reconciler.create(&service).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Batch delete; only `name` is read from each entry
pub async fn delete_services(
    State(state): State<AppState>,
    Json(services): Json<Vec<ServiceState>>,
) -> Result<Json<DeleteReport>, ApiError> {
    Ok(Json(state.reconciler.delete(&services).await?))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteReport>, ApiError> {
    Ok(Json(state.reconciler.delete_names(&[name]).await?))
}

pub async fn ensure_network(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<NetworkResponse>), ApiError> {
    let outcome = state.reconciler.networks().ensure(&name).await?;
    let status = match outcome {
        NetworkOutcome::Created { .. } => StatusCode::CREATED,
        NetworkOutcome::Existing { .. } => StatusCode::OK,
    };
    Ok((
        status,
        Json(NetworkResponse {
            name,
            created: outcome.was_created(),
        }),
    ))
}

pub async fn remove_network(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NetworkRemovedResponse>, ApiError> {
    let removed = state.reconciler.networks().remove(&name).await?;
    Ok(Json(NetworkRemovedResponse { name, removed }))
}

/// Create the Axum router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/v1/services",
            get(list_services)
                .post(create_service)
                .delete(delete_services),
        )
        .route("/v1/services/states", get(list_service_states))
        .route("/v1/services/{name}", axum::routing::delete(delete_service))
        .route(
            "/v1/networks/{name}",
            post(ensure_network).delete(remove_network),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{op, MemoryPlatform};
    use crate::reconcile::ReconcilerConfig;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_app() -> (Arc<MemoryPlatform>, Router) {
        let platform = Arc::new(MemoryPlatform::new());
        let state = AppState::new(platform.clone(), ReconcilerConfig::default());
        (platform, create_router(state))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_, app) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_service_endpoint() {
        let (platform, app) = create_test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/services",
                serde_json::json!({"name": "api", "image": "x:1", "replicas": 2}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(platform.service_by_name("api").is_some());
    }

    #[tokio::test]
    async fn test_create_invalid_service_is_bad_request() {
        let (_, app) = create_test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/services",
                serde_json::json!({"name": "api", "image": ""}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_when_platform_down_is_unavailable() {
        let (platform, app) = create_test_app();
        platform.fail(
            op::LIST_SERVICES,
            PlatformError::Unavailable("connection refused".to_string()),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/services")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_delete_missing_service_is_ok() {
        let (platform, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/services/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(platform.calls(op::REMOVE_SERVICE), 0);
    }

    #[tokio::test]
    async fn test_delete_when_platform_drops_is_unavailable() {
        let (platform, app) = create_test_app();
        let service = Service::new("api", "x:1");
        platform.add_service(
            "s1",
            crate::reconcile::build_service_spec(&service, "swarmctl-net"),
        );
        platform.fail_service_removal(
            "s1",
            PlatformError::Unavailable("connection reset".to_string()),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/services/api")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(body.error.contains("'api'"));
        assert!(body.transient);
    }

    #[tokio::test]
    async fn test_ensure_network_status_codes() {
        let (_, app) = create_test_app();

        let first = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/networks/backend")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let second = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/networks/backend")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(second.status(), StatusCode::OK);
    }
}
