use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::ChildService,
    types::{ChildListResponse, ChildRequest, ChildResponse, DeleteChildResponse},
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppJson, AppPath, AppState};

fn child_service(state: &AppState) -> ChildService {
    ChildService::new(Arc::clone(&state.child_repository))
}

/// HTTP handler for listing the caller's children
///
/// GET /api/children
#[instrument(name = "list_children", skip(state, claims), fields(user_id = claims.id))]
pub async fn list_children(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ChildListResponse>, AppError> {
    let children = child_service(&state).list_children(claims.id).await?;

    info!(child_count = children.len(), "Children listed successfully");

    Ok(Json(ChildListResponse {
        success: true,
        children,
    }))
}

/// POST /api/children
#[instrument(name = "add_child", skip(state, claims, request), fields(user_id = claims.id))]
pub async fn add_child(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    AppJson(request): AppJson<ChildRequest>,
) -> Result<(StatusCode, Json<ChildResponse>), AppError> {
    let child = child_service(&state)
        .create_child(claims.id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChildResponse {
            success: true,
            message: "Child added successfully".to_string(),
            child,
        }),
    ))
}

/// PUT /api/children/:id
#[instrument(name = "update_child", skip(state, claims, request), fields(user_id = claims.id))]
pub async fn update_child(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    AppPath(child_id): AppPath<i64>,
    AppJson(request): AppJson<ChildRequest>,
) -> Result<Json<ChildResponse>, AppError> {
    let child = child_service(&state)
        .update_child(claims.id, child_id, request)
        .await?;

    Ok(Json(ChildResponse {
        success: true,
        message: "Child updated successfully".to_string(),
        child,
    }))
}

/// DELETE /api/children/:id
#[instrument(name = "delete_child", skip(state, claims), fields(user_id = claims.id))]
pub async fn delete_child(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    AppPath(child_id): AppPath<i64>,
) -> Result<Json<DeleteChildResponse>, AppError> {
    child_service(&state)
        .delete_child(claims.id, child_id)
        .await?;

    Ok(Json(DeleteChildResponse {
        success: true,
        message: "Child deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::child::repository::InMemoryChildRepository;
    use crate::session::{jwt_auth, TokenConfig};
    use crate::shared::test_utils::{AppStateBuilder, TEST_SECRET};
    use axum::{
        body::Body,
        http::Request,
        middleware,
        routing::{get, put},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn children_router(repo: Arc<InMemoryChildRepository>) -> Router {
        let app_state = AppStateBuilder::new().with_child_repository(repo).build();

        Router::new()
            .route("/children", get(list_children).post(add_child))
            .route("/children/:id", put(update_child).delete(delete_child))
            .route_layer(middleware::from_fn_with_state(app_state.clone(), jwt_auth))
            .with_state(app_state)
    }

    fn token_for(user_id: i64) -> String {
        TokenConfig::new(TEST_SECRET, 7)
            .create_token(user_id, &format!("parent{}@x.com", user_id), "parent")
            .unwrap()
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token));
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn kid() -> Value {
        json!({"name": "Kid", "age": 10, "avatar": "K", "age_group": "10-13"})
    }

    #[tokio::test]
    async fn test_add_and_list_children() {
        let app = children_router(Arc::new(InMemoryChildRepository::new()));
        let token = token_for(1);

        let (status, body) = send(&app, "POST", "/children", Some(kid()), &token).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["child"]["name"], "Kid");
        assert_eq!(body["child"]["age_group"], "10-13");
        assert_eq!(body["child"]["user_id"], 1);

        let (status, body) = send(&app, "GET", "/children", None, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["children"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_child_validation_error() {
        let repo = Arc::new(InMemoryChildRepository::new());
        let app = children_router(repo.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/children",
            Some(json!({"name": "K", "age": 30, "avatar": "", "age_group": "adult"})),
            &token_for(1),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"].as_array().unwrap().len(), 4);
        assert_eq!(repo.child_count(), 0);
    }

    #[tokio::test]
    async fn test_update_child() {
        let app = children_router(Arc::new(InMemoryChildRepository::new()));
        let token = token_for(1);
        let (_, body) = send(&app, "POST", "/children", Some(kid()), &token).await;
        let id = body["child"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/children/{}", id),
            Some(json!({"name": "Kid", "age": 14, "avatar": "K", "age_group": "14-17"})),
            &token,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["child"]["id"], id);
        assert_eq!(body["child"]["age"], 14);
        assert_eq!(body["child"]["age_group"], "14-17");
    }

    #[tokio::test]
    async fn test_other_parent_gets_not_found() {
        let repo = Arc::new(InMemoryChildRepository::new());
        let app = children_router(repo.clone());
        let (_, body) = send(&app, "POST", "/children", Some(kid()), &token_for(1)).await;
        let uri = format!("/children/{}", body["child"]["id"].as_i64().unwrap());
        let intruder = token_for(2);

        let (status, update_body) = send(&app, "PUT", &uri, Some(kid()), &intruder).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, delete_body) = send(&app, "DELETE", &uri, None, &intruder).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, missing_body) = send(&app, "DELETE", "/children/9999", None, &intruder).await;
        assert_eq!(delete_body["error"], missing_body["error"]);
        assert_eq!(update_body["error"], missing_body["error"]);

        assert_eq!(repo.child_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_child() {
        let app = children_router(Arc::new(InMemoryChildRepository::new()));
        let token = token_for(1);
        let (_, body) = send(&app, "POST", "/children", Some(kid()), &token).await;
        let uri = format!("/children/{}", body["child"]["id"].as_i64().unwrap());

        let (status, body) = send(&app, "DELETE", &uri, None, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = send(&app, "DELETE", &uri, None, &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_validation_error() {
        let app = children_router(Arc::new(InMemoryChildRepository::new()));

        let (status, body) = send(&app, "DELETE", "/children/abc", None, &token_for(1)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_children_require_token() {
        let app = children_router(Arc::new(InMemoryChildRepository::new()));

        let request = Request::builder()
            .uri("/children")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
