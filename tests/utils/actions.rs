use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

/// Status plus decoded JSON body of one request
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn child_payload(name: &str, age: i64, avatar: &str, age_group: &str) -> Value {
    json!({
        "name": name,
        "age": age,
        "avatar": avatar,
        "age_group": age_group,
    })
}

// ============================================================================
// Request Actions
// ============================================================================

impl TestSetup {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        ApiResponse {
            status,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResponse {
        self.send(
            "POST",
            "/api/auth/register",
            Some(json!({"name": name, "email": email, "password": password})),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse {
        self.send(
            "POST",
            "/api/auth/login",
            Some(json!({"email": email, "password": password})),
            None,
        )
        .await
    }

    /// Registers and logs in, returning the bearer token
    pub async fn register_and_login(&self, name: &str, email: &str) -> String {
        let password = "Passw0rd!";
        let registered = self.register(name, email, password).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let logged_in = self.login(email, password).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.body);
        logged_in.body["token"].as_str().unwrap().to_string()
    }

    pub async fn list_children(&self, token: &str) -> ApiResponse {
        self.send("GET", "/api/children", None, Some(token)).await
    }

    pub async fn add_child(&self, token: &str, payload: Value) -> ApiResponse {
        self.send("POST", "/api/children", Some(payload), Some(token))
            .await
    }

    pub async fn update_child(&self, token: &str, child_id: i64, payload: Value) -> ApiResponse {
        self.send(
            "PUT",
            &format!("/api/children/{}", child_id),
            Some(payload),
            Some(token),
        )
        .await
    }

    pub async fn delete_child(&self, token: &str, child_id: i64) -> ApiResponse {
        self.send(
            "DELETE",
            &format!("/api/children/{}", child_id),
            None,
            Some(token),
        )
        .await
    }
}
