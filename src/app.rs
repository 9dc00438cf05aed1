use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{self, PasswordConfig};
use crate::child::{self, repository::SqliteChildRepository};
use crate::config::AppConfig;
use crate::db::DbConnection;
use crate::session::{jwt_auth, TokenConfig};
use crate::shared::{AppError, AppState};
use crate::user::SqliteUserRepository;

/// Wires the SQLite repositories and the token/password settings into shared state
pub fn sqlite_state(db: &DbConnection, config: &AppConfig) -> Result<AppState, AppError> {
    let password_config = PasswordConfig::new(
        config.password_hash_memory_kib,
        config.password_hash_iterations,
    )?;

    Ok(AppState::new(
        Arc::new(SqliteUserRepository::new(db)),
        Arc::new(SqliteChildRepository::new(db)),
        TokenConfig::new(config.jwt_secret.clone(), config.jwt_expiration_days),
        password_config,
    ))
}

/// Builds the full application router: `/api` routes, CORS, tracing and the
/// non-API surface
pub fn build_router(state: AppState, config: &AppConfig) -> Result<Router, AppError> {
    let app = Router::new().nest("/api", api_routes(state.clone()));

    let app = if config.static_dir.is_dir() {
        info!(dir = %config.static_dir.display(), "Serving static frontend");
        let index = config.static_dir.join("index.html");
        app.fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)))
    } else {
        warn!(
            dir = %config.static_dir.display(),
            "Static directory not found, serving API only"
        );
        app.route("/", get(root))
    };

    Ok(app
        .layer(cors_layer(&config.frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn api_routes(state: AppState) -> Router<AppState> {
    let public_auth = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let protected_auth = Router::new()
        .route("/verify", get(auth::verify))
        .route("/user", get(auth::current_user))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    let children = Router::new()
        .route("/", get(child::list_children).post(child::add_child))
        .route("/:id", put(child::update_child).delete(child::delete_child))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth));

    Router::new()
        .nest("/auth", public_auth.merge(protected_auth))
        .nest("/children", children)
        .fallback(api_not_found)
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Config(format!("Invalid FRONTEND_URL {:?}: {}", frontend_url, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "KidGuard API is running",
    }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
