use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{
        CurrentUserResponse, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest,
        RegisterResponse, VerifyResponse,
    },
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppJson, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
        state.password_config.clone(),
    )
}

/// HTTP handler for registering a parent account
///
/// POST /api/auth/register
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = auth_service(&state).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// HTTP handler for logging in
///
/// POST /api/auth/login
/// Returns a JWT token plus the public user fields
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = auth_service(&state).login(request).await?;

    Ok(Json(LoginResponse {
        success: true,
        token: outcome.token,
        user: outcome.user,
    }))
}

/// GET /api/auth/verify
/// The middleware has already validated the token by the time this runs.
#[instrument(name = "verify", skip(claims))]
pub async fn verify(Extension(claims): Extension<SessionClaims>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: claims,
    })
}

/// GET /api/auth/user
pub async fn current_user(Extension(claims): Extension<SessionClaims>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        user: claims,
    })
}

/// POST /api/auth/logout
/// Tokens are stateless, so logging out is the client discarding its token.
#[instrument(name = "logout", skip(claims))]
pub async fn logout(Extension(claims): Extension<SessionClaims>) -> Json<LogoutResponse> {
    info!(user_id = claims.id, "User logged out");

    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}
