use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    password::PasswordConfig,
    types::{LoginOutcome, LoginRequest, PublicUser, RegisterRequest, RegisteredUser},
};
use crate::session::TokenConfig;
use crate::shared::AppError;
use crate::user::{NewUser, UserRepository};
use crate::validation::{
    char_len_between, is_valid_email, is_valid_person_name, normalize_email, password_violations,
    Validator,
};

/// Service for registration, login and token verification
pub struct AuthService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
    password_config: PasswordConfig,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        token_config: TokenConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
            password_config,
        }
    }

    /// Registers a new parent account and returns its public identity
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisteredUser, AppError> {
        let name = request.name.trim().to_string();
        let email = normalize_email(&request.email);

        let mut validator = Validator::new();
        validator
            .check(
                char_len_between(&name, 2, 100),
                "name",
                "Name must be between 2 and 100 characters",
            )
            .check(
                is_valid_person_name(&name),
                "name",
                "Name contains invalid characters",
            )
            .check(is_valid_email(&email), "email", "Invalid email format");
        for violation in password_violations(&request.password) {
            validator.check(false, "password", violation);
        }
        validator.finish()?;

        // Checked before hashing to skip the expensive step; the UNIQUE
        // constraint still catches a concurrent registration
        if self.repository.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "Registration rejected, email already exists");
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = self.password_config.hash_off_thread(request.password).await?;

        let user = self
            .repository
            .create_user(&NewUser {
                name,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "New user registered");
        Ok(RegisteredUser::from(&user))
    }

    /// Checks credentials and issues a session token
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AppError> {
        let mut validator = Validator::new();
        validator
            .check(!request.email.trim().is_empty(), "email", "Email is required")
            .check(!request.password.is_empty(), "password", "Password is required");
        validator.finish()?;

        let email = normalize_email(&request.email);

        let user = match self.repository.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.password_config
                    .verify_dummy_off_thread(request.password)
                    .await?;
                warn!(email = %email, "Login failed, unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        let password_matches = self
            .password_config
            .verify_off_thread(request.password, user.password_hash.clone())
            .await?;
        if !password_matches {
            warn!(user_id = user.id, "Login failed, wrong password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = user.id, "Login failed, account inactive");
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .token_config
            .create_token(user.id, &user.email, &user.role)?;

        // Best effort: the response does not wait on the last-login stamp
        let repository = Arc::clone(&self.repository);
        let user_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = repository.record_login(user_id, Utc::now()).await {
                warn!(user_id, error = %e, "Failed to record last login");
            }
        });

        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome {
            token,
            user: PublicUser::from(&user),
        })
    }
}
