use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

use kidguard::{
    auth::PasswordConfig, build_router, child::repository::SqliteChildRepository,
    session::TokenConfig, user::SqliteUserRepository, AppConfig, AppState, DbConnection,
};

const TEST_SECRET: &str = "integration-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub db: DbConnection,
}

pub struct TestSetupBuilder {
    expiration_days: i64,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self { expiration_days: 7 }
    }

    /// Negative values issue tokens that are already expired
    pub fn with_expiration_days(mut self, days: i64) -> Self {
        self.expiration_days = days;
        self
    }

    pub async fn build(self) -> TestSetup {
        let db = DbConnection::in_memory().await.unwrap();

        let state = AppState::new(
            Arc::new(SqliteUserRepository::new(&db)),
            Arc::new(SqliteChildRepository::new(&db)),
            TokenConfig::new(TEST_SECRET, self.expiration_days),
            // Cheapest Argon2 parameters, hashing is not under test here
            PasswordConfig::new(8, 1).unwrap(),
        );

        let config = AppConfig {
            static_dir: PathBuf::from("/nonexistent/kidguard/dist"),
            ..AppConfig::default()
        };
        let app = build_router(state, &config).unwrap();

        TestSetup { app, db }
    }
}
