// Library crate for the KidGuard backend
// This file exposes the public API for integration tests

pub mod app;
pub mod auth;
pub mod child;
pub mod config;
pub mod db;
pub mod session;
pub mod shared;
pub mod user;
pub mod validation;

// Re-export commonly used types for easier access in tests
pub use app::{build_router, sqlite_state};
pub use config::AppConfig;
pub use db::DbConnection;
pub use shared::{AppError, AppState};
