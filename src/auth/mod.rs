// Public API - what other modules can use
pub use handlers::{current_user, login, logout, register, verify};
pub use password::PasswordConfig;
pub use service::AuthService;

// Internal modules
mod handlers;
mod password;
mod service;
pub mod types;
