// Public API - what other modules can use
pub use handlers::{add_child, delete_child, list_children, update_child};
pub use service::ChildService;

pub mod models;
pub mod repository;
pub mod types;

// Internal modules
mod handlers;
mod service;
