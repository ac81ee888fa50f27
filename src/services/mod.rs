pub mod auth_service;
pub mod context;
pub mod password_reset_service;
pub mod token_service;
pub mod user_service;

pub use context::ServiceContext;
