pub mod bootstrap;
pub mod guards;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod providers;
pub mod tokens;
mod types;

pub use guards::AuthUser;
pub use policy::{Policy, authorize};
pub use types::{Claims, Role, TokenBundle};
