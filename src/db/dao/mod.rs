pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod password_reset_token_dao;
pub mod refresh_token_dao;
pub mod user_dao;

pub use base::{ColumnFilter, DaoBase, FilterOp, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use password_reset_token_dao::PasswordResetTokenDao;
pub use refresh_token_dao::RefreshTokenDao;
pub use user_dao::{UserChanges, UserDao, UserFields, UserListFilter};
