use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::record_hooks;

// No foreign key to users: a token whose owner is gone fails at redemption.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub token: String,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub user_email: String,
    pub expires_at: DateTimeWithTimeZone,
}

impl ActiveModelBehavior for ActiveModel {}

record_hooks!();
