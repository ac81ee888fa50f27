use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::record_hooks;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    #[sea_orm(indexed)]
    pub name: Option<String>,
    pub role: String,
    pub picture: Option<String>,
    #[sea_orm(indexed)]
    pub facebook_id: Option<String>,
    #[sea_orm(indexed)]
    pub google_id: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}

record_hooks!();
