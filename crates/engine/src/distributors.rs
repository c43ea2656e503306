//! Distributors and their commission balance.
//!
//! The balance is split into three buckets:
//! - `available_commission_minor`: withdrawable
//! - `frozen_commission_minor`: reserved by pending withdrawals
//! - `withdrawn_commission_minor`: paid out
//!
//! Every change is a delta update (`col = col + x`) inside a transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorBalance {
    pub distributor_id: i64,
    pub user_id: i64,
    pub available_commission_minor: i64,
    pub frozen_commission_minor: i64,
    pub withdrawn_commission_minor: i64,
    pub total_commission_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "distributors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub level: i32,
    pub available_commission_minor: i64,
    pub frozen_commission_minor: i64,
    pub withdrawn_commission_minor: i64,
    pub total_commission_minor: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commissions::Entity")]
    Commissions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commissions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DistributorBalance {
    fn from(model: Model) -> Self {
        Self {
            distributor_id: model.id,
            user_id: model.user_id,
            available_commission_minor: model.available_commission_minor,
            frozen_commission_minor: model.frozen_commission_minor,
            withdrawn_commission_minor: model.withdrawn_commission_minor,
            total_commission_minor: model.total_commission_minor,
        }
    }
}
