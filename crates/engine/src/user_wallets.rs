//! User wallet balance: `balance_minor` (spendable), `frozen_balance_minor`
//! (reserved by pending withdrawals) and `total_withdrawn_minor`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub user_id: i64,
    pub balance_minor: i64,
    pub frozen_balance_minor: i64,
    pub total_withdrawn_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub balance_minor: i64,
    pub frozen_balance_minor: i64,
    pub total_withdrawn_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WalletBalance {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            balance_minor: model.balance_minor,
            frozen_balance_minor: model.frozen_balance_minor,
            total_withdrawn_minor: model.total_withdrawn_minor,
        }
    }
}
