//! Per-order distributor earnings.
//!
//! A commission starts `pending` and becomes `settled` when the distributor
//! settlement covering its creation date is processed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Settled,
}

impl CommissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
        }
    }
}

impl TryFrom<&str> for CommissionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "settled" => Ok(Self::Settled),
            other => Err(EngineError::InvalidValue(format!(
                "invalid commission status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub distributor_id: i64,
    pub order_id: i64,
    pub amount_minor: i64,
    pub rate_bps: i32,
    pub status: String,
    pub settlement_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub settled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::distributors::Entity",
        from = "Column::DistributorId",
        to = "super::distributors::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Distributors,
}

impl Related<super::distributors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Distributors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
