//! Append-only audit trail of money movements per user.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    Recharge,
    Consume,
    Refund,
    Withdraw,
    Commission,
}

impl WalletTransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::Consume => "consume",
            Self::Refund => "refund",
            Self::Withdraw => "withdraw",
            Self::Commission => "commission",
        }
    }

    /// Human-readable label used by exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Recharge => "Recharge",
            Self::Consume => "Consumption",
            Self::Refund => "Refund",
            Self::Withdraw => "Withdrawal",
            Self::Commission => "Commission",
        }
    }
}

impl TryFrom<&str> for WalletTransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "recharge" => Ok(Self::Recharge),
            "consume" => Ok(Self::Consume),
            "refund" => Ok(Self::Refund),
            "withdraw" => Ok(Self::Withdraw),
            "commission" => Ok(Self::Commission),
            other => Err(EngineError::InvalidValue(format!(
                "invalid wallet transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: WalletTransactionKind,
    pub amount_minor: i64,
    pub reference_no: Option<String>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub amount_minor: i64,
    pub reference_no: Option<String>,
    pub remark: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new_entry(
        user_id: i64,
        kind: WalletTransactionKind,
        amount_minor: i64,
        reference_no: Option<String>,
        remark: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(amount_minor),
            reference_no: ActiveValue::Set(reference_no),
            remark: ActiveValue::Set(remark),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: WalletTransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            reference_no: model.reference_no,
            remark: model.remark,
            created_at: model.created_at,
        })
    }
}
