//! Withdrawal requests and their audit lifecycle.
//!
//! ```text
//! pending ──approve──> approved ──process──> processing ──complete──> success
//!    │                    └──────────────complete──────────────────────┘
//!    └──reject──> rejected
//! ```
//!
//! The requested `amount_minor` is frozen when the request is created (by
//! the user-facing service). Rejecting releases it back to the available
//! bucket; completing burns it from the frozen bucket and books
//! `actual_amount_minor` as withdrawn.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalKind {
    /// Cash out of the user wallet balance.
    Wallet,
    /// Cash out of a distributor's commission.
    Commission,
}

impl WithdrawalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Commission => "commission",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wallet => "Wallet balance",
            Self::Commission => "Commission",
        }
    }
}

impl TryFrom<&str> for WithdrawalKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "wallet" => Ok(Self::Wallet),
            "commission" => Ok(Self::Commission),
            other => Err(EngineError::InvalidValue(format!(
                "invalid withdrawal kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Processing,
    Success,
    Rejected,
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Processing,
        Self::Success,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending review",
            Self::Approved => "Approved",
            Self::Processing => "Paying out",
            Self::Success => "Paid",
            Self::Rejected => "Rejected",
        }
    }
}

impl TryFrom<&str> for WithdrawalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidValue(format!(
                "invalid withdrawal status: {other}"
            ))),
        }
    }
}

/// The audit actions, with the statuses each one may start from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawalAction {
    Approve,
    Reject,
    Process,
    Complete,
}

impl WithdrawalAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Process => "process",
            Self::Complete => "complete",
        }
    }

    /// Statuses the action accepts.
    ///
    /// `Complete` also accepts `approved`, so the "mark processing" step can
    /// be skipped.
    pub fn allowed_from(self) -> &'static [WithdrawalStatus] {
        match self {
            Self::Approve | Self::Reject => &[WithdrawalStatus::Pending],
            Self::Process => &[WithdrawalStatus::Approved],
            Self::Complete => &[WithdrawalStatus::Processing, WithdrawalStatus::Approved],
        }
    }

    pub fn target(self) -> WithdrawalStatus {
        match self {
            Self::Approve => WithdrawalStatus::Approved,
            Self::Reject => WithdrawalStatus::Rejected,
            Self::Process => WithdrawalStatus::Processing,
            Self::Complete => WithdrawalStatus::Success,
        }
    }

    pub fn check(self, withdrawal: &Withdrawal) -> Result<(), EngineError> {
        if self.allowed_from().contains(&withdrawal.status) {
            return Ok(());
        }
        Err(EngineError::WithdrawalStatus(format!(
            "cannot {} withdrawal {} in status {}",
            self.as_str(),
            withdrawal.withdrawal_no,
            withdrawal.status.as_str()
        )))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub withdrawal_no: String,
    pub user_id: i64,
    pub kind: WithdrawalKind,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub actual_amount_minor: i64,
    pub channel: String,
    /// Encrypted payout account; opaque to the ledger.
    pub account_info: Option<String>,
    pub status: WithdrawalStatus,
    pub reject_reason: Option<String>,
    pub operator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub withdrawal_no: String,
    pub user_id: i64,
    pub kind: String,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub actual_amount_minor: i64,
    pub channel: String,
    pub account_info: Option<String>,
    pub status: String,
    pub reject_reason: Option<String>,
    pub operator_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Withdrawal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            withdrawal_no: model.withdrawal_no,
            user_id: model.user_id,
            kind: WithdrawalKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            fee_minor: model.fee_minor,
            actual_amount_minor: model.actual_amount_minor,
            channel: model.channel,
            account_info: model.account_info,
            status: WithdrawalStatus::try_from(model.status.as_str())?,
            reject_reason: model.reject_reason,
            operator_id: model.operator_id,
            created_at: model.created_at,
            processed_at: model.processed_at,
        })
    }
}
