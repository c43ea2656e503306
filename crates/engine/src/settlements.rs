//! Settlements: computed payout batches for a merchant or a distributor over
//! an inclusive period.
//!
//! A settlement is created `pending`, and processing moves it through
//! `processing` to `completed` inside a single transaction. It never moves
//! backwards.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, Period, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Merchant,
    Distributor,
}

impl SettlementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Distributor => "distributor",
        }
    }

    /// Human-readable label used by exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Merchant => "Merchant",
            Self::Distributor => "Distributor",
        }
    }
}

impl TryFrom<&str> for SettlementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "merchant" => Ok(Self::Merchant),
            "distributor" => Ok(Self::Distributor),
            other => Err(EngineError::InvalidValue(format!(
                "invalid settlement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Processing,
    Completed,
}

impl SettlementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
        }
    }
}

impl TryFrom<&str> for SettlementStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidValue(format!(
                "invalid settlement status: {other}"
            ))),
        }
    }
}

/// The money side of a settlement.
///
/// Invariant: `fee_minor + actual_amount_minor == total_amount_minor`, and
/// `fee_minor == 0` for distributors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAmounts {
    pub total_amount_minor: i64,
    pub fee_minor: i64,
    pub actual_amount_minor: i64,
    pub item_count: i64,
}

impl SettlementAmounts {
    /// Merchant payout: the platform keeps `commission_rate_bps` of the
    /// completed orders total.
    pub fn merchant(total_amount_minor: i64, order_count: i64, commission_rate_bps: i32) -> Self {
        let fee_minor = Money::new(total_amount_minor)
            .apply_bps(commission_rate_bps)
            .minor();
        Self {
            total_amount_minor,
            fee_minor,
            actual_amount_minor: total_amount_minor - fee_minor,
            item_count: order_count,
        }
    }

    /// Distributor payout: the pending commissions, with no fee.
    pub fn distributor(total_amount_minor: i64, commission_count: i64) -> Self {
        Self {
            total_amount_minor,
            fee_minor: 0,
            actual_amount_minor: total_amount_minor,
            item_count: commission_count,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_amount_minor == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: i64,
    pub settlement_no: String,
    pub kind: SettlementKind,
    pub target_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount_minor: i64,
    pub fee_minor: i64,
    pub actual_amount_minor: i64,
    pub item_count: i64,
    pub status: SettlementStatus,
    pub operator_id: Option<i64>,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn period(&self) -> ResultEngine<Period> {
        Period::new(self.period_start, self.period_end)
    }

    pub fn amounts(&self) -> SettlementAmounts {
        SettlementAmounts {
            total_amount_minor: self.total_amount_minor,
            fee_minor: self.fee_minor,
            actual_amount_minor: self.actual_amount_minor,
            item_count: self.item_count,
        }
    }
}

/// A settlement with its target resolved to a display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDetail {
    pub settlement: Settlement,
    pub target_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub settlement_no: String,
    pub kind: String,
    pub target_id: i64,
    pub period_start: Date,
    pub period_end: Date,
    pub total_amount_minor: i64,
    pub fee_minor: i64,
    pub actual_amount_minor: i64,
    pub item_count: i64,
    pub status: String,
    pub operator_id: Option<i64>,
    pub settled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new_pending(
        settlement_no: String,
        kind: SettlementKind,
        target_id: i64,
        period: Period,
        amounts: SettlementAmounts,
        operator_id: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            settlement_no: ActiveValue::Set(settlement_no),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            target_id: ActiveValue::Set(target_id),
            period_start: ActiveValue::Set(period.start()),
            period_end: ActiveValue::Set(period.end()),
            total_amount_minor: ActiveValue::Set(amounts.total_amount_minor),
            fee_minor: ActiveValue::Set(amounts.fee_minor),
            actual_amount_minor: ActiveValue::Set(amounts.actual_amount_minor),
            item_count: ActiveValue::Set(amounts.item_count),
            status: ActiveValue::Set(SettlementStatus::Pending.as_str().to_string()),
            operator_id: ActiveValue::Set(Some(operator_id)),
            settled_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Settlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            settlement_no: model.settlement_no,
            kind: SettlementKind::try_from(model.kind.as_str())?,
            target_id: model.target_id,
            period_start: model.period_start,
            period_end: model.period_end,
            total_amount_minor: model.total_amount_minor,
            fee_minor: model.fee_minor,
            actual_amount_minor: model.actual_amount_minor,
            item_count: model.item_count,
            status: SettlementStatus::try_from(model.status.as_str())?,
            operator_id: model.operator_id,
            settled_at: model.settled_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_fee_is_commission_share() {
        let amounts = SettlementAmounts::merchant(10_000, 1, 1_000);
        assert_eq!(amounts.total_amount_minor, 10_000);
        assert_eq!(amounts.fee_minor, 1_000);
        assert_eq!(amounts.actual_amount_minor, 9_000);
        assert_eq!(amounts.item_count, 1);
    }

    #[test]
    fn merchant_amounts_always_balance() {
        for (total, bps) in [(0, 1_000), (1, 3_333), (999, 250), (123_457, 10_000), (77, 0)] {
            let amounts = SettlementAmounts::merchant(total, 3, bps);
            assert_eq!(
                amounts.fee_minor + amounts.actual_amount_minor,
                amounts.total_amount_minor
            );
        }
    }

    #[test]
    fn distributor_has_no_fee() {
        let amounts = SettlementAmounts::distributor(1_000, 4);
        assert_eq!(amounts.fee_minor, 0);
        assert_eq!(amounts.actual_amount_minor, 1_000);
        assert!(!amounts.is_zero());
        assert!(SettlementAmounts::distributor(0, 0).is_zero());
    }

    #[test]
    fn kind_and_status_parse_their_codes() {
        assert_eq!(
            SettlementKind::try_from("distributor").unwrap(),
            SettlementKind::Distributor
        );
        assert_eq!(
            SettlementStatus::try_from("processing").unwrap(),
            SettlementStatus::Processing
        );
        assert!(SettlementStatus::try_from("done").is_err());
    }
}
