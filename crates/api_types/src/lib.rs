use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod settlement {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementKind {
        Merchant,
        Distributor,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementStatus {
        Pending,
        Processing,
        Completed,
    }

    /// Request body for creating one settlement.
    ///
    /// `period_start` and `period_end` are both inclusive calendar dates.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub kind: SettlementKind,
        pub target_id: i64,
        pub period_start: NaiveDate,
        pub period_end: NaiveDate,
    }

    /// Request body for generating settlements for every eligible target.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementGenerate {
        pub kind: SettlementKind,
        pub period_start: NaiveDate,
        pub period_end: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SettlementList {
        pub kind: Option<SettlementKind>,
        pub status: Option<SettlementStatus>,
        pub target_id: Option<i64>,
        /// RFC3339 lower bound on `created_at` (inclusive).
        pub from: Option<DateTime<Utc>>,
        /// RFC3339 upper bound on `created_at` (exclusive).
        pub to: Option<DateTime<Utc>>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementDetailView {
        #[serde(flatten)]
        pub settlement: SettlementView,
        /// Merchant name, or distributor nickname with its id.
        pub target_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementListResponse {
        pub settlements: Vec<SettlementView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementKindStatsView {
        pub pending_count: i64,
        pub pending_amount_minor: i64,
        pub completed_count: i64,
        pub completed_amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementStatsView {
        pub merchant: SettlementKindStatsView,
        pub distributor: SettlementKindStatsView,
    }
}

pub mod withdrawal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WithdrawalKind {
        Wallet,
        Commission,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WithdrawalStatus {
        Pending,
        Approved,
        Processing,
        Success,
        Rejected,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WithdrawalList {
        pub kind: Option<WithdrawalKind>,
        pub status: Option<WithdrawalStatus>,
        pub user_id: Option<i64>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalView {
        pub id: i64,
        pub withdrawal_no: String,
        pub user_id: i64,
        pub kind: WithdrawalKind,
        pub amount_minor: i64,
        pub fee_minor: i64,
        pub actual_amount_minor: i64,
        pub channel: String,
        pub account_info: Option<String>,
        pub status: WithdrawalStatus,
        pub reject_reason: Option<String>,
        pub operator_id: Option<i64>,
        pub created_at: DateTime<Utc>,
        pub processed_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalListResponse {
        pub withdrawals: Vec<WithdrawalView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalReject {
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchIds {
        pub ids: Vec<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchReject {
        pub ids: Vec<i64>,
        pub reason: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct StatusTotalsView {
        pub count: i64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalSummaryView {
        pub pending: StatusTotalsView,
        pub approved: StatusTotalsView,
        pub processing: StatusTotalsView,
        pub success: StatusTotalsView,
        pub rejected: StatusTotalsView,
        pub total: StatusTotalsView,
    }
}

pub mod batch {
    use super::*;

    /// What happened to one item of a batch.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "outcome", rename_all = "snake_case")]
    pub enum BatchItemView<T> {
        Done { id: i64, value: T },
        Skipped { id: i64, reason: String },
        Failed { id: i64, kind: String, message: String },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchResponse<T> {
        pub succeeded: usize,
        pub skipped: usize,
        pub failed: usize,
        pub items: Vec<BatchItemView<T>>,
    }
}

pub mod report {
    use super::*;

    /// Inclusive calendar date range.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DateRange {
        pub start: NaiveDate,
        pub end: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyRevenueView {
        pub date: NaiveDate,
        pub revenue_minor: i64,
        pub order_count: i64,
        pub refund_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyRefundView {
        pub date: NaiveDate,
        pub amount_minor: i64,
        pub count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderTypeRevenueView {
        pub order_type: String,
        pub revenue_minor: i64,
        pub order_count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChannelShareView {
        pub channel: String,
        pub amount_minor: i64,
        pub count: i64,
        pub percentage: f64,
    }
}

pub mod overview {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewView {
        pub today_revenue_minor: i64,
        pub month_revenue_minor: i64,
        pub last_month_revenue_minor: i64,
        /// Month-over-month growth, in percent.
        pub growth_rate: f64,
        pub total_revenue_minor: i64,
        pub total_refund_minor: i64,
        pub total_commission_minor: i64,
        pub net_profit_minor: i64,
        pub pending_withdrawal_count: i64,
        pub pending_withdrawal_amount_minor: i64,
        pub pending_settlement_count: i64,
    }
}

pub mod export {
    use super::*;
    use crate::{settlement, withdrawal};

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SettlementExport {
        pub kind: Option<settlement::SettlementKind>,
        pub status: Option<settlement::SettlementStatus>,
        pub target_id: Option<i64>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WithdrawalExport {
        pub kind: Option<withdrawal::WithdrawalKind>,
        pub status: Option<withdrawal::WithdrawalStatus>,
        pub user_id: Option<i64>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletTransactionKind {
        Recharge,
        Consume,
        Refund,
        Withdraw,
        Commission,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionExport {
        pub user_id: Option<i64>,
        pub kind: Option<WalletTransactionKind>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }
}
