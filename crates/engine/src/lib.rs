pub use batch::{BatchItem, BatchReport, ItemOutcome, SkipReason};
pub use commissions::CommissionStatus;
pub use distributors::DistributorBalance;
pub use error::{EngineError, ErrorKind};
pub use export::UTF8_BOM;
pub use merchants::MerchantStatus;
pub use money::Money;
pub use numbers::{
    NumberGenerator, SETTLEMENT_PREFIX, SequenceNumberGenerator, TimestampNumberGenerator,
};
pub use operators::Operator;
pub use ops::{
    ChannelShare, DailyRefund, DailyRevenue, EXPORT_ROW_LIMIT, Engine, EngineBuilder,
    OrderTypeRevenue, Overview, SettlementKindStats, SettlementListFilter, SettlementStats,
    StatusTotals, TransactionExportFilter, WithdrawalListFilter, WithdrawalSummary,
};
pub use orders::OrderStatus;
pub use payments::PaymentStatus;
pub use period::{MAX_REPORT_DAYS, Period};
pub use settlements::{
    Settlement, SettlementAmounts, SettlementDetail, SettlementKind, SettlementStatus,
};
pub use user_wallets::WalletBalance;
pub use wallet_transactions::{WalletTransaction, WalletTransactionKind};
pub use withdrawals::{Withdrawal, WithdrawalAction, WithdrawalKind, WithdrawalStatus};

mod batch;
mod commissions;
mod devices;
mod distributors;
mod error;
mod export;
mod merchants;
mod money;
mod numbers;
mod operators;
mod ops;
mod orders;
mod payments;
mod period;
mod refunds;
mod settlements;
mod user_wallets;
mod users;
mod venues;
mod wallet_transactions;
mod withdrawals;

pub type ResultEngine<T> = Result<T, EngineError>;
