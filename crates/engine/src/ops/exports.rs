use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    EngineError, ResultEngine, Settlement, WalletTransaction, WalletTransactionKind, Withdrawal,
    export, settlements, wallet_transactions, withdrawals,
};

use super::{
    Engine, settlements::ApplySettlementFilters, settlements::SettlementListFilter,
    withdrawals::ApplyWithdrawalFilters, withdrawals::WithdrawalListFilter,
};

/// Upper bound on the rows of a single export.
pub const EXPORT_ROW_LIMIT: u64 = 100_000;

/// Filters for the wallet transaction export; `[from, to)` on `created_at`.
#[derive(Clone, Debug, Default)]
pub struct TransactionExportFilter {
    pub user_id: Option<i64>,
    pub kind: Option<WalletTransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Engine {
    /// Settlements matching `filter`, newest first, as CSV.
    pub async fn export_settlements(&self, filter: &SettlementListFilter) -> ResultEngine<Vec<u8>> {
        filter.validate()?;
        let rows = settlements::Entity::find()
            .apply_settlement_filters(filter)
            .order_by_desc(settlements::Column::Id)
            .limit(EXPORT_ROW_LIMIT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Settlement::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(rows = rows.len(), "exporting settlements");
        export::settlements_csv(&rows)
    }

    /// Withdrawals matching `filter`, newest first, as CSV.
    pub async fn export_withdrawals(&self, filter: &WithdrawalListFilter) -> ResultEngine<Vec<u8>> {
        filter.validate()?;
        let rows = withdrawals::Entity::find()
            .apply_withdrawal_filters(filter)
            .order_by_desc(withdrawals::Column::Id)
            .limit(EXPORT_ROW_LIMIT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Withdrawal::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(rows = rows.len(), "exporting withdrawals");
        export::withdrawals_csv(&rows)
    }

    /// Wallet ledger entries matching `filter`, newest first, as CSV.
    pub async fn export_wallet_transactions(
        &self,
        filter: &TransactionExportFilter,
    ) -> ResultEngine<Vec<u8>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from >= to
        {
            return Err(EngineError::InvalidPeriod(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let mut query = wallet_transactions::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(wallet_transactions::Column::UserId.eq(user_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(wallet_transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(wallet_transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(wallet_transactions::Column::CreatedAt.lt(to));
        }

        let rows = query
            .order_by_desc(wallet_transactions::Column::Id)
            .limit(EXPORT_ROW_LIMIT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(WalletTransaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(rows = rows.len(), "exporting wallet transactions");
        export::wallet_transactions_csv(&rows)
    }
}
