use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, Value,
    prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    BatchReport, EngineError, ResultEngine, WalletBalance, WalletTransactionKind, Withdrawal,
    WithdrawalAction, WithdrawalKind, WithdrawalStatus, distributors, user_wallets,
    wallet_transactions, withdrawals,
};

use super::{Engine, clamp_limit, decode_cursor, encode_cursor, keyed_sum_count, with_tx};

/// Filters for listing withdrawals.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`) on `created_at`.
#[derive(Clone, Debug, Default)]
pub struct WithdrawalListFilter {
    pub kind: Option<WithdrawalKind>,
    pub status: Option<WithdrawalStatus>,
    pub user_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl WithdrawalListFilter {
    pub(super) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(EngineError::InvalidPeriod(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(())
    }
}

pub(super) trait ApplyWithdrawalFilters: QueryFilter + Sized {
    fn apply_withdrawal_filters(self, filter: &WithdrawalListFilter) -> Self;
}

impl<T> ApplyWithdrawalFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_withdrawal_filters(mut self, filter: &WithdrawalListFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(withdrawals::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            self = self.filter(withdrawals::Column::Status.eq(status.as_str()));
        }
        if let Some(user_id) = filter.user_id {
            self = self.filter(withdrawals::Column::UserId.eq(user_id));
        }
        if let Some(from) = filter.from {
            self = self.filter(withdrawals::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(withdrawals::Column::CreatedAt.lt(to));
        }
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub count: i64,
    pub amount_minor: i64,
}

impl StatusTotals {
    fn add(&mut self, other: StatusTotals) {
        self.count += other.count;
        self.amount_minor += other.amount_minor;
    }
}

/// Withdrawal counts and requested amounts per audit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalSummary {
    pub pending: StatusTotals,
    pub approved: StatusTotals,
    pub processing: StatusTotals,
    pub success: StatusTotals,
    pub rejected: StatusTotals,
    pub total: StatusTotals,
}

impl WithdrawalSummary {
    pub fn get(&self, status: WithdrawalStatus) -> StatusTotals {
        match status {
            WithdrawalStatus::Pending => self.pending,
            WithdrawalStatus::Approved => self.approved,
            WithdrawalStatus::Processing => self.processing,
            WithdrawalStatus::Success => self.success,
            WithdrawalStatus::Rejected => self.rejected,
        }
    }

    fn get_mut(&mut self, status: WithdrawalStatus) -> &mut StatusTotals {
        match status {
            WithdrawalStatus::Pending => &mut self.pending,
            WithdrawalStatus::Approved => &mut self.approved,
            WithdrawalStatus::Processing => &mut self.processing,
            WithdrawalStatus::Success => &mut self.success,
            WithdrawalStatus::Rejected => &mut self.rejected,
        }
    }
}

impl Engine {
    /// `pending → approved`. No funds move.
    pub async fn approve_withdrawal(
        &self,
        withdrawal_id: i64,
        operator_id: i64,
    ) -> ResultEngine<Withdrawal> {
        self.audit_withdrawal(withdrawal_id, WithdrawalAction::Approve, operator_id, None)
            .await
    }

    /// `pending → rejected`, releasing the frozen amount back to the
    /// available bucket it came from.
    pub async fn reject_withdrawal(
        &self,
        withdrawal_id: i64,
        operator_id: i64,
        reason: &str,
    ) -> ResultEngine<Withdrawal> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::InvalidValue(
                "a reject reason is required".to_string(),
            ));
        }
        self.audit_withdrawal(
            withdrawal_id,
            WithdrawalAction::Reject,
            operator_id,
            Some(reason),
        )
        .await
    }

    /// `approved → processing`: the payout has been handed to the channel.
    pub async fn process_withdrawal(
        &self,
        withdrawal_id: i64,
        operator_id: i64,
    ) -> ResultEngine<Withdrawal> {
        self.audit_withdrawal(withdrawal_id, WithdrawalAction::Process, operator_id, None)
            .await
    }

    /// `processing | approved → success`.
    ///
    /// Burns the requested amount from the frozen bucket, books the actual
    /// amount as withdrawn and appends a `withdraw` wallet transaction.
    pub async fn complete_withdrawal(
        &self,
        withdrawal_id: i64,
        operator_id: i64,
    ) -> ResultEngine<Withdrawal> {
        self.audit_withdrawal(withdrawal_id, WithdrawalAction::Complete, operator_id, None)
            .await
    }

    pub async fn batch_approve_withdrawals(
        &self,
        withdrawal_ids: &[i64],
        operator_id: i64,
    ) -> BatchReport<Withdrawal> {
        let mut report = BatchReport::default();
        for &id in withdrawal_ids {
            let outcome = self.approve_withdrawal(id, operator_id).await;
            record(&mut report, WithdrawalAction::Approve, id, outcome);
        }
        report
    }

    pub async fn batch_reject_withdrawals(
        &self,
        withdrawal_ids: &[i64],
        operator_id: i64,
        reason: &str,
    ) -> BatchReport<Withdrawal> {
        let mut report = BatchReport::default();
        for &id in withdrawal_ids {
            let outcome = self.reject_withdrawal(id, operator_id, reason).await;
            record(&mut report, WithdrawalAction::Reject, id, outcome);
        }
        report
    }

    pub async fn batch_complete_withdrawals(
        &self,
        withdrawal_ids: &[i64],
        operator_id: i64,
    ) -> BatchReport<Withdrawal> {
        let mut report = BatchReport::default();
        for &id in withdrawal_ids {
            let outcome = self.complete_withdrawal(id, operator_id).await;
            record(&mut report, WithdrawalAction::Complete, id, outcome);
        }
        report
    }

    /// Counts and requested amounts per status, over an optional
    /// `[from, to)` window on `created_at`.
    pub async fn withdrawal_summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<WithdrawalSummary> {
        if let (Some(from), Some(to)) = (from, to)
            && from >= to
        {
            return Err(EngineError::InvalidPeriod(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let mut sql = String::from(
            "SELECT status AS key, COALESCE(SUM(amount_minor), 0) AS total, COUNT(id) AS items \
             FROM withdrawals WHERE 1 = 1",
        );
        let mut values: Vec<Value> = Vec::new();
        if let Some(from) = from {
            sql.push_str(" AND created_at >= ?");
            values.push(from.into());
        }
        if let Some(to) = to {
            sql.push_str(" AND created_at < ?");
            values.push(to.into());
        }
        sql.push_str(" GROUP BY status");

        let mut summary = WithdrawalSummary::default();
        for row in keyed_sum_count(&self.database, &sql, values).await? {
            let status = WithdrawalStatus::try_from(row.key.as_str())?;
            let totals = StatusTotals {
                count: row.items,
                amount_minor: row.total,
            };
            summary.get_mut(status).add(totals);
            summary.total.add(totals);
        }
        Ok(summary)
    }

    /// Return a withdrawal by id.
    pub async fn withdrawal(&self, withdrawal_id: i64) -> ResultEngine<Withdrawal> {
        withdrawals::Entity::find_by_id(withdrawal_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::WithdrawalNotFound(withdrawal_id.to_string()))
            .and_then(Withdrawal::try_from)
    }

    /// Lists withdrawals newest first, with cursor-based pagination.
    pub async fn list_withdrawals_page(
        &self,
        filter: &WithdrawalListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Withdrawal>, Option<String>)> {
        filter.validate()?;
        let limit = clamp_limit(limit);

        let mut query = withdrawals::Entity::find()
            .apply_withdrawal_filters(filter)
            .order_by_desc(withdrawals::Column::Id)
            .limit(limit.saturating_add(1));
        if let Some(cursor) = cursor {
            query = query.filter(withdrawals::Column::Id.lt(decode_cursor(cursor)?));
        }

        let models = query.all(&self.database).await?;
        let has_more = models.len() > limit as usize;
        let items = models
            .into_iter()
            .take(limit as usize)
            .map(Withdrawal::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = match items.last() {
            Some(last) if has_more => Some(encode_cursor(last.id)?),
            _ => None,
        };
        Ok((items, next_cursor))
    }

    /// Return the wallet buckets of a user.
    pub async fn wallet_balance(&self, user_id: i64) -> ResultEngine<WalletBalance> {
        user_wallets::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(WalletBalance::from)
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))
    }

    async fn audit_withdrawal(
        &self,
        withdrawal_id: i64,
        action: WithdrawalAction,
        operator_id: i64,
        reason: Option<&str>,
    ) -> ResultEngine<Withdrawal> {
        let withdrawal = with_tx!(self, |db_tx| {
            let withdrawal = self.require_withdrawal(&db_tx, withdrawal_id).await?;
            action.check(&withdrawal)?;
            let now = Utc::now();

            self.advance_withdrawal(&db_tx, &withdrawal, action, operator_id, reason, now)
                .await?;

            match action {
                WithdrawalAction::Reject => self.release_frozen(&db_tx, &withdrawal, now).await?,
                WithdrawalAction::Complete => self.burn_frozen(&db_tx, &withdrawal, now).await?,
                WithdrawalAction::Approve | WithdrawalAction::Process => {}
            }

            self.require_withdrawal(&db_tx, withdrawal_id).await
        })?;

        tracing::info!(
            withdrawal_no = %withdrawal.withdrawal_no,
            action = action.as_str(),
            status = withdrawal.status.as_str(),
            operator_id,
            "withdrawal transition"
        );
        Ok(withdrawal)
    }

    async fn require_withdrawal(
        &self,
        db: &DatabaseTransaction,
        withdrawal_id: i64,
    ) -> ResultEngine<Withdrawal> {
        withdrawals::Entity::find_by_id(withdrawal_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::WithdrawalNotFound(withdrawal_id.to_string()))
            .and_then(Withdrawal::try_from)
    }

    /// Compare-and-set on the status: a row moved by someone else since it
    /// was read matches nothing and fails the transition.
    async fn advance_withdrawal(
        &self,
        db: &DatabaseTransaction,
        withdrawal: &Withdrawal,
        action: WithdrawalAction,
        operator_id: i64,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut update = withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::Status,
                Expr::value(action.target().as_str()),
            )
            .col_expr(withdrawals::Column::OperatorId, Expr::value(operator_id));
        if matches!(action, WithdrawalAction::Reject | WithdrawalAction::Complete) {
            update = update.col_expr(withdrawals::Column::ProcessedAt, Expr::value(now));
        }
        if let Some(reason) = reason {
            update = update.col_expr(withdrawals::Column::RejectReason, Expr::value(reason));
        }

        let result = update
            .filter(withdrawals::Column::Id.eq(withdrawal.id))
            .filter(
                withdrawals::Column::Status
                    .is_in(action.allowed_from().iter().map(|status| status.as_str())),
            )
            .exec(db)
            .await?;
        if result.rows_affected != 1 {
            return Err(EngineError::WithdrawalStatus(format!(
                "withdrawal {} changed status before it could {}",
                withdrawal.withdrawal_no,
                action.as_str()
            )));
        }
        Ok(())
    }

    /// frozen → available, by exactly the requested amount.
    async fn release_frozen(
        &self,
        db: &DatabaseTransaction,
        withdrawal: &Withdrawal,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let amount = withdrawal.amount_minor;
        let moved = match withdrawal.kind {
            WithdrawalKind::Commission => {
                distributors::Entity::update_many()
                    .col_expr(
                        distributors::Column::AvailableCommissionMinor,
                        Expr::col(distributors::Column::AvailableCommissionMinor).add(amount),
                    )
                    .col_expr(
                        distributors::Column::FrozenCommissionMinor,
                        Expr::col(distributors::Column::FrozenCommissionMinor).sub(amount),
                    )
                    .filter(distributors::Column::UserId.eq(withdrawal.user_id))
                    .filter(distributors::Column::FrozenCommissionMinor.gte(amount))
                    .exec(db)
                    .await?
            }
            WithdrawalKind::Wallet => {
                user_wallets::Entity::update_many()
                    .col_expr(
                        user_wallets::Column::BalanceMinor,
                        Expr::col(user_wallets::Column::BalanceMinor).add(amount),
                    )
                    .col_expr(
                        user_wallets::Column::FrozenBalanceMinor,
                        Expr::col(user_wallets::Column::FrozenBalanceMinor).sub(amount),
                    )
                    .col_expr(user_wallets::Column::UpdatedAt, Expr::value(now))
                    .filter(user_wallets::Column::UserId.eq(withdrawal.user_id))
                    .filter(user_wallets::Column::FrozenBalanceMinor.gte(amount))
                    .exec(db)
                    .await?
            }
        };
        if moved.rows_affected != 1 {
            return Err(self.frozen_update_error(db, withdrawal).await);
        }
        Ok(())
    }

    /// frozen → withdrawn, plus the ledger entry.
    async fn burn_frozen(
        &self,
        db: &DatabaseTransaction,
        withdrawal: &Withdrawal,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let amount = withdrawal.amount_minor;
        let actual = withdrawal.actual_amount_minor;
        let moved = match withdrawal.kind {
            WithdrawalKind::Commission => {
                distributors::Entity::update_many()
                    .col_expr(
                        distributors::Column::FrozenCommissionMinor,
                        Expr::col(distributors::Column::FrozenCommissionMinor).sub(amount),
                    )
                    .col_expr(
                        distributors::Column::WithdrawnCommissionMinor,
                        Expr::col(distributors::Column::WithdrawnCommissionMinor).add(actual),
                    )
                    .filter(distributors::Column::UserId.eq(withdrawal.user_id))
                    .filter(distributors::Column::FrozenCommissionMinor.gte(amount))
                    .exec(db)
                    .await?
            }
            WithdrawalKind::Wallet => {
                user_wallets::Entity::update_many()
                    .col_expr(
                        user_wallets::Column::FrozenBalanceMinor,
                        Expr::col(user_wallets::Column::FrozenBalanceMinor).sub(amount),
                    )
                    .col_expr(
                        user_wallets::Column::TotalWithdrawnMinor,
                        Expr::col(user_wallets::Column::TotalWithdrawnMinor).add(actual),
                    )
                    .col_expr(user_wallets::Column::UpdatedAt, Expr::value(now))
                    .filter(user_wallets::Column::UserId.eq(withdrawal.user_id))
                    .filter(user_wallets::Column::FrozenBalanceMinor.gte(amount))
                    .exec(db)
                    .await?
            }
        };
        if moved.rows_affected != 1 {
            return Err(self.frozen_update_error(db, withdrawal).await);
        }

        wallet_transactions::ActiveModel::new_entry(
            withdrawal.user_id,
            WalletTransactionKind::Withdraw,
            amount,
            Some(withdrawal.withdrawal_no.clone()),
            Some(format!(
                "{} withdrawal via {}",
                withdrawal.kind.label(),
                withdrawal.channel
            )),
            now,
        )
        .insert(db)
        .await?;
        Ok(())
    }

    /// A guarded bucket update matched no row: the holder is gone or its
    /// frozen bucket is short.
    async fn frozen_update_error(
        &self,
        db: &DatabaseTransaction,
        withdrawal: &Withdrawal,
    ) -> EngineError {
        let holder = match withdrawal.kind {
            WithdrawalKind::Commission => distributors::Entity::find()
                .filter(distributors::Column::UserId.eq(withdrawal.user_id))
                .one(db)
                .await
                .map(|found| found.is_some()),
            WithdrawalKind::Wallet => user_wallets::Entity::find_by_id(withdrawal.user_id)
                .one(db)
                .await
                .map(|found| found.is_some()),
        };
        match (holder, withdrawal.kind) {
            (Err(err), _) => EngineError::Database(err),
            (Ok(true), _) => EngineError::InsufficientFrozen(format!(
                "withdrawal {} needs {} frozen",
                withdrawal.withdrawal_no, withdrawal.amount_minor
            )),
            (Ok(false), WithdrawalKind::Commission) => EngineError::DistributorNotFound(format!(
                "for user {}",
                withdrawal.user_id
            )),
            (Ok(false), WithdrawalKind::Wallet) => {
                EngineError::UserNotFound(withdrawal.user_id.to_string())
            }
        }
    }
}

fn record(
    report: &mut BatchReport<Withdrawal>,
    action: WithdrawalAction,
    id: i64,
    outcome: ResultEngine<Withdrawal>,
) {
    match outcome {
        Ok(withdrawal) => report.done(id, withdrawal),
        Err(err) => {
            tracing::warn!(
                withdrawal_id = id,
                action = action.as_str(),
                "batch item failed: {err}"
            );
            report.failed(id, &err);
        }
    }
}
