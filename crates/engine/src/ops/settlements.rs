use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    BatchReport, CommissionStatus, DistributorBalance, EngineError, MerchantStatus, OrderStatus,
    Period, ResultEngine, Settlement, SettlementAmounts, SettlementDetail, SettlementKind,
    SettlementStatus, SkipReason, commissions, distributors, merchants,
    numbers::SETTLEMENT_PREFIX, settlements, users,
};

use super::{Engine, clamp_limit, decode_cursor, encode_cursor, sum_count, with_tx};

const MERCHANT_TOTAL_SQL: &str = "SELECT COALESCE(SUM(o.actual_amount_minor), 0) AS total, \
            COUNT(o.id) AS items \
     FROM orders o \
     JOIN devices d ON d.id = o.device_id \
     JOIN venues v ON v.id = d.venue_id \
     WHERE v.merchant_id = ? \
       AND o.status = ? \
       AND o.completed_at >= ? \
       AND o.completed_at < ?";

const DISTRIBUTOR_TOTAL_SQL: &str = "SELECT COALESCE(SUM(amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM commissions \
     WHERE distributor_id = ? \
       AND status = ? \
       AND created_at >= ? \
       AND created_at < ?";

/// Filters for listing settlements.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`) on `created_at`.
#[derive(Clone, Debug, Default)]
pub struct SettlementListFilter {
    pub kind: Option<SettlementKind>,
    pub status: Option<SettlementStatus>,
    pub target_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SettlementListFilter {
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

pub(super) trait ApplySettlementFilters: QueryFilter + Sized {
    fn apply_settlement_filters(self, filter: &SettlementListFilter) -> Self;
}

impl<T> ApplySettlementFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_settlement_filters(mut self, filter: &SettlementListFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(settlements::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            self = self.filter(settlements::Column::Status.eq(status.as_str()));
        }
        if let Some(target_id) = filter.target_id {
            self = self.filter(settlements::Column::TargetId.eq(target_id));
        }
        if let Some(from) = filter.from {
            self = self.filter(settlements::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(settlements::Column::CreatedAt.lt(to));
        }
        self
    }
}

enum Generated {
    Created(Settlement),
    Skipped(SkipReason),
}

fn settlement_key(kind: SettlementKind, target_id: i64, period: Period) -> String {
    format!(
        "{} settlement for {target_id} over {}..{}",
        kind.as_str(),
        period.start(),
        period.end()
    )
}

impl Engine {
    /// Creates a `pending` settlement for one merchant or distributor.
    ///
    /// - merchant: completed orders fulfilled by the merchant's devices,
    ///   bucketed on `completed_at`; fee = total × commission rate.
    /// - distributor: pending commissions, bucketed on `created_at`; no fee.
    ///
    /// A zero total still creates the settlement. A second settlement for
    /// the same `(kind, target, period)` fails with
    /// [`EngineError::DuplicateRecord`].
    pub async fn create_settlement(
        &self,
        kind: SettlementKind,
        target_id: i64,
        period: Period,
        operator_id: i64,
    ) -> ResultEngine<Settlement> {
        let settlement = with_tx!(self, |db_tx| {
            let amounts = match kind {
                SettlementKind::Merchant => {
                    let merchant = self.require_merchant(&db_tx, target_id).await?;
                    if self
                        .settlement_exists(&db_tx, kind, target_id, period)
                        .await?
                    {
                        return Err(EngineError::DuplicateRecord(settlement_key(
                            kind, target_id, period,
                        )));
                    }
                    self.merchant_amounts(&db_tx, &merchant, period).await?
                }
                SettlementKind::Distributor => {
                    self.require_distributor(&db_tx, target_id).await?;
                    if self
                        .settlement_exists(&db_tx, kind, target_id, period)
                        .await?
                    {
                        return Err(EngineError::DuplicateRecord(settlement_key(
                            kind, target_id, period,
                        )));
                    }
                    self.distributor_amounts(&db_tx, target_id, period).await?
                }
            };

            self.insert_settlement(&db_tx, kind, target_id, period, amounts, operator_id)
                .await
        })?;

        tracing::info!(
            settlement_no = %settlement.settlement_no,
            kind = kind.as_str(),
            target_id,
            total_minor = settlement.total_amount_minor,
            "settlement created"
        );
        Ok(settlement)
    }

    /// Pays out a `pending` settlement.
    ///
    /// In one transaction: `pending → processing`; for distributors, the
    /// pending commissions of the period become `settled` and
    /// `available_commission` is credited with the actual amount; then
    /// `processing → completed`. Any failure leaves the settlement `pending`.
    pub async fn process_settlement(
        &self,
        settlement_id: i64,
        operator_id: i64,
    ) -> ResultEngine<Settlement> {
        let settlement = with_tx!(self, |db_tx| {
            let settlement = self.require_settlement(&db_tx, settlement_id).await?;
            if settlement.status != SettlementStatus::Pending {
                return Err(EngineError::InvalidOperation(format!(
                    "settlement {} is {}, only pending settlements can be processed",
                    settlement.settlement_no,
                    settlement.status.as_str()
                )));
            }
            let period = settlement.period()?;
            let now = Utc::now();

            self.advance_settlement(
                &db_tx,
                &settlement,
                SettlementStatus::Pending,
                SettlementStatus::Processing,
                operator_id,
                None,
            )
            .await?;

            if settlement.kind == SettlementKind::Distributor {
                let swept = commissions::Entity::update_many()
                    .col_expr(
                        commissions::Column::Status,
                        Expr::value(CommissionStatus::Settled.as_str()),
                    )
                    .col_expr(commissions::Column::SettledAt, Expr::value(now))
                    .col_expr(commissions::Column::SettlementId, Expr::value(settlement.id))
                    .filter(commissions::Column::DistributorId.eq(settlement.target_id))
                    .filter(commissions::Column::Status.eq(CommissionStatus::Pending.as_str()))
                    .filter(commissions::Column::CreatedAt.gte(period.lower_bound()))
                    .filter(commissions::Column::CreatedAt.lt(period.upper_bound()))
                    .exec(&db_tx)
                    .await?;
                tracing::debug!(
                    settlement_no = %settlement.settlement_no,
                    commissions = swept.rows_affected,
                    "commissions settled"
                );

                let credited = distributors::Entity::update_many()
                    .col_expr(
                        distributors::Column::AvailableCommissionMinor,
                        Expr::col(distributors::Column::AvailableCommissionMinor)
                            .add(settlement.actual_amount_minor),
                    )
                    .filter(distributors::Column::Id.eq(settlement.target_id))
                    .exec(&db_tx)
                    .await?;
                if credited.rows_affected != 1 {
                    return Err(EngineError::DistributorNotFound(
                        settlement.target_id.to_string(),
                    ));
                }
            }

            self.advance_settlement(
                &db_tx,
                &settlement,
                SettlementStatus::Processing,
                SettlementStatus::Completed,
                operator_id,
                Some(now),
            )
            .await?;

            self.require_settlement(&db_tx, settlement_id).await
        })?;

        tracing::info!(
            settlement_no = %settlement.settlement_no,
            actual_minor = settlement.actual_amount_minor,
            operator_id,
            "settlement completed"
        );
        Ok(settlement)
    }

    /// Creates merchant settlements for every active merchant.
    ///
    /// Merchants already settled for the period or with nothing to settle
    /// are skipped; a failing merchant is recorded and the batch continues.
    pub async fn generate_merchant_settlements(
        &self,
        period: Period,
        operator_id: i64,
    ) -> ResultEngine<BatchReport<Settlement>> {
        let merchant_ids: Vec<i64> = merchants::Entity::find()
            .select_only()
            .column(merchants::Column::Id)
            .filter(merchants::Column::Status.eq(MerchantStatus::Active.as_str()))
            .order_by_asc(merchants::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(self
            .generate_settlements(SettlementKind::Merchant, merchant_ids, period, operator_id)
            .await)
    }

    /// Creates distributor settlements for every distributor with at least
    /// one pending commission in the period.
    pub async fn generate_distributor_settlements(
        &self,
        period: Period,
        operator_id: i64,
    ) -> ResultEngine<BatchReport<Settlement>> {
        let distributor_ids: Vec<i64> = commissions::Entity::find()
            .select_only()
            .column(commissions::Column::DistributorId)
            .distinct()
            .filter(commissions::Column::Status.eq(CommissionStatus::Pending.as_str()))
            .filter(commissions::Column::CreatedAt.gte(period.lower_bound()))
            .filter(commissions::Column::CreatedAt.lt(period.upper_bound()))
            .order_by_asc(commissions::Column::DistributorId)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(self
            .generate_settlements(
                SettlementKind::Distributor,
                distributor_ids,
                period,
                operator_id,
            )
            .await)
    }

    async fn generate_settlements(
        &self,
        kind: SettlementKind,
        target_ids: Vec<i64>,
        period: Period,
        operator_id: i64,
    ) -> BatchReport<Settlement> {
        let mut report = BatchReport::default();
        for target_id in target_ids {
            match self
                .try_generate_settlement(kind, target_id, period, operator_id)
                .await
            {
                Ok(Generated::Created(settlement)) => report.done(target_id, settlement),
                Ok(Generated::Skipped(reason)) => {
                    tracing::debug!(
                        kind = kind.as_str(),
                        target_id,
                        reason = reason.as_str(),
                        "settlement skipped"
                    );
                    report.skipped(target_id, reason);
                }
                Err(err) => {
                    tracing::warn!(
                        kind = kind.as_str(),
                        target_id,
                        "settlement generation failed: {err}"
                    );
                    report.failed(target_id, &err);
                }
            }
        }

        tracing::info!(
            kind = kind.as_str(),
            start = %period.start(),
            end = %period.end(),
            items = report.items.len(),
            created = report.succeeded().count(),
            "settlement batch finished"
        );
        report
    }

    async fn try_generate_settlement(
        &self,
        kind: SettlementKind,
        target_id: i64,
        period: Period,
        operator_id: i64,
    ) -> ResultEngine<Generated> {
        with_tx!(self, |db_tx| {
            if self
                .settlement_exists(&db_tx, kind, target_id, period)
                .await?
            {
                return Ok(Generated::Skipped(SkipReason::AlreadySettled));
            }

            let amounts = match kind {
                SettlementKind::Merchant => {
                    let merchant = self.require_merchant(&db_tx, target_id).await?;
                    self.merchant_amounts(&db_tx, &merchant, period).await?
                }
                SettlementKind::Distributor => {
                    self.require_distributor(&db_tx, target_id).await?;
                    self.distributor_amounts(&db_tx, target_id, period).await?
                }
            };
            if amounts.is_zero() {
                return Ok(Generated::Skipped(SkipReason::NothingToSettle));
            }

            let settlement = self
                .insert_settlement(&db_tx, kind, target_id, period, amounts, operator_id)
                .await?;
            Ok(Generated::Created(settlement))
        })
    }

    /// Return a settlement by id.
    pub async fn settlement(&self, settlement_id: i64) -> ResultEngine<Settlement> {
        settlements::Entity::find_by_id(settlement_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::SettlementNotFound(settlement_id.to_string()))
            .and_then(Settlement::try_from)
    }

    /// Return a settlement with its target resolved to a display name:
    /// the merchant name, or `"{nickname} (#{distributor_id})"`.
    pub async fn settlement_detail(&self, settlement_id: i64) -> ResultEngine<SettlementDetail> {
        let settlement = self.settlement(settlement_id).await?;

        let target_name = match settlement.kind {
            SettlementKind::Merchant => merchants::Entity::find_by_id(settlement.target_id)
                .one(&self.database)
                .await?
                .map(|merchant| merchant.name)
                .unwrap_or_else(|| format!("merchant #{}", settlement.target_id)),
            SettlementKind::Distributor => {
                let nickname = match distributors::Entity::find_by_id(settlement.target_id)
                    .one(&self.database)
                    .await?
                {
                    Some(distributor) => users::Entity::find_by_id(distributor.user_id)
                        .one(&self.database)
                        .await?
                        .map(|user| user.nickname),
                    None => None,
                };
                match nickname {
                    Some(nickname) => format!("{nickname} (#{})", settlement.target_id),
                    None => format!("#{}", settlement.target_id),
                }
            }
        };

        Ok(SettlementDetail {
            settlement,
            target_name,
        })
    }

    /// Lists settlements newest first, with cursor-based pagination.
    pub async fn list_settlements_page(
        &self,
        filter: &SettlementListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Settlement>, Option<String>)> {
        filter.validate()?;
        let limit = clamp_limit(limit);

        let mut query = settlements::Entity::find()
            .apply_settlement_filters(filter)
            .order_by_desc(settlements::Column::Id)
            .limit(limit.saturating_add(1));
        if let Some(cursor) = cursor {
            query = query.filter(settlements::Column::Id.lt(decode_cursor(cursor)?));
        }

        let models = query.all(&self.database).await?;
        let has_more = models.len() > limit as usize;
        let items = models
            .into_iter()
            .take(limit as usize)
            .map(Settlement::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = match items.last() {
            Some(last) if has_more => Some(encode_cursor(last.id)?),
            _ => None,
        };
        Ok((items, next_cursor))
    }

    /// Return the commission buckets of a distributor.
    pub async fn distributor_balance(
        &self,
        distributor_id: i64,
    ) -> ResultEngine<DistributorBalance> {
        distributors::Entity::find_by_id(distributor_id)
            .one(&self.database)
            .await?
            .map(DistributorBalance::from)
            .ok_or_else(|| EngineError::DistributorNotFound(distributor_id.to_string()))
    }

    async fn require_settlement(
        &self,
        db: &DatabaseTransaction,
        settlement_id: i64,
    ) -> ResultEngine<Settlement> {
        settlements::Entity::find_by_id(settlement_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::SettlementNotFound(settlement_id.to_string()))
            .and_then(Settlement::try_from)
    }

    async fn require_merchant(
        &self,
        db: &DatabaseTransaction,
        merchant_id: i64,
    ) -> ResultEngine<merchants::Model> {
        merchants::Entity::find_by_id(merchant_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::MerchantNotFound(merchant_id.to_string()))
    }

    async fn require_distributor(
        &self,
        db: &DatabaseTransaction,
        distributor_id: i64,
    ) -> ResultEngine<distributors::Model> {
        distributors::Entity::find_by_id(distributor_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::DistributorNotFound(distributor_id.to_string()))
    }

    async fn settlement_exists(
        &self,
        db: &DatabaseTransaction,
        kind: SettlementKind,
        target_id: i64,
        period: Period,
    ) -> ResultEngine<bool> {
        Ok(settlements::Entity::find()
            .filter(settlements::Column::Kind.eq(kind.as_str()))
            .filter(settlements::Column::TargetId.eq(target_id))
            .filter(settlements::Column::PeriodStart.eq(period.start()))
            .filter(settlements::Column::PeriodEnd.eq(period.end()))
            .one(db)
            .await?
            .is_some())
    }

    async fn merchant_amounts(
        &self,
        db: &DatabaseTransaction,
        merchant: &merchants::Model,
        period: Period,
    ) -> ResultEngine<SettlementAmounts> {
        let totals = sum_count(
            db,
            MERCHANT_TOTAL_SQL,
            vec![
                merchant.id.into(),
                OrderStatus::Completed.as_str().into(),
                period.lower_bound().into(),
                period.upper_bound().into(),
            ],
        )
        .await?;
        Ok(SettlementAmounts::merchant(
            totals.total,
            totals.items,
            merchant.commission_rate_bps,
        ))
    }

    async fn distributor_amounts(
        &self,
        db: &DatabaseTransaction,
        distributor_id: i64,
        period: Period,
    ) -> ResultEngine<SettlementAmounts> {
        let totals = sum_count(
            db,
            DISTRIBUTOR_TOTAL_SQL,
            vec![
                distributor_id.into(),
                CommissionStatus::Pending.as_str().into(),
                period.lower_bound().into(),
                period.upper_bound().into(),
            ],
        )
        .await?;
        Ok(SettlementAmounts::distributor(totals.total, totals.items))
    }

    async fn insert_settlement(
        &self,
        db: &DatabaseTransaction,
        kind: SettlementKind,
        target_id: i64,
        period: Period,
        amounts: SettlementAmounts,
        operator_id: i64,
    ) -> ResultEngine<Settlement> {
        let model = settlements::ActiveModel::new_pending(
            self.next_number(SETTLEMENT_PREFIX),
            kind,
            target_id,
            period,
            amounts,
            operator_id,
            Utc::now(),
        )
        .insert(db)
        .await
        .map_err(|err| EngineError::from_insert(err, settlement_key(kind, target_id, period)))?;
        Settlement::try_from(model)
    }

    /// Compare-and-set status transition: only applies while the row is
    /// still in `from`.
    async fn advance_settlement(
        &self,
        db: &DatabaseTransaction,
        settlement: &Settlement,
        from: SettlementStatus,
        to: SettlementStatus,
        operator_id: i64,
        settled_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<()> {
        let mut update = settlements::Entity::update_many()
            .col_expr(settlements::Column::Status, Expr::value(to.as_str()))
            .col_expr(settlements::Column::OperatorId, Expr::value(operator_id));
        if let Some(settled_at) = settled_at {
            update = update.col_expr(settlements::Column::SettledAt, Expr::value(settled_at));
        }
        let result = update
            .filter(settlements::Column::Id.eq(settlement.id))
            .filter(settlements::Column::Status.eq(from.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected != 1 {
            return Err(EngineError::InvalidOperation(format!(
                "settlement {} is no longer {}",
                settlement.settlement_no,
                from.as_str()
            )));
        }
        Ok(())
    }
}
