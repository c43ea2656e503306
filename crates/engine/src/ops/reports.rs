use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, FromQueryResult, QueryFilter, QuerySelect, Statement, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    OrderStatus, PaymentStatus, Period, ResultEngine, SettlementKind, SettlementStatus, orders,
    payments, refunds,
};

use super::{Engine, keyed_sum_count};

const ORDER_TYPE_SQL: &str = "SELECT order_type AS key, \
            COALESCE(SUM(actual_amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM orders \
     WHERE status = ? AND completed_at >= ? AND completed_at < ? \
     GROUP BY order_type \
     ORDER BY total DESC, key";

const SETTLEMENT_STATS_SQL: &str = "SELECT kind, status, \
            COALESCE(SUM(actual_amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM settlements \
     GROUP BY kind, status";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue_minor: i64,
    pub order_count: i64,
    pub refund_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRefund {
    pub date: NaiveDate,
    pub amount_minor: i64,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTypeRevenue {
    pub order_type: String,
    pub revenue_minor: i64,
    pub order_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelShare {
    pub channel: String,
    pub amount_minor: i64,
    pub count: i64,
    /// Share of the total successful amount, in percent with two decimals.
    pub percentage: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementKindStats {
    pub pending_count: i64,
    pub pending_amount_minor: i64,
    pub completed_count: i64,
    pub completed_amount_minor: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStats {
    pub merchant: SettlementKindStats,
    pub distributor: SettlementKindStats,
}

#[derive(Debug, FromQueryResult)]
struct KindStatusRow {
    kind: String,
    status: String,
    total: i64,
    items: i64,
}

#[derive(Clone, Copy, Debug, Default)]
struct DayTotals {
    revenue: i64,
    orders: i64,
    refund: i64,
    refunds: i64,
}

/// `part / total` in percent, rounded to two decimals; 0 when `total` is 0.
fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / total as f64).round() / 100.0
}

fn bucket_by_day(
    rows: Vec<(Option<DateTime<Utc>>, i64)>,
    buckets: &mut BTreeMap<NaiveDate, DayTotals>,
    add: impl Fn(&mut DayTotals, i64),
) {
    for (at, amount) in rows {
        if let Some(at) = at {
            add(buckets.entry(at.date_naive()).or_default(), amount);
        }
    }
}

impl Engine {
    /// One row per day of `[start, end]`: completed-order revenue bucketed
    /// on `completed_at`, and successful refunds bucketed on `refunded_at`.
    /// Days without activity are zero rows.
    pub async fn revenue_by_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<DailyRevenue>> {
        let period = Period::for_report(start, end)?;
        let mut buckets = BTreeMap::new();

        bucket_by_day(
            self.completed_order_amounts(period).await?,
            &mut buckets,
            |day, amount| {
                day.revenue += amount;
                day.orders += 1;
            },
        );
        bucket_by_day(
            self.successful_refund_amounts(period).await?,
            &mut buckets,
            |day, amount| {
                day.refund += amount;
                day.refunds += 1;
            },
        );

        Ok(period
            .densify(&buckets)
            .into_iter()
            .map(|(date, day)| DailyRevenue {
                date,
                revenue_minor: day.revenue,
                order_count: day.orders,
                refund_minor: day.refund,
            })
            .collect())
    }

    /// One row per day of `[start, end]` with the successful refunds.
    pub async fn refund_by_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<DailyRefund>> {
        let period = Period::for_report(start, end)?;
        let mut buckets = BTreeMap::new();
        bucket_by_day(
            self.successful_refund_amounts(period).await?,
            &mut buckets,
            |day, amount| {
                day.refund += amount;
                day.refunds += 1;
            },
        );

        Ok(period
            .densify(&buckets)
            .into_iter()
            .map(|(date, day)| DailyRefund {
                date,
                amount_minor: day.refund,
                count: day.refunds,
            })
            .collect())
    }

    /// Completed-order revenue per order type, largest first.
    pub async fn revenue_by_order_type(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<OrderTypeRevenue>> {
        let period = Period::new(start, end)?;
        let rows = keyed_sum_count(
            &self.database,
            ORDER_TYPE_SQL,
            vec![
                OrderStatus::Completed.as_str().into(),
                period.lower_bound().into(),
                period.upper_bound().into(),
            ],
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderTypeRevenue {
                order_type: row.key,
                revenue_minor: row.total,
                order_count: row.items,
            })
            .collect())
    }

    /// Successful payments per channel, with each channel's share of the
    /// total.
    pub async fn payment_channel_breakdown(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<ChannelShare>> {
        let period = Period::new(start, end)?;
        let mut rows: Vec<(String, i64, i64)> = payments::Entity::find()
            .select_only()
            .column(payments::Column::Channel)
            .column_as(payments::Column::AmountMinor.sum(), "total")
            .column_as(payments::Column::Id.count(), "items")
            .filter(payments::Column::Status.eq(PaymentStatus::Success.as_str()))
            .filter(payments::Column::PaidAt.gte(period.lower_bound()))
            .filter(payments::Column::PaidAt.lt(period.upper_bound()))
            .group_by(payments::Column::Channel)
            .into_tuple()
            .all(&self.database)
            .await?;
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total: i64 = rows.iter().map(|(_, amount, _)| amount).sum();
        Ok(rows
            .into_iter()
            .map(|(channel, amount_minor, count)| ChannelShare {
                percentage: percentage(amount_minor, total),
                channel,
                amount_minor,
                count,
            })
            .collect())
    }

    /// Pending and completed settlement counts and payout amounts per kind.
    pub async fn settlement_stats(&self) -> ResultEngine<SettlementStats> {
        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            SETTLEMENT_STATS_SQL,
            Vec::<sea_orm::Value>::new(),
        );
        let rows = KindStatusRow::find_by_statement(stmt)
            .all(&self.database)
            .await?;

        let mut stats = SettlementStats::default();
        for row in rows {
            let entry = match SettlementKind::try_from(row.kind.as_str())? {
                SettlementKind::Merchant => &mut stats.merchant,
                SettlementKind::Distributor => &mut stats.distributor,
            };
            match SettlementStatus::try_from(row.status.as_str())? {
                SettlementStatus::Pending => {
                    entry.pending_count += row.items;
                    entry.pending_amount_minor += row.total;
                }
                SettlementStatus::Completed => {
                    entry.completed_count += row.items;
                    entry.completed_amount_minor += row.total;
                }
                // transient inside a transaction
                SettlementStatus::Processing => {}
            }
        }
        Ok(stats)
    }

    async fn completed_order_amounts(
        &self,
        period: Period,
    ) -> ResultEngine<Vec<(Option<DateTime<Utc>>, i64)>> {
        Ok(orders::Entity::find()
            .select_only()
            .column(orders::Column::CompletedAt)
            .column(orders::Column::ActualAmountMinor)
            .filter(orders::Column::Status.eq(OrderStatus::Completed.as_str()))
            .filter(orders::Column::CompletedAt.gte(period.lower_bound()))
            .filter(orders::Column::CompletedAt.lt(period.upper_bound()))
            .into_tuple()
            .all(&self.database)
            .await?)
    }

    async fn successful_refund_amounts(
        &self,
        period: Period,
    ) -> ResultEngine<Vec<(Option<DateTime<Utc>>, i64)>> {
        Ok(refunds::Entity::find()
            .select_only()
            .column(refunds::Column::RefundedAt)
            .column(refunds::Column::AmountMinor)
            .filter(refunds::Column::Status.eq(PaymentStatus::Success.as_str()))
            .filter(refunds::Column::RefundedAt.gte(period.lower_bound()))
            .filter(refunds::Column::RefundedAt.lt(period.upper_bound()))
            .into_tuple()
            .all(&self.database)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn percentage_of_nothing_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
    }
}
