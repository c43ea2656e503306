use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use sea_orm::Value;
use serde::{Deserialize, Serialize};

use crate::{
    CommissionStatus, EngineError, OrderStatus, PaymentStatus, ResultEngine, SettlementStatus,
    WithdrawalStatus,
};

use super::{Engine, sum_count};

const REVENUE_SQL: &str = "SELECT COALESCE(SUM(actual_amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM orders WHERE status = ? AND completed_at >= ? AND completed_at < ?";

const TOTAL_REVENUE_SQL: &str = "SELECT COALESCE(SUM(actual_amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM orders WHERE status = ?";

const TOTAL_REFUND_SQL: &str = "SELECT COALESCE(SUM(amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM refunds WHERE status = ?";

const TOTAL_COMMISSION_SQL: &str = "SELECT COALESCE(SUM(amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM commissions WHERE status = ?";

const WITHDRAWALS_SQL: &str = "SELECT COALESCE(SUM(amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM withdrawals WHERE status = ?";

const SETTLEMENTS_SQL: &str = "SELECT COALESCE(SUM(actual_amount_minor), 0) AS total, \
            COUNT(id) AS items \
     FROM settlements WHERE status = ?";

/// Dashboard figures, relative to an explicit `now`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub today_revenue_minor: i64,
    pub month_revenue_minor: i64,
    pub last_month_revenue_minor: i64,
    /// Month-over-month growth in percent, two decimals.
    pub growth_rate: f64,
    pub total_revenue_minor: i64,
    pub total_refund_minor: i64,
    /// Commission already paid out through settlements.
    pub total_commission_minor: i64,
    pub net_profit_minor: i64,
    pub pending_withdrawal_count: i64,
    pub pending_withdrawal_amount_minor: i64,
    pub pending_settlement_count: i64,
}

/// Month-over-month growth: 0 when both months are empty, 100 when only
/// this month has revenue.
pub(crate) fn growth_rate(this_month: i64, last_month: i64) -> f64 {
    match (this_month, last_month) {
        (0, 0) => 0.0,
        (_, 0) => 100.0,
        (this, last) => {
            let rate = (this - last) as f64 * 100.0 / last as f64;
            (rate * 100.0).round() / 100.0
        }
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn out_of_range(now: DateTime<Utc>) -> EngineError {
    EngineError::InvalidValue(format!("{now} out of range"))
}

impl Engine {
    pub async fn overview(&self, now: DateTime<Utc>) -> ResultEngine<Overview> {
        let today = now.date_naive();
        let tomorrow = today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| out_of_range(now))?;
        let month_start = today.with_day(1).ok_or_else(|| out_of_range(now))?;
        let next_month_start = month_start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| out_of_range(now))?;
        let last_month_start = month_start
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| out_of_range(now))?;

        let today_revenue = self.revenue_between(midnight(today), midnight(tomorrow)).await?;
        let month_revenue = self
            .revenue_between(midnight(month_start), midnight(next_month_start))
            .await?;
        let last_month_revenue = self
            .revenue_between(midnight(last_month_start), midnight(month_start))
            .await?;

        let total_revenue = self
            .total(TOTAL_REVENUE_SQL, OrderStatus::Completed.as_str())
            .await?;
        let total_refund = self
            .total(TOTAL_REFUND_SQL, PaymentStatus::Success.as_str())
            .await?;
        let total_commission = self
            .total(TOTAL_COMMISSION_SQL, CommissionStatus::Settled.as_str())
            .await?;

        let pending_withdrawals = sum_count(
            &self.database,
            WITHDRAWALS_SQL,
            vec![WithdrawalStatus::Pending.as_str().into()],
        )
        .await?;
        let pending_settlements = sum_count(
            &self.database,
            SETTLEMENTS_SQL,
            vec![SettlementStatus::Pending.as_str().into()],
        )
        .await?;

        Ok(Overview {
            today_revenue_minor: today_revenue,
            month_revenue_minor: month_revenue,
            last_month_revenue_minor: last_month_revenue,
            growth_rate: growth_rate(month_revenue, last_month_revenue),
            total_revenue_minor: total_revenue,
            total_refund_minor: total_refund,
            total_commission_minor: total_commission,
            net_profit_minor: total_revenue - total_refund - total_commission,
            pending_withdrawal_count: pending_withdrawals.items,
            pending_withdrawal_amount_minor: pending_withdrawals.total,
            pending_settlement_count: pending_settlements.items,
        })
    }

    async fn revenue_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> ResultEngine<i64> {
        let values: Vec<Value> = vec![
            OrderStatus::Completed.as_str().into(),
            from.into(),
            to.into(),
        ];
        Ok(sum_count(&self.database, REVENUE_SQL, values).await?.total)
    }

    async fn total(&self, sql: &str, status: &str) -> ResultEngine<i64> {
        Ok(sum_count(&self.database, sql, vec![status.into()])
            .await?
            .total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_edge_cases() {
        assert_eq!(growth_rate(0, 0), 0.0);
        assert_eq!(growth_rate(500, 0), 100.0);
        assert_eq!(growth_rate(150, 100), 50.0);
        assert_eq!(growth_rate(50, 100), -50.0);
        assert_eq!(growth_rate(100, 300), -66.67);
    }
}
