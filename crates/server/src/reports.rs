//! Ledger report endpoints

use api_types::report::{
    ChannelShareView, DailyRefundView, DailyRevenueView, DateRange, OrderTypeRevenueView,
};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState};

pub async fn revenue_daily(
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<DailyRevenueView>>, ServerError> {
    let rows = state.engine.revenue_by_day(range.start, range.end).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| DailyRevenueView {
                date: row.date,
                revenue_minor: row.revenue_minor,
                order_count: row.order_count,
                refund_minor: row.refund_minor,
            })
            .collect(),
    ))
}

pub async fn refunds_daily(
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<DailyRefundView>>, ServerError> {
    let rows = state.engine.refund_by_day(range.start, range.end).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| DailyRefundView {
                date: row.date,
                amount_minor: row.amount_minor,
                count: row.count,
            })
            .collect(),
    ))
}

pub async fn revenue_by_order_type(
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<OrderTypeRevenueView>>, ServerError> {
    let rows = state
        .engine
        .revenue_by_order_type(range.start, range.end)
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| OrderTypeRevenueView {
                order_type: row.order_type,
                revenue_minor: row.revenue_minor,
                order_count: row.order_count,
            })
            .collect(),
    ))
}

pub async fn payment_channels(
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<ChannelShareView>>, ServerError> {
    let rows = state
        .engine
        .payment_channel_breakdown(range.start, range.end)
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| ChannelShareView {
                channel: row.channel,
                amount_minor: row.amount_minor,
                count: row.count,
                percentage: row.percentage,
            })
            .collect(),
    ))
}
