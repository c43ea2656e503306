use api_types::overview::OverviewView;
use axum::{Json, extract::State};
use chrono::Utc;

use crate::{ServerError, server::ServerState};

/// Dashboard figures as of now.
pub async fn get(State(state): State<ServerState>) -> Result<Json<OverviewView>, ServerError> {
    let overview = state.engine.overview(Utc::now()).await?;

    Ok(Json(OverviewView {
        today_revenue_minor: overview.today_revenue_minor,
        month_revenue_minor: overview.month_revenue_minor,
        last_month_revenue_minor: overview.last_month_revenue_minor,
        growth_rate: overview.growth_rate,
        total_revenue_minor: overview.total_revenue_minor,
        total_refund_minor: overview.total_refund_minor,
        total_commission_minor: overview.total_commission_minor,
        net_profit_minor: overview.net_profit_minor,
        pending_withdrawal_count: overview.pending_withdrawal_count,
        pending_withdrawal_amount_minor: overview.pending_withdrawal_amount_minor,
        pending_settlement_count: overview.pending_settlement_count,
    }))
}
