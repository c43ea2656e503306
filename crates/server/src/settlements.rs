//! Settlements API endpoints

use api_types::{
    batch::BatchResponse,
    settlement::{
        SettlementDetailView, SettlementGenerate, SettlementKind as ApiKind,
        SettlementKindStatsView, SettlementList, SettlementListResponse, SettlementNew,
        SettlementStatsView, SettlementStatus as ApiStatus, SettlementView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Operator, Period};

use crate::{ServerError, batch::batch_response, server::ServerState};

fn map_kind(kind: engine::SettlementKind) -> ApiKind {
    match kind {
        engine::SettlementKind::Merchant => ApiKind::Merchant,
        engine::SettlementKind::Distributor => ApiKind::Distributor,
    }
}

pub(crate) fn engine_kind(kind: ApiKind) -> engine::SettlementKind {
    match kind {
        ApiKind::Merchant => engine::SettlementKind::Merchant,
        ApiKind::Distributor => engine::SettlementKind::Distributor,
    }
}

fn map_status(status: engine::SettlementStatus) -> ApiStatus {
    match status {
        engine::SettlementStatus::Pending => ApiStatus::Pending,
        engine::SettlementStatus::Processing => ApiStatus::Processing,
        engine::SettlementStatus::Completed => ApiStatus::Completed,
    }
}

pub(crate) fn engine_status(status: ApiStatus) -> engine::SettlementStatus {
    match status {
        ApiStatus::Pending => engine::SettlementStatus::Pending,
        ApiStatus::Processing => engine::SettlementStatus::Processing,
        ApiStatus::Completed => engine::SettlementStatus::Completed,
    }
}

fn map_settlement(settlement: engine::Settlement) -> SettlementView {
    SettlementView {
        id: settlement.id,
        settlement_no: settlement.settlement_no,
        kind: map_kind(settlement.kind),
        target_id: settlement.target_id,
        period_start: settlement.period_start,
        period_end: settlement.period_end,
        total_amount_minor: settlement.total_amount_minor,
        fee_minor: settlement.fee_minor,
        actual_amount_minor: settlement.actual_amount_minor,
        item_count: settlement.item_count,
        status: map_status(settlement.status),
        operator_id: settlement.operator_id,
        settled_at: settlement.settled_at,
        created_at: settlement.created_at,
    }
}

fn map_kind_stats(stats: engine::SettlementKindStats) -> SettlementKindStatsView {
    SettlementKindStatsView {
        pending_count: stats.pending_count,
        pending_amount_minor: stats.pending_amount_minor,
        completed_count: stats.completed_count,
        completed_amount_minor: stats.completed_amount_minor,
    }
}

pub async fn settlement_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementView>), ServerError> {
    let period = Period::new(payload.period_start, payload.period_end)?;
    let settlement = state
        .engine
        .create_settlement(engine_kind(payload.kind), payload.target_id, period, operator.id)
        .await?;

    Ok((StatusCode::CREATED, Json(map_settlement(settlement))))
}

pub async fn generate(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementGenerate>,
) -> Result<Json<BatchResponse<SettlementView>>, ServerError> {
    let period = Period::new(payload.period_start, payload.period_end)?;
    let report = match payload.kind {
        ApiKind::Merchant => {
            state
                .engine
                .generate_merchant_settlements(period, operator.id)
                .await?
        }
        ApiKind::Distributor => {
            state
                .engine
                .generate_distributor_settlements(period, operator.id)
                .await?
        }
    };

    Ok(Json(batch_response(report, map_settlement)))
}

pub async fn process(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<SettlementView>, ServerError> {
    let settlement = state.engine.process_settlement(id, operator.id).await?;
    Ok(Json(map_settlement(settlement)))
}

pub async fn get_detail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<SettlementDetailView>, ServerError> {
    let detail = state.engine.settlement_detail(id).await?;
    Ok(Json(SettlementDetailView {
        settlement: map_settlement(detail.settlement),
        target_name: detail.target_name,
    }))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<SettlementList>,
) -> Result<Json<SettlementListResponse>, ServerError> {
    let filter = engine::SettlementListFilter {
        kind: query.kind.map(engine_kind),
        status: query.status.map(engine_status),
        target_id: query.target_id,
        from: query.from,
        to: query.to,
    };

    let (settlements, next_cursor) = state
        .engine
        .list_settlements_page(&filter, query.limit.unwrap_or(50), query.cursor.as_deref())
        .await?;

    Ok(Json(SettlementListResponse {
        settlements: settlements.into_iter().map(map_settlement).collect(),
        next_cursor,
    }))
}

pub async fn stats(
    State(state): State<ServerState>,
) -> Result<Json<SettlementStatsView>, ServerError> {
    let stats = state.engine.settlement_stats().await?;
    Ok(Json(SettlementStatsView {
        merchant: map_kind_stats(stats.merchant),
        distributor: map_kind_stats(stats.distributor),
    }))
}
