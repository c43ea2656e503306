//! Withdrawal audit API endpoints

use api_types::{
    batch::BatchResponse,
    withdrawal::{
        BatchIds, BatchReject, StatusTotalsView, SummaryQuery, WithdrawalKind as ApiKind,
        WithdrawalList, WithdrawalListResponse, WithdrawalReject, WithdrawalStatus as ApiStatus,
        WithdrawalSummaryView, WithdrawalView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::Operator;

use crate::{ServerError, batch::batch_response, server::ServerState};

fn map_kind(kind: engine::WithdrawalKind) -> ApiKind {
    match kind {
        engine::WithdrawalKind::Wallet => ApiKind::Wallet,
        engine::WithdrawalKind::Commission => ApiKind::Commission,
    }
}

pub(crate) fn engine_kind(kind: ApiKind) -> engine::WithdrawalKind {
    match kind {
        ApiKind::Wallet => engine::WithdrawalKind::Wallet,
        ApiKind::Commission => engine::WithdrawalKind::Commission,
    }
}

fn map_status(status: engine::WithdrawalStatus) -> ApiStatus {
    match status {
        engine::WithdrawalStatus::Pending => ApiStatus::Pending,
        engine::WithdrawalStatus::Approved => ApiStatus::Approved,
        engine::WithdrawalStatus::Processing => ApiStatus::Processing,
        engine::WithdrawalStatus::Success => ApiStatus::Success,
        engine::WithdrawalStatus::Rejected => ApiStatus::Rejected,
    }
}

pub(crate) fn engine_status(status: ApiStatus) -> engine::WithdrawalStatus {
    match status {
        ApiStatus::Pending => engine::WithdrawalStatus::Pending,
        ApiStatus::Approved => engine::WithdrawalStatus::Approved,
        ApiStatus::Processing => engine::WithdrawalStatus::Processing,
        ApiStatus::Success => engine::WithdrawalStatus::Success,
        ApiStatus::Rejected => engine::WithdrawalStatus::Rejected,
    }
}

fn map_withdrawal(withdrawal: engine::Withdrawal) -> WithdrawalView {
    WithdrawalView {
        id: withdrawal.id,
        withdrawal_no: withdrawal.withdrawal_no,
        user_id: withdrawal.user_id,
        kind: map_kind(withdrawal.kind),
        amount_minor: withdrawal.amount_minor,
        fee_minor: withdrawal.fee_minor,
        actual_amount_minor: withdrawal.actual_amount_minor,
        channel: withdrawal.channel,
        account_info: withdrawal.account_info,
        status: map_status(withdrawal.status),
        reject_reason: withdrawal.reject_reason,
        operator_id: withdrawal.operator_id,
        created_at: withdrawal.created_at,
        processed_at: withdrawal.processed_at,
    }
}

fn map_totals(totals: engine::StatusTotals) -> StatusTotalsView {
    StatusTotalsView {
        count: totals.count,
        amount_minor: totals.amount_minor,
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<WithdrawalView>, ServerError> {
    let withdrawal = state.engine.withdrawal(id).await?;
    Ok(Json(map_withdrawal(withdrawal)))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<WithdrawalList>,
) -> Result<Json<WithdrawalListResponse>, ServerError> {
    let filter = engine::WithdrawalListFilter {
        kind: query.kind.map(engine_kind),
        status: query.status.map(engine_status),
        user_id: query.user_id,
        from: query.from,
        to: query.to,
    };

    let (withdrawals, next_cursor) = state
        .engine
        .list_withdrawals_page(&filter, query.limit.unwrap_or(50), query.cursor.as_deref())
        .await?;

    Ok(Json(WithdrawalListResponse {
        withdrawals: withdrawals.into_iter().map(map_withdrawal).collect(),
        next_cursor,
    }))
}

pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<WithdrawalSummaryView>, ServerError> {
    let summary = state
        .engine
        .withdrawal_summary(query.from, query.to)
        .await?;

    Ok(Json(WithdrawalSummaryView {
        pending: map_totals(summary.pending),
        approved: map_totals(summary.approved),
        processing: map_totals(summary.processing),
        success: map_totals(summary.success),
        rejected: map_totals(summary.rejected),
        total: map_totals(summary.total),
    }))
}

pub async fn approve(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<WithdrawalView>, ServerError> {
    let withdrawal = state.engine.approve_withdrawal(id, operator.id).await?;
    Ok(Json(map_withdrawal(withdrawal)))
}

pub async fn reject(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<WithdrawalReject>,
) -> Result<Json<WithdrawalView>, ServerError> {
    let withdrawal = state
        .engine
        .reject_withdrawal(id, operator.id, &payload.reason)
        .await?;
    Ok(Json(map_withdrawal(withdrawal)))
}

pub async fn process(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<WithdrawalView>, ServerError> {
    let withdrawal = state.engine.process_withdrawal(id, operator.id).await?;
    Ok(Json(map_withdrawal(withdrawal)))
}

pub async fn complete(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<WithdrawalView>, ServerError> {
    let withdrawal = state.engine.complete_withdrawal(id, operator.id).await?;
    Ok(Json(map_withdrawal(withdrawal)))
}

fn require_ids(ids: &[i64]) -> Result<(), ServerError> {
    if ids.is_empty() {
        return Err(ServerError::Generic("ids must not be empty".to_string()));
    }
    Ok(())
}

pub async fn batch_approve(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchIds>,
) -> Result<Json<BatchResponse<WithdrawalView>>, ServerError> {
    require_ids(&payload.ids)?;
    let report = state
        .engine
        .batch_approve_withdrawals(&payload.ids, operator.id)
        .await;
    Ok(Json(batch_response(report, map_withdrawal)))
}

pub async fn batch_reject(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchReject>,
) -> Result<Json<BatchResponse<WithdrawalView>>, ServerError> {
    require_ids(&payload.ids)?;
    if payload.reason.trim().is_empty() {
        return Err(ServerError::Generic("reason must not be empty".to_string()));
    }
    let report = state
        .engine
        .batch_reject_withdrawals(&payload.ids, operator.id, &payload.reason)
        .await;
    Ok(Json(batch_response(report, map_withdrawal)))
}

pub async fn batch_complete(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchIds>,
) -> Result<Json<BatchResponse<WithdrawalView>>, ServerError> {
    require_ids(&payload.ids)?;
    let report = state
        .engine
        .batch_complete_withdrawals(&payload.ids, operator.id)
        .await;
    Ok(Json(batch_response(report, map_withdrawal)))
}
