//! CSV download endpoints

use api_types::export::{
    SettlementExport, TransactionExport, WalletTransactionKind as ApiKind, WithdrawalExport,
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, settlements, withdrawals};

fn engine_transaction_kind(kind: ApiKind) -> engine::WalletTransactionKind {
    match kind {
        ApiKind::Recharge => engine::WalletTransactionKind::Recharge,
        ApiKind::Consume => engine::WalletTransactionKind::Consume,
        ApiKind::Refund => engine::WalletTransactionKind::Refund,
        ApiKind::Withdraw => engine::WalletTransactionKind::Withdraw,
        ApiKind::Commission => engine::WalletTransactionKind::Commission,
    }
}

/// Wraps a rendered CSV into an attachment named `{stem}_{timestamp}.csv`.
fn attachment(stem: &str, body: Vec<u8>) -> Response {
    let filename = format!("{stem}_{}.csv", Utc::now().format("%Y%m%d%H%M%S"));
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn settlements(
    State(state): State<ServerState>,
    Query(query): Query<SettlementExport>,
) -> Result<Response, ServerError> {
    let filter = engine::SettlementListFilter {
        kind: query.kind.map(settlements::engine_kind),
        status: query.status.map(settlements::engine_status),
        target_id: query.target_id,
        from: query.from,
        to: query.to,
    };
    let body = state.engine.export_settlements(&filter).await?;
    Ok(attachment("settlements", body))
}

pub async fn withdrawals(
    State(state): State<ServerState>,
    Query(query): Query<WithdrawalExport>,
) -> Result<Response, ServerError> {
    let filter = engine::WithdrawalListFilter {
        kind: query.kind.map(withdrawals::engine_kind),
        status: query.status.map(withdrawals::engine_status),
        user_id: query.user_id,
        from: query.from,
        to: query.to,
    };
    let body = state.engine.export_withdrawals(&filter).await?;
    Ok(attachment("withdrawals", body))
}

pub async fn transactions(
    State(state): State<ServerState>,
    Query(query): Query<TransactionExport>,
) -> Result<Response, ServerError> {
    let filter = engine::TransactionExportFilter {
        user_id: query.user_id,
        kind: query.kind.map(engine_transaction_kind),
        from: query.from,
        to: query.to,
    };
    let body = state.engine.export_wallet_transactions(&filter).await?;
    Ok(attachment("wallet_transactions", body))
}
