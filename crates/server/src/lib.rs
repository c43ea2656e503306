use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod batch;
mod exports;
mod overview;
mod reports;
mod server;
mod settlements;
mod withdrawals;

pub mod types {
    pub mod settlement {
        pub use api_types::settlement::{
            SettlementDetailView, SettlementGenerate, SettlementKind, SettlementKindStatsView,
            SettlementList, SettlementListResponse, SettlementNew, SettlementStatsView,
            SettlementStatus, SettlementView,
        };
    }

    pub mod withdrawal {
        pub use api_types::withdrawal::{
            BatchIds, BatchReject, StatusTotalsView, SummaryQuery, WithdrawalKind, WithdrawalList,
            WithdrawalListResponse, WithdrawalReject, WithdrawalStatus, WithdrawalSummaryView,
            WithdrawalView,
        };
    }

    pub mod batch {
        pub use api_types::batch::{BatchItemView, BatchResponse};
    }

    pub mod report {
        pub use api_types::report::{
            ChannelShareView, DailyRefundView, DailyRevenueView, DateRange, OrderTypeRevenueView,
        };
    }

    pub mod overview {
        pub use api_types::overview::OverviewView;
    }

    pub mod export {
        pub use api_types::export::{
            SettlementExport, TransactionExport, WalletTransactionKind, WithdrawalExport,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateRecord => StatusCode::CONFLICT,
        ErrorKind::InvalidOperation | ErrorKind::InvalidStatus => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Internal | ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err.kind() {
        ErrorKind::Internal | ErrorKind::Database => {
            tracing::error!("engine error: {err}");
            "internal server error".to_string()
        }
        _ => err.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
