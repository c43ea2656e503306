use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{exports, overview, reports, settlements, withdrawals};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Basic-auth guard: resolves the operator and stores it in the request
/// extensions for the handlers.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let operator = state
        .engine
        .authenticate_operator(auth_header.username(), auth_header.password())
        .await
        .map_err(|err| {
            tracing::error!("operator lookup failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(operator) = operator else {
        tracing::debug!(username = auth_header.username(), "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(operator);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/overview", get(overview::get))
        .route("/reports/revenue/daily", get(reports::revenue_daily))
        .route("/reports/refunds/daily", get(reports::refunds_daily))
        .route("/reports/revenue/order-types", get(reports::revenue_by_order_type))
        .route("/reports/payment-channels", get(reports::payment_channels))
        .route(
            "/settlements",
            get(settlements::list).post(settlements::settlement_new),
        )
        .route("/settlements/stats", get(settlements::stats))
        .route("/settlements/generate", post(settlements::generate))
        .route("/settlements/{id}", get(settlements::get_detail))
        .route("/settlements/{id}/process", post(settlements::process))
        .route("/withdrawals", get(withdrawals::list))
        .route("/withdrawals/summary", get(withdrawals::summary))
        .route("/withdrawals/batch/approve", post(withdrawals::batch_approve))
        .route("/withdrawals/batch/reject", post(withdrawals::batch_reject))
        .route("/withdrawals/batch/complete", post(withdrawals::batch_complete))
        .route("/withdrawals/{id}", get(withdrawals::get))
        .route("/withdrawals/{id}/approve", post(withdrawals::approve))
        .route("/withdrawals/{id}/reject", post(withdrawals::reject))
        .route("/withdrawals/{id}/process", post(withdrawals::process))
        .route("/withdrawals/{id}/complete", post(withdrawals::complete))
        .route("/exports/settlements", get(exports::settlements))
        .route("/exports/withdrawals", get(exports::withdrawals))
        .route("/exports/transactions", get(exports::transactions))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
