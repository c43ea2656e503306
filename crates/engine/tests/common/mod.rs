#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};

use engine::{Engine, SequenceNumberGenerator};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .number_generator(Arc::new(SequenceNumberGenerator::new()))
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) -> i64 {
    let backend = db.get_database_backend();
    let result = db
        .execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
    result.last_insert_id() as i64
}

pub async fn query_i64(db: &DatabaseConnection, sql: &str, values: Vec<Value>) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}

pub async fn insert_merchant(db: &DatabaseConnection, name: &str, rate_bps: i32) -> i64 {
    exec(
        db,
        "INSERT INTO merchants (name, commission_rate_bps, status, created_at) \
         VALUES (?, ?, 'active', ?)",
        vec![name.into(), rate_bps.into(), at(2024, 1, 1, 0).into()],
    )
    .await
}

pub async fn insert_disabled_merchant(db: &DatabaseConnection, name: &str) -> i64 {
    exec(
        db,
        "INSERT INTO merchants (name, commission_rate_bps, status, created_at) \
         VALUES (?, 1000, 'disabled', ?)",
        vec![name.into(), at(2024, 1, 1, 0).into()],
    )
    .await
}

/// A merchant with one venue and one device; returns `(merchant_id, device_id)`.
pub async fn merchant_with_device(
    db: &DatabaseConnection,
    name: &str,
    rate_bps: i32,
) -> (i64, i64) {
    let merchant_id = insert_merchant(db, name, rate_bps).await;
    let venue_id = exec(
        db,
        "INSERT INTO venues (merchant_id, name, created_at) VALUES (?, ?, ?)",
        vec![
            merchant_id.into(),
            format!("{name} venue").into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await;
    let device_id = exec(
        db,
        "INSERT INTO devices (venue_id, device_no, created_at) VALUES (?, ?, ?)",
        vec![
            venue_id.into(),
            format!("DEV-{merchant_id}").into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await;
    (merchant_id, device_id)
}

pub async fn insert_user(db: &DatabaseConnection, nickname: &str) -> i64 {
    exec(
        db,
        "INSERT INTO users (nickname, created_at) VALUES (?, ?)",
        vec![nickname.into(), at(2024, 1, 1, 0).into()],
    )
    .await
}

pub async fn insert_wallet(db: &DatabaseConnection, user_id: i64, balance: i64, frozen: i64) {
    exec(
        db,
        "INSERT INTO user_wallets \
         (user_id, balance_minor, frozen_balance_minor, total_withdrawn_minor, updated_at) \
         VALUES (?, ?, ?, 0, ?)",
        vec![
            user_id.into(),
            balance.into(),
            frozen.into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await;
}

pub async fn insert_order(
    db: &DatabaseConnection,
    order_no: &str,
    user_id: i64,
    device_id: i64,
    order_type: &str,
    status: &str,
    amount: i64,
    completed_at: Option<DateTime<Utc>>,
) -> i64 {
    exec(
        db,
        "INSERT INTO orders \
         (order_no, user_id, device_id, order_type, status, total_amount_minor, \
          actual_amount_minor, created_at, completed_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            order_no.into(),
            user_id.into(),
            device_id.into(),
            order_type.into(),
            status.into(),
            amount.into(),
            amount.into(),
            completed_at.unwrap_or_else(|| at(2024, 1, 1, 0)).into(),
            completed_at.into(),
        ],
    )
    .await
}

pub async fn insert_payment(
    db: &DatabaseConnection,
    order_id: i64,
    user_id: i64,
    channel: &str,
    amount: i64,
    status: &str,
    paid_at: Option<DateTime<Utc>>,
) -> i64 {
    exec(
        db,
        "INSERT INTO payments \
         (payment_no, order_id, user_id, channel, amount_minor, status, paid_at, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            format!("PAY-{order_id}-{channel}-{amount}").into(),
            order_id.into(),
            user_id.into(),
            channel.into(),
            amount.into(),
            status.into(),
            paid_at.into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await
}

pub async fn insert_refund(
    db: &DatabaseConnection,
    order_id: i64,
    payment_id: i64,
    amount: i64,
    status: &str,
    refunded_at: Option<DateTime<Utc>>,
) -> i64 {
    exec(
        db,
        "INSERT INTO refunds \
         (refund_no, order_id, payment_id, amount_minor, status, refunded_at, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            format!("RF-{payment_id}-{amount}").into(),
            order_id.into(),
            payment_id.into(),
            amount.into(),
            status.into(),
            refunded_at.into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await
}

pub async fn insert_distributor(
    db: &DatabaseConnection,
    user_id: i64,
    available: i64,
    frozen: i64,
) -> i64 {
    exec(
        db,
        "INSERT INTO distributors \
         (user_id, level, available_commission_minor, frozen_commission_minor, \
          withdrawn_commission_minor, total_commission_minor, status, created_at) \
         VALUES (?, 1, ?, ?, 0, ?, 'active', ?)",
        vec![
            user_id.into(),
            available.into(),
            frozen.into(),
            (available + frozen).into(),
            at(2024, 1, 1, 0).into(),
        ],
    )
    .await
}

pub async fn insert_commission(
    db: &DatabaseConnection,
    distributor_id: i64,
    order_id: i64,
    amount: i64,
    status: &str,
    created_at: DateTime<Utc>,
) -> i64 {
    exec(
        db,
        "INSERT INTO commissions \
         (distributor_id, order_id, amount_minor, rate_bps, status, created_at) \
         VALUES (?, ?, ?, 1000, ?, ?)",
        vec![
            distributor_id.into(),
            order_id.into(),
            amount.into(),
            status.into(),
            created_at.into(),
        ],
    )
    .await
}

pub async fn insert_withdrawal(
    db: &DatabaseConnection,
    withdrawal_no: &str,
    user_id: i64,
    kind: &str,
    amount: i64,
    fee: i64,
    status: &str,
) -> i64 {
    exec(
        db,
        "INSERT INTO withdrawals \
         (withdrawal_no, user_id, kind, amount_minor, fee_minor, actual_amount_minor, \
          channel, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 'alipay', ?, ?)",
        vec![
            withdrawal_no.into(),
            user_id.into(),
            kind.into(),
            amount.into(),
            fee.into(),
            (amount - fee).into(),
            status.into(),
            at(2024, 3, 10, 12).into(),
        ],
    )
    .await
}
