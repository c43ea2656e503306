use std::sync::Arc;

use base64::Engine as _;
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, Statement, Value};
use serde::{Deserialize, Serialize};

use crate::{EngineError, NumberGenerator, ResultEngine, TimestampNumberGenerator};

mod exports;
mod operators;
mod overview;
mod reports;
mod settlements;
mod withdrawals;

pub use exports::{EXPORT_ROW_LIMIT, TransactionExportFilter};
pub use overview::Overview;
pub use reports::{
    ChannelShare, DailyRefund, DailyRevenue, OrderTypeRevenue, SettlementKindStats,
    SettlementStats,
};
pub use settlements::SettlementListFilter;
pub use withdrawals::{StatusTotals, WithdrawalListFilter, WithdrawalSummary};

/// Run a block inside a DB transaction, committing on success.
///
/// On `Err` (including an early `?` return) or a panic the transaction is
/// dropped without commit, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    numbers: Arc<dyn NumberGenerator>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn next_number(&self, prefix: &str) -> String {
        self.numbers.next_number(prefix)
    }
}

/// `SUM` + `COUNT` projection of an aggregate query.
#[derive(Debug, Default, FromQueryResult)]
pub(crate) struct SumCount {
    pub total: i64,
    pub items: i64,
}

/// `GROUP BY` row of an aggregate query.
#[derive(Debug, FromQueryResult)]
pub(crate) struct KeyedSumCount {
    pub key: String,
    pub total: i64,
    pub items: i64,
}

pub(crate) async fn sum_count<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    values: Vec<Value>,
) -> ResultEngine<SumCount> {
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    Ok(SumCount::find_by_statement(stmt)
        .one(db)
        .await?
        .unwrap_or_default())
}

pub(crate) async fn keyed_sum_count<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    values: Vec<Value>,
) -> ResultEngine<Vec<KeyedSumCount>> {
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    Ok(KeyedSumCount::find_by_statement(stmt).all(db).await?)
}

/// Opaque pagination cursor: the last id returned (lists are newest first).
#[derive(Clone, Debug, Serialize, Deserialize)]
struct IdCursor {
    id: i64,
}

pub(crate) fn encode_cursor(id: i64) -> ResultEngine<String> {
    let bytes = serde_json::to_vec(&IdCursor { id })
        .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn decode_cursor(input: &str) -> ResultEngine<i64> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(input.as_bytes())
        .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))?;
    serde_json::from_slice::<IdCursor>(&bytes)
        .map(|cursor| cursor.id)
        .map_err(|_| EngineError::InvalidCursor("invalid cursor".to_string()))
}

/// Page size bounds for list endpoints.
pub(crate) fn clamp_limit(limit: u64) -> u64 {
    limit.clamp(1, 500)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    numbers: Option<Arc<dyn NumberGenerator>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the settlement / withdrawal number generator
    /// (default: [`TimestampNumberGenerator`]).
    pub fn number_generator(mut self, numbers: Arc<dyn NumberGenerator>) -> EngineBuilder {
        self.numbers = Some(numbers);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            numbers: self
                .numbers
                .unwrap_or_else(|| Arc::new(TimestampNumberGenerator)),
        })
    }
}
