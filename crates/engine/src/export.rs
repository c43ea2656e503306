//! CSV rendering for the back-office exports.
//!
//! Output is UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding. Amounts render as `12.34`, timestamps as
//! `YYYY-MM-DD HH:MM:SS` (UTC), and enum codes as their labels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{EngineError, Money, ResultEngine, Settlement, WalletTransaction, Withdrawal};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn optional_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(timestamp).unwrap_or_default()
}

fn amount(minor: i64) -> String {
    Money::new(minor).to_string()
}

#[derive(Serialize)]
struct SettlementRow<'a> {
    settlement_no: &'a str,
    kind: &'static str,
    target_id: i64,
    period_start: String,
    period_end: String,
    total_amount: String,
    fee: String,
    actual_amount: String,
    item_count: i64,
    status: &'static str,
    settled_at: String,
    created_at: String,
}

impl<'a> From<&'a Settlement> for SettlementRow<'a> {
    fn from(settlement: &'a Settlement) -> Self {
        Self {
            settlement_no: &settlement.settlement_no,
            kind: settlement.kind.label(),
            target_id: settlement.target_id,
            period_start: settlement.period_start.to_string(),
            period_end: settlement.period_end.to_string(),
            total_amount: amount(settlement.total_amount_minor),
            fee: amount(settlement.fee_minor),
            actual_amount: amount(settlement.actual_amount_minor),
            item_count: settlement.item_count,
            status: settlement.status.label(),
            settled_at: optional_timestamp(settlement.settled_at),
            created_at: timestamp(settlement.created_at),
        }
    }
}

#[derive(Serialize)]
struct WithdrawalRow<'a> {
    withdrawal_no: &'a str,
    user_id: i64,
    kind: &'static str,
    amount: String,
    fee: String,
    actual_amount: String,
    channel: &'a str,
    status: &'static str,
    reject_reason: &'a str,
    created_at: String,
    processed_at: String,
}

impl<'a> From<&'a Withdrawal> for WithdrawalRow<'a> {
    fn from(withdrawal: &'a Withdrawal) -> Self {
        Self {
            withdrawal_no: &withdrawal.withdrawal_no,
            user_id: withdrawal.user_id,
            kind: withdrawal.kind.label(),
            amount: amount(withdrawal.amount_minor),
            fee: amount(withdrawal.fee_minor),
            actual_amount: amount(withdrawal.actual_amount_minor),
            channel: &withdrawal.channel,
            status: withdrawal.status.label(),
            reject_reason: withdrawal.reject_reason.as_deref().unwrap_or_default(),
            created_at: timestamp(withdrawal.created_at),
            processed_at: optional_timestamp(withdrawal.processed_at),
        }
    }
}

#[derive(Serialize)]
struct WalletTransactionRow<'a> {
    id: i64,
    user_id: i64,
    kind: &'static str,
    amount: String,
    reference_no: &'a str,
    remark: &'a str,
    created_at: String,
}

impl<'a> From<&'a WalletTransaction> for WalletTransactionRow<'a> {
    fn from(transaction: &'a WalletTransaction) -> Self {
        Self {
            id: transaction.id,
            user_id: transaction.user_id,
            kind: transaction.kind.label(),
            amount: amount(transaction.amount_minor),
            reference_no: transaction.reference_no.as_deref().unwrap_or_default(),
            remark: transaction.remark.as_deref().unwrap_or_default(),
            created_at: timestamp(transaction.created_at),
        }
    }
}

/// Writes the BOM, the header row and one record per item. The header is
/// written even when `rows` is empty.
fn render<'a, T, R>(rows: &'a [T], headers: &[&str]) -> ResultEngine<Vec<u8>>
where
    R: Serialize + From<&'a T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.to_vec());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(R::from(row))?;
    }
    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.into_error().into()))
}

const SETTLEMENT_HEADERS: &[&str] = &[
    "Settlement No",
    "Type",
    "Target ID",
    "Period Start",
    "Period End",
    "Total Amount",
    "Fee",
    "Actual Amount",
    "Items",
    "Status",
    "Settled At",
    "Created At",
];

const WITHDRAWAL_HEADERS: &[&str] = &[
    "Withdrawal No",
    "User ID",
    "Type",
    "Amount",
    "Fee",
    "Actual Amount",
    "Channel",
    "Status",
    "Reject Reason",
    "Created At",
    "Processed At",
];

const WALLET_TRANSACTION_HEADERS: &[&str] = &[
    "ID",
    "User ID",
    "Type",
    "Amount",
    "Reference No",
    "Remark",
    "Created At",
];

pub fn settlements_csv(settlements: &[Settlement]) -> ResultEngine<Vec<u8>> {
    render::<_, SettlementRow>(settlements, SETTLEMENT_HEADERS)
}

pub fn withdrawals_csv(withdrawals: &[Withdrawal]) -> ResultEngine<Vec<u8>> {
    render::<_, WithdrawalRow>(withdrawals, WITHDRAWAL_HEADERS)
}

pub fn wallet_transactions_csv(transactions: &[WalletTransaction]) -> ResultEngine<Vec<u8>> {
    render::<_, WalletTransactionRow>(transactions, WALLET_TRANSACTION_HEADERS)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::{SettlementKind, SettlementStatus, WalletTransactionKind};

    fn settlement() -> Settlement {
        Settlement {
            id: 1,
            settlement_no: "ST00000001".to_string(),
            kind: SettlementKind::Merchant,
            target_id: 3,
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            total_amount_minor: 10_000,
            fee_minor: 1_000,
            actual_amount_minor: 9_000,
            item_count: 1,
            status: SettlementStatus::Completed,
            operator_id: Some(1),
            settled_at: Some(Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 5).unwrap()),
            created_at: Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn settlements_render_with_bom_and_labels() {
        let bytes = settlements_csv(&[settlement()]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), SETTLEMENT_HEADERS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "ST00000001,Merchant,3,2024-03-01,2024-03-31,100.00,10.00,90.00,1,Completed,\
             2024-04-02 09:30:05,2024-04-01 08:00:00"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_export_still_has_a_header() {
        let bytes = withdrawals_csv(&[]).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.trim_end(), WITHDRAWAL_HEADERS.join(","));
    }

    #[test]
    fn transactions_quote_free_text() {
        let transaction = WalletTransaction {
            id: 9,
            user_id: 7,
            kind: WalletTransactionKind::Withdraw,
            amount_minor: 1_050,
            reference_no: Some("WD00000001".to_string()),
            remark: Some("paid, thanks".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        };
        let bytes = wallet_transactions_csv(&[transaction]).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let row = text.lines().nth(1).unwrap();
        let expected = format!(
            "9,7,{},10.50,WD00000001,\"paid, thanks\",2024-05-01 00:00:00",
            WalletTransactionKind::Withdraw.label()
        );
        assert_eq!(row, expected);
    }
}
