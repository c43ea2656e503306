mod common;

use common::*;
use engine::{
    ErrorKind, Period, SettlementKind, SettlementListFilter, TransactionExportFilter, UTF8_BOM,
    WithdrawalListFilter,
};

#[tokio::test]
async fn daily_revenue_is_densified() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "alice").await;
    let order = insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        1_500,
        Some(at(2024, 5, 2, 9)),
    )
    .await;
    insert_order(
        &db,
        "O-2",
        user_id,
        device,
        "rental",
        "completed",
        500,
        Some(at(2024, 5, 2, 23)),
    )
    .await;
    insert_order(
        &db,
        "O-3",
        user_id,
        device,
        "rental",
        "cancelled",
        900,
        Some(at(2024, 5, 2, 10)),
    )
    .await;
    let payment = insert_payment(
        &db,
        order,
        user_id,
        "wechat",
        1_500,
        "success",
        Some(at(2024, 5, 2, 9)),
    )
    .await;
    insert_refund(&db, order, payment, 300, "success", Some(at(2024, 5, 3, 8))).await;
    insert_refund(&db, order, payment, 999, "failed", Some(at(2024, 5, 3, 8))).await;

    let rows = engine
        .revenue_by_day(date(2024, 5, 1), date(2024, 5, 3))
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].date, date(2024, 5, 1));
    assert_eq!((rows[0].revenue_minor, rows[0].order_count, rows[0].refund_minor), (0, 0, 0));
    assert_eq!((rows[1].revenue_minor, rows[1].order_count, rows[1].refund_minor), (2_000, 2, 0));
    assert_eq!((rows[2].revenue_minor, rows[2].order_count, rows[2].refund_minor), (0, 0, 300));

    let refunds = engine
        .refund_by_day(date(2024, 5, 1), date(2024, 5, 3))
        .await
        .unwrap();
    assert_eq!(refunds.len(), 3);
    assert_eq!((refunds[2].amount_minor, refunds[2].count), (300, 1));
    assert_eq!(refunds[0].count, 0);
}

#[tokio::test]
async fn quiet_days_around_one_busy_day_are_zero_filled() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "alice").await;
    let order = insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        1_200,
        Some(at(2024, 6, 11, 10)),
    )
    .await;
    let payment = insert_payment(
        &db,
        order,
        user_id,
        "alipay",
        1_200,
        "success",
        Some(at(2024, 6, 11, 10)),
    )
    .await;
    insert_refund(&db, order, payment, 200, "success", Some(at(2024, 6, 11, 18))).await;

    let rows = engine
        .revenue_by_day(date(2024, 6, 10), date(2024, 6, 12))
        .await
        .unwrap();

    let days: Vec<_> = rows.iter().map(|row| row.date).collect();
    assert_eq!(days, vec![date(2024, 6, 10), date(2024, 6, 11), date(2024, 6, 12)]);
    assert_eq!((rows[0].revenue_minor, rows[0].order_count, rows[0].refund_minor), (0, 0, 0));
    assert_eq!(
        (rows[1].revenue_minor, rows[1].order_count, rows[1].refund_minor),
        (1_200, 1, 200)
    );
    assert_eq!((rows[2].revenue_minor, rows[2].order_count, rows[2].refund_minor), (0, 0, 0));

    let refunds = engine
        .refund_by_day(date(2024, 6, 10), date(2024, 6, 12))
        .await
        .unwrap();
    let counts: Vec<_> = refunds.iter().map(|row| (row.amount_minor, row.count)).collect();
    assert_eq!(counts, vec![(0, 0), (200, 1), (0, 0)]);
}

#[tokio::test]
async fn channel_breakdown_orders_ties_by_name_within_the_period() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "alice").await;
    let order = insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        1_000,
        Some(at(2024, 7, 1, 9)),
    )
    .await;
    insert_payment(&db, order, user_id, "wechat", 400, "success", Some(at(2024, 7, 1, 9))).await;
    insert_payment(&db, order, user_id, "alipay", 400, "success", Some(at(2024, 7, 2, 9))).await;
    insert_payment(&db, order, user_id, "wallet", 200, "success", Some(at(2024, 7, 3, 9))).await;
    insert_payment(&db, order, user_id, "wallet", 900, "success", Some(at(2024, 8, 1, 0))).await;
    insert_payment(&db, order, user_id, "card", 500, "pending", None).await;

    let channels = engine
        .payment_channel_breakdown(date(2024, 7, 1), date(2024, 7, 31))
        .await
        .unwrap();

    let names: Vec<_> = channels.iter().map(|share| share.channel.as_str()).collect();
    assert_eq!(names, vec!["alipay", "wechat", "wallet"]);
    assert_eq!((channels[2].amount_minor, channels[2].count), (200, 1));
    assert_eq!(channels[0].percentage, 40.0);
    assert_eq!(channels[2].percentage, 20.0);
}

#[tokio::test]
async fn report_ranges_are_validated() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .revenue_by_day(date(2024, 5, 3), date(2024, 5, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = engine
        .refund_by_day(date(2023, 1, 1), date(2024, 5, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn revenue_by_order_type_and_channels() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "bob").await;
    let first = insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        600,
        Some(at(2024, 6, 1, 1)),
    )
    .await;
    let second = insert_order(
        &db,
        "O-2",
        user_id,
        device,
        "retail",
        "completed",
        300,
        Some(at(2024, 6, 1, 2)),
    )
    .await;
    let third = insert_order(
        &db,
        "O-3",
        user_id,
        device,
        "locker",
        "completed",
        100,
        Some(at(2024, 6, 2, 2)),
    )
    .await;
    insert_payment(&db, first, user_id, "wechat", 600, "success", Some(at(2024, 6, 1, 1))).await;
    insert_payment(&db, second, user_id, "alipay", 300, "success", Some(at(2024, 6, 1, 2))).await;
    insert_payment(&db, third, user_id, "wechat", 100, "success", Some(at(2024, 6, 2, 2))).await;
    insert_payment(&db, third, user_id, "wallet", 100, "failed", Some(at(2024, 6, 2, 2))).await;

    let by_type = engine
        .revenue_by_order_type(date(2024, 6, 1), date(2024, 6, 30))
        .await
        .unwrap();
    assert_eq!(by_type.len(), 2);
    assert_eq!(by_type[0].order_type, "locker");
    assert_eq!((by_type[0].revenue_minor, by_type[0].order_count), (700, 2));
    assert_eq!((by_type[1].revenue_minor, by_type[1].order_count), (300, 1));

    let channels = engine
        .payment_channel_breakdown(date(2024, 6, 1), date(2024, 6, 30))
        .await
        .unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].channel, "wechat");
    assert_eq!(channels[0].amount_minor, 700);
    assert_eq!(channels[0].count, 2);
    assert_eq!(channels[0].percentage, 70.0);
    assert_eq!(channels[1].percentage, 30.0);

    let empty = engine
        .payment_channel_breakdown(date(2025, 1, 1), date(2025, 1, 2))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn overview_compares_months_and_nets_profit() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "carol").await;
    let last_month = insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        1_000,
        Some(at(2024, 4, 20, 10)),
    )
    .await;
    insert_order(
        &db,
        "O-2",
        user_id,
        device,
        "locker",
        "completed",
        1_200,
        Some(at(2024, 5, 3, 10)),
    )
    .await;
    insert_order(
        &db,
        "O-3",
        user_id,
        device,
        "rental",
        "completed",
        300,
        Some(at(2024, 5, 15, 1)),
    )
    .await;
    let payment = insert_payment(
        &db,
        last_month,
        user_id,
        "wechat",
        1_000,
        "success",
        Some(at(2024, 4, 20, 10)),
    )
    .await;
    insert_refund(&db, last_month, payment, 200, "success", Some(at(2024, 4, 21, 10))).await;
    let distributor = insert_distributor(&db, user_id, 0, 0).await;
    insert_commission(&db, distributor, last_month, 100, "settled", at(2024, 4, 20, 10)).await;
    insert_commission(&db, distributor, last_month, 999, "pending", at(2024, 4, 20, 10)).await;
    insert_withdrawal(&db, "WD-1", user_id, "wallet", 450, 0, "pending").await;
    insert_withdrawal(&db, "WD-2", user_id, "wallet", 50, 0, "success").await;

    let overview = engine.overview(at(2024, 5, 15, 12)).await.unwrap();

    assert_eq!(overview.today_revenue_minor, 300);
    assert_eq!(overview.month_revenue_minor, 1_500);
    assert_eq!(overview.last_month_revenue_minor, 1_000);
    assert_eq!(overview.growth_rate, 50.0);
    assert_eq!(overview.total_revenue_minor, 2_500);
    assert_eq!(overview.total_refund_minor, 200);
    assert_eq!(overview.total_commission_minor, 100);
    assert_eq!(overview.net_profit_minor, 2_200);
    assert_eq!(overview.pending_withdrawal_count, 1);
    assert_eq!(overview.pending_withdrawal_amount_minor, 450);
    assert_eq!(overview.pending_settlement_count, 0);
}

#[tokio::test]
async fn overview_growth_without_last_month() {
    let (engine, db) = engine_with_db().await;
    let (_, device) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "dave").await;

    let empty = engine.overview(at(2024, 1, 10, 0)).await.unwrap();
    assert_eq!(empty.growth_rate, 0.0);

    insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        100,
        Some(at(2024, 1, 2, 0)),
    )
    .await;
    let overview = engine.overview(at(2024, 1, 10, 0)).await.unwrap();
    assert_eq!(overview.last_month_revenue_minor, 0);
    assert_eq!(overview.growth_rate, 100.0);
}

#[tokio::test]
async fn exports_render_filtered_rows() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, _) = merchant_with_device(&db, "Acme", 1_000).await;
    let user_id = insert_user(&db, "erin").await;
    insert_wallet(&db, user_id, 0, 500).await;
    let withdrawal = insert_withdrawal(&db, "WD-1", user_id, "wallet", 500, 5, "approved").await;
    engine.complete_withdrawal(withdrawal, 1).await.unwrap();
    let period = Period::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
    engine
        .create_settlement(SettlementKind::Merchant, merchant_id, period, 1)
        .await
        .unwrap();

    let csv = engine
        .export_settlements(&SettlementListFilter::default())
        .await
        .unwrap();
    assert!(csv.starts_with(UTF8_BOM));
    let text = String::from_utf8(csv[UTF8_BOM.len()..].to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().nth(1).unwrap().starts_with("ST00000001,Merchant,"));

    let csv = engine
        .export_withdrawals(&WithdrawalListFilter::default())
        .await
        .unwrap();
    let text = String::from_utf8(csv[UTF8_BOM.len()..].to_vec()).unwrap();
    let row = text.lines().nth(1).unwrap();
    assert!(row.starts_with("WD-1,"));
    assert!(row.contains(",5.00,0.05,4.95,alipay,Paid,"));

    let filter = TransactionExportFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    let csv = engine.export_wallet_transactions(&filter).await.unwrap();
    let text = String::from_utf8(csv[UTF8_BOM.len()..].to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains(",5.00,WD-1,"));
}

#[tokio::test]
async fn operators_authenticate_with_their_password() {
    let (engine, _db) = engine_with_db().await;
    let operator = engine
        .create_operator("root", "s3cret", "admin")
        .await
        .unwrap();

    let found = engine
        .authenticate_operator("root", "s3cret")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, operator);
    assert!(engine
        .authenticate_operator("root", "wrong")
        .await
        .unwrap()
        .is_none());
    assert!(engine
        .authenticate_operator("nobody", "s3cret")
        .await
        .unwrap()
        .is_none());

    let err = engine
        .create_operator("root", "other", "admin")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateRecord);
}
