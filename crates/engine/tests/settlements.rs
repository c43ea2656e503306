mod common;

use common::*;
use sea_orm::{ConnectionTrait, SqlErr, Statement};
use engine::{
    EngineError, ErrorKind, ItemOutcome, Period, SettlementKind, SettlementListFilter,
    SettlementStatus, SkipReason,
};

fn march() -> Period {
    Period::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap()
}

#[tokio::test]
async fn merchant_settlement_takes_commission_share() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, device_id) = merchant_with_device(&db, "Acme Lockers", 1_000).await;
    let user_id = insert_user(&db, "bob").await;
    insert_order(
        &db,
        "O-1",
        user_id,
        device_id,
        "locker",
        "completed",
        10_000,
        Some(at(2024, 3, 15, 10)),
    )
    .await;

    let settlement = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();

    assert_eq!(settlement.settlement_no, "ST00000001");
    assert_eq!(settlement.kind, SettlementKind::Merchant);
    assert_eq!(settlement.total_amount_minor, 10_000);
    assert_eq!(settlement.fee_minor, 1_000);
    assert_eq!(settlement.actual_amount_minor, 9_000);
    assert_eq!(settlement.item_count, 1);
    assert_eq!(settlement.status, SettlementStatus::Pending);
    assert_eq!(settlement.operator_id, Some(1));
}

#[tokio::test]
async fn merchant_total_ignores_other_merchants_statuses_and_periods() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, device_id) = merchant_with_device(&db, "Acme", 250).await;
    let (_, other_device) = merchant_with_device(&db, "Other", 250).await;
    let user_id = insert_user(&db, "bob").await;

    insert_order(
        &db,
        "O-1",
        user_id,
        device_id,
        "locker",
        "completed",
        1_999,
        Some(at(2024, 3, 1, 0)),
    )
    .await;
    insert_order(
        &db,
        "O-2",
        user_id,
        device_id,
        "rental",
        "completed",
        3_001,
        Some(at(2024, 3, 31, 23)),
    )
    .await;
    // outside the period, on both edges
    insert_order(
        &db,
        "O-3",
        user_id,
        device_id,
        "locker",
        "completed",
        500,
        Some(at(2024, 2, 29, 23)),
    )
    .await;
    insert_order(
        &db,
        "O-4",
        user_id,
        device_id,
        "locker",
        "completed",
        500,
        Some(at(2024, 4, 1, 0)),
    )
    .await;
    // not completed
    insert_order(&db, "O-5", user_id, device_id, "locker", "paid", 700, None).await;
    insert_order(
        &db,
        "O-6",
        user_id,
        device_id,
        "locker",
        "refunded",
        700,
        Some(at(2024, 3, 5, 0)),
    )
    .await;
    // another merchant
    insert_order(
        &db,
        "O-7",
        user_id,
        other_device,
        "locker",
        "completed",
        900,
        Some(at(2024, 3, 5, 0)),
    )
    .await;

    let settlement = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();

    assert_eq!(settlement.total_amount_minor, 5_000);
    assert_eq!(settlement.item_count, 2);
    assert_eq!(settlement.fee_minor, 125);
    assert_eq!(
        settlement.fee_minor + settlement.actual_amount_minor,
        settlement.total_amount_minor
    );
}

#[tokio::test]
async fn zero_total_still_creates_a_pending_settlement() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, _) = merchant_with_device(&db, "Quiet", 1_000).await;

    let settlement = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();

    assert_eq!(settlement.total_amount_minor, 0);
    assert_eq!(settlement.item_count, 0);
    assert_eq!(settlement.status, SettlementStatus::Pending);
}

#[tokio::test]
async fn duplicate_settlement_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, _) = merchant_with_device(&db, "Acme", 1_000).await;

    engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();
    let err = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 2)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateRecord);
    let count = query_i64(&db, "SELECT COUNT(*) FROM settlements", vec![]).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unique_index_rejects_duplicates_that_skip_the_pre_check() {
    let (_engine, db) = engine_with_db().await;
    let sql = "INSERT INTO settlements \
               (settlement_no, kind, target_id, period_start, period_end, status, created_at) \
               VALUES (?, 'merchant', 1, ?, ?, 'pending', ?)";
    let values = |no: &str| {
        vec![
            no.into(),
            date(2024, 3, 1).into(),
            date(2024, 3, 31).into(),
            at(2024, 4, 1, 0).into(),
        ]
    };
    exec(&db, sql, values("ST-A")).await;

    let backend = db.get_database_backend();
    let err = db
        .execute(Statement::from_sql_and_values(backend, sql, values("ST-B")))
        .await
        .unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn missing_targets_are_reported() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_settlement(SettlementKind::Merchant, 404, march(), 1)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::MerchantNotFound("404".to_string()));

    let err = engine
        .create_settlement(SettlementKind::Distributor, 405, march(), 1)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DistributorNotFound("405".to_string()));
}

#[tokio::test]
async fn distributor_settlement_settles_commissions_and_credits_available() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_user(&db, "carol").await;
    let distributor_id = insert_distributor(&db, user_id, 500, 0).await;
    let in_period =
        insert_commission(&db, distributor_id, 1, 1_000, "pending", at(2024, 3, 20, 8)).await;
    let next_month =
        insert_commission(&db, distributor_id, 2, 300, "pending", at(2024, 4, 1, 0)).await;
    insert_commission(&db, distributor_id, 3, 700, "settled", at(2024, 3, 21, 8)).await;

    let settlement = engine
        .create_settlement(SettlementKind::Distributor, distributor_id, march(), 1)
        .await
        .unwrap();
    assert_eq!(settlement.total_amount_minor, 1_000);
    assert_eq!(settlement.fee_minor, 0);
    assert_eq!(settlement.actual_amount_minor, 1_000);
    assert_eq!(settlement.item_count, 1);

    let processed = engine.process_settlement(settlement.id, 7).await.unwrap();
    assert_eq!(processed.status, SettlementStatus::Completed);
    assert_eq!(processed.operator_id, Some(7));
    assert!(processed.settled_at.is_some());

    let settled = query_i64(
        &db,
        "SELECT COUNT(*) FROM commissions WHERE status = 'settled' AND settlement_id = ?",
        vec![settlement.id.into()],
    )
    .await;
    assert_eq!(settled, 1);
    let swept_id = query_i64(
        &db,
        "SELECT id FROM commissions WHERE settlement_id = ?",
        vec![settlement.id.into()],
    )
    .await;
    assert_eq!(swept_id, in_period);
    let untouched = query_i64(
        &db,
        "SELECT COUNT(*) FROM commissions WHERE id = ? AND status = 'pending'",
        vec![next_month.into()],
    )
    .await;
    assert_eq!(untouched, 1);

    let balance = engine.distributor_balance(distributor_id).await.unwrap();
    assert_eq!(balance.available_commission_minor, 1_500);
}

#[tokio::test]
async fn processing_leaves_other_distributors_commissions_alone() {
    let (engine, db) = engine_with_db().await;
    let carol = insert_user(&db, "carol").await;
    let dave = insert_user(&db, "dave").await;
    let settled_distributor = insert_distributor(&db, carol, 500, 0).await;
    let other_distributor = insert_distributor(&db, dave, 200, 0).await;
    insert_commission(&db, settled_distributor, 1, 1_000, "pending", at(2024, 3, 10, 8)).await;
    let other_commission =
        insert_commission(&db, other_distributor, 2, 400, "pending", at(2024, 3, 12, 8)).await;

    let settlement = engine
        .create_settlement(SettlementKind::Distributor, settled_distributor, march(), 1)
        .await
        .unwrap();
    engine.process_settlement(settlement.id, 7).await.unwrap();

    let still_pending = query_i64(
        &db,
        "SELECT COUNT(*) FROM commissions \
         WHERE id = ? AND status = 'pending' AND settlement_id IS NULL",
        vec![other_commission.into()],
    )
    .await;
    assert_eq!(still_pending, 1);
    let swept = query_i64(
        &db,
        "SELECT COUNT(*) FROM commissions WHERE settlement_id = ?",
        vec![settlement.id.into()],
    )
    .await;
    assert_eq!(swept, 1);

    let other = engine.distributor_balance(other_distributor).await.unwrap();
    assert_eq!(other.available_commission_minor, 200);
    let credited = engine.distributor_balance(settled_distributor).await.unwrap();
    assert_eq!(credited.available_commission_minor, 1_500);
}

#[tokio::test]
async fn processing_twice_fails_and_leaves_the_record() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, _) = merchant_with_device(&db, "Acme", 1_000).await;
    let settlement = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();

    let first = engine.process_settlement(settlement.id, 1).await.unwrap();
    let err = engine.process_settlement(settlement.id, 2).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    let after = engine.settlement(settlement.id).await.unwrap();
    assert_eq!(after, first);
}

#[tokio::test]
async fn processing_a_missing_settlement_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine.process_settlement(99, 1).await.unwrap_err();
    assert_eq!(err, EngineError::SettlementNotFound("99".to_string()));
}

#[tokio::test]
async fn failed_processing_rolls_back_to_pending() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_user(&db, "dave").await;
    let distributor_id = insert_distributor(&db, user_id, 0, 0).await;
    insert_commission(&db, distributor_id, 1, 400, "pending", at(2024, 3, 2, 0)).await;
    let settlement = engine
        .create_settlement(SettlementKind::Distributor, distributor_id, march(), 1)
        .await
        .unwrap();

    // the distributor vanishes between creation and processing
    exec(&db, "PRAGMA foreign_keys = OFF", vec![]).await;
    exec(&db, "DELETE FROM distributors WHERE id = ?", vec![distributor_id.into()]).await;

    let err = engine.process_settlement(settlement.id, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let after = engine.settlement(settlement.id).await.unwrap();
    assert_eq!(after.status, SettlementStatus::Pending);
    let pending = query_i64(
        &db,
        "SELECT COUNT(*) FROM commissions WHERE status = 'pending'",
        vec![],
    )
    .await;
    assert_eq!(pending, 1);
}

#[tokio::test]
async fn merchant_batch_skips_settled_and_empty_merchants() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_user(&db, "erin").await;
    let (busy, busy_device) = merchant_with_device(&db, "Busy", 1_000).await;
    let (already, already_device) = merchant_with_device(&db, "Already", 1_000).await;
    let (empty, _) = merchant_with_device(&db, "Empty", 1_000).await;
    insert_disabled_merchant(&db, "Disabled").await;
    insert_order(
        &db,
        "O-1",
        user_id,
        busy_device,
        "retail",
        "completed",
        2_000,
        Some(at(2024, 3, 3, 3)),
    )
    .await;
    insert_order(
        &db,
        "O-2",
        user_id,
        already_device,
        "retail",
        "completed",
        2_000,
        Some(at(2024, 3, 3, 3)),
    )
    .await;
    engine
        .create_settlement(SettlementKind::Merchant, already, march(), 1)
        .await
        .unwrap();

    let report = engine.generate_merchant_settlements(march(), 1).await.unwrap();

    assert_eq!(report.items.len(), 3);
    let created: Vec<_> = report.succeeded().collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].target_id, busy);
    assert_eq!(created[0].actual_amount_minor, 1_800);
    assert!(report.failed_ids().is_empty());

    let reasons: Vec<_> = report
        .items
        .iter()
        .filter_map(|item| match item.outcome {
            ItemOutcome::Skipped(reason) => Some((item.id, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            (already, SkipReason::AlreadySettled),
            (empty, SkipReason::NothingToSettle)
        ]
    );
}

#[tokio::test]
async fn distributor_batch_only_targets_distributors_with_pending_commissions() {
    let (engine, db) = engine_with_db().await;
    let with_commission = insert_distributor(&db, insert_user(&db, "a").await, 0, 0).await;
    let without = insert_distributor(&db, insert_user(&db, "b").await, 0, 0).await;
    insert_commission(&db, with_commission, 1, 250, "pending", at(2024, 3, 9, 9)).await;
    insert_commission(&db, with_commission, 2, 250, "pending", at(2024, 3, 10, 9)).await;
    insert_commission(&db, without, 3, 999, "settled", at(2024, 3, 9, 9)).await;

    let report = engine
        .generate_distributor_settlements(march(), 1)
        .await
        .unwrap();

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].id, with_commission);
    let created: Vec<_> = report.succeeded().collect();
    assert_eq!(created[0].total_amount_minor, 500);
    assert_eq!(created[0].item_count, 2);

    // a second run finds the period already settled
    let again = engine
        .generate_distributor_settlements(march(), 1)
        .await
        .unwrap();
    assert_eq!(again.skipped_ids(), vec![with_commission]);
}

#[tokio::test]
async fn detail_resolves_target_names() {
    let (engine, db) = engine_with_db().await;
    let (merchant_id, _) = merchant_with_device(&db, "Acme Lockers", 1_000).await;
    let user_id = insert_user(&db, "frank").await;
    let distributor_id = insert_distributor(&db, user_id, 0, 0).await;

    let merchant_settlement = engine
        .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
        .await
        .unwrap();
    let distributor_settlement = engine
        .create_settlement(SettlementKind::Distributor, distributor_id, march(), 1)
        .await
        .unwrap();

    let detail = engine
        .settlement_detail(merchant_settlement.id)
        .await
        .unwrap();
    assert_eq!(detail.target_name, "Acme Lockers");

    let detail = engine
        .settlement_detail(distributor_settlement.id)
        .await
        .unwrap();
    assert_eq!(detail.target_name, format!("frank (#{distributor_id})"));
    assert_eq!(detail.settlement, distributor_settlement);
}

#[tokio::test]
async fn list_paginates_newest_first_and_filters() {
    let (engine, db) = engine_with_db().await;
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let (merchant_id, _) = merchant_with_device(&db, name, 1_000).await;
        let settlement = engine
            .create_settlement(SettlementKind::Merchant, merchant_id, march(), 1)
            .await
            .unwrap();
        ids.push(settlement.id);
    }
    let distributor_id = insert_distributor(&db, insert_user(&db, "g").await, 0, 0).await;
    engine
        .create_settlement(SettlementKind::Distributor, distributor_id, march(), 1)
        .await
        .unwrap();

    let filter = SettlementListFilter {
        kind: Some(SettlementKind::Merchant),
        ..Default::default()
    };
    let (page, cursor) = engine
        .list_settlements_page(&filter, 2, None)
        .await
        .unwrap();
    assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);
    let cursor = cursor.unwrap();

    let (page, cursor) = engine
        .list_settlements_page(&filter, 2, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[0]]);
    assert!(cursor.is_none());

    let err = engine
        .list_settlements_page(&filter, 2, Some("garbage"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn stats_split_pending_and_completed_per_kind() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_user(&db, "h").await;
    let (first, device) = merchant_with_device(&db, "First", 1_000).await;
    let (second, _) = merchant_with_device(&db, "Second", 1_000).await;
    insert_order(
        &db,
        "O-1",
        user_id,
        device,
        "locker",
        "completed",
        1_000,
        Some(at(2024, 3, 3, 3)),
    )
    .await;

    let done = engine
        .create_settlement(SettlementKind::Merchant, first, march(), 1)
        .await
        .unwrap();
    engine.process_settlement(done.id, 1).await.unwrap();
    engine
        .create_settlement(SettlementKind::Merchant, second, march(), 1)
        .await
        .unwrap();

    let stats = engine.settlement_stats().await.unwrap();
    assert_eq!(stats.merchant.completed_count, 1);
    assert_eq!(stats.merchant.completed_amount_minor, 900);
    assert_eq!(stats.merchant.pending_count, 1);
    assert_eq!(stats.merchant.pending_amount_minor, 0);
    assert_eq!(stats.distributor.pending_count, 0);
}
