//! Initial schema migration - creates all tables from scratch.
//!
//! Lookup tables the ledger reads:
//!
//! - `merchants`, `venues`, `devices`: who fulfils an order
//! - `users`, `user_wallets`: end users and their wallet buckets
//! - `orders`, `payments`, `refunds`: revenue sources
//! - `distributors`, `commissions`: referral commissions
//! - `wallet_transactions`: ledger audit trail
//!
//! Tables the back-office writes:
//!
//! - `settlements`: payout batches, unique per (kind, target, period)
//! - `withdrawals`: cash-out requests and their audit status
//! - `operators`: back-office accounts

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
    Name,
    Contact,
    CommissionRateBps,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Venues {
    Table,
    Id,
    MerchantId,
    Name,
    Address,
    CreatedAt,
}

#[derive(Iden)]
enum Devices {
    Table,
    Id,
    VenueId,
    DeviceNo,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Nickname,
    Phone,
    CreatedAt,
}

#[derive(Iden)]
enum UserWallets {
    Table,
    UserId,
    BalanceMinor,
    FrozenBalanceMinor,
    TotalWithdrawnMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    OrderNo,
    UserId,
    DeviceId,
    OrderType,
    Status,
    TotalAmountMinor,
    ActualAmountMinor,
    CreatedAt,
    CompletedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    PaymentNo,
    OrderId,
    UserId,
    Channel,
    AmountMinor,
    Status,
    PaidAt,
    CreatedAt,
}

#[derive(Iden)]
enum Refunds {
    Table,
    Id,
    RefundNo,
    OrderId,
    PaymentId,
    AmountMinor,
    Status,
    RefundedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Distributors {
    Table,
    Id,
    UserId,
    Level,
    AvailableCommissionMinor,
    FrozenCommissionMinor,
    WithdrawnCommissionMinor,
    TotalCommissionMinor,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Commissions {
    Table,
    Id,
    DistributorId,
    OrderId,
    AmountMinor,
    RateBps,
    Status,
    SettlementId,
    CreatedAt,
    SettledAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    UserId,
    Kind,
    AmountMinor,
    ReferenceNo,
    Remark,
    CreatedAt,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    SettlementNo,
    Kind,
    TargetId,
    PeriodStart,
    PeriodEnd,
    TotalAmountMinor,
    FeeMinor,
    ActualAmountMinor,
    ItemCount,
    Status,
    OperatorId,
    SettledAt,
    CreatedAt,
}

#[derive(Iden)]
enum Withdrawals {
    Table,
    Id,
    WithdrawalNo,
    UserId,
    Kind,
    AmountMinor,
    FeeMinor,
    ActualAmountMinor,
    Channel,
    AccountInfo,
    Status,
    RejectReason,
    OperatorId,
    CreatedAt,
    ProcessedAt,
}

#[derive(Iden)]
enum Operators {
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    CreatedAt,
}

fn id<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn money<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn optional_timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).timestamp_with_time_zone().to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Merchants, venues, devices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Merchants::Table)
                    .if_not_exists()
                    .col(id(Merchants::Id))
                    .col(ColumnDef::new(Merchants::Name).string().not_null())
                    .col(ColumnDef::new(Merchants::Contact).string())
                    .col(
                        ColumnDef::new(Merchants::CommissionRateBps)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Merchants::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(timestamp(Merchants::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Venues::Table)
                    .if_not_exists()
                    .col(id(Venues::Id))
                    .col(ColumnDef::new(Venues::MerchantId).big_integer().not_null())
                    .col(ColumnDef::new(Venues::Name).string().not_null())
                    .col(ColumnDef::new(Venues::Address).string())
                    .col(timestamp(Venues::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-venues-merchant_id")
                            .from(Venues::Table, Venues::MerchantId)
                            .to(Merchants::Table, Merchants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(id(Devices::Id))
                    .col(ColumnDef::new(Devices::VenueId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Devices::DeviceNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(timestamp(Devices::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-devices-venue_id")
                            .from(Devices::Table, Devices::VenueId)
                            .to(Venues::Table, Venues::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Users and wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id(Users::Id))
                    .col(ColumnDef::new(Users::Nickname).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(timestamp(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserWallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserWallets::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(money(UserWallets::BalanceMinor))
                    .col(money(UserWallets::FrozenBalanceMinor))
                    .col(money(UserWallets::TotalWithdrawnMinor))
                    .col(timestamp(UserWallets::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_wallets-user_id")
                            .from(UserWallets::Table, UserWallets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Orders, payments, refunds
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(id(Orders::Id))
                    .col(
                        ColumnDef::new(Orders::OrderNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::DeviceId).big_integer())
                    .col(ColumnDef::new(Orders::OrderType).string().not_null())
                    .col(ColumnDef::new(Orders::Status).string().not_null())
                    .col(money(Orders::TotalAmountMinor))
                    .col(money(Orders::ActualAmountMinor))
                    .col(timestamp(Orders::CreatedAt))
                    .col(optional_timestamp(Orders::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-device_id")
                            .from(Orders::Table, Orders::DeviceId)
                            .to(Devices::Table, Devices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-status-completed_at")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::CompletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(id(Payments::Id))
                    .col(
                        ColumnDef::new(Payments::PaymentNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Channel).string().not_null())
                    .col(money(Payments::AmountMinor))
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(optional_timestamp(Payments::PaidAt))
                    .col(timestamp(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-order_id")
                            .from(Payments::Table, Payments::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Refunds::Table)
                    .if_not_exists()
                    .col(id(Refunds::Id))
                    .col(
                        ColumnDef::new(Refunds::RefundNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Refunds::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(Refunds::PaymentId).big_integer().not_null())
                    .col(money(Refunds::AmountMinor))
                    .col(ColumnDef::new(Refunds::Status).string().not_null())
                    .col(optional_timestamp(Refunds::RefundedAt))
                    .col(timestamp(Refunds::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-refunds-payment_id")
                            .from(Refunds::Table, Refunds::PaymentId)
                            .to(Payments::Table, Payments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Distributors and commissions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Distributors::Table)
                    .if_not_exists()
                    .col(id(Distributors::Id))
                    .col(
                        ColumnDef::new(Distributors::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Distributors::Level)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(money(Distributors::AvailableCommissionMinor))
                    .col(money(Distributors::FrozenCommissionMinor))
                    .col(money(Distributors::WithdrawnCommissionMinor))
                    .col(money(Distributors::TotalCommissionMinor))
                    .col(
                        ColumnDef::new(Distributors::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(timestamp(Distributors::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-distributors-user_id")
                            .from(Distributors::Table, Distributors::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Commissions::Table)
                    .if_not_exists()
                    .col(id(Commissions::Id))
                    .col(
                        ColumnDef::new(Commissions::DistributorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Commissions::OrderId).big_integer().not_null())
                    .col(money(Commissions::AmountMinor))
                    .col(
                        ColumnDef::new(Commissions::RateBps)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Commissions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Commissions::SettlementId).big_integer())
                    .col(timestamp(Commissions::CreatedAt))
                    .col(optional_timestamp(Commissions::SettledAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-commissions-distributor_id")
                            .from(Commissions::Table, Commissions::DistributorId)
                            .to(Distributors::Table, Distributors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-commissions-distributor_id-status-created_at")
                    .table(Commissions::Table)
                    .col(Commissions::DistributorId)
                    .col(Commissions::Status)
                    .col(Commissions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Wallet ledger
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(id(WalletTransactions::Id))
                    .col(
                        ColumnDef::new(WalletTransactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::ReferenceNo).string())
                    .col(ColumnDef::new(WalletTransactions::Remark).string())
                    .col(timestamp(WalletTransactions::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-user_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::UserId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(id(Settlements::Id))
                    .col(
                        ColumnDef::new(Settlements::SettlementNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Settlements::Kind).string().not_null())
                    .col(ColumnDef::new(Settlements::TargetId).big_integer().not_null())
                    .col(ColumnDef::new(Settlements::PeriodStart).date().not_null())
                    .col(ColumnDef::new(Settlements::PeriodEnd).date().not_null())
                    .col(money(Settlements::TotalAmountMinor))
                    .col(money(Settlements::FeeMinor))
                    .col(money(Settlements::ActualAmountMinor))
                    .col(money(Settlements::ItemCount))
                    .col(ColumnDef::new(Settlements::Status).string().not_null())
                    .col(ColumnDef::new(Settlements::OperatorId).big_integer())
                    .col(optional_timestamp(Settlements::SettledAt))
                    .col(timestamp(Settlements::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One settlement per target and period, also under concurrent
        // generation.
        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-kind-target-period-unique")
                    .table(Settlements::Table)
                    .col(Settlements::Kind)
                    .col(Settlements::TargetId)
                    .col(Settlements::PeriodStart)
                    .col(Settlements::PeriodEnd)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Withdrawals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(id(Withdrawals::Id))
                    .col(
                        ColumnDef::new(Withdrawals::WithdrawalNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Withdrawals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Kind).string().not_null())
                    .col(money(Withdrawals::AmountMinor))
                    .col(money(Withdrawals::FeeMinor))
                    .col(money(Withdrawals::ActualAmountMinor))
                    .col(ColumnDef::new(Withdrawals::Channel).string().not_null())
                    .col(ColumnDef::new(Withdrawals::AccountInfo).text())
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Withdrawals::RejectReason).string())
                    .col(ColumnDef::new(Withdrawals::OperatorId).big_integer())
                    .col(timestamp(Withdrawals::CreatedAt))
                    .col(optional_timestamp(Withdrawals::ProcessedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-withdrawals-status-created_at")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::Status)
                    .col(Withdrawals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Operators
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Operators::Table)
                    .if_not_exists()
                    .col(id(Operators::Id))
                    .col(
                        ColumnDef::new(Operators::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Operators::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Operators::Role)
                            .string()
                            .not_null()
                            .default("admin"),
                    )
                    .col(timestamp(Operators::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Operators::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Commissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Distributors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Refunds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserWallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Venues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Merchants::Table).to_owned())
            .await?;
        Ok(())
    }
}
