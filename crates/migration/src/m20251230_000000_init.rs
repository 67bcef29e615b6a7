//! Fintrack schema.
//!
//!
//! - `wallets`: places where money is kept, with a denormalized balance
//! - `wallet_memberships`: owner/admin/member access to a wallet
//! - `categories`: income/expense categories owned by a user
//! - `transactions`: income and expense records of a wallet
//! - `plans`: envelope shared by budgets and goals
//! - `budgets`, `budget_categories`, `budget_records`: budget facet
//! - `goals`, `goal_records`: goal facet

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    Name,
    Icon,
    Kind,
    Balance,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
enum WalletMemberships {
    Table,
    WalletId,
    UserId,
    Role,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    OwnerId,
    Name,
    NameNorm,
    Kind,
    Icon,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    WalletId,
    CategoryId,
    Kind,
    AmountMinor,
    Title,
    Description,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum Plans {
    Table,
    Id,
    WalletId,
    Name,
    NameNorm,
    Description,
    Kind,
    EndDate,
    CreatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    PlanId,
    TargetAmount,
    SpentAmount,
    StartDate,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    PlanId,
    CategoryId,
}

#[derive(Iden)]
enum BudgetRecords {
    Table,
    PlanId,
    TransactionId,
}

#[derive(Iden)]
enum Goals {
    Table,
    PlanId,
    TargetAmount,
    CurrentAmount,
}

#[derive(Iden)]
enum GoalRecords {
    Table,
    Id,
    PlanId,
    Amount,
    Note,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .col(ColumnDef::new(Wallets::Icon).string())
                    .col(ColumnDef::new(Wallets::Kind).string().not_null())
                    .col(ColumnDef::new(Wallets::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Wallets::OwnerId).string().not_null())
                    .col(ColumnDef::new(Wallets::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-owner_id")
                    .table(Wallets::Table)
                    .col(Wallets::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Wallet Memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletMemberships::WalletId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletMemberships::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletMemberships::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(WalletMemberships::WalletId)
                            .col(WalletMemberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_memberships-wallet_id")
                            .from(WalletMemberships::Table, WalletMemberships::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_memberships-user_id")
                    .table(WalletMemberships::Table)
                    .col(WalletMemberships::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::OwnerId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_id-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CategoryId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Title).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-wallet_id")
                            .from(Transactions::Table, Transactions::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-wallet_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::WalletId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-category_id")
                    .table(Transactions::Table)
                    .col(Transactions::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Plans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plans::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plans::WalletId).string().not_null())
                    .col(ColumnDef::new(Plans::Name).string().not_null())
                    .col(ColumnDef::new(Plans::NameNorm).string().not_null())
                    .col(ColumnDef::new(Plans::Description).string())
                    .col(ColumnDef::new(Plans::Kind).string().not_null())
                    .col(ColumnDef::new(Plans::EndDate).timestamp().not_null())
                    .col(ColumnDef::new(Plans::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-plans-wallet_id")
                            .from(Plans::Table, Plans::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-plans-wallet_id-name_norm-unique")
                    .table(Plans::Table)
                    .col(Plans::WalletId)
                    .col(Plans::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::PlanId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Budgets::TargetAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::SpentAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Budgets::StartDate).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-plan_id")
                            .from(Budgets::Table, Budgets::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategories::PlanId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::CategoryId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(BudgetCategories::PlanId)
                            .col(BudgetCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-plan_id")
                            .from(BudgetCategories::Table, BudgetCategories::PlanId)
                            .to(Budgets::Table, Budgets::PlanId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-category_id")
                            .from(BudgetCategories::Table, BudgetCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BudgetRecords::PlanId).string().not_null())
                    .col(
                        ColumnDef::new(BudgetRecords::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(BudgetRecords::PlanId)
                            .col(BudgetRecords::TransactionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_records-plan_id")
                            .from(BudgetRecords::Table, BudgetRecords::PlanId)
                            .to(Budgets::Table, Budgets::PlanId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_records-transaction_id")
                            .from(BudgetRecords::Table, BudgetRecords::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_records-transaction_id")
                    .table(BudgetRecords::Table)
                    .col(BudgetRecords::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Goals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Goals::PlanId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Goals::TargetAmount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Goals::CurrentAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goals-plan_id")
                            .from(Goals::Table, Goals::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GoalRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GoalRecords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GoalRecords::PlanId).string().not_null())
                    .col(ColumnDef::new(GoalRecords::Amount).big_integer().not_null())
                    .col(ColumnDef::new(GoalRecords::Note).string())
                    .col(
                        ColumnDef::new(GoalRecords::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goal_records-plan_id")
                            .from(GoalRecords::Table, GoalRecords::PlanId)
                            .to(Goals::Table, Goals::PlanId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-goal_records-plan_id")
                    .table(GoalRecords::Table)
                    .col(GoalRecords::PlanId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(GoalRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        Ok(())
    }
}
