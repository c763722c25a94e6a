use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string(Accounts::Name))
                    .col(string_len(Accounts::Kind, 20))
                    .col(string(Accounts::Currency).default("IDR"))
                    .col(big_integer(Accounts::InitialBalance).default(0))
                    .col(timestamp_with_time_zone(Accounts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string(Categories::Name))
                    .col(string_len(Categories::Kind, 10))
                    .col(boolean(Categories::IsBudgetable).default(true))
                    .col(timestamp_with_time_zone(Categories::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Duplicate category names are allowed across kinds, not within one.
        manager
            .create_index(
                Index::create()
                    .name("uq_categories_name_kind")
                    .table(Categories::Table)
                    .col(Categories::Name)
                    .col(Categories::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create transactions (ledger) table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(string_len(Transactions::Kind, 10))
                    .col(big_integer(Transactions::Amount))
                    .col(date(Transactions::Date))
                    .col(integer_null(Transactions::AccountId))
                    .col(integer_null(Transactions::CategoryId))
                    .col(integer_null(Transactions::FromAccountId))
                    .col(integer_null(Transactions::ToAccountId))
                    .col(string_null(Transactions::TransferGroupId))
                    .col(string_null(Transactions::Note))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_account")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_from_account")
                            .from(Transactions::Table, Transactions::FromAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_to_account")
                            .from(Transactions::Table, Transactions::ToAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_category")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Transfer pairs are deleted as a unit; index the group id.
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_transfer_group")
                    .table(Transactions::Table)
                    .col(Transactions::TransferGroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_date")
                    .table(Transactions::Table)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        // Create budgets table
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(pk_auto(Budgets::Id))
                    .col(string_len(Budgets::Month, 7))
                    .col(integer(Budgets::CategoryId))
                    .col(big_integer(Budgets::Amount))
                    .col(timestamp_with_time_zone(Budgets::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_category")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_budgets_month_category")
                    .table(Budgets::Table)
                    .col(Budgets::Month)
                    .col(Budgets::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create debts table
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(pk_auto(Debts::Id))
                    .col(string_len(Debts::Kind, 12))
                    .col(string(Debts::CounterpartyName))
                    .col(big_integer(Debts::PrincipalAmount))
                    .col(big_integer(Debts::RemainingAmount))
                    .col(date_null(Debts::DueDate))
                    .col(string_len(Debts::Status, 6))
                    .col(timestamp_with_time_zone(Debts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create debt_payments table
        manager
            .create_table(
                Table::create()
                    .table(DebtPayments::Table)
                    .if_not_exists()
                    .col(pk_auto(DebtPayments::Id))
                    .col(integer(DebtPayments::DebtId))
                    .col(big_integer(DebtPayments::Amount))
                    .col(date(DebtPayments::Date))
                    .col(integer_null(DebtPayments::AccountId))
                    .col(integer_null(DebtPayments::TransactionId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_payment_debt")
                            .from(DebtPayments::Table, DebtPayments::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_payment_transaction")
                            .from(DebtPayments::Table, DebtPayments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create subscriptions table
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(pk_auto(Subscriptions::Id))
                    .col(string(Subscriptions::Name))
                    .col(big_integer(Subscriptions::Amount))
                    .col(string_len(Subscriptions::Frequency, 10))
                    .col(date(Subscriptions::NextDueDate))
                    .col(integer_null(Subscriptions::AccountId))
                    .col(boolean(Subscriptions::IsActive).default(true))
                    .col(timestamp_with_time_zone(Subscriptions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_account")
                            .from(Subscriptions::Table, Subscriptions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Name,
    Kind,
    Currency,
    InitialBalance,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Kind,
    IsBudgetable,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    Kind,
    Amount,
    Date,
    AccountId,
    CategoryId,
    FromAccountId,
    ToAccountId,
    TransferGroupId,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Month,
    CategoryId,
    Amount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    Kind,
    CounterpartyName,
    PrincipalAmount,
    RemainingAmount,
    DueDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DebtPayments {
    Table,
    Id,
    DebtId,
    Amount,
    Date,
    AccountId,
    TransactionId,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    Name,
    Amount,
    Frequency,
    NextDueDate,
    AccountId,
    CreatedAt,
    IsActive,
}
