use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::delete_account,
        crate::handlers::accounts::get_account_balances,
        crate::handlers::accounts::reconcile_account,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::delete_category,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::budgets::upsert_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_budget_summary,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::budgets::copy_budgets,
        crate::handlers::debts::create_debt,
        crate::handlers::debts::get_debts,
        crate::handlers::debts::update_debt,
        crate::handlers::debts::delete_debt,
        crate::handlers::debts::create_debt_payment,
        crate::handlers::debts::get_debt_payments,
        crate::handlers::debts::delete_debt_payment,
        crate::handlers::subscriptions::create_subscription,
        crate::handlers::subscriptions::get_subscriptions,
        crate::handlers::subscriptions::update_subscription,
        crate::handlers::subscriptions::delete_subscription,
        crate::handlers::subscriptions::charge_subscription,
        crate::handlers::summary::get_dashboard_summary,
        crate::handlers::summary::get_upcoming,
        crate::handlers::import::import_transactions,
        crate::handlers::exports::export_transactions_csv,
        crate::handlers::backup::export_backup,
        crate::handlers::backup::restore_backup,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::accounts::CreateAccountRequest,
            crate::handlers::accounts::UpdateAccountRequest,
            crate::handlers::accounts::AccountResponse,
            crate::handlers::accounts::AccountBalanceResponse,
            crate::handlers::accounts::BalancesResponse,
            crate::handlers::accounts::ReconcileRequest,
            crate::handlers::accounts::ReconcileResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::transactions::DeleteTransactionResponse,
            crate::handlers::budgets::UpsertBudgetRequest,
            crate::handlers::budgets::UpdateBudgetRequest,
            crate::handlers::budgets::BudgetResponse,
            crate::handlers::budgets::BudgetSummaryResponse,
            crate::handlers::budgets::BudgetSummaryItem,
            crate::handlers::budgets::CopyBudgetsRequest,
            crate::handlers::budgets::CopyBudgetsResponse,
            crate::handlers::debts::CreateDebtRequest,
            crate::handlers::debts::UpdateDebtRequest,
            crate::handlers::debts::DebtResponse,
            crate::handlers::debts::CreateDebtPaymentRequest,
            crate::handlers::debts::DebtPaymentResponse,
            crate::handlers::debts::DebtPaymentCreatedResponse,
            crate::handlers::subscriptions::CreateSubscriptionRequest,
            crate::handlers::subscriptions::UpdateSubscriptionRequest,
            crate::handlers::subscriptions::SubscriptionResponse,
            crate::handlers::subscriptions::ChargeSubscriptionRequest,
            crate::handlers::subscriptions::ChargeSubscriptionResponse,
            crate::handlers::summary::DashboardSummaryResponse,
            crate::handlers::summary::DailyFlow,
            crate::handlers::summary::CategoryExpense,
            crate::handlers::summary::UpcomingResponse,
            crate::handlers::summary::UpcomingSubscription,
            crate::handlers::summary::UpcomingDebt,
            crate::handlers::import::ImportTransactionsRequest,
            crate::handlers::import::ImportItem,
            crate::handlers::import::ImportTransactionsResponse,
            crate::handlers::import::ImportItemError,
            crate::handlers::backup::BackupEnvelope,
            crate::handlers::backup::BackupData,
            crate::handlers::backup::RestoreMode,
            crate::handlers::backup::RestoreRequest,
            crate::handlers::backup::RestoreResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Account CRUD, balances and reconciliation"),
        (name = "categories", description = "Category endpoints"),
        (name = "transactions", description = "Ledger row endpoints"),
        (name = "budgets", description = "Monthly budget endpoints"),
        (name = "debts", description = "Debt and debt payment endpoints"),
        (name = "subscriptions", description = "Recurring subscription endpoints"),
        (name = "dashboard", description = "Summary and upcoming-due endpoints"),
        (name = "import-export", description = "Transaction import and CSV export"),
        (name = "backup", description = "JSON backup and restore"),
    ),
    info(
        title = "Duitnya API",
        description = "Personal finance tracker: ledger, budgets, debts and subscriptions",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
