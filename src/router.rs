use crate::handlers::{
    accounts::{
        create_account, delete_account, get_account, get_account_balances, get_accounts,
        reconcile_account, update_account,
    },
    backup::{export_backup, restore_backup},
    budgets::{
        copy_budgets, delete_budget, get_budget_summary, get_budgets, update_budget, upsert_budget,
    },
    categories::{create_category, delete_category, get_categories},
    debts::{
        create_debt, create_debt_payment, delete_debt, delete_debt_payment, get_debt_payments,
        get_debts, update_debt,
    },
    exports::export_transactions_csv,
    health::health_check,
    import::import_transactions,
    subscriptions::{
        charge_subscription, create_subscription, delete_subscription, get_subscriptions,
        update_subscription,
    },
    summary::{get_dashboard_summary, get_upcoming},
    transactions::{create_transaction, delete_transaction, get_transaction, get_transactions},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Account routes
        .route("/api/v1/accounts", post(create_account))
        .route("/api/v1/accounts", get(get_accounts))
        .route("/api/v1/accounts/balances", get(get_account_balances))
        .route("/api/v1/accounts/reconcile", post(reconcile_account))
        .route("/api/v1/accounts/:id", get(get_account))
        .route("/api/v1/accounts/:id", patch(update_account))
        .route("/api/v1/accounts/:id", delete(delete_account))
        // Category routes
        .route("/api/v1/categories", post(create_category))
        .route("/api/v1/categories", get(get_categories))
        .route("/api/v1/categories/:id", delete(delete_category))
        // Ledger routes
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions", get(get_transactions))
        .route("/api/v1/transactions/:id", get(get_transaction))
        .route("/api/v1/transactions/:id", delete(delete_transaction))
        // Budget routes
        .route("/api/v1/budgets", post(upsert_budget))
        .route("/api/v1/budgets", get(get_budgets))
        .route("/api/v1/budgets/summary", get(get_budget_summary))
        .route("/api/v1/budgets/copy", post(copy_budgets))
        .route("/api/v1/budgets/:id", patch(update_budget))
        .route("/api/v1/budgets/:id", delete(delete_budget))
        // Debt routes
        .route("/api/v1/debts", post(create_debt))
        .route("/api/v1/debts", get(get_debts))
        .route("/api/v1/debts/:id", patch(update_debt))
        .route("/api/v1/debts/:id", delete(delete_debt))
        .route("/api/v1/debts/:id/payments", post(create_debt_payment))
        .route("/api/v1/debts/:id/payments", get(get_debt_payments))
        .route("/api/v1/debt-payments/:id", delete(delete_debt_payment))
        // Subscription routes
        .route("/api/v1/subscriptions", post(create_subscription))
        .route("/api/v1/subscriptions", get(get_subscriptions))
        .route("/api/v1/subscriptions/:id", patch(update_subscription))
        .route("/api/v1/subscriptions/:id", delete(delete_subscription))
        .route("/api/v1/subscriptions/:id/charge", post(charge_subscription))
        // Dashboard routes
        .route("/api/v1/dashboard/summary", get(get_dashboard_summary))
        .route("/api/v1/dashboard/upcoming", get(get_upcoming))
        // Import / export routes
        .route("/api/v1/import/transactions", post(import_transactions))
        .route("/api/v1/exports/transactions", get(export_transactions_csv))
        // Backup routes
        .route("/api/v1/backup", get(export_backup))
        .route("/api/v1/backup/restore", post(restore_backup))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
