use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use compute::balance;
use model::entities::account::{self, AccountKind};
use model::entities::category::{self, CategoryKind};
use model::entities::transaction::{self, TransactionKind};
use sea_orm::{
    ActiveModelTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a new account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Account name
    pub name: String,
    /// Account kind: "bank", "ewallet" or "cash"
    #[schema(value_type = String)]
    pub kind: AccountKind,
    /// ISO 4217 currency code (default: "IDR")
    pub currency: Option<String>,
    /// Opening balance in the smallest currency unit (default: 0)
    pub initial_balance: Option<i64>,
}

/// Request body for updating an account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateAccountRequest {
    /// Account name
    pub name: Option<String>,
    /// Account kind: "bank", "ewallet" or "cash"
    #[schema(value_type = Option<String>)]
    pub kind: Option<AccountKind>,
    /// ISO 4217 currency code
    pub currency: Option<String>,
    /// Opening balance in the smallest currency unit
    pub initial_balance: Option<i64>,
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub kind: AccountKind,
    pub currency: String,
    pub initial_balance: i64,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind,
            currency: model.currency,
            initial_balance: model.initial_balance,
            created_at: model.created_at,
        }
    }
}

/// Account with its derived current balance
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountBalanceResponse {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub kind: AccountKind,
    pub currency: String,
    pub initial_balance: i64,
    /// Derived balance in the smallest currency unit
    pub balance: i64,
}

/// All account balances plus their sum
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalancesResponse {
    pub accounts: Vec<AccountBalanceResponse>,
    pub total_balance: i64,
}

/// Request body for reconciling an account against a real-world balance
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReconcileRequest {
    /// Account to reconcile
    pub account_id: i32,
    /// Balance observed in the real world, smallest currency unit
    pub actual_balance: i64,
    /// Date for the adjustment row (default: today)
    pub date: Option<NaiveDate>,
    /// Category for the adjustment row, matching its direction
    pub category_id: Option<i32>,
    /// Note for the adjustment row
    pub note: Option<String>,
}

/// Result of a reconciliation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconcileResponse {
    pub account_id: i32,
    /// Balance derived from the ledger before adjustment
    pub computed_balance: i64,
    pub actual_balance: i64,
    /// `actual_balance - computed_balance`
    pub delta: i64,
    /// Adjustment row created to absorb the delta, if any
    pub created_transaction_id: Option<i32>,
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AccountResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Account name must not be empty"));
    }
    if request.initial_balance.is_some_and(|b| b < 0) {
        return Err(ApiError::bad_request("Initial balance must not be negative"));
    }

    let new_account = account::ActiveModel {
        name: Set(name.to_string()),
        kind: Set(request.kind),
        currency: Set(request.currency.unwrap_or_else(|| "IDR".to_string())),
        initial_balance: Set(request.initial_balance.unwrap_or(0)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let model = new_account.insert(&state.db).await?;
    info!("Account created with ID: {}, name: {}", model.id, model.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            AccountResponse::from(model),
            "Account created successfully",
        )),
    ))
}

/// Get all accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<AccountResponse>>>> {
    let accounts = account::Entity::find()
        .order_by_asc(account::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} accounts", accounts.len());

    let data: Vec<AccountResponse> = accounts.into_iter().map(AccountResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Accounts retrieved successfully")))
}

/// Get a specific account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(
        ("id" = i32, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<AccountResponse>>> {
    let model = account::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", id)))?;

    Ok(Json(ApiResponse::new(
        AccountResponse::from(model),
        "Account retrieved successfully",
    )))
}

/// Update an account
#[utoipa::path(
    patch,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(
        ("id" = i32, Path, description = "Account ID")
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Json<ApiResponse<AccountResponse>>> {
    let model = account::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", id)))?;

    let mut active = model.into_active_model();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Account name must not be empty"));
        }
        active.name = Set(name);
    }
    if let Some(kind) = request.kind {
        active.kind = Set(kind);
    }
    if let Some(currency) = request.currency {
        active.currency = Set(currency);
    }
    if let Some(initial_balance) = request.initial_balance {
        if initial_balance < 0 {
            return Err(ApiError::bad_request("Initial balance must not be negative"));
        }
        active.initial_balance = Set(initial_balance);
    }

    let updated = active.update(&state.db).await?;
    info!("Account {} updated", updated.id);

    Ok(Json(ApiResponse::new(
        AccountResponse::from(updated),
        "Account updated successfully",
    )))
}

/// Delete an account and every ledger row touching it
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(
        ("id" = i32, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let model = account::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", id)))?;

    account::Entity::delete_by_id(model.id).exec(&state.db).await?;
    info!("Account {} deleted", id);

    Ok(Json(ApiResponse::new(
        format!("Account {} deleted", id),
        "Account deleted successfully",
    )))
}

/// Get every account together with its derived balance
#[utoipa::path(
    get,
    path = "/api/v1/accounts/balances",
    tag = "accounts",
    responses(
        (status = 200, description = "Balances retrieved successfully", body = ApiResponse<BalancesResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_balances(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<BalancesResponse>>> {
    let accounts = account::Entity::find()
        .order_by_asc(account::Column::Id)
        .all(&state.db)
        .await?;
    // One scan of the ledger covers every account.
    let rows = transaction::Entity::find().all(&state.db).await?;

    let mut total_balance = 0i64;
    let mut out = Vec::with_capacity(accounts.len());
    for acct in accounts {
        let bal = balance(acct.initial_balance, acct.id, &rows);
        total_balance += bal;
        out.push(AccountBalanceResponse {
            id: acct.id,
            name: acct.name,
            kind: acct.kind,
            currency: acct.currency,
            initial_balance: acct.initial_balance,
            balance: bal,
        });
    }
    debug!("Computed balances for {} accounts", out.len());

    Ok(Json(ApiResponse::new(
        BalancesResponse {
            accounts: out,
            total_balance,
        },
        "Balances retrieved successfully",
    )))
}

/// Reconcile an account against a real-world balance
///
/// If the observed balance differs from the derived one, a single
/// income or expense row is created so the ledger matches reality.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/reconcile",
    tag = "accounts",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Account reconciled", body = ApiResponse<ReconcileResponse>),
        (status = 400, description = "Invalid category", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn reconcile_account(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> ApiResult<Json<ApiResponse<ReconcileResponse>>> {
    let account = account::Entity::find_by_id(request.account_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", request.account_id)))?;

    let rows = transaction::Entity::find()
        .filter(compute::ledger::touching_account(account.id))
        .all(&state.db)
        .await?;
    let computed_balance = balance(account.initial_balance, account.id, &rows);
    let delta = request.actual_balance - computed_balance;

    let created_transaction_id = if delta != 0 {
        let kind = if delta > 0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };
        if let Some(category_id) = request.category_id {
            let cat = category::Entity::find_by_id(category_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| {
                    ApiError::bad_request(format!("Category {} not found", category_id))
                })?;
            let matches = match kind {
                TransactionKind::Income => cat.kind == CategoryKind::Income,
                _ => cat.kind == CategoryKind::Expense,
            };
            if !matches {
                return Err(ApiError::bad_request(
                    "Category kind does not match the adjustment direction",
                ));
            }
        }
        let adjustment = transaction::ActiveModel {
            kind: Set(kind),
            amount: Set(delta),
            date: Set(request.date.unwrap_or_else(|| Utc::now().date_naive())),
            account_id: Set(Some(account.id)),
            category_id: Set(request.category_id),
            note: Set(Some(
                request
                    .note
                    .unwrap_or_else(|| "Balance reconciliation".to_string()),
            )),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let row = adjustment.insert(&state.db).await?;
        info!(
            "Reconciled account {} with delta {} via transaction {}",
            account.id, delta, row.id
        );
        Some(row.id)
    } else {
        debug!("Account {} already reconciled", account.id);
        None
    };

    Ok(Json(ApiResponse::new(
        ReconcileResponse {
            account_id: account.id,
            computed_balance,
            actual_balance: request.actual_balance,
            delta,
            created_transaction_id,
        },
        "Account reconciled",
    )))
}
