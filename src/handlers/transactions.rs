use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use compute::Month;
use model::entities::transaction::{self, TransactionKind};
use model::entities::account;
use model::entities::category::{self, CategoryKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a ledger row
///
/// `amount` is always entered positive; the stored sign follows the
/// kind (income positive, expense negative, transfers a zero-sum pair).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Transaction kind: "income", "expense" or "transfer"
    #[schema(value_type = String)]
    pub kind: TransactionKind,
    /// Positive amount in the smallest currency unit
    pub amount: i64,
    /// Transaction date
    pub date: NaiveDate,
    /// Account for income/expense rows
    pub account_id: Option<i32>,
    /// Category for income/expense rows
    pub category_id: Option<i32>,
    /// Source account for transfers
    pub from_account_id: Option<i32>,
    /// Destination account for transfers
    pub to_account_id: Option<i32>,
    /// Free-form note
    pub note: Option<String>,
}

/// Query parameters for listing ledger rows
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Calendar month filter, "YYYY-MM"
    pub month: Option<String>,
    /// Kind filter
    pub kind: Option<TransactionKind>,
    /// Rows touching this account
    pub account_id: Option<i32>,
    /// Rows in this category
    pub category_id: Option<i32>,
}

/// Ledger row response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    #[schema(value_type = String)]
    pub kind: TransactionKind,
    /// Signed amount as stored
    pub amount: i64,
    pub date: NaiveDate,
    pub account_id: Option<i32>,
    pub category_id: Option<i32>,
    pub from_account_id: Option<i32>,
    pub to_account_id: Option<i32>,
    pub transfer_group_id: Option<String>,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            amount: model.amount,
            date: model.date,
            account_id: model.account_id,
            category_id: model.category_id,
            from_account_id: model.from_account_id,
            to_account_id: model.to_account_id,
            transfer_group_id: model.transfer_group_id,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

/// Result of deleting a ledger row
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTransactionResponse {
    /// Number of rows removed
    pub deleted: u64,
    /// "single" for plain rows, "group" when a transfer pair was removed
    pub scope: String,
}

async fn require_account(state: &AppState, id: i32, role: &str) -> ApiResult<account::Model> {
    account::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("{} account {} does not exist", role, id)))
}

/// Create a ledger row
///
/// Income and expense produce one row; a transfer produces two rows
/// sharing a group ID, written atomically.
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Vec<TransactionResponse>>>)> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }

    if let Some(category_id) = request.category_id {
        let cat = category::Entity::find_by_id(category_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| {
                ApiError::bad_request(format!("Category {} does not exist", category_id))
            })?;
        let matches = match request.kind {
            TransactionKind::Income => cat.kind == CategoryKind::Income,
            TransactionKind::Expense => cat.kind == CategoryKind::Expense,
            TransactionKind::Transfer => false,
        };
        if !matches {
            return Err(ApiError::bad_request(
                "Category kind does not match the transaction kind",
            ));
        }
    }

    let now = Utc::now();
    let rows = match request.kind {
        TransactionKind::Income | TransactionKind::Expense => {
            let account_id = request
                .account_id
                .ok_or_else(|| ApiError::bad_request("account_id is required"))?;
            require_account(&state, account_id, "Target").await?;

            let signed = match request.kind {
                TransactionKind::Income => request.amount,
                _ => -request.amount,
            };
            let row = transaction::ActiveModel {
                kind: Set(request.kind),
                amount: Set(signed),
                date: Set(request.date),
                account_id: Set(Some(account_id)),
                category_id: Set(request.category_id),
                note: Set(request.note.clone()),
                created_at: Set(now),
                ..Default::default()
            };
            vec![row.insert(&state.db).await?]
        }
        TransactionKind::Transfer => {
            let from_id = request
                .from_account_id
                .ok_or_else(|| ApiError::bad_request("from_account_id is required for transfers"))?;
            let to_id = request
                .to_account_id
                .ok_or_else(|| ApiError::bad_request("to_account_id is required for transfers"))?;
            if from_id == to_id {
                return Err(ApiError::bad_request(
                    "Transfer source and destination must differ",
                ));
            }
            require_account(&state, from_id, "Source").await?;
            require_account(&state, to_id, "Destination").await?;

            let group_id = Uuid::new_v4().to_string();
            // Both legs land together or not at all.
            let txn = state.db.begin().await?;
            let out_row = transaction::ActiveModel {
                kind: Set(TransactionKind::Transfer),
                amount: Set(-request.amount),
                date: Set(request.date),
                from_account_id: Set(Some(from_id)),
                transfer_group_id: Set(Some(group_id.clone())),
                note: Set(request.note.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            let in_row = transaction::ActiveModel {
                kind: Set(TransactionKind::Transfer),
                amount: Set(request.amount),
                date: Set(request.date),
                to_account_id: Set(Some(to_id)),
                transfer_group_id: Set(Some(group_id)),
                note: Set(request.note.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;
            vec![out_row, in_row]
        }
    };

    info!(
        "Created {} ledger row(s) of kind {:?}",
        rows.len(),
        request.kind
    );
    let data: Vec<TransactionResponse> = rows.into_iter().map(TransactionResponse::from).collect();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(data, "Transaction created successfully")),
    ))
}

/// Get ledger rows, newest first, with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(
        ("month" = Option<String>, Query, description = "Calendar month filter, YYYY-MM"),
        ("kind" = Option<String>, Query, description = "Kind filter: income, expense or transfer"),
        ("account_id" = Option<i32>, Query, description = "Rows touching this account"),
        ("category_id" = Option<i32>, Query, description = "Rows in this category")
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Invalid month filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<TransactionResponse>>>> {
    let mut finder = transaction::Entity::find()
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id);

    if let Some(month) = &query.month {
        let month = Month::parse(month)
            .map_err(|_| ApiError::bad_request(format!("Invalid month filter: {}", month)))?;
        let (start, end) = month.range();
        finder = finder
            .filter(transaction::Column::Date.gte(start))
            .filter(transaction::Column::Date.lt(end));
    }
    if let Some(kind) = query.kind {
        finder = finder.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(account_id) = query.account_id {
        finder = finder.filter(compute::ledger::touching_account(account_id));
    }
    if let Some(category_id) = query.category_id {
        finder = finder.filter(transaction::Column::CategoryId.eq(category_id));
    }

    let rows = finder.all(&state.db).await?;
    debug!("Retrieved {} ledger rows", rows.len());

    let data: Vec<TransactionResponse> = rows.into_iter().map(TransactionResponse::from).collect();
    Ok(Json(ApiResponse::new(
        data,
        "Transactions retrieved successfully",
    )))
}

/// Get a specific ledger row by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<TransactionResponse>>> {
    let model = transaction::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Transaction {} not found", id)))?;

    Ok(Json(ApiResponse::new(
        TransactionResponse::from(model),
        "Transaction retrieved successfully",
    )))
}

/// Delete a ledger row
///
/// Deleting either leg of a transfer removes the whole group, so no
/// half-transfer can remain.
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = ApiResponse<DeleteTransactionResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<DeleteTransactionResponse>>> {
    let model = transaction::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Transaction {} not found", id)))?;

    let (deleted, scope) = match &model.transfer_group_id {
        Some(group_id) => {
            let result = transaction::Entity::delete_many()
                .filter(transaction::Column::TransferGroupId.eq(group_id.clone()))
                .exec(&state.db)
                .await?;
            if result.rows_affected != 2 {
                warn!(
                    "Transfer group {} removed {} rows",
                    group_id, result.rows_affected
                );
            }
            (result.rows_affected, "group")
        }
        None => {
            transaction::Entity::delete_by_id(model.id)
                .exec(&state.db)
                .await?;
            (1, "single")
        }
    };
    info!("Deleted {} ledger row(s) starting from {}", deleted, id);

    Ok(Json(ApiResponse::new(
        DeleteTransactionResponse {
            deleted,
            scope: scope.to_string(),
        },
        "Transaction deleted successfully",
    )))
}
