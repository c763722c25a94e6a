use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use model::entities::debt::{self, DebtKind, DebtStatus};
use model::entities::transaction::{self, TransactionKind};
use model::entities::{account, debt_payment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDebtRequest {
    /// "payable" (I owe) or "receivable" (owed to me)
    #[schema(value_type = String)]
    pub kind: DebtKind,
    /// Who the debt is with
    pub counterparty_name: String,
    /// Principal amount, smallest currency unit, positive
    pub principal_amount: i64,
    /// Optional due date
    pub due_date: Option<NaiveDate>,
}

/// Request body for updating a debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateDebtRequest {
    pub counterparty_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// "open" or "paid"
    #[schema(value_type = Option<String>)]
    pub status: Option<DebtStatus>,
}

/// Query parameters for listing debts
#[derive(Debug, Deserialize)]
pub struct ListDebtsQuery {
    pub kind: Option<DebtKind>,
    pub status: Option<DebtStatus>,
}

/// Debt response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DebtResponse {
    pub id: i32,
    #[schema(value_type = String)]
    pub kind: DebtKind,
    pub counterparty_name: String,
    pub principal_amount: i64,
    pub remaining_amount: i64,
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub status: DebtStatus,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<debt::Model> for DebtResponse {
    fn from(model: debt::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            counterparty_name: model.counterparty_name,
            principal_amount: model.principal_amount,
            remaining_amount: model.remaining_amount,
            due_date: model.due_date,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Request body for recording a payment against a debt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDebtPaymentRequest {
    /// Payment amount, positive; clamped to the remaining amount
    pub amount: i64,
    /// Payment date (default: today)
    pub date: Option<NaiveDate>,
    /// Account to book a ledger row against; omit to record the
    /// payment without touching the ledger
    pub account_id: Option<i32>,
}

/// Debt payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DebtPaymentResponse {
    pub id: i32,
    pub debt_id: i32,
    pub amount: i64,
    pub date: NaiveDate,
    pub account_id: Option<i32>,
    /// Ledger row booked for this payment, if any
    pub transaction_id: Option<i32>,
}

impl From<debt_payment::Model> for DebtPaymentResponse {
    fn from(model: debt_payment::Model) -> Self {
        Self {
            id: model.id,
            debt_id: model.debt_id,
            amount: model.amount,
            date: model.date,
            account_id: model.account_id,
            transaction_id: model.transaction_id,
        }
    }
}

/// Payment plus the updated debt it was applied to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DebtPaymentCreatedResponse {
    pub payment: DebtPaymentResponse,
    pub debt: DebtResponse,
}

/// Create a new debt
#[utoipa::path(
    post,
    path = "/api/v1/debts",
    tag = "debts",
    request_body = CreateDebtRequest,
    responses(
        (status = 201, description = "Debt created successfully", body = ApiResponse<DebtResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_debt(
    State(state): State<AppState>,
    Json(request): Json<CreateDebtRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DebtResponse>>)> {
    let counterparty = request.counterparty_name.trim();
    if counterparty.is_empty() {
        return Err(ApiError::bad_request("Counterparty name must not be empty"));
    }
    if request.principal_amount <= 0 {
        return Err(ApiError::bad_request("Principal amount must be positive"));
    }

    let new_debt = debt::ActiveModel {
        kind: Set(request.kind),
        counterparty_name: Set(counterparty.to_string()),
        principal_amount: Set(request.principal_amount),
        remaining_amount: Set(request.principal_amount),
        due_date: Set(request.due_date),
        status: Set(DebtStatus::Open),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let model = new_debt.insert(&state.db).await?;
    info!(
        "Debt created with ID: {}, counterparty: {}",
        model.id, model.counterparty_name
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            DebtResponse::from(model),
            "Debt created successfully",
        )),
    ))
}

/// Get all debts, optionally filtered by kind and status
#[utoipa::path(
    get,
    path = "/api/v1/debts",
    tag = "debts",
    params(
        ("kind" = Option<String>, Query, description = "Filter by kind: payable or receivable"),
        ("status" = Option<String>, Query, description = "Filter by status: open or paid")
    ),
    responses(
        (status = 200, description = "Debts retrieved successfully", body = ApiResponse<Vec<DebtResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debts(
    State(state): State<AppState>,
    Query(query): Query<ListDebtsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<DebtResponse>>>> {
    let mut finder = debt::Entity::find().order_by_asc(debt::Column::Id);
    if let Some(kind) = query.kind {
        finder = finder.filter(debt::Column::Kind.eq(kind));
    }
    if let Some(status) = query.status {
        finder = finder.filter(debt::Column::Status.eq(status));
    }

    let debts = finder.all(&state.db).await?;
    debug!("Retrieved {} debts", debts.len());

    let data: Vec<DebtResponse> = debts.into_iter().map(DebtResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Debts retrieved successfully")))
}

/// Update a debt
#[utoipa::path(
    patch,
    path = "/api/v1/debts/{id}",
    tag = "debts",
    params(
        ("id" = i32, Path, description = "Debt ID")
    ),
    request_body = UpdateDebtRequest,
    responses(
        (status = 200, description = "Debt updated successfully", body = ApiResponse<DebtResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Debt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_debt(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDebtRequest>,
) -> ApiResult<Json<ApiResponse<DebtResponse>>> {
    let model = debt::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt {} not found", id)))?;

    let mut active = model.into_active_model();
    if let Some(name) = request.counterparty_name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Counterparty name must not be empty"));
        }
        active.counterparty_name = Set(name);
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(Some(due_date));
    }
    if let Some(status) = request.status {
        active.status = Set(status);
        // Marking paid by hand settles whatever is left.
        if status == DebtStatus::Paid {
            active.remaining_amount = Set(0);
        }
    }

    let updated = active.update(&state.db).await?;
    info!("Debt {} updated", updated.id);

    Ok(Json(ApiResponse::new(
        DebtResponse::from(updated),
        "Debt updated successfully",
    )))
}

/// Delete a debt and its payment history
#[utoipa::path(
    delete,
    path = "/api/v1/debts/{id}",
    tag = "debts",
    params(
        ("id" = i32, Path, description = "Debt ID")
    ),
    responses(
        (status = 200, description = "Debt deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Debt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_debt(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let model = debt::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt {} not found", id)))?;

    debt::Entity::delete_by_id(model.id).exec(&state.db).await?;
    info!("Debt {} deleted", id);

    Ok(Json(ApiResponse::new(
        format!("Debt {} deleted", id),
        "Debt deleted successfully",
    )))
}

/// Record a payment against a debt
///
/// The amount is clamped to what is still owed. When an account is
/// given, a ledger row is booked alongside the payment: an expense for
/// payables, an income for receivables. Reaching zero flips the debt
/// to paid. Payment, ledger row and debt update land in one
/// database transaction.
#[utoipa::path(
    post,
    path = "/api/v1/debts/{id}/payments",
    tag = "debts",
    params(
        ("id" = i32, Path, description = "Debt ID")
    ),
    request_body = CreateDebtPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<DebtPaymentCreatedResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Debt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_debt_payment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CreateDebtPaymentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DebtPaymentCreatedResponse>>)> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request("Payment amount must be positive"));
    }

    let debt_model = debt::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt {} not found", id)))?;
    if debt_model.status == DebtStatus::Paid || debt_model.remaining_amount == 0 {
        return Err(ApiError::bad_request("Debt is already settled"));
    }

    if let Some(account_id) = request.account_id {
        let exists = account::Entity::find_by_id(account_id).one(&state.db).await?;
        if exists.is_none() {
            return Err(ApiError::bad_request(format!(
                "Account {} does not exist",
                account_id
            )));
        }
    }

    let amount = request.amount.min(debt_model.remaining_amount);
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
    let now = Utc::now();

    let txn = state.db.begin().await?;

    let transaction_id = match request.account_id {
        Some(account_id) => {
            let (kind, signed, note) = match debt_model.kind {
                DebtKind::Payable => (
                    TransactionKind::Expense,
                    -amount,
                    format!("Debt payment to {}", debt_model.counterparty_name),
                ),
                DebtKind::Receivable => (
                    TransactionKind::Income,
                    amount,
                    format!("Debt payment from {}", debt_model.counterparty_name),
                ),
            };
            let row = transaction::ActiveModel {
                kind: Set(kind),
                amount: Set(signed),
                date: Set(date),
                account_id: Set(Some(account_id)),
                note: Set(Some(note)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Some(row.id)
        }
        None => None,
    };

    let payment = debt_payment::ActiveModel {
        debt_id: Set(debt_model.id),
        amount: Set(amount),
        date: Set(date),
        account_id: Set(request.account_id),
        transaction_id: Set(transaction_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let remaining = debt_model.remaining_amount - amount;
    let mut active = debt_model.into_active_model();
    active.remaining_amount = Set(remaining);
    if remaining == 0 {
        active.status = Set(DebtStatus::Paid);
    }
    let updated_debt = active.update(&txn).await?;

    txn.commit().await?;
    info!(
        "Payment {} of {} recorded against debt {}, remaining {}",
        payment.id, amount, updated_debt.id, remaining
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            DebtPaymentCreatedResponse {
                payment: DebtPaymentResponse::from(payment),
                debt: DebtResponse::from(updated_debt),
            },
            "Payment recorded",
        )),
    ))
}

/// Get the payment history of a debt, newest first
#[utoipa::path(
    get,
    path = "/api/v1/debts/{id}/payments",
    tag = "debts",
    params(
        ("id" = i32, Path, description = "Debt ID")
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<DebtPaymentResponse>>),
        (status = 404, description = "Debt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_debt_payments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<DebtPaymentResponse>>>> {
    let debt_model = debt::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt {} not found", id)))?;

    let payments = debt_payment::Entity::find()
        .filter(debt_payment::Column::DebtId.eq(debt_model.id))
        .order_by_desc(debt_payment::Column::Date)
        .order_by_desc(debt_payment::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} payments for debt {}", payments.len(), id);

    let data: Vec<DebtPaymentResponse> =
        payments.into_iter().map(DebtPaymentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Payments retrieved successfully")))
}

/// Delete a debt payment
///
/// The amount is added back to the debt, reopening it if it was paid,
/// and any ledger row booked for the payment is removed too.
#[utoipa::path(
    delete,
    path = "/api/v1/debt-payments/{id}",
    tag = "debts",
    params(
        ("id" = i32, Path, description = "Debt payment ID")
    ),
    responses(
        (status = 200, description = "Payment deleted", body = ApiResponse<DebtResponse>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_debt_payment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<DebtResponse>>> {
    let payment = debt_payment::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt payment {} not found", id)))?;
    let debt_model = debt::Entity::find_by_id(payment.debt_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Debt {} not found", payment.debt_id)))?;

    let txn = state.db.begin().await?;

    debt_payment::Entity::delete_by_id(payment.id).exec(&txn).await?;
    if let Some(transaction_id) = payment.transaction_id {
        transaction::Entity::delete_by_id(transaction_id)
            .exec(&txn)
            .await?;
    }

    let restored = (debt_model.remaining_amount + payment.amount)
        .min(debt_model.principal_amount);
    let mut active = debt_model.into_active_model();
    active.remaining_amount = Set(restored);
    active.status = Set(DebtStatus::Open);
    let updated_debt = active.update(&txn).await?;

    txn.commit().await?;
    info!(
        "Debt payment {} deleted, debt {} back to remaining {}",
        id, updated_debt.id, restored
    );

    Ok(Json(ApiResponse::new(
        DebtResponse::from(updated_debt),
        "Payment deleted",
    )))
}
