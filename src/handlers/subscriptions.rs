use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, NaiveDate, Utc};
use compute::advance_due;
use model::entities::subscription::{self, Frequency};
use model::entities::transaction::{self, TransactionKind};
use model::entities::account;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a subscription
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    /// Subscription name
    pub name: String,
    /// Charge amount, smallest currency unit, positive
    pub amount: i64,
    /// Billing frequency: "weekly", "monthly" or "yearly"
    #[schema(value_type = String)]
    pub frequency: Frequency,
    /// First due date
    pub next_due_date: NaiveDate,
    /// Default account to charge
    pub account_id: Option<i32>,
    /// Whether charging is allowed (default: true)
    pub is_active: Option<bool>,
}

/// Request body for updating a subscription
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub name: Option<String>,
    pub amount: Option<i64>,
    #[schema(value_type = Option<String>)]
    pub frequency: Option<Frequency>,
    pub next_due_date: Option<NaiveDate>,
    pub account_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing subscriptions
#[derive(Debug, Deserialize)]
pub struct ListSubscriptionsQuery {
    /// Filter on the active flag
    pub active: Option<bool>,
    /// Only subscriptions due within this many days from today
    pub days: Option<i64>,
}

/// Subscription response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i32,
    pub name: String,
    pub amount: i64,
    #[schema(value_type = String)]
    pub frequency: Frequency,
    pub next_due_date: NaiveDate,
    pub account_id: Option<i32>,
    pub is_active: bool,
}

impl From<subscription::Model> for SubscriptionResponse {
    fn from(model: subscription::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            amount: model.amount,
            frequency: model.frequency,
            next_due_date: model.next_due_date,
            account_id: model.account_id,
            is_active: model.is_active,
        }
    }
}

/// Request body for charging a subscription
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChargeSubscriptionRequest {
    /// Charge date (default: the due date)
    pub date: Option<NaiveDate>,
    /// Amount override, positive
    pub amount: Option<i64>,
    /// Account override
    pub account_id: Option<i32>,
}

/// Result of charging a subscription
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChargeSubscriptionResponse {
    /// Expense row booked for the charge
    pub transaction_id: i32,
    /// Subscription with its due date advanced
    pub subscription: SubscriptionResponse,
}

/// Create a new subscription
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created successfully", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubscriptionResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Subscription name must not be empty"));
    }
    if request.amount <= 0 {
        return Err(ApiError::bad_request("Amount must be positive"));
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

    let new_subscription = subscription::ActiveModel {
        name: Set(name.to_string()),
        amount: Set(request.amount),
        frequency: Set(request.frequency),
        next_due_date: Set(request.next_due_date),
        account_id: Set(request.account_id),
        is_active: Set(request.is_active.unwrap_or(true)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let model = new_subscription.insert(&state.db).await?;
    info!(
        "Subscription created with ID: {}, name: {}",
        model.id, model.name
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            SubscriptionResponse::from(model),
            "Subscription created successfully",
        )),
    ))
}

/// Get subscriptions ordered by due date
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    params(
        ("active" = Option<bool>, Query, description = "Filter on the active flag"),
        ("days" = Option<i64>, Query, description = "Only subscriptions due within this many days")
    ),
    responses(
        (status = 200, description = "Subscriptions retrieved successfully", body = ApiResponse<Vec<SubscriptionResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ListSubscriptionsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SubscriptionResponse>>>> {
    let mut finder = subscription::Entity::find()
        .order_by_asc(subscription::Column::NextDueDate)
        .order_by_asc(subscription::Column::Id);
    if let Some(active) = query.active {
        finder = finder.filter(subscription::Column::IsActive.eq(active));
    }
    if let Some(days) = query.days {
        let horizon = Utc::now().date_naive() + Duration::days(days.max(0));
        finder = finder.filter(subscription::Column::NextDueDate.lte(horizon));
    }

    let subscriptions = finder.all(&state.db).await?;
    debug!("Retrieved {} subscriptions", subscriptions.len());

    let data: Vec<SubscriptionResponse> = subscriptions
        .into_iter()
        .map(SubscriptionResponse::from)
        .collect();
    Ok(Json(ApiResponse::new(
        data,
        "Subscriptions retrieved successfully",
    )))
}

/// Update a subscription
#[utoipa::path(
    patch,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(
        ("id" = i32, Path, description = "Subscription ID")
    ),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated successfully", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> ApiResult<Json<ApiResponse<SubscriptionResponse>>> {
    let model = subscription::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subscription {} not found", id)))?;

    let mut active = model.into_active_model();
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Subscription name must not be empty"));
        }
        active.name = Set(name);
    }
    if let Some(amount) = request.amount {
        if amount <= 0 {
            return Err(ApiError::bad_request("Amount must be positive"));
        }
        active.amount = Set(amount);
    }
    if let Some(frequency) = request.frequency {
        active.frequency = Set(frequency);
    }
    if let Some(next_due_date) = request.next_due_date {
        active.next_due_date = Set(next_due_date);
    }
    if let Some(account_id) = request.account_id {
        let exists = account::Entity::find_by_id(account_id).one(&state.db).await?;
        if exists.is_none() {
            return Err(ApiError::bad_request(format!(
                "Account {} does not exist",
                account_id
            )));
        }
        active.account_id = Set(Some(account_id));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    info!("Subscription {} updated", updated.id);

    Ok(Json(ApiResponse::new(
        SubscriptionResponse::from(updated),
        "Subscription updated successfully",
    )))
}

/// Delete a subscription
#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(
        ("id" = i32, Path, description = "Subscription ID")
    ),
    responses(
        (status = 200, description = "Subscription deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let model = subscription::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subscription {} not found", id)))?;

    subscription::Entity::delete_by_id(model.id)
        .exec(&state.db)
        .await?;
    info!("Subscription {} deleted", id);

    Ok(Json(ApiResponse::new(
        format!("Subscription {} deleted", id),
        "Subscription deleted successfully",
    )))
}

/// Charge a subscription
///
/// Books an expense row against the subscription's account (or the
/// override) and advances the due date by one period. Both writes land
/// in one database transaction. Inactive subscriptions cannot be
/// charged.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/{id}/charge",
    tag = "subscriptions",
    params(
        ("id" = i32, Path, description = "Subscription ID")
    ),
    request_body = ChargeSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription charged", body = ApiResponse<ChargeSubscriptionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn charge_subscription(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ChargeSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ChargeSubscriptionResponse>>)> {
    let model = subscription::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subscription {} not found", id)))?;
    if !model.is_active {
        return Err(ApiError::bad_request("Subscription is not active"));
    }

    let amount = request.amount.unwrap_or(model.amount);
    if amount <= 0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    let account_id = request
        .account_id
        .or(model.account_id)
        .ok_or_else(|| ApiError::bad_request("No account to charge against"))?;
    let exists = account::Entity::find_by_id(account_id).one(&state.db).await?;
    if exists.is_none() {
        return Err(ApiError::bad_request(format!(
            "Account {} does not exist",
            account_id
        )));
    }
    let date = request.date.unwrap_or(model.next_due_date);
    let next_due = advance_due(model.next_due_date, model.frequency);

    let txn = state.db.begin().await?;
    let row = transaction::ActiveModel {
        kind: Set(TransactionKind::Expense),
        amount: Set(-amount),
        date: Set(date),
        account_id: Set(Some(account_id)),
        note: Set(Some(format!("Subscription: {}", model.name))),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active = model.into_active_model();
    active.next_due_date = Set(next_due);
    let updated = active.update(&txn).await?;
    txn.commit().await?;
    info!(
        "Subscription {} charged via transaction {}, next due {}",
        updated.id, row.id, updated.next_due_date
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ChargeSubscriptionResponse {
                transaction_id: row.id,
                subscription: SubscriptionResponse::from(updated),
            },
            "Subscription charged",
        )),
    ))
}
