use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use compute::budget::{percent_used, remaining, spent_by_category};
use compute::Month;
use model::entities::category::{self, CategoryKind};
use model::entities::{budget, transaction};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for setting a monthly budget (upsert on month + category)
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpsertBudgetRequest {
    /// Calendar month, "YYYY-MM"
    pub month: String,
    /// Expense category the budget applies to
    pub category_id: i32,
    /// Planned amount, smallest currency unit, positive
    pub amount: i64,
}

/// Request body for updating a budget amount
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBudgetRequest {
    /// Planned amount, smallest currency unit, positive
    pub amount: i64,
}

/// Query parameters for listing budgets
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Calendar month, "YYYY-MM" (default: current month)
    pub month: Option<String>,
}

/// Budget with its actual spending for the month
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub month: String,
    pub category_id: i32,
    pub category_name: String,
    /// Planned amount
    pub amount: i64,
    /// Actual expenses in the month, absolute value
    pub spent: i64,
    /// `max(amount - spent, 0)`
    pub remaining: i64,
    /// Spent share of plan, capped at 100
    pub percent_used: u8,
}

/// Per-category line of the monthly budget summary
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetSummaryItem {
    pub budget_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub planned: i64,
    pub spent: i64,
    pub remaining: i64,
    pub percent_used: u8,
}

/// Monthly budget summary
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetSummaryResponse {
    pub month: String,
    pub total_planned: i64,
    pub total_spent: i64,
    pub total_remaining: i64,
    pub items: Vec<BudgetSummaryItem>,
}

/// Request body for copying budgets between months
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CopyBudgetsRequest {
    /// Month to copy from, "YYYY-MM"
    pub from_month: String,
    /// Month to copy into, "YYYY-MM"
    pub to_month: String,
    /// Replace amounts that already exist in the target month (default: false)
    pub overwrite: Option<bool>,
    /// Scale factor applied to copied amounts (default: 1.0)
    pub factor: Option<f64>,
}

/// Result of a budget copy
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CopyBudgetsResponse {
    pub from_month: String,
    pub to_month: String,
    /// Budgets newly created in the target month
    pub created: usize,
    /// Existing target budgets overwritten
    pub updated: usize,
    /// Existing target budgets left untouched
    pub skipped: usize,
}

fn parse_month(value: &str) -> ApiResult<Month> {
    Month::parse(value).map_err(|_| ApiError::bad_request(format!("Invalid month: {}", value)))
}

/// Expense totals per category for one month.
async fn month_spending(state: &AppState, month: &Month) -> ApiResult<HashMap<i32, i64>> {
    let (start, end) = month.range();
    let rows = transaction::Entity::find()
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .all(&state.db)
        .await?;
    Ok(spent_by_category(&rows))
}

async fn budgets_with_spending(
    state: &AppState,
    month: &Month,
) -> ApiResult<Vec<BudgetResponse>> {
    let spent = month_spending(state, month).await?;
    let budgets = budget::Entity::find()
        .filter(budget::Column::Month.eq(month.to_string()))
        .order_by_asc(budget::Column::Id)
        .find_also_related(category::Entity)
        .all(&state.db)
        .await?;

    let out = budgets
        .into_iter()
        .map(|(b, cat)| {
            let spent = spent.get(&b.category_id).copied().unwrap_or(0);
            BudgetResponse {
                id: b.id,
                month: b.month,
                category_id: b.category_id,
                category_name: cat.map(|c| c.name).unwrap_or_default(),
                amount: b.amount,
                spent,
                remaining: remaining(b.amount, spent),
                percent_used: percent_used(b.amount, spent),
            }
        })
        .collect();
    Ok(out)
}

/// Set the budget for a category and month
///
/// Creates the budget or replaces the amount if one already exists for
/// the same month and category.
#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    tag = "budgets",
    request_body = UpsertBudgetRequest,
    responses(
        (status = 201, description = "Budget set successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn upsert_budget(
    State(state): State<AppState>,
    Json(request): Json<UpsertBudgetRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BudgetResponse>>)> {
    let month = parse_month(&request.month)?;
    if request.amount <= 0 {
        return Err(ApiError::bad_request("Budget amount must be positive"));
    }

    let cat = category::Entity::find_by_id(request.category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request(format!("Category {} does not exist", request.category_id))
        })?;
    if cat.kind != CategoryKind::Expense || !cat.is_budgetable {
        return Err(ApiError::bad_request(
            "Budgets can only target budgetable expense categories",
        ));
    }

    let existing = budget::Entity::find()
        .filter(budget::Column::Month.eq(month.to_string()))
        .filter(budget::Column::CategoryId.eq(request.category_id))
        .one(&state.db)
        .await?;

    let model = match existing {
        Some(b) => {
            let mut active = b.into_active_model();
            active.amount = Set(request.amount);
            active.update(&state.db).await?
        }
        None => {
            budget::ActiveModel {
                month: Set(month.to_string()),
                category_id: Set(request.category_id),
                amount: Set(request.amount),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&state.db)
            .await?
        }
    };
    info!(
        "Budget {} set for category {} in {}",
        model.id, model.category_id, model.month
    );

    let spent = month_spending(&state, &month)
        .await?
        .get(&model.category_id)
        .copied()
        .unwrap_or(0);
    let response = BudgetResponse {
        id: model.id,
        month: model.month,
        category_id: model.category_id,
        category_name: cat.name,
        amount: model.amount,
        spent,
        remaining: remaining(model.amount, spent),
        percent_used: percent_used(model.amount, spent),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(response, "Budget set successfully")),
    ))
}

/// Get budgets for a month, each with its actual spending
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    params(
        ("month" = Option<String>, Query, description = "Calendar month, YYYY-MM (default: current)")
    ),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetResponse>>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    State(state): State<AppState>,
    Query(query): Query<ListBudgetsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<BudgetResponse>>>> {
    let month = match &query.month {
        Some(value) => parse_month(value)?,
        None => Month::current(),
    };

    let data = budgets_with_spending(&state, &month).await?;
    debug!("Retrieved {} budgets for {}", data.len(), month);
    Ok(Json(ApiResponse::new(data, "Budgets retrieved successfully")))
}

/// Get the budget summary for a month
#[utoipa::path(
    get,
    path = "/api/v1/budgets/summary",
    tag = "budgets",
    params(
        ("month" = Option<String>, Query, description = "Calendar month, YYYY-MM (default: current)")
    ),
    responses(
        (status = 200, description = "Budget summary retrieved successfully", body = ApiResponse<BudgetSummaryResponse>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_summary(
    State(state): State<AppState>,
    Query(query): Query<ListBudgetsQuery>,
) -> ApiResult<Json<ApiResponse<BudgetSummaryResponse>>> {
    let month = match &query.month {
        Some(value) => parse_month(value)?,
        None => Month::current(),
    };

    let budgets = budgets_with_spending(&state, &month).await?;
    let total_planned: i64 = budgets.iter().map(|b| b.amount).sum();
    let total_spent: i64 = budgets.iter().map(|b| b.spent).sum();
    let mut items: Vec<BudgetSummaryItem> = budgets
        .into_iter()
        .map(|b| BudgetSummaryItem {
            budget_id: b.id,
            category_id: b.category_id,
            category_name: b.category_name,
            planned: b.amount,
            spent: b.spent,
            remaining: b.remaining,
            percent_used: b.percent_used,
        })
        .collect();
    items.sort_by(|a, b| a.category_name.cmp(&b.category_name));

    Ok(Json(ApiResponse::new(
        BudgetSummaryResponse {
            month: month.to_string(),
            total_planned,
            total_spent,
            total_remaining: remaining(total_planned, total_spent),
            items,
        },
        "Budget summary retrieved successfully",
    )))
}

/// Update a budget amount
#[utoipa::path(
    patch,
    path = "/api/v1/budgets/{id}",
    tag = "budgets",
    params(
        ("id" = i32, Path, description = "Budget ID")
    ),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBudgetRequest>,
) -> ApiResult<Json<ApiResponse<BudgetResponse>>> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request("Budget amount must be positive"));
    }

    let model = budget::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Budget {} not found", id)))?;

    let mut active = model.into_active_model();
    active.amount = Set(request.amount);
    let updated = active.update(&state.db).await?;
    info!("Budget {} updated", updated.id);

    let month = parse_month(&updated.month)?;
    let cat = category::Entity::find_by_id(updated.category_id)
        .one(&state.db)
        .await?;
    let spent = month_spending(&state, &month)
        .await?
        .get(&updated.category_id)
        .copied()
        .unwrap_or(0);

    Ok(Json(ApiResponse::new(
        BudgetResponse {
            id: updated.id,
            month: updated.month,
            category_id: updated.category_id,
            category_name: cat.map(|c| c.name).unwrap_or_default(),
            amount: updated.amount,
            spent,
            remaining: remaining(updated.amount, spent),
            percent_used: percent_used(updated.amount, spent),
        },
        "Budget updated successfully",
    )))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{id}",
    tag = "budgets",
    params(
        ("id" = i32, Path, description = "Budget ID")
    ),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let model = budget::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Budget {} not found", id)))?;

    budget::Entity::delete_by_id(model.id).exec(&state.db).await?;
    info!("Budget {} deleted", id);

    Ok(Json(ApiResponse::new(
        format!("Budget {} deleted", id),
        "Budget deleted successfully",
    )))
}

/// Copy all budgets from one month to another
///
/// Copied amounts are scaled by `factor` and floored at 1. Budgets
/// already present in the target month are skipped unless `overwrite`
/// is set.
#[utoipa::path(
    post,
    path = "/api/v1/budgets/copy",
    tag = "budgets",
    request_body = CopyBudgetsRequest,
    responses(
        (status = 200, description = "Budgets copied", body = ApiResponse<CopyBudgetsResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn copy_budgets(
    State(state): State<AppState>,
    Json(request): Json<CopyBudgetsRequest>,
) -> ApiResult<Json<ApiResponse<CopyBudgetsResponse>>> {
    let from_month = parse_month(&request.from_month)?;
    let to_month = parse_month(&request.to_month)?;
    if from_month == to_month {
        return Err(ApiError::bad_request(
            "Source and target month must differ",
        ));
    }
    let factor = request.factor.unwrap_or(1.0);
    if !(factor.is_finite() && factor > 0.0) {
        return Err(ApiError::bad_request("Factor must be a positive number"));
    }
    let overwrite = request.overwrite.unwrap_or(false);

    let source = budget::Entity::find()
        .filter(budget::Column::Month.eq(from_month.to_string()))
        .all(&state.db)
        .await?;
    let target: HashMap<i32, budget::Model> = budget::Entity::find()
        .filter(budget::Column::Month.eq(to_month.to_string()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|b| (b.category_id, b))
        .collect();

    let mut created = 0usize;
    let mut updated = 0usize;
    let mut skipped = 0usize;
    for src in source {
        let scaled = (((src.amount as f64) * factor).floor() as i64).max(1);
        match target.get(&src.category_id) {
            Some(existing) if overwrite => {
                let mut active = existing.clone().into_active_model();
                active.amount = Set(scaled);
                active.update(&state.db).await?;
                updated += 1;
            }
            Some(_) => skipped += 1,
            None => {
                budget::ActiveModel {
                    month: Set(to_month.to_string()),
                    category_id: Set(src.category_id),
                    amount: Set(scaled),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&state.db)
                .await?;
                created += 1;
            }
        }
    }
    info!(
        "Copied budgets {} -> {}: {} created, {} updated, {} skipped",
        from_month, to_month, created, updated, skipped
    );

    Ok(Json(ApiResponse::new(
        CopyBudgetsResponse {
            from_month: from_month.to_string(),
            to_month: to_month.to_string(),
            created,
            updated,
            skipped,
        },
        "Budgets copied",
    )))
}
