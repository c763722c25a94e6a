use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{Duration, NaiveDate, Utc};
use compute::Month;
use model::entities::debt::{self, DebtKind, DebtStatus};
use model::entities::subscription;
use model::entities::transaction::{self, TransactionKind};
use model::entities::category;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Query parameters for the dashboard summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Calendar month, "YYYY-MM" (default: current month)
    pub month: Option<String>,
    /// Restrict to rows on this account
    pub account_id: Option<i32>,
    /// Restrict to rows in this category
    pub category_id: Option<i32>,
}

/// Query parameters for the upcoming-due list
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    /// Horizon in days ahead (default: 7, clamped to 1..=60)
    pub days: Option<i64>,
}

/// One day of cash flow
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyFlow {
    pub date: NaiveDate,
    /// Income that day, absolute value
    pub income: i64,
    /// Expenses that day, absolute value
    pub expense: i64,
}

/// Expense total for one category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryExpense {
    pub category_id: Option<i32>,
    pub category_name: String,
    /// Absolute expense total
    pub amount: i64,
}

/// Monthly cash-flow summary, transfers excluded
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummaryResponse {
    pub month: String,
    /// Total income, absolute value
    pub income: i64,
    /// Total expenses, absolute value
    pub expense: i64,
    /// `income - expense`
    pub net: i64,
    /// Zero-filled series covering every day of the month
    pub daily: Vec<DailyFlow>,
    /// Expense breakdown per category, largest first
    pub by_category: Vec<CategoryExpense>,
}

/// Subscription due within the horizon
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpcomingSubscription {
    pub id: i32,
    pub name: String,
    pub amount: i64,
    pub next_due_date: NaiveDate,
    /// Days from today to the due date, negative when overdue
    pub days_until_due: i64,
    /// Due date already passed
    pub overdue: bool,
}

/// Open debt due within the horizon
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpcomingDebt {
    pub id: i32,
    #[schema(value_type = String)]
    pub kind: DebtKind,
    pub counterparty_name: String,
    pub remaining_amount: i64,
    pub due_date: NaiveDate,
    /// Days from today to the due date, negative when overdue
    pub days_until_due: i64,
    /// Due date already passed
    pub overdue: bool,
}

/// Everything due soon
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpcomingResponse {
    /// Horizon actually applied
    pub days: i64,
    pub subscriptions: Vec<UpcomingSubscription>,
    pub debts: Vec<UpcomingDebt>,
}

/// Get the cash-flow summary for a month
///
/// Transfers move money between own accounts and never count as
/// income or expense here.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    tag = "dashboard",
    params(
        ("month" = Option<String>, Query, description = "Calendar month, YYYY-MM (default: current)"),
        ("account_id" = Option<i32>, Query, description = "Restrict to rows on this account"),
        ("category_id" = Option<i32>, Query, description = "Restrict to rows in this category")
    ),
    responses(
        (status = 200, description = "Summary retrieved successfully", body = ApiResponse<DashboardSummaryResponse>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<ApiResponse<DashboardSummaryResponse>>> {
    let month = match &query.month {
        Some(value) => Month::parse(value)
            .map_err(|_| ApiError::bad_request(format!("Invalid month: {}", value)))?,
        None => Month::current(),
    };
    let (start, end) = month.range();

    let mut finder = transaction::Entity::find()
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .filter(transaction::Column::Kind.ne(TransactionKind::Transfer));
    if let Some(account_id) = query.account_id {
        finder = finder.filter(transaction::Column::AccountId.eq(account_id));
    }
    if let Some(category_id) = query.category_id {
        finder = finder.filter(transaction::Column::CategoryId.eq(category_id));
    }
    let rows = finder.all(&state.db).await?;
    debug!("Summarizing {} rows for {}", rows.len(), month);

    // Zero-filled day buckets so charts never see gaps.
    let mut daily: Vec<DailyFlow> = Vec::new();
    let mut day = start;
    while day < end {
        daily.push(DailyFlow {
            date: day,
            income: 0,
            expense: 0,
        });
        day += Duration::days(1);
    }

    let mut income = 0i64;
    let mut expense = 0i64;
    let mut by_category: HashMap<Option<i32>, i64> = HashMap::new();
    for row in &rows {
        let idx = (row.date - start).num_days() as usize;
        match row.kind {
            TransactionKind::Income => {
                income += row.amount;
                daily[idx].income += row.amount;
            }
            TransactionKind::Expense => {
                let abs = row.amount.abs();
                expense += abs;
                daily[idx].expense += abs;
                *by_category.entry(row.category_id).or_insert(0) += abs;
            }
            TransactionKind::Transfer => {}
        }
    }

    let names: HashMap<i32, String> = category::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut by_category: Vec<CategoryExpense> = by_category
        .into_iter()
        .map(|(category_id, amount)| CategoryExpense {
            category_id,
            category_name: category_id
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| "Uncategorized".to_string()),
            amount,
        })
        .collect();
    by_category.sort_by(|a, b| b.amount.cmp(&a.amount));

    Ok(Json(ApiResponse::new(
        DashboardSummaryResponse {
            month: month.to_string(),
            income,
            expense,
            net: income - expense,
            daily,
            by_category,
        },
        "Summary retrieved successfully",
    )))
}

/// Get subscriptions and debts due within the horizon
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/upcoming",
    tag = "dashboard",
    params(
        ("days" = Option<i64>, Query, description = "Horizon in days ahead (default: 7, clamped to 1..=60)")
    ),
    responses(
        (status = 200, description = "Upcoming items retrieved successfully", body = ApiResponse<UpcomingResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_upcoming(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<ApiResponse<UpcomingResponse>>> {
    let days = query.days.unwrap_or(7).clamp(1, 60);
    let today = Utc::now().date_naive();
    let horizon = today + Duration::days(days);

    let subscriptions = subscription::Entity::find()
        .filter(subscription::Column::IsActive.eq(true))
        .filter(subscription::Column::NextDueDate.lte(horizon))
        .order_by_asc(subscription::Column::NextDueDate)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| UpcomingSubscription {
            id: s.id,
            name: s.name,
            amount: s.amount,
            days_until_due: (s.next_due_date - today).num_days(),
            overdue: s.next_due_date < today,
            next_due_date: s.next_due_date,
        })
        .collect();

    let debts = debt::Entity::find()
        .filter(debt::Column::Status.eq(DebtStatus::Open))
        .filter(debt::Column::DueDate.is_not_null())
        .filter(debt::Column::DueDate.lte(horizon))
        .order_by_asc(debt::Column::DueDate)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|d| {
            let due_date = d.due_date?;
            Some(UpcomingDebt {
                id: d.id,
                kind: d.kind,
                counterparty_name: d.counterparty_name,
                remaining_amount: d.remaining_amount,
                days_until_due: (due_date - today).num_days(),
                overdue: due_date < today,
                due_date,
            })
        })
        .collect();

    Ok(Json(ApiResponse::new(
        UpcomingResponse {
            days,
            subscriptions,
            debts,
        },
        "Upcoming items retrieved successfully",
    )))
}
