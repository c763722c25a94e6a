use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use compute::Month;
use model::entities::transaction::{self, TransactionKind};
use model::entities::{account, category};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{ApiError, ApiResult};
use crate::schemas::AppState;

/// Query parameters narrowing the export
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Calendar month filter, "YYYY-MM"
    pub month: Option<String>,
    pub kind: Option<TransactionKind>,
    /// Rows touching this account
    pub account_id: Option<i32>,
    pub category_id: Option<i32>,
}

/// Download the full ledger as CSV
///
/// Account and category references are resolved to names so the file
/// stands on its own.
#[utoipa::path(
    get,
    path = "/api/v1/exports/transactions",
    tag = "import-export",
    params(
        ("month" = Option<String>, Query, description = "Calendar month filter, YYYY-MM"),
        ("kind" = Option<String>, Query, description = "Kind filter: income, expense or transfer"),
        ("account_id" = Option<i32>, Query, description = "Rows touching this account"),
        ("category_id" = Option<i32>, Query, description = "Rows in this category")
    ),
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv"),
        (status = 400, description = "Invalid month filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn export_transactions_csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let accounts: HashMap<i32, String> = account::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let categories: HashMap<i32, String> = category::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut finder = transaction::Entity::find()
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id);
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
    debug!("Exporting {} ledger rows as CSV", rows.len());

    let name_of = |map: &HashMap<i32, String>, id: Option<i32>| -> String {
        id.and_then(|id| map.get(&id).cloned()).unwrap_or_default()
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id",
            "date",
            "type",
            "amount",
            "account",
            "category",
            "fromAccount",
            "toAccount",
            "note",
        ])
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {}", e)))?;
    for row in &rows {
        let kind = match row.kind {
            transaction::TransactionKind::Income => "income",
            transaction::TransactionKind::Expense => "expense",
            transaction::TransactionKind::Transfer => "transfer",
        };
        writer
            .write_record([
                row.id.to_string(),
                row.date.to_string(),
                kind.to_string(),
                row.amount.to_string(),
                name_of(&accounts, row.account_id),
                name_of(&categories, row.category_id),
                name_of(&accounts, row.from_account_id),
                name_of(&accounts, row.to_account_id),
                row.note.clone().unwrap_or_default(),
            ])
            .map_err(|e| ApiError::Internal(format!("CSV write failed: {}", e)))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {}", e)))?;
    let body = String::from_utf8(body)
        .map_err(|e| ApiError::Internal(format!("CSV encoding failed: {}", e)))?;

    let filename = format!(
        "attachment; filename=\"transactions-{}.csv\"",
        Utc::now().date_naive()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    )
        .into_response())
}
