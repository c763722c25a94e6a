use std::collections::HashMap;

use axum::{
    extract::State,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use model::entities::account::{self, AccountKind};
use model::entities::category::{self, CategoryKind};
use model::entities::transaction::{self, TransactionKind};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// One row to import
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ImportItem {
    /// "income", "expense" or "transfer"
    #[schema(value_type = String)]
    pub kind: TransactionKind,
    /// Positive amount in the smallest currency unit
    pub amount: i64,
    pub date: NaiveDate,
    /// Account name for income/expense rows, matched case-sensitively
    pub account_name: Option<String>,
    /// Category name, matched against categories of the same kind
    pub category_name: Option<String>,
    /// Source account name for transfers
    pub from_account_name: Option<String>,
    /// Destination account name for transfers
    pub to_account_name: Option<String>,
    pub note: Option<String>,
}

/// Request body for importing ledger rows
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ImportTransactionsRequest {
    pub transactions: Vec<ImportItem>,
    /// Create accounts named in the rows but not yet known (default: true)
    pub create_missing_accounts: Option<bool>,
    /// Create categories named in the rows but not yet known (default: false)
    pub create_missing_categories: Option<bool>,
}

/// Why one row was skipped
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportItemError {
    /// Position of the row in the request
    pub index: usize,
    pub error: String,
}

/// Result of an import
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportTransactionsResponse {
    /// Rows written to the ledger (a transfer counts once)
    pub created: usize,
    /// Rows skipped, with reasons
    pub errors: Vec<ImportItemError>,
}

/// Resolves an account name to an id, creating the account when allowed.
/// `Ok(None)` means the name is unknown and creation is off.
async fn resolve_account(
    txn: &DatabaseTransaction,
    known: &mut HashMap<String, i32>,
    name: &str,
    create: bool,
) -> ApiResult<Option<i32>> {
    if let Some(id) = known.get(name) {
        return Ok(Some(*id));
    }
    if !create {
        return Ok(None);
    }
    let acct = account::ActiveModel {
        name: Set(name.to_string()),
        kind: Set(AccountKind::Bank),
        currency: Set("IDR".to_string()),
        initial_balance: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    known.insert(acct.name.clone(), acct.id);
    Ok(Some(acct.id))
}

/// Import ledger rows from JSON
///
/// All writes happen in one database transaction; invalid rows are
/// skipped and reported by index instead of failing the batch.
/// Transfer rows become proper two-row pairs.
#[utoipa::path(
    post,
    path = "/api/v1/import/transactions",
    tag = "import-export",
    request_body = ImportTransactionsRequest,
    responses(
        (status = 200, description = "Import finished", body = ApiResponse<ImportTransactionsResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn import_transactions(
    State(state): State<AppState>,
    Json(request): Json<ImportTransactionsRequest>,
) -> ApiResult<Json<ApiResponse<ImportTransactionsResponse>>> {
    if request.transactions.is_empty() {
        return Err(ApiError::bad_request("No transactions to import"));
    }
    let create_accounts = request.create_missing_accounts.unwrap_or(true);
    let create_categories = request.create_missing_categories.unwrap_or(false);

    let txn = state.db.begin().await?;

    let mut accounts: HashMap<String, i32> = account::Entity::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| (a.name, a.id))
        .collect();
    let mut categories: HashMap<(String, CategoryKind), i32> = category::Entity::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| ((c.name, c.kind), c.id))
        .collect();

    let now = Utc::now();
    let mut created = 0usize;
    let mut errors = Vec::new();
    'rows: for (index, item) in request.transactions.iter().enumerate() {
        if item.amount <= 0 {
            errors.push(ImportItemError {
                index,
                error: "Amount must be positive".to_string(),
            });
            continue;
        }

        if item.kind == TransactionKind::Transfer {
            let mut ids = [0i32; 2];
            for (slot, name) in [
                item.from_account_name.as_deref(),
                item.to_account_name.as_deref(),
            ]
            .into_iter()
            .enumerate()
            {
                let name = name.map(str::trim).unwrap_or_default();
                if name.is_empty() {
                    errors.push(ImportItemError {
                        index,
                        error: "Transfers need from_account_name and to_account_name"
                            .to_string(),
                    });
                    continue 'rows;
                }
                match resolve_account(&txn, &mut accounts, name, create_accounts).await? {
                    Some(id) => ids[slot] = id,
                    None => {
                        errors.push(ImportItemError {
                            index,
                            error: format!("Unknown account '{}'", name),
                        });
                        continue 'rows;
                    }
                }
            }
            let [from_id, to_id] = ids;
            if from_id == to_id {
                errors.push(ImportItemError {
                    index,
                    error: "Transfer source and destination must differ".to_string(),
                });
                continue;
            }

            let group_id = Uuid::new_v4().to_string();
            transaction::ActiveModel {
                kind: Set(TransactionKind::Transfer),
                amount: Set(-item.amount),
                date: Set(item.date),
                from_account_id: Set(Some(from_id)),
                transfer_group_id: Set(Some(group_id.clone())),
                note: Set(item.note.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            transaction::ActiveModel {
                kind: Set(TransactionKind::Transfer),
                amount: Set(item.amount),
                date: Set(item.date),
                to_account_id: Set(Some(to_id)),
                transfer_group_id: Set(Some(group_id)),
                note: Set(item.note.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created += 1;
            continue;
        }

        let account_name = item
            .account_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if account_name.is_empty() {
            errors.push(ImportItemError {
                index,
                error: "Account name must not be empty".to_string(),
            });
            continue;
        }
        let account_id =
            match resolve_account(&txn, &mut accounts, account_name, create_accounts).await? {
                Some(id) => id,
                None => {
                    errors.push(ImportItemError {
                        index,
                        error: format!("Unknown account '{}'", account_name),
                    });
                    continue;
                }
            };

        let category_kind = match item.kind {
            TransactionKind::Income => CategoryKind::Income,
            _ => CategoryKind::Expense,
        };
        let category_id = match item.category_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let key = (name.to_string(), category_kind);
                match categories.get(&key) {
                    Some(id) => Some(*id),
                    None if create_categories => {
                        let cat = category::ActiveModel {
                            name: Set(name.to_string()),
                            kind: Set(category_kind),
                            is_budgetable: Set(category_kind == CategoryKind::Expense),
                            created_at: Set(now),
                            ..Default::default()
                        }
                        .insert(&txn)
                        .await?;
                        categories.insert(key, cat.id);
                        Some(cat.id)
                    }
                    // Unknown categories are dropped rather than invented.
                    None => None,
                }
            }
            _ => None,
        };

        let signed = match item.kind {
            TransactionKind::Income => item.amount,
            _ => -item.amount,
        };
        transaction::ActiveModel {
            kind: Set(item.kind),
            amount: Set(signed),
            date: Set(item.date),
            account_id: Set(Some(account_id)),
            category_id: Set(category_id),
            note: Set(item.note.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        created += 1;
    }

    txn.commit().await?;
    if errors.is_empty() {
        info!("Imported {} ledger rows", created);
    } else {
        warn!(
            "Imported {} ledger rows, skipped {}",
            created,
            errors.len()
        );
    }

    Ok(Json(ApiResponse::new(
        ImportTransactionsResponse { created, errors },
        "Import finished",
    )))
}
