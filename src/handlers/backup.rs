use std::collections::HashSet;

use axum::{
    extract::State,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{account, budget, category, debt, debt_payment, subscription, transaction};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

const BACKUP_VERSION: u32 = 1;

/// Full database contents
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BackupData {
    #[schema(value_type = Vec<Object>)]
    pub accounts: Vec<account::Model>,
    #[schema(value_type = Vec<Object>)]
    pub categories: Vec<category::Model>,
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<transaction::Model>,
    #[schema(value_type = Vec<Object>)]
    pub debts: Vec<debt::Model>,
    #[schema(value_type = Vec<Object>)]
    pub debt_payments: Vec<debt_payment::Model>,
    #[schema(value_type = Vec<Object>)]
    pub subscriptions: Vec<subscription::Model>,
    #[schema(value_type = Vec<Object>)]
    pub budgets: Vec<budget::Model>,
}

/// Versioned backup envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BackupEnvelope {
    /// Envelope format version
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub data: BackupData,
}

/// Restore mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Keep existing rows, add backup rows with unseen IDs
    Merge,
    /// Wipe everything first, then load the backup as-is
    Replace,
}

/// Request body for restoring a backup
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RestoreRequest {
    /// Restore mode (default: merge)
    pub mode: Option<RestoreMode>,
    pub backup: BackupEnvelope,
}

/// Rows written per table during a restore
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestoreResponse {
    pub mode: RestoreMode,
    pub accounts: usize,
    pub categories: usize,
    pub transactions: usize,
    pub debts: usize,
    pub debt_payments: usize,
    pub subscriptions: usize,
    pub budgets: usize,
}

/// Export the whole database as one JSON document
#[utoipa::path(
    get,
    path = "/api/v1/backup",
    tag = "backup",
    responses(
        (status = 200, description = "Backup created", body = BackupEnvelope),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn export_backup(State(state): State<AppState>) -> ApiResult<Json<BackupEnvelope>> {
    let data = BackupData {
        accounts: account::Entity::find().all(&state.db).await?,
        categories: category::Entity::find().all(&state.db).await?,
        transactions: transaction::Entity::find().all(&state.db).await?,
        debts: debt::Entity::find().all(&state.db).await?,
        debt_payments: debt_payment::Entity::find().all(&state.db).await?,
        subscriptions: subscription::Entity::find().all(&state.db).await?,
        budgets: budget::Entity::find().all(&state.db).await?,
    };
    info!(
        "Backup exported: {} accounts, {} transactions",
        data.accounts.len(),
        data.transactions.len()
    );

    Ok(Json(BackupEnvelope {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        data,
    }))
}

/// Restore the database from a backup envelope
///
/// "replace" wipes every table before loading; "merge" keeps existing
/// rows and only adds backup rows whose IDs are not taken. Everything
/// runs inside one database transaction.
#[utoipa::path(
    post,
    path = "/api/v1/backup/restore",
    tag = "backup",
    request_body = RestoreRequest,
    responses(
        (status = 200, description = "Backup restored", body = ApiResponse<RestoreResponse>),
        (status = 400, description = "Unsupported backup version", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn restore_backup(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> ApiResult<Json<ApiResponse<RestoreResponse>>> {
    if request.backup.version != BACKUP_VERSION {
        return Err(ApiError::bad_request(format!(
            "Unsupported backup version {}",
            request.backup.version
        )));
    }
    let mode = request.mode.unwrap_or(RestoreMode::Merge);
    let data = request.backup.data;

    let txn = state.db.begin().await?;

    if mode == RestoreMode::Replace {
        // Children before parents so foreign keys never dangle.
        debt_payment::Entity::delete_many().exec(&txn).await?;
        transaction::Entity::delete_many().exec(&txn).await?;
        subscription::Entity::delete_many().exec(&txn).await?;
        budget::Entity::delete_many().exec(&txn).await?;
        debt::Entity::delete_many().exec(&txn).await?;
        category::Entity::delete_many().exec(&txn).await?;
        account::Entity::delete_many().exec(&txn).await?;
    }

    // Parents before children; IDs from the backup are preserved.
    let mut counts = RestoreResponse {
        mode,
        accounts: 0,
        categories: 0,
        transactions: 0,
        debts: 0,
        debt_payments: 0,
        subscriptions: 0,
        budgets: 0,
    };

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => account::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.accounts {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.accounts += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => category::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.categories {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.categories += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => debt::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.debts {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.debts += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => transaction::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.transactions {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.transactions += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => debt_payment::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.debt_payments {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.debt_payments += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => subscription::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.subscriptions {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.subscriptions += 1;
    }

    let existing: HashSet<i32> = match mode {
        RestoreMode::Merge => budget::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        RestoreMode::Replace => HashSet::new(),
    };
    for m in data.budgets {
        if existing.contains(&m.id) {
            continue;
        }
        m.into_active_model().insert(&txn).await?;
        counts.budgets += 1;
    }

    txn.commit().await?;
    info!(
        "Backup restored in {:?} mode: {} accounts, {} transactions",
        mode, counts.accounts, counts.transactions
    );

    Ok(Json(ApiResponse::new(counts, "Backup restored")))
}
