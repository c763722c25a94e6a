use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::category::{self, CategoryKind};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category name
    pub name: String,
    /// Category kind: "income" or "expense"
    #[schema(value_type = String)]
    pub kind: CategoryKind,
    /// Whether the category can carry a monthly budget (default: kind == expense)
    pub is_budgetable: Option<bool>,
}

/// Query parameters for listing categories
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Filter by kind
    pub kind: Option<CategoryKind>,
}

/// Category response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub kind: CategoryKind,
    pub is_budgetable: bool,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind,
            is_budgetable: model.is_budgetable,
        }
    }
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Category already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Category name must not be empty"));
    }

    // (name, kind) is unique; report a conflict before the DB does.
    let existing = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .filter(category::Column::Kind.eq(request.kind))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(format!(
            "Category '{}' already exists for this kind",
            name
        )));
    }

    let is_budgetable = request
        .is_budgetable
        .unwrap_or(request.kind == CategoryKind::Expense);

    let new_category = category::ActiveModel {
        name: Set(name.to_string()),
        kind: Set(request.kind),
        is_budgetable: Set(is_budgetable),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let model = new_category.insert(&state.db).await?;
    info!("Category created with ID: {}, name: {}", model.id, model.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CategoryResponse::from(model),
            "Category created successfully",
        )),
    ))
}

/// Get all categories, optionally filtered by kind
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    params(
        ("kind" = Option<String>, Query, description = "Filter by kind: income or expense")
    ),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let mut finder = category::Entity::find().order_by_asc(category::Column::Name);
    if let Some(kind) = query.kind {
        finder = finder.filter(category::Column::Kind.eq(kind));
    }

    let categories = finder.all(&state.db).await?;
    debug!("Retrieved {} categories", categories.len());

    let data: Vec<CategoryResponse> = categories.into_iter().map(CategoryResponse::from).collect();
    Ok(Json(ApiResponse::new(
        data,
        "Categories retrieved successfully",
    )))
}

/// Delete a category
///
/// Ledger rows keep their data but lose the category reference;
/// budgets on the category are removed.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let model = category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category {} not found", id)))?;

    category::Entity::delete_by_id(model.id).exec(&state.db).await?;
    info!("Category {} deleted", id);

    Ok(Json(ApiResponse::new(
        format!("Category {} deleted", id),
        "Category deleted successfully",
    )))
}
