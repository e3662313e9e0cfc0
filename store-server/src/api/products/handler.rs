//! Product API Handlers

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate, Review, ReviewCreate};
use crate::db::repository::{ProductRepository, Repository};
use crate::utils::money::validate_price;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/products - 获取所有商品（公开）
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_all().await?;
    Ok(ok(products))
}

/// GET /api/products/{id} - 获取单个商品（公开）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(ok(product))
}

/// POST /api/products - 创建商品（管理员）
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(data): Json<ProductCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    validate_price(data.price)?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(data).await?;

    let id = product.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    if let Err(e) = state.audit.record(
        AuditAction::ProductCreated,
        user.email.clone(),
        id.clone(),
        format!("Created product '{}'", product.name),
    ) {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    tracing::info!(product_id = %id, name = %product.name, "Product created");

    Ok(ok(product))
}

/// PUT /api/products/{id} - 更新商品（管理员，动态部分更新）
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<ProductUpdate>,
) -> AppResult<Json<AppResponse<Product>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if let Some(price) = data.price {
        validate_price(price)?;
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo.update(&id, data).await?;

    if let Err(e) = state.audit.record(
        AuditAction::ProductUpdated,
        user.email.clone(),
        id.clone(),
        format!("Updated product '{}'", product.name),
    ) {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    Ok(ok(product))
}

/// DELETE /api/products/{id} - 删除商品（管理员）
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let repo = ProductRepository::new(state.get_db());
    let deleted = repo.delete(&id).await?;

    if let Err(e) = state.audit.record(
        AuditAction::ProductDeleted,
        user.email.clone(),
        id.clone(),
        "Deleted product".to_string(),
    ) {
        tracing::warn!(error = %e, "Audit entry dropped");
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(ok(deleted))
}

/// GET /api/products/{id}/reviews - 获取商品评论（公开）
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Review>>>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(ok(product.reviews))
}

/// POST /api/products/{id}/reviews - 追加评论（需登录，署名为当前用户）
pub async fn add_review(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<ReviewCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.add_review(&id, user.name.clone(), data).await?;

    tracing::info!(product_id = %id, reviewer = %user.name, "Review added");

    Ok(ok(product))
}
