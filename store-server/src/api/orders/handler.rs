//! Order API Handlers

use std::io::Cursor;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use image::codecs::jpeg::JpegEncoder;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderCreate, OrderItem, OrderStatus};
use crate::db::repository::{OrderRepository, ProductRepository, Repository};
use crate::security_log;
use crate::utils::money::{money_eq, order_total, to_f64, validate_client_total, validate_line_item};
use crate::utils::validation::{validate_latitude, validate_longitude};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// 配送凭证照片大小上限
const MAX_PROOF_SIZE: usize = 5 * 1024 * 1024;

/// 重编码 JPEG 的质量
const JPEG_QUALITY: u8 = 85;

/// POST /api/orders - 下单
///
/// 逐项解析商品并在服务端快照名称与单价，重新计算总价后与客户端
/// 提交值核对；库存扣减与订单创建在仓储层的单个事务内完成。
pub async fn place(
    State(state): State<ServerState>,
    Json(data): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<AppResponse<Order>>)> {
    data.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    for item in &data.items {
        validate_line_item(item)?;
    }
    validate_client_total(data.total_amount)?;
    if let Some(lat) = data.latitude {
        validate_latitude(lat)?;
    }
    if let Some(lon) = data.longitude {
        validate_longitude(lon)?;
    }

    let db = state.get_db();
    let products = ProductRepository::new(db.clone());

    // 客户端提交的价格不可信，以当前目录价为准
    let mut items: Vec<OrderItem> = Vec::with_capacity(data.items.len());
    for input in &data.items {
        let product = products
            .find_by_id(&input.product)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {}", input.product)))?;
        let product_id = product
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Product record missing id"))?;

        items.push(OrderItem {
            product: product_id,
            name: product.name,
            price: product.price,
            quantity: input.quantity,
        });
    }

    let computed = to_f64(order_total(&items));
    if !money_eq(computed, data.total_amount) {
        security_log!(
            "WARN",
            "order_total_mismatch",
            client_total = format!("{:.2}", data.total_amount),
            computed_total = format!("{:.2}", computed)
        );
        return Err(AppError::validation(
            "Order total does not match the priced items",
        ));
    }

    let repo = OrderRepository::new(db);
    let order = repo.place_order(data, items, computed).await?;

    let id = order.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    tracing::info!(
        order_id = %id,
        total = %format!("{:.2}", order.total_amount),
        items = order.items.len(),
        "Order placed"
    );

    Ok((StatusCode::CREATED, ok(order)))
}

/// GET /api/orders - 获取所有订单（骑手/管理员）
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    if !user.is_staff() {
        return Err(AppError::forbidden("Staff access required"));
    }

    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_all().await?;
    Ok(ok(orders))
}

/// GET /api/orders/{id} - 获取单个订单（骑手/管理员）
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    if !user.is_staff() {
        return Err(AppError::forbidden("Staff access required"));
    }

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;
    Ok(ok(order))
}

/// DELETE /api/orders/{id} - 删除订单（管理员，不回补库存）
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let repo = OrderRepository::new(state.get_db());
    let deleted = repo.delete(&id).await?;

    tracing::info!(order_id = %id, deleted_by = %user.email, "Order deleted");

    Ok(ok(deleted))
}

/// PATCH /api/orders/{id}/deliver - 开始配送（骑手/管理员）
///
/// 仅 Pending 订单可进入 Delivering；重复调用幂等返回当前状态。
pub async fn start_delivery(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    if !user.is_staff() {
        return Err(AppError::forbidden("Staff access required"));
    }

    let repo = OrderRepository::new(state.get_db());
    let order = repo.start_delivery(&id).await?;

    tracing::info!(order_id = %id, rider = %user.email, "Delivery started");

    Ok(ok(order))
}

/// POST /api/orders/{id}/deliver-proof - 上传配送凭证并完成订单（骑手/管理员）
///
/// multipart 字段名 `proof`；照片验证为图片后统一重编码为 JPEG 存储，
/// 订单由 Delivering 进入 Delivered。
pub async fn submit_proof(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<AppResponse<Order>>> {
    if !user.is_staff() {
        return Err(AppError::forbidden("Staff access required"));
    }

    let mut proof_bytes = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("proof") {
            proof_bytes = Some(field.bytes().await?);
            break;
        }
    }

    let bytes = proof_bytes.ok_or_else(|| AppError::validation("Missing 'proof' file field"))?;
    if bytes.is_empty() {
        return Err(AppError::validation("Proof photo is empty"));
    }
    if bytes.len() > MAX_PROOF_SIZE {
        return Err(AppError::validation(format!(
            "Proof photo exceeds {} MB limit",
            MAX_PROOF_SIZE / 1024 / 1024
        )));
    }

    let img = image::load_from_memory(&bytes)
        .map_err(|_| AppError::validation("Proof photo is not a valid image"))?;

    // 统一转成 JPEG：剥离元数据，约束存储大小
    let rgb_img = img.to_rgb8();
    let mut cursor = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    rgb_img
        .write_with_encoder(encoder)
        .map_err(|e| AppError::internal(format!("Failed to encode proof photo: {}", e)))?;

    let filename = format!("{}.jpg", Uuid::new_v4());
    let dir = state.config.proofs_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::internal(format!("Failed to create proofs directory: {}", e)))?;
    tokio::fs::write(dir.join(&filename), cursor.into_inner())
        .await
        .map_err(|e| AppError::internal(format!("Failed to store proof photo: {}", e)))?;

    let proof_path = format!("/uploads/proofs/{}", filename);
    let repo = OrderRepository::new(state.get_db());
    let order = repo.complete_delivery(&id, proof_path).await?;

    tracing::info!(order_id = %id, rider = %user.email, "Delivery completed with proof");

    Ok(ok(order))
}

/// GET /api/orders/track-order/{id} - 订单跟踪
///
/// 配送中的订单会盖上骑手当前位置再返回。
pub async fn track(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;

    if order.status == OrderStatus::Delivering {
        let point = state.feed.current();
        let stamped = repo.stamp_rider_position(&id, point.lat, point.lon).await?;
        return Ok(ok(stamped));
    }

    Ok(ok(order))
}
