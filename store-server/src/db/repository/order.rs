//! Order Repository
//!
//! Order creation runs inside a single SurrealDB transaction so stock
//! decrements and the order record commit or roll back together.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{DEFAULT_PAYMENT_METHOD, Order, OrderCreate, OrderItem, OrderStatus};
use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::RecordId;
use uuid::Uuid;

const ORDER_TABLE: &str = "order";

/// Map transaction THROW messages back to typed repository errors
fn map_transaction_error(err: surrealdb::Error) -> RepoError {
    let msg = err.to_string();
    if let Some(pos) = msg.find("Insufficient stock") {
        return RepoError::InsufficientStock(msg[pos..].to_string());
    }
    if let Some(pos) = msg.find("Product not found") {
        return RepoError::NotFound(msg[pos..].to_string());
    }
    RepoError::Database(msg)
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all orders, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// 下单事务
    ///
    /// 1. 校验每个商品存在且库存充足
    /// 2. 扣减库存（事务内条件判断，THROW 即整体回滚）
    /// 3. 创建订单记录
    ///
    /// `items` 与 `total_amount` 由调用方基于当前商品快照计算。
    pub async fn place_order(
        &self,
        data: OrderCreate,
        items: Vec<OrderItem>,
        total_amount: f64,
    ) -> RepoResult<Order> {
        if items.is_empty() {
            return Err(RepoError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }

        let order_id = RecordId::from_table_key(ORDER_TABLE, Uuid::new_v4().simple().to_string());

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for i in 0..items.len() {
            sql.push_str(&format!(
                "IF (SELECT VALUE stock FROM ONLY $product_{i}) = NONE {{ THROW 'Product not found: ' + <string>$product_{i} }};\n"
            ));
            sql.push_str(&format!(
                "IF (SELECT VALUE stock FROM ONLY $product_{i}) < $qty_{i} {{ THROW 'Insufficient stock for ' + $label_{i} }};\n"
            ));
            sql.push_str(&format!("UPDATE $product_{i} SET stock -= $qty_{i};\n"));
        }
        sql.push_str(
            "CREATE $order_id SET \
                name = $name, \
                address = $address, \
                contact = $contact, \
                payment_method = $payment_method, \
                latitude = $latitude, \
                longitude = $longitude, \
                items = $items, \
                total_amount = $total_amount, \
                status = $status, \
                created_at = $created_at;\n",
        );
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = self
            .base
            .db()
            .query(&sql)
            .bind(("order_id", order_id.clone()));

        for (i, item) in items.iter().enumerate() {
            query = query
                .bind((format!("product_{i}"), item.product.clone()))
                .bind((format!("qty_{i}"), item.quantity))
                .bind((format!("label_{i}"), item.name.clone()));
        }

        let payment_method = data
            .payment_method
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        query = query
            .bind(("name", data.name))
            .bind(("address", data.address))
            .bind(("contact", data.contact))
            .bind(("payment_method", payment_method))
            .bind(("latitude", data.latitude))
            .bind(("longitude", data.longitude))
            .bind(("items", items))
            .bind(("total_amount", total_amount))
            .bind(("status", OrderStatus::Pending))
            .bind(("created_at", Utc::now()));

        let response = query.await?;
        response.check().map_err(map_transaction_error)?;

        self.find_by_id(&order_id.to_string())
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Move an order out for delivery
    ///
    /// Repeating the call on an order already out for delivery is a no-op
    /// success, so two riders racing the same button both get 200.
    pub async fn start_delivery(&self, id: &str) -> RepoResult<Order> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        match existing.status {
            OrderStatus::Delivering => Ok(existing),
            OrderStatus::Delivered => Err(RepoError::InvalidTransition(format!(
                "Cannot move order from {} to {}",
                OrderStatus::Delivered,
                OrderStatus::Delivering
            ))),
            OrderStatus::Pending => {
                // Guarded update: only wins if the order is still pending
                let mut result = self
                    .base
                    .db()
                    .query("UPDATE $thing SET status = $to WHERE status = $from RETURN AFTER")
                    .bind(("thing", thing))
                    .bind(("from", OrderStatus::Pending))
                    .bind(("to", OrderStatus::Delivering))
                    .await?;

                let updated: Vec<Order> = result.take(0)?;
                match updated.into_iter().next() {
                    Some(order) => Ok(order),
                    None => {
                        // Lost the race; accept if someone else already started delivery
                        let now = self
                            .find_by_id(id)
                            .await?
                            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;
                        if now.status == OrderStatus::Delivering {
                            Ok(now)
                        } else {
                            Err(RepoError::InvalidTransition(format!(
                                "Cannot move order from {} to {}",
                                now.status,
                                OrderStatus::Delivering
                            )))
                        }
                    }
                }
            }
        }
    }

    /// Complete delivery with a proof image
    ///
    /// Only valid while the order is out for delivery.
    pub async fn complete_delivery(&self, id: &str, proof_image: String) -> RepoResult<Order> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        if existing.status != OrderStatus::Delivering {
            return Err(RepoError::InvalidTransition(format!(
                "Cannot complete delivery for order in {} status",
                existing.status
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    status = $to,
                    proof_image = $proof_image
                WHERE status = $from
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("from", OrderStatus::Delivering))
            .bind(("to", OrderStatus::Delivered))
            .bind(("proof_image", proof_image))
            .await?;

        let updated: Vec<Order> = result.take(0)?;
        updated.into_iter().next().ok_or_else(|| {
            RepoError::InvalidTransition("Order is no longer out for delivery".to_string())
        })
    }

    /// Record the rider's last known position on an order
    pub async fn stamp_rider_position(
        &self,
        id: &str,
        latitude: f64,
        longitude: f64,
    ) -> RepoResult<Order> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    rider_latitude = $latitude,
                    rider_longitude = $longitude
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("latitude", latitude))
            .bind(("longitude", longitude))
            .await?;

        result
            .take::<Option<Order>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Hard delete an order, stock stays as-is
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;

        let deleted: Option<Order> = self.base.db().delete(thing).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Order {} not found", id)));
        }
        Ok(true)
    }
}
