//! 订单全流程集成测试
//!
//! 覆盖下单事务（库存扣减、总价核对）、配送状态机和订单跟踪。
//! 账号直接写库并签发 JWT，跳过邮箱验证流程（auth_flow 已覆盖）。

use std::io::Cursor;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use store_server::build_router;
use store_server::core::{Config, ServerState};
use store_server::db::DbService;
use store_server::db::models::{Brand, ProductCreate, UserCreate, UserRole};
use store_server::db::repository::{ProductRepository, Repository, UserRepository};
use store_server::email::MemoryMailer;
use store_server::tracking::GeoPoint;

const MULTIPART_BOUNDARY: &str = "proof-test-boundary";

struct TestApp {
    app: Router,
    state: ServerState,
    _work_dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let work_dir = tempfile::tempdir().expect("failed to create temp work dir");
    let config = Config::with_overrides(work_dir.path().to_string_lossy().to_string(), 0);
    let db = DbService::new_memory().await.expect("in-memory database");
    let state = ServerState::with_components(&config, db, Arc::new(MemoryMailer::new()));

    TestApp {
        app: build_router(state.clone()),
        state,
        _work_dir: work_dir,
    }
}

/// 直接写库创建已验证账号并签发令牌
async fn seed_user(state: &ServerState, name: &str, email: &str, role: UserRole) -> String {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .create(
            UserCreate {
                name: name.to_string(),
                email: email.to_string(),
                password: "password123".to_string(),
                role: Some(role),
            },
            None,
        )
        .await
        .expect("seed user");

    let id = user.id.clone().expect("user id").to_string();
    state
        .jwt_service
        .generate_token(&id, &user.name, &user.email, user.role)
        .expect("mint token")
}

async fn seed_product(state: &ServerState, name: &str, price: f64, stock: i32) -> String {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .create(ProductCreate {
            name: name.to_string(),
            brand: Brand::Rolex,
            price,
            stock: Some(stock),
            description: None,
            image: None,
        })
        .await
        .expect("seed product");
    product.id.expect("product id").to_string()
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn checkout_payload(items: Value, total: f64) -> Value {
    json!({
        "name": "Juan Dela Cruz",
        "address": "123 Rizal Ave, Manila",
        "contact": "+63 912 345 6789",
        "items": items,
        "total_amount": total
    })
}

async fn place_order(app: &Router, token: &str, items: Value, total: f64) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/orders",
            token,
            checkout_payload(items, total),
        ))
        .await
        .expect("place order call")
}

async fn product_stock(app: &Router, product_id: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/products/{}", product_id)))
        .await
        .expect("product call");
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["stock"]
        .as_i64()
        .expect("stock")
}

/// 4x4 纯色 PNG 样本
fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode sample image");
    cursor.into_inner()
}

fn multipart_body(field_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"proof.png\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

fn proof_request(order_id: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/orders/{}/deliver-proof", order_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn checkout_decrements_stock_and_reprices_server_side() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;

    let daytona = seed_product(&t.state, "Daytona", 19999.99, 5).await;
    let nautilus = seed_product(&t.state, "Nautilus", 45000.50, 3).await;

    let response = place_order(
        &t.app,
        &client,
        json!([
            { "product": daytona, "quantity": 2 },
            { "product": nautilus, "quantity": 1 }
        ]),
        85000.48,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("PENDING"));
    assert_eq!(body["data"]["total_amount"], json!(85000.48));
    assert_eq!(body["data"]["payment_method"], json!("Cash on Delivery"));
    assert_eq!(body["data"]["items"].as_array().expect("items").len(), 2);
    // 行项目是目录价快照
    assert_eq!(body["data"]["items"][0]["price"], json!(19999.99));
    assert_eq!(body["data"]["items"][0]["name"], json!("Daytona"));

    assert_eq!(product_stock(&t.app, &daytona).await, 3);
    assert_eq!(product_stock(&t.app, &nautilus).await, 2);
}

#[tokio::test]
async fn checkout_rejects_mismatched_total_without_touching_stock() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let product = seed_product(&t.state, "Submariner", 12500.00, 4).await;

    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 2 }]),
        1.00,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E0002"));

    assert_eq!(product_stock(&t.app, &product).await, 4);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_order() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;

    let plenty = seed_product(&t.state, "Tank", 9800.00, 10).await;
    let scarce = seed_product(&t.state, "Royal Oak", 52000.00, 1).await;

    let response = place_order(
        &t.app,
        &client,
        json!([
            { "product": plenty, "quantity": 1 },
            { "product": scarce, "quantity": 3 }
        ]),
        9800.00 + 156000.00,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E0005"));

    // 事务整体回滚：第一件的扣减也不能留下
    assert_eq!(product_stock(&t.app, &plenty).await, 10);
    assert_eq!(product_stock(&t.app, &scarce).await, 1);
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let t = spawn_app().await;
    let product = seed_product(&t.state, "Santos", 7000.00, 2).await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    checkout_payload(json!([{ "product": product, "quantity": 1 }]), 7000.00)
                        .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("place order call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(product_stock(&t.app, &product).await, 2);
}

#[tokio::test]
async fn delivery_lifecycle_with_proof_photo() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let rider = seed_user(&t.state, "Rider", "rider@example.com", UserRole::Rider).await;

    let product = seed_product(&t.state, "Calatrava", 31000.00, 2).await;
    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 1 }]),
        31000.00,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    // 未出发就交凭证：状态机拒绝
    let response = t
        .app
        .clone()
        .oneshot(proof_request(&order_id, &rider, multipart_body("proof", &sample_png())))
        .await
        .expect("proof call");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // 客户无权发起配送
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &client,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 骑手出发
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &rider,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], json!("DELIVERING"));

    // 重复点击幂等
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &rider,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], json!("DELIVERING"));

    // 交凭证完成配送
    let response = t
        .app
        .clone()
        .oneshot(proof_request(&order_id, &rider, multipart_body("proof", &sample_png())))
        .await
        .expect("proof call");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("DELIVERED"));

    let proof_path = body["data"]["proof_image"].as_str().expect("proof path");
    assert!(proof_path.starts_with("/uploads/proofs/"));
    assert!(proof_path.ends_with(".jpg"));

    // 凭证重编码为 JPEG 落盘，且能从静态路径取回
    let filename = proof_path.rsplit('/').next().expect("filename");
    let stored = std::fs::read(t.state.config.proofs_dir().join(filename)).expect("stored proof");
    assert_eq!(&stored[..2], &[0xFF, 0xD8]);

    let response = t
        .app
        .clone()
        .oneshot(get_request(proof_path))
        .await
        .expect("static fetch");
    assert_eq!(response.status(), StatusCode::OK);

    // 已送达后一切转换关闭
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &rider,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = t
        .app
        .clone()
        .oneshot(proof_request(&order_id, &rider, multipart_body("proof", &sample_png())))
        .await
        .expect("proof call");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn proof_upload_rejects_non_image_and_wrong_field() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let rider = seed_user(&t.state, "Rider", "rider@example.com", UserRole::Rider).await;

    let product = seed_product(&t.state, "Speedmaster", 5200.00, 1).await;
    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 1 }]),
        5200.00,
    )
    .await;
    let order_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &rider,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::OK);

    // 字段名不对：当作缺文件处理
    let response = t
        .app
        .clone()
        .oneshot(proof_request(&order_id, &rider, multipart_body("photo", &sample_png())))
        .await
        .expect("proof call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 不是图片的字节流
    let response = t
        .app
        .clone()
        .oneshot(proof_request(
            &order_id,
            &rider,
            multipart_body("proof", b"definitely not an image"),
        ))
        .await
        .expect("proof call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 订单保持可继续的配送中状态
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/orders/{}", order_id),
            &rider,
        ))
        .await
        .expect("get call");
    assert_eq!(body_json(response).await["data"]["status"], json!("DELIVERING"));
}

#[tokio::test]
async fn concurrent_start_delivery_converges() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let rider_a = seed_user(&t.state, "Rider A", "rider.a@example.com", UserRole::Rider).await;
    let rider_b = seed_user(&t.state, "Rider B", "rider.b@example.com", UserRole::Rider).await;

    let product = seed_product(&t.state, "Overseas", 24000.00, 1).await;
    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 1 }]),
        24000.00,
    )
    .await;
    let order_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    let uri = format!("/api/orders/{}/deliver", order_id);
    let (first, second) = tokio::join!(
        t.app.clone().oneshot(authed_request("PATCH", &uri, &rider_a)),
        t.app.clone().oneshot(authed_request("PATCH", &uri, &rider_b)),
    );

    // 两个骑手抢同一单：双方都拿到 200，状态收敛为配送中
    assert_eq!(first.expect("first call").status(), StatusCode::OK);
    assert_eq!(second.expect("second call").status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", &format!("/api/orders/{}", order_id), &rider_a))
        .await
        .expect("get call");
    assert_eq!(body_json(response).await["data"]["status"], json!("DELIVERING"));
}

#[tokio::test]
async fn tracking_stamps_rider_position_only_while_delivering() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let rider = seed_user(&t.state, "Rider", "rider@example.com", UserRole::Rider).await;

    let product = seed_product(&t.state, "Reverso", 11000.00, 1).await;
    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 1 }]),
        11000.00,
    )
    .await;
    let order_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    t.state.feed.publish(GeoPoint { lat: 14.0, lon: 121.0 });

    // 待配送订单不盖骑手位置
    let track_uri = format!("/api/orders/track-order/{}", order_id);
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", &track_uri, &client))
        .await
        .expect("track call");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("PENDING"));
    assert!(body["data"].get("rider_latitude").is_none());

    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "PATCH",
            &format!("/api/orders/{}/deliver", order_id),
            &rider,
        ))
        .await
        .expect("deliver call");
    assert_eq!(response.status(), StatusCode::OK);

    // 配送中：跟踪响应带上最新位置
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", &track_uri, &client))
        .await
        .expect("track call");
    let body = body_json(response).await;
    assert_eq!(body["data"]["rider_latitude"], json!(14.0));
    assert_eq!(body["data"]["rider_longitude"], json!(121.0));

    // 位置更新后再查，返回新值
    t.state.feed.publish(GeoPoint { lat: 14.55, lon: 121.02 });
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", &track_uri, &client))
        .await
        .expect("track call");
    let body = body_json(response).await;
    assert_eq!(body["data"]["rider_latitude"], json!(14.55));
    assert_eq!(body["data"]["rider_longitude"], json!(121.02));
}

#[tokio::test]
async fn rider_location_endpoint_reports_current_feed() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;

    t.state.feed.publish(GeoPoint { lat: 14.5995, lon: 120.9842 });

    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", "/api/rider/location", &client))
        .await
        .expect("location call");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["lat"], json!(14.5995));
    assert_eq!(body["data"]["lon"], json!(120.9842));

    // 端点读的是共享槽的实时值，不是快照
    t.state.feed.publish(GeoPoint { lat: 14.7, lon: 121.1 });
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", "/api/rider/location", &client))
        .await
        .expect("location call");
    let body = body_json(response).await;
    assert_eq!(body["data"]["lat"], json!(14.7));
    assert_eq!(body["data"]["lon"], json!(121.1));
}

#[tokio::test]
async fn order_listing_and_deletion_are_role_gated() {
    let t = spawn_app().await;
    let client = seed_user(&t.state, "Client", "client@example.com", UserRole::Client).await;
    let rider = seed_user(&t.state, "Rider", "rider@example.com", UserRole::Rider).await;
    let admin = seed_user(&t.state, "Admin", "admin@example.com", UserRole::Admin).await;

    let product = seed_product(&t.state, "Portugieser", 8300.00, 2).await;
    let response = place_order(
        &t.app,
        &client,
        json!([{ "product": product, "quantity": 1 }]),
        8300.00,
    )
    .await;
    let order_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    // 客户不能翻订单列表
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", "/api/orders", &client))
        .await
        .expect("list call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 骑手可以看到待配送队列
    let response = t
        .app
        .clone()
        .oneshot(authed_request("GET", "/api/orders", &rider))
        .await
        .expect("list call");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().expect("orders").len(), 1);

    // 删除是管理员专属
    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/orders/{}", order_id),
            &rider,
        ))
        .await
        .expect("delete call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/orders/{}", order_id),
            &admin,
        ))
        .await
        .expect("delete call");
    assert_eq!(response.status(), StatusCode::OK);

    // 删除不回补库存
    assert_eq!(product_stock(&t.app, &product).await, 1);

    let response = t
        .app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/orders/{}", order_id),
            &admin,
        ))
        .await
        .expect("get call");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
