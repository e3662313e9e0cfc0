//! 认证全流程集成测试
//!
//! 直接对 `build_router` 的结果做 oneshot 调用，不监听端口。
//! 邮件经 `MemoryMailer` 捕获，从信体里取验证链接和一次性验证码。

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
use store_server::email::MemoryMailer;

struct TestApp {
    app: Router,
    mailer: Arc<MemoryMailer>,
    _work_dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let work_dir = tempfile::tempdir().expect("failed to create temp work dir");
    let config = Config::with_overrides(work_dir.path().to_string_lossy().to_string(), 0);
    let db = DbService::new_memory().await.expect("in-memory database");
    let mailer = Arc::new(MemoryMailer::new());
    let state = ServerState::with_components(&config, db, mailer.clone());

    TestApp {
        app: build_router(state),
        mailer,
        _work_dir: work_dir,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// 最后一封捕获邮件的正文
fn last_mail_html(mailer: &MemoryMailer) -> String {
    mailer.messages().last().expect("no mail captured").html.clone()
}

/// 从验证邮件里取 token 参数
fn extract_token(html: &str) -> String {
    let start = html.find("token=").expect("no token in email") + "token=".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// 从 OTP 邮件里取 6 位验证码
fn extract_otp(html: &str) -> String {
    let start = html.find("<h1>").expect("no code in email") + 4;
    let end = html[start..].find("</h1>").expect("unterminated code") + start;
    html[start..end].trim().to_string()
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": name, "email": email, "password": password }),
        ))
        .await
        .expect("register call")
}

/// 注册并点掉验证链接
async fn register_and_verify(app: &Router, mailer: &MemoryMailer, name: &str, email: &str, password: &str) {
    let response = register(app, name, email, password).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let token = extract_token(&last_mail_html(mailer));
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/auth/verify-email?token={}", token)))
        .await
        .expect("verify call");
    assert_eq!(response.status(), StatusCode::OK);
}

/// 完整两步登录，返回会话 token
async fn login(app: &Router, mailer: &MemoryMailer, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["requires_otp"], json!(true));

    let otp = extract_otp(&last_mail_html(mailer));
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-otp",
            json!({ "email": email, "otp": otp }),
        ))
        .await
        .expect("verify-otp call");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["data"]["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn register_verify_and_login_end_to_end() {
    let t = spawn_app().await;

    register_and_verify(&t.app, &t.mailer, "Alice", "alice@example.com", "password123").await;
    let token = login(&t.app, &t.mailer, "alice@example.com", "password123").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_get("/api/auth/me", &token))
        .await
        .expect("me call");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E0000"));
    assert_eq!(body["data"]["email"], json!("alice@example.com"));
    assert_eq!(body["data"]["role"], json!("client"));
    assert_eq!(body["data"]["is_verified"], json!(true));
}

#[tokio::test]
async fn client_login_redirects_to_client_page() {
    let t = spawn_app().await;

    register_and_verify(&t.app, &t.mailer, "Bob", "bob@example.com", "password123").await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "bob@example.com", "password": "password123" }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::OK);

    let otp = extract_otp(&last_mail_html(&t.mailer));
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-otp",
            json!({ "email": "bob@example.com", "otp": otp }),
        ))
        .await
        .expect("verify-otp call");
    let body = body_json(response).await;
    assert_eq!(body["data"]["redirect_url"], json!("/client"));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let t = spawn_app().await;

    let response = register(&t.app, "Carol", "carol@example.com", "password123").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = register(&t.app, "Carol Again", "carol@example.com", "password456").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E0004"));
}

#[tokio::test]
async fn registration_ignores_requested_role() {
    let t = spawn_app().await;

    // 公开注册接口即使带上 role 字段也只产出普通客户账号
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "password123",
                "role": "admin"
            }),
        ))
        .await
        .expect("register call");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], json!("client"));
}

#[tokio::test]
async fn login_blocked_until_email_verified() {
    let t = spawn_app().await;

    let response = register(&t.app, "Dana", "dana@example.com", "password123").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "dana@example.com", "password": "password123" }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E2002"));
}

#[tokio::test]
async fn verification_link_is_single_use() {
    let t = spawn_app().await;

    let response = register(&t.app, "Erin", "erin@example.com", "password123").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = extract_token(&last_mail_html(&t.mailer));

    let uri = format!("/api/auth/verify-email?token={}", token);
    let response = t.app.clone().oneshot(get_request(&uri)).await.expect("first verify");
    assert_eq!(response.status(), StatusCode::OK);

    let response = t.app.clone().oneshot(get_request(&uri)).await.expect("second verify");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_unknown_account_and_bad_password() {
    let t = spawn_app().await;

    register_and_verify(&t.app, &t.mailer, "Frank", "frank@example.com", "password123").await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": "password123" }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "frank@example.com", "password": "wrong-password" }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("E3004"));
}

#[tokio::test]
async fn wrong_otp_can_be_retried_but_success_consumes_it() {
    let t = spawn_app().await;

    register_and_verify(&t.app, &t.mailer, "Grace", "grace@example.com", "password123").await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "grace@example.com", "password": "password123" }),
        ))
        .await
        .expect("login call");
    assert_eq!(response.status(), StatusCode::OK);
    let otp = extract_otp(&last_mail_html(&t.mailer));

    // 码错：记录保留，可重试
    let wrong = if otp == "000000" { "000001" } else { "000000" };
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-otp",
            json!({ "email": "grace@example.com", "otp": wrong }),
        ))
        .await
        .expect("verify-otp call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 正确的码依然有效
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-otp",
            json!({ "email": "grace@example.com", "otp": otp }),
        ))
        .await
        .expect("verify-otp call");
    assert_eq!(response.status(), StatusCode::OK);

    // 成功即销毁，同一个码不能再换一个会话
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-otp",
            json!({ "email": "grace@example.com", "otp": otp }),
        ))
        .await
        .expect("verify-otp call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_reject_missing_token() {
    let t = spawn_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get_request("/api/auth/me"))
        .await
        .expect("me call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .app
        .clone()
        .oneshot(get_request("/api/orders"))
        .await
        .expect("orders call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn self_service_user_rules() {
    let t = spawn_app().await;

    register_and_verify(&t.app, &t.mailer, "Heidi", "heidi@example.com", "password123").await;
    let token = login(&t.app, &t.mailer, "heidi@example.com", "password123").await;

    // 普通用户不能列出所有账号
    let response = t
        .app
        .clone()
        .oneshot(authed_get("/api/users", &token))
        .await
        .expect("list call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 自己的记录可以看
    let me = body_json(
        t.app
            .clone()
            .oneshot(authed_get("/api/auth/me", &token))
            .await
            .expect("me call"),
    )
    .await;
    let my_id = me["data"]["id"].as_str().expect("id").to_string();

    let response = t
        .app
        .clone()
        .oneshot(authed_get(&format!("/api/users/{}", my_id), &token))
        .await
        .expect("get call");
    assert_eq!(response.status(), StatusCode::OK);

    // 名字可以自助改，角色不行
    let response = t
        .app
        .clone()
        .oneshot({
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{}", my_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "name": "Heidi Renamed" }).to_string()))
                .expect("request")
        })
        .await
        .expect("update call");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], json!("Heidi Renamed"));

    let response = t
        .app
        .clone()
        .oneshot({
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{}", my_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "role": "admin" }).to_string()))
                .expect("request")
        })
        .await
        .expect("update call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
