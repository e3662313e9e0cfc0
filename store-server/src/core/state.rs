use std::path::PathBuf;
use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditService, AuditWorker};
use crate::auth::{JwtConfig, JwtService, OtpStore};
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::{UserCreate, UserRole};
use crate::db::repository::UserRepository;
use crate::email::{LogMailer, Mailer, SmtpMailer};
use crate::tracking::RiderFeed;

/// 审计通道容量
///
/// 写满说明 worker 落后于管理操作的速率，多出的条目丢弃并记入运行日志。
const AUDIT_BUFFER_SIZE: usize = 256;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | otp | Arc<OtpStore> | 待验证一次性验证码 |
/// | mailer | Arc<dyn Mailer> | 邮件投递 |
/// | audit | Arc<AuditService> | 审计日志入队 |
/// | feed | RiderFeed | 骑手位置共享槽 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 一次性验证码存储
    pub otp: Arc<OtpStore>,
    /// 邮件投递通道
    pub mailer: Arc<dyn Mailer>,
    /// 审计日志服务
    pub audit: Arc<AuditService>,
    /// 骑手位置
    pub feed: RiderFeed,
    /// 后台任务的协作停机信号
    pub shutdown: CancellationToken,
    /// 审计 worker 句柄，停机时等待其清空队列
    audit_worker: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (database/, logs/, uploads/proofs/)
    /// 2. 数据库 (work_dir/database/store.db, RocksDB 引擎)
    /// 3. 邮件通道 (EMAIL_ENABLED 决定 SMTP 或日志)
    /// 4. 共享组件 (JWT, OTP, 审计, 位置)
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("store.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        let mailer: Arc<dyn Mailer> = if config.email_enabled {
            Arc::new(SmtpMailer::new(config.email.clone()))
        } else {
            tracing::info!("EMAIL_ENABLED is off, outbound mail goes to the server log");
            Arc::new(LogMailer)
        };

        Self::with_components(config, db_service, mailer)
    }

    /// 从既有组件组装状态
    ///
    /// 生产路径由 [`initialize`](Self::initialize) 调用；测试用它注入
    /// 内存数据库和可检查的 mailer。审计 worker 随状态一起启动。
    pub fn with_components(config: &Config, db_service: DbService, mailer: Arc<dyn Mailer>) -> Self {
        let work_dir = PathBuf::from(&config.work_dir);
        let jwt_config =
            JwtConfig::load_or_generate(&work_dir).expect("Failed to load or generate JWT secret");
        let jwt_service = Arc::new(JwtService::with_config(jwt_config));

        let db = db_service.db;
        let (audit, audit_rx) = AuditService::new(db.clone(), AUDIT_BUFFER_SIZE);
        let shutdown = CancellationToken::new();

        let worker = AuditWorker::new(audit.storage().clone(), shutdown.clone());
        let handle = tokio::spawn(worker.run(audit_rx));

        Self {
            config: config.clone(),
            db,
            jwt_service,
            otp: Arc::new(OtpStore::new()),
            mailer,
            audit,
            feed: RiderFeed::default(),
            shutdown,
            audit_worker: Arc::new(tokio::sync::Mutex::new(Some(handle))),
        }
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 确保存在管理员账号
    ///
    /// 库中没有任何管理员时，用 `ADMIN_EMAIL`/`ADMIN_PASSWORD` 创建一个
    /// 预验证账号；环境变量缺失则只告警，不阻塞启动。
    pub async fn ensure_admin_account(&self) {
        let repo = UserRepository::new(self.get_db());

        match repo.admin_exists().await {
            Ok(true) => {}
            Ok(false) => {
                let (Some(email), Some(password)) =
                    (self.config.admin_email.clone(), self.config.admin_password.clone())
                else {
                    tracing::warn!(
                        "No admin account exists and ADMIN_EMAIL/ADMIN_PASSWORD are not set"
                    );
                    return;
                };

                let data = UserCreate {
                    name: self.config.admin_name.clone(),
                    email,
                    password,
                    role: Some(UserRole::Admin),
                };

                match repo.create(data, None).await {
                    Ok(admin) => {
                        tracing::info!(email = %admin.email, "Bootstrap admin account created");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create bootstrap admin account");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check for existing admin account");
            }
        }
    }

    /// 停止后台任务并等待审计队列清空
    pub async fn finish_background_tasks(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.audit_worker.lock().await.take() {
            let _ = handle.await;
        }
    }
}
