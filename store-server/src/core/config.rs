use std::path::PathBuf;

use crate::email::EmailConfig;

/// 服务器配置 - 店面后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | PUBLIC_BASE_URL | http://localhost:{port} | 验证链接的外部地址 |
/// | EMAIL_ENABLED | false | 是否通过 SMTP 真实发信 |
/// | SMTP_HOST / SMTP_PORT | localhost / 1025 | SMTP 服务器 |
/// | SMTP_USERNAME / SMTP_PASSWORD | (空) | SMTP 凭证，两者全空走明文直连 |
/// | SMTP_FROM / SMTP_FROM_NAME | no-reply@store.local / Store | 发件人 |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | (未设置) | 引导管理员账号 |
/// | ADMIN_NAME | Administrator | 引导管理员显示名 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志和上传文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 对外可达的基础地址，用于拼接邮件里的验证链接
    pub public_base_url: String,

    // === 邮件投递 ===
    /// SMTP 连接参数
    pub email: EmailConfig,
    /// 关闭时邮件只写入运行日志，不做网络投递
    pub email_enabled: bool,

    // === 引导管理员 ===
    /// 首个管理员邮箱 (仅在库中无管理员时使用)
    pub admin_email: Option<String>,
    /// 首个管理员密码
    pub admin_password: Option<String>,
    /// 首个管理员显示名
    pub admin_name: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", http_port)),

            email: email_from_env(),
            email_enabled: std::env::var("EMAIL_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),

            admin_email: std::env::var("ADMIN_EMAIL").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
            admin_name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.public_base_url = format!("http://localhost:{}", http_port);
        config
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 配送凭证照片目录 (work_dir/uploads/proofs)
    pub fn proofs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads").join("proofs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.proofs_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn email_from_env() -> EmailConfig {
    let defaults = EmailConfig::default();
    EmailConfig {
        smtp_host: std::env::var("SMTP_HOST").unwrap_or(defaults.smtp_host),
        smtp_port: std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.smtp_port),
        smtp_username: std::env::var("SMTP_USERNAME").unwrap_or(defaults.smtp_username),
        smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or(defaults.smtp_password),
        from_email: std::env::var("SMTP_FROM").unwrap_or(defaults.from_email),
        from_name: std::env::var("SMTP_FROM_NAME").unwrap_or(defaults.from_name),
    }
}
