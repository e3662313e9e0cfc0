use store_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv 不覆盖已有变量)
    dotenv::dotenv().ok();

    // 2. 加载配置并准备工作目录 (日志初始化前需要 logs/)
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    // 3. 初始化日志 (生产环境落盘)
    let logs_dir = config.logs_dir();
    let log_dir = if config.is_production() {
        logs_dir.to_str()
    } else {
        None
    };
    init_logger_with_file(None, log_dir);

    // 打印横幅
    print_banner();

    tracing::info!("Store server starting...");

    // 4. 初始化服务器状态
    let state = ServerState::initialize(&config).await;

    // 5. 启动 HTTP 服务器 (含引导管理员和优雅停机)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
