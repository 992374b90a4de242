//! 认证服务主入口

use bearer_auth::{
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    providers::{facebook::FacebookClient, twitter::TwitterClient},
    repository::UserRepository,
    routes, telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("bearer-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 生产环境应该直接设置环境变量
    if let Ok(env) = std::env::var("AUTH_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bearer-auth starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 装配用户存储、第三方客户端与认证分发器
    let store = Arc::new(UserRepository::new(db_pool));
    let facebook = Arc::new(FacebookClient::new(&config.facebook)?);
    let twitter = Arc::new(TwitterClient::new(&config.twitter)?);

    let app_state = Arc::new(AppState::new(&config, store, facebook, twitter)?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭：收到信号后最多再等待 graceful_shutdown_timeout_secs
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(timeout).await;
        } => {
            tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("bearer-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: bearer-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量 (前缀 AUTH_，层级分隔符 __):");
    println!("  AUTH_DATABASE__URL            PostgreSQL 连接串（必填）");
    println!("  AUTH_AUTH__TOKEN_SECRET       令牌签名密钥（至少 32 字符）");
    println!("  AUTH_AUTH__TOKEN_TTL_SECS     令牌有效期（秒），不设置则永不过期");
    println!("  AUTH_FACEBOOK__APP_SECRET     Facebook 应用密钥");
    println!("  AUTH_TWITTER__CONSUMER_KEY    Twitter consumer key");
    println!("  AUTH_TWITTER__CONSUMER_SECRET Twitter consumer secret");
}
