//! 主应用程序入口
//!
//! 组装各层并启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    MessagingService, MessagingServiceDependencies, NotificationService,
    NotificationServiceDependencies, PresenceRegistry, RealtimeHub, SystemClock,
};
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取配置，缺省值面向本地开发；生产部署通过环境变量覆盖
    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    // 建连并跑迁移
    let infrastructure = Infrastructure::connect(InfrastructureConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
    })
    .await?;
    let storage = infrastructure.storage;

    // 实时中枢：注册表在进程内，下线时把最后在线时间写回档案
    let clock = Arc::new(SystemClock::default());
    let registry = Arc::new(PresenceRegistry::new());
    let hub = Arc::new(RealtimeHub::new(
        registry,
        storage.profile_repository.clone(),
        clock.clone(),
    ));

    // 创建应用层服务
    let messaging_service = MessagingService::new(MessagingServiceDependencies {
        message_repository: storage.message_repository.clone(),
        conversation_repository: storage.conversation_repository.clone(),
        clock: clock.clone(),
        hub: hub.clone(),
    });

    let notification_service = NotificationService::new(NotificationServiceDependencies {
        notification_repository: storage.notification_repository.clone(),
        profile_repository: storage.profile_repository.clone(),
        clock,
        hub: hub.clone(),
    });

    // 创建 JWT 服务
    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    // 创建应用状态
    let state = AppState::new(
        Arc::new(messaging_service),
        Arc::new(notification_service),
        hub,
        jwt_service,
    );

    // 启动 Web 服务器
    let app = router(state);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("CareerHub 实时服务启动在 http://{}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("服务已退出");
    Ok(())
}

/// 等待 ctrl-c，触发 axum 的优雅关闭。
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "监听退出信号失败");
        return;
    }
    tracing::info!("收到退出信号，开始优雅关闭");
}
