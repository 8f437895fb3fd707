use std::sync::Arc;

use anyhow::Context;
use catalog_api::{
    config::AppConfig,
    domain::services::product_service::ProductService,
    infrastructure::{
        database::{ensure_schema, init_mysql},
        repository::MySqlProductRepository,
        storage::build_image_store,
    },
    logging::init_logging,
    server::{create_app, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let config = AppConfig::load().context("Failed to load configuration")?;
    // 初始化日志
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting catalog service");

    // 初始化数据库连接, 建表失败时不启动服务
    let db_pool = init_mysql(&config).await.context("Failed to connect to MySQL")?;
    ensure_schema(&db_pool)
        .await
        .context("Failed to create products table")?;

    // 初始化图片存储
    let images = build_image_store(&config.storage)
        .await
        .context("Failed to initialize image storage")?;

    let products = ProductService::new(
        Arc::new(MySqlProductRepository::new(db_pool)),
        images,
        config.public_origin(),
    )
    .with_cleanup_on_failure(config.storage.cleanup_on_failure);

    // 创建应用状态
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(AppState {
        config: Arc::new(config),
        products: Arc::new(products),
    });

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running on {}", &addr);

    axum::serve(listener, app).await?;
    Ok(())
}
