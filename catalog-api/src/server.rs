use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::{health, products};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::services::product_service::ProductService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: Arc<ProductService>,
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();
    let app_state = Arc::new(state);

    // API 路由
    let api_routes = Router::new()
        .merge(products::routes())
        .merge(health::routes())
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes));

    let mut app = Router::new().nest("/api", api_routes);

    // 本地存储的图片直接由上传目录提供
    if config.storage.backend == StorageBackend::Local {
        app = app.nest_service(
            config.storage.local.serve_prefix.trim_end_matches('/'),
            ServeDir::new(&config.storage.local.upload_dir),
        );
    }

    // 组合所有中间件
    app.layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}
