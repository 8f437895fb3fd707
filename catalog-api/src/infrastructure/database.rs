use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;

use crate::config::AppConfig;
use crate::error::AppError;

const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id INT AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        description TEXT,
        price DECIMAL(10,2) NOT NULL,
        image_url TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    ) ENGINE=INNODB
"#;

pub async fn init_mysql(config: &AppConfig) -> Result<MySqlPool, AppError> {
    let db = &config.database;
    tracing::info!(host = %db.host, port = db.port, database = %db.name, "Initializing MySQL connection pool");

    let options = MySqlConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name);

    let pool = MySqlPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    tracing::info!("Database connection pool initialized");

    Ok(pool)
}

/// Creates the `products` table when it is missing.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), AppError> {
    sqlx::query(CREATE_PRODUCTS_TABLE).execute(pool).await?;
    tracing::info!("Products table ready");
    Ok(())
}
