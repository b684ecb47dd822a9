//! データベースアクセス層
//!
//! SQLiteデータベースへの接続とマイグレーション

pub mod requests;

use scraper_common::error::{ScraperError, ScraperResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// データベース接続プールを作成（ファイルが無ければ作成し、マイグレーションを実行）
pub async fn create_pool(database_url: &str) -> ScraperResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ScraperError::Database(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| ScraperError::Database(e.to_string()))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// マイグレーション実行
pub async fn run_migrations(pool: &SqlitePool) -> ScraperResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ScraperError::Database(format!("Migration failed: {}", e)))
}
