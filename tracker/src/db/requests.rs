//! ユーザー別リクエスト数のストレージ層
//!
//! 1回の受信分は同じ時刻（Unix秒）で1トランザクションにまとめて追記する。

use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::protocol::UsersRequests;
use sqlx::SqlitePool;

/// リクエスト数ストレージ（SQLite版）
#[derive(Clone)]
pub struct RequestCountStorage {
    pool: SqlitePool,
}

impl RequestCountStorage {
    /// 新しいストレージインスタンスを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 集計バッチを `created_at` で追記する。空なら何もしない
    pub async fn append_batch(&self, batch: &UsersRequests, created_at: i64) -> ScraperResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ScraperError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (user_id, nreq) in batch {
            sqlx::query("INSERT INTO requests (user_id, created_at, nreq) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(created_at)
                .bind(nreq)
                .execute(&mut *tx)
                .await
                .map_err(|e| ScraperError::Database(format!("Failed to insert row: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| ScraperError::Database(format!("Failed to commit batch: {}", e)))?;

        tracing::debug!(users = batch.len(), created_at, "Appended request batch");
        Ok(())
    }

    /// 1ユーザーの `[from, to)` の合計
    pub async fn sum_one(&self, user_id: &str, from: i64, to: i64) -> ScraperResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(nreq), 0) FROM requests WHERE user_id = ? AND created_at >= ? AND created_at < ?",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ScraperError::Database(format!("Failed to sum user requests: {}", e)))
    }

    /// 全ユーザーの `[from, to)` の合計
    pub async fn sum_all(&self, from: i64, to: i64) -> ScraperResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(nreq), 0) FROM requests WHERE created_at >= ? AND created_at < ?",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ScraperError::Database(format!("Failed to sum requests: {}", e)))
    }
}
