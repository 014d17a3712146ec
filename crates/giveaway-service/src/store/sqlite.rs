use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::GiveawayError;
use crate::state::Contest;
use crate::store::StoreBackend;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS contests (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Transactional backend: one row per contest, each stored as an opaque
/// JSON blob, replaced wholesale per mutation.
///
/// Persisting runs begin → delete-all → re-insert-all → commit, so the
/// engine's transaction guarantee provides the same all-or-nothing
/// property the file backend gets from its whole-file rename.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub async fn open(path: &Path) -> Result<Self, GiveawayError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    async fn load(&self) -> Result<Vec<Contest>, GiveawayError> {
        let rows = sqlx::query("SELECT id, data FROM contests ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        let mut contests = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.get("data");
            match serde_json::from_str(&data) {
                Ok(contest) => contests.push(contest),
                Err(err) => {
                    let id: String = row.get("id");
                    tracing::warn!(contest = %id, error = %err, "skipping malformed contest row");
                }
            }
        }
        Ok(contests)
    }

    async fn persist(&self, contests: &[Contest]) -> Result<(), GiveawayError> {
        let updated_at = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM contests").execute(&mut *tx).await?;
        for contest in contests {
            sqlx::query("INSERT INTO contests (id, data, updated_at) VALUES (?1, ?2, ?3)")
                .bind(&contest.id)
                .bind(serde_json::to_string(contest)?)
                .bind(&updated_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
