use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{MatchStore, StoreError};
use crate::models::Match;

/// Local document table: one row per match, same semantics as the
/// Cosmos container.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. A single connection that never expires,
    /// since every new connection would open an empty database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS matches (
                   id TEXT PRIMARY KEY NOT NULL,
                   player1 TEXT NOT NULL,
                   player2 TEXT NOT NULL,
                   sets_player1 INTEGER NOT NULL,
                   sets_player2 INTEGER NOT NULL,
                   games TEXT NOT NULL DEFAULT '',
                   date TEXT NOT NULL,
                   winner TEXT NOT NULL,
                   notes TEXT NOT NULL DEFAULT '',
                   created_at TEXT NOT NULL
               )"#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MatchStore for SqliteStore {
    async fn create(&self, record: &Match) -> Result<Match, StoreError> {
        sqlx::query(
            r#"INSERT INTO matches
               (id, player1, player2, sets_player1, sets_player2, games, date, winner, notes, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(&record.player1)
        .bind(&record.player2)
        .bind(record.sets_player1)
        .bind(record.sets_player2)
        .bind(&record.games)
        .bind(&record.date)
        .bind(&record.winner)
        .bind(&record.notes)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }

    async fn list(&self, player: Option<&str>) -> Result<Vec<Match>, StoreError> {
        let records = match player {
            Some(player) => {
                sqlx::query_as::<_, Match>(
                    r#"SELECT * FROM matches
                       WHERE instr(lower(player1), lower(?)) > 0
                          OR instr(lower(player2), lower(?)) > 0
                       ORDER BY date DESC, created_at DESC"#,
                )
                .bind(player)
                .bind(player)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Match>(
                    r#"SELECT * FROM matches ORDER BY date DESC, created_at DESC"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Match, StoreError> {
        sqlx::query_as::<_, Match>(r#"SELECT * FROM matches WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM matches WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
