use async_trait::async_trait;
use thiserror::Error;
use crate::models::Match;

pub mod cosmos;
pub mod sqlite;

pub use cosmos::CosmosStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{0}' not found")]
    NotFound(String),

    /// The store answered with a failure status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable document: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Decode(e) | sqlx::Error::ColumnDecode { source: e, .. } => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Backend {
                status: 500,
                message: other.to_string(),
            },
        }
    }
}

/// Document store holding match records. The record id is also the
/// partition key, so point operations only need the id.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create(&self, record: &Match) -> Result<Match, StoreError>;

    /// All records, or those where either player contains `player`
    /// (case-insensitive), newest `fecha` first.
    async fn list(&self, player: Option<&str>) -> Result<Vec<Match>, StoreError>;

    async fn get(&self, id: &str) -> Result<Match, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Date descending, then creation time descending.
pub(crate) fn sort_newest_first(records: &mut [Match]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str, created_at: &str) -> Match {
        Match {
            id: id.into(),
            player1: "A".into(),
            player2: "B".into(),
            sets_player1: 2,
            sets_player2: 1,
            games: String::new(),
            date: date.into(),
            winner: "jugador1".into(),
            notes: String::new(),
            created_at: created_at.into(),
        }
    }

    #[test]
    fn newest_date_comes_first() {
        let mut records = vec![
            record("old", "2024-01-15", "2024-01-15T10:00:00"),
            record("new", "2025-03-02", "2025-03-02T10:00:00"),
            record("same-day-early", "2025-03-02", "2025-03-02T08:00:00"),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["new", "same-day-early", "old"]);
    }
}
