use std::path::Path;
use std::sync::Mutex;

use log::info;
use rusqlite::{params, Connection};

use crate::errors::StoreError;
use crate::models::LeaderboardEntry;

pub const LEADERBOARD_SIZE: usize = 20;

/// Append-only score storage. Rows are never updated or deleted.
pub trait LeaderboardStore: Send + Sync {
    fn insert(&self, name: &str, score: u32, date: &str) -> Result<(), StoreError>;

    fn top(&self, date: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

pub struct SqliteLeaderboard {
    conn: Mutex<Connection>,
}

impl SqliteLeaderboard {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening leaderboard at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_scores (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT NOT NULL,
                score INTEGER NOT NULL,
                date  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS daily_scores_date_score
                ON daily_scores (date, score DESC);",
        )?;
        Ok(SqliteLeaderboard {
            conn: Mutex::new(conn),
        })
    }
}

impl LeaderboardStore for SqliteLeaderboard {
    fn insert(&self, name: &str, score: u32, date: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO daily_scores (name, score, date) VALUES (?1, ?2, ?3)",
            params![name, score, date],
        )?;
        Ok(())
    }

    fn top(&self, date: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT name, score FROM daily_scores
             WHERE date = ?1
             ORDER BY score DESC, id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![date, limit as i64], |row| {
            Ok(LeaderboardEntry {
                name: row.get(0)?,
                score: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_filters_by_date_and_orders_by_score() {
        let store = SqliteLeaderboard::open_in_memory().unwrap();
        store.insert("ann", 12, "2025-05-01").unwrap();
        store.insert("bob", 30, "2025-05-01").unwrap();
        store.insert("cid", 99, "2025-04-30").unwrap();
        store.insert("dee", 12, "2025-05-01").unwrap();

        let top = store.top("2025-05-01", LEADERBOARD_SIZE).unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "ann", "dee"]);
        assert_eq!(top[0].score, 30);
    }

    #[test]
    fn test_top_is_capped() {
        let store = SqliteLeaderboard::open_in_memory().unwrap();
        for i in 0..30 {
            store.insert(&format!("p{}", i), i, "2025-05-01").unwrap();
        }

        let top = store.top("2025-05-01", LEADERBOARD_SIZE).unwrap();
        assert_eq!(top.len(), LEADERBOARD_SIZE);
        assert_eq!(top[0].score, 29);
        assert_eq!(top[LEADERBOARD_SIZE - 1].score, 10);
    }

    #[test]
    fn test_empty_day() {
        let store = SqliteLeaderboard::open_in_memory().unwrap();
        assert!(store.top("2025-05-01", LEADERBOARD_SIZE).unwrap().is_empty());
    }
}
