//! SQLite-backed session snapshot storage.
//!
//! Snapshots are opaque JSON here; the only contract is that a saved
//! snapshot round-trips into a valid `SessionState`.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use boardwalk_domain::{SessionId, SessionState};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error on {context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    fn database(context: &'static str, source: sqlx::Error) -> Self {
        Self::Database { context, source }
    }
}

/// SQLite implementation of the persistence collaborator.
pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("create table", e))?;

        Ok(Self { pool })
    }

    /// Persist the latest snapshot for a session, replacing any prior one.
    pub async fn save_state(
        &self,
        session_id: &SessionId,
        state: &SessionState,
    ) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(state).map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, state, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                state = excluded.state,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(session_id.as_str())
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save", e))?;

        tracing::debug!(session_id = %session_id, "Session snapshot saved");
        Ok(())
    }

    /// Load the latest snapshot for a session, if one was ever saved.
    pub async fn load_latest_state(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionState>, RepoError> {
        let row = sqlx::query("SELECT state FROM sessions WHERE session_id = ?")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("load", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("state");
                let state = serde_json::from_str(&json)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardwalk_domain::{ParticipantId, ParticipantState, SpaceId};

    use crate::infrastructure::catalog::BoardCatalog;

    async fn temp_repo() -> (SqliteSessionRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir
            .path()
            .join("sessions.db")
            .to_string_lossy()
            .into_owned();
        let repo = SqliteSessionRepo::new(&db_path).await.expect("open repo");
        (repo, dir)
    }

    fn sample_state() -> SessionState {
        let mut state = SessionState::new(
            SessionId::from_trusted("s1"),
            BoardCatalog::default_board().into_spaces(),
        );
        let p1 = ParticipantId::from_trusted("p1");
        let mut participant =
            ParticipantState::new(p1.clone(), SpaceId::from_trusted("go"), 1500);
        participant.position = 8;
        state.participants.insert(p1.clone(), participant);
        state.turn_order.push(p1);
        state
    }

    #[tokio::test]
    async fn test_snapshot_round_trips() {
        let (repo, _dir) = temp_repo().await;
        let state = sample_state();

        repo.save_state(&state.id, &state).await.expect("save");
        let loaded = repo
            .load_latest_state(&state.id)
            .await
            .expect("load")
            .expect("snapshot exists");
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_save_replaces_prior_snapshot() {
        let (repo, _dir) = temp_repo().await;
        let mut state = sample_state();

        repo.save_state(&state.id, &state).await.expect("first save");
        if let Some(p) = state
            .participants
            .get_mut(&ParticipantId::from_trusted("p1"))
        {
            p.balance = 700;
        }
        repo.save_state(&state.id, &state).await.expect("second save");

        let loaded = repo
            .load_latest_state(&state.id)
            .await
            .expect("load")
            .expect("snapshot exists");
        assert_eq!(
            loaded
                .participant(&ParticipantId::from_trusted("p1"))
                .expect("p1")
                .balance,
            700
        );
    }

    #[tokio::test]
    async fn test_missing_session_loads_none() {
        let (repo, _dir) = temp_repo().await;
        let loaded = repo
            .load_latest_state(&SessionId::from_trusted("ghost"))
            .await
            .expect("load");
        assert!(loaded.is_none());
    }
}
