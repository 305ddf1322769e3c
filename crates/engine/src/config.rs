//! Engine configuration, loaded from the environment (with `.env` support
//! via dotenvy in `main`).

use std::path::PathBuf;
use std::time::Duration;

/// Default bound on one sweep; a sweep that exceeds it fails rather than
/// leaving the session half-settled indefinitely.
const DEFAULT_SWEEP_TIMEOUT_MS: u64 = 5_000;

const DEFAULT_STARTING_BALANCE: i64 = 1_500;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub session_db: String,
    pub sweep_timeout: Duration,
    pub starting_balance: i64,
    /// Optional JSON board file; the built-in board is used when unset.
    pub board_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let server_port: u16 = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .unwrap_or(3000);
        let session_db = std::env::var("SESSION_DB").unwrap_or_else(|_| "sessions.db".into());
        let sweep_timeout_ms: u64 = std::env::var("SWEEP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_TIMEOUT_MS);
        let starting_balance: i64 = std::env::var("STARTING_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STARTING_BALANCE);
        let board_path = std::env::var("BOARD_PATH").ok().map(PathBuf::from);

        Self {
            server_host,
            server_port,
            session_db,
            sweep_timeout: Duration::from_millis(sweep_timeout_ms),
            starting_balance,
            board_path,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            session_db: "sessions.db".into(),
            sweep_timeout: Duration::from_millis(DEFAULT_SWEEP_TIMEOUT_MS),
            starting_balance: DEFAULT_STARTING_BALANCE,
            board_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.starting_balance, 1_500);
        assert_eq!(config.sweep_timeout, Duration::from_secs(5));
        assert!(config.board_path.is_none());
    }
}
