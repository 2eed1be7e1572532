//! Harness configuration.
//!
//! Everything is read once from the environment. goose's own command line
//! (`--host`, `--users`, `--run-time`, ...) still overrides the defaults the
//! binaries register from here.

use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

// ============================================================================
// Defaults
// ============================================================================

/// Backend host used when neither `LOAD_HOST` nor `--host` is given.
pub const DEFAULT_HOST: &str = "http://localhost:21101";

/// REST prefix of the support API.
pub const DEFAULT_BASE_PATH: &str = "/api/v1";

/// socket.io host used when the attack has no host at all.
pub const DEFAULT_WS_HOST: &str = "http://localhost:3000";

pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASS: &str = "admin123";

/// Share of AI stress actors that create their own ticket and session.
pub const DEFAULT_AI_SETUP_PROB: f64 = 0.05;

/// Share of pressure actors that create their own ticket and session.
pub const DEFAULT_PRESSURE_SETUP_PROB: f64 = 0.02;

pub const DEFAULT_TEST_DURATION_SECS: u64 = 120;
pub const DEFAULT_VUS: usize = 10;
pub const DEFAULT_HATCH_RATE: &str = "2";

/// Game names tried in order before falling back to the first listed game.
pub const PREFERRED_GAME_NAMES: &[&str] = &["Load Test Game", "Default Game"];

/// Issue type names tried in order before falling back to the first listed type.
pub const PREFERRED_ISSUE_TYPE_NAMES: &[&str] = &["Other", "General Inquiry", "Bug Report"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name}={value:?} is not a number")]
    NotANumber { name: &'static str, value: String },

    #[error("{name}={value} is outside 0.0..=1.0")]
    OutOfRange { name: &'static str, value: f64 },
}

/// Username/password pair posted to `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Settings shared by every scenario.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub host: String,
    pub base_path: String,
    pub ws_host: Option<String>,
    pub admin: Credential,
    /// Players log in only when `PLAYER_USER` is set; otherwise they are anonymous.
    pub player: Option<Credential>,
    pub game_id: Option<String>,
    pub issue_type_id: Option<String>,
    pub player_name: Option<String>,
    pub ai_session_id: Option<String>,
    pub ai_setup_prob: f64,
    pub pressure_setup_prob: f64,
    pub preferred_games: Vec<String>,
    pub preferred_issue_types: Vec<String>,
    pub result_file: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LoadConfig {
    /// Load configuration from environment variables or defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let player = get("PLAYER_USER").map(|username| {
            Credential::new(username, get("PLAYER_PASS").unwrap_or_default())
        });

        Self {
            host: get("LOAD_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            base_path: normalize_base_path(
                &get("BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            ),
            ws_host: get("WS_HOST"),
            admin: Credential::new(
                get("ADMIN_USER").unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
                get("ADMIN_PASS").unwrap_or_else(|| DEFAULT_ADMIN_PASS.to_string()),
            ),
            player,
            game_id: get("GAME_ID"),
            issue_type_id: get("ISSUE_TYPE_ID"),
            player_name: get("PLAYER_NAME"),
            ai_session_id: get("AI_SESSION_ID"),
            ai_setup_prob: probability_or_default(
                "AI_SETUP_PROB",
                get("AI_SETUP_PROB"),
                DEFAULT_AI_SETUP_PROB,
            ),
            pressure_setup_prob: probability_or_default(
                "PRESSURE_SETUP_PROB",
                get("PRESSURE_SETUP_PROB"),
                DEFAULT_PRESSURE_SETUP_PROB,
            ),
            preferred_games: PREFERRED_GAME_NAMES.iter().map(|s| s.to_string()).collect(),
            preferred_issue_types: PREFERRED_ISSUE_TYPE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            result_file: get("LOAD_RESULT_FILE"),
        }
    }

    /// Full request path for an endpoint below the API prefix.
    pub fn path(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_path, endpoint.trim_start_matches('/'))
    }
}

/// `api/v1/` and `/api/v1` both become `/api/v1`; an empty prefix stays empty.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub fn parse_probability(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        name,
        value: raw.to_string(),
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange { name, value });
    }
    Ok(value)
}

fn probability_or_default(name: &'static str, raw: Option<String>, default: f64) -> f64 {
    match raw.map(|raw| parse_probability(name, &raw)) {
        None => default,
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            tracing::warn!(error = %e, default, "ignoring invalid probability");
            default
        }
    }
}

/// Process-wide configuration, read on first use.
pub static CONFIG: LazyLock<LoadConfig> = LazyLock::new(LoadConfig::from_env);

pub fn config() -> &'static LoadConfig {
    &CONFIG
}

/// Read test duration from LOAD_TEST_DURATION env var, with fallback default
pub fn env_duration(default: u64) -> u64 {
    std::env::var("LOAD_TEST_DURATION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read virtual user count from LOAD_TEST_VUS env var, with fallback default
pub fn env_vus(default: usize) -> usize {
    std::env::var("LOAD_TEST_VUS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
