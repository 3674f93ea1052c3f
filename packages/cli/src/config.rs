use innerspell_config::{
    DEFAULT_CORS_ORIGIN, DEFAULT_OUTPUT_MODE, DEFAULT_POLICY, DEFAULT_PORT,
    INNERSPELL_CATALOG_PATH, INNERSPELL_CORS_ORIGIN, INNERSPELL_OUTPUT_MODE, INNERSPELL_POLICY,
    INNERSPELL_PORT, INNERSPELL_PROMPTS_DIR, PORT,
};
use innerspell_recommender::{OutputMode, PolicyConfig};
use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid policy preset: {0} (expected full, no-price or minimal)")]
    InvalidPolicy(String),
    #[error("Invalid output mode: {0} (expected structured or text)")]
    InvalidOutputMode(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub policy: PolicyConfig,
    pub output_mode: OutputMode,
    /// Admin prompt overrides (`<dir>/system/<id>.json`)
    pub prompts_dir: Option<PathBuf>,
    /// JSON catalog replacing the built-in consultants
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var(INNERSPELL_PORT)
            .or_else(|_| env::var(PORT))
            .unwrap_or_else(|_| DEFAULT_PORT.to_string());

        let port = port_str.trim().parse::<u16>()?;

        // Validate port is in valid range
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var(INNERSPELL_CORS_ORIGIN).unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        let policy_name = env::var(INNERSPELL_POLICY).unwrap_or_else(|_| DEFAULT_POLICY.to_string());
        let policy = PolicyConfig::from_name(&policy_name)
            .ok_or_else(|| ConfigError::InvalidPolicy(policy_name.clone()))?;

        let output_mode = env::var(INNERSPELL_OUTPUT_MODE)
            .unwrap_or_else(|_| DEFAULT_OUTPUT_MODE.to_string())
            .parse::<OutputMode>()
            .map_err(ConfigError::InvalidOutputMode)?;

        let prompts_dir = optional_path(INNERSPELL_PROMPTS_DIR);
        let catalog_path = optional_path(INNERSPELL_CATALOG_PATH);

        Ok(Config {
            port,
            cors_origin,
            policy,
            output_mode,
            prompts_dir,
            catalog_path,
        })
    }
}

fn optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
