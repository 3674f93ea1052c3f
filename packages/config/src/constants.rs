// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Innerspell

// Model Provider
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";

// Server Configuration
pub const INNERSPELL_PORT: &str = "INNERSPELL_PORT";
pub const PORT: &str = "PORT"; // Legacy
pub const INNERSPELL_CORS_ORIGIN: &str = "INNERSPELL_CORS_ORIGIN";

// Recommender Configuration
pub const INNERSPELL_POLICY: &str = "INNERSPELL_POLICY";
pub const INNERSPELL_OUTPUT_MODE: &str = "INNERSPELL_OUTPUT_MODE";
pub const INNERSPELL_PROMPTS_DIR: &str = "INNERSPELL_PROMPTS_DIR";
pub const INNERSPELL_CATALOG_PATH: &str = "INNERSPELL_CATALOG_PATH";

// Defaults
pub const DEFAULT_PORT: u16 = 4001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_POLICY: &str = "full";
pub const DEFAULT_OUTPUT_MODE: &str = "structured";
