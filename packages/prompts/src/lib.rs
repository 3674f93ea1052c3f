// ABOUTME: Centralized prompt management for the Innerspell model calls
// ABOUTME: Provides type-safe prompt loading, admin overrides, and parameter substitution from JSON files

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Prompt id of the recommender policy
pub const RECOMMENDER_PROMPT: &str = "recommender";
/// Prompt id of the daily spell card
pub const DAILY_SPELL_PROMPT: &str = "daily_spell";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (RECOMMENDER_PROMPT, include_str!("../system/recommender.json")),
    (DAILY_SPELL_PROMPT, include_str!("../system/daily_spell.json")),
];

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Prompts directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read prompt file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse prompt JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid prompt format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub version: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub category: String,
    pub template: String,
    pub parameters: Vec<String>,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PromptMetadata>,
}

/// Loads prompts from an optional admin override directory, falling back to
/// the prompts bundled with this crate.
///
/// Override files live at `<prompts_dir>/system/<id>.json` and use the same
/// format as the bundled ones.
pub struct PromptManager {
    prompts_dir: Option<PathBuf>,
    cache: HashMap<String, Prompt>,
}

impl PromptManager {
    /// Create a new PromptManager
    ///
    /// If prompts_dir is None, only the bundled prompts are used
    pub fn new(prompts_dir: Option<PathBuf>) -> Result<Self, PromptError> {
        if let Some(dir) = &prompts_dir {
            if !dir.exists() {
                return Err(PromptError::MissingDirectory(dir.clone()));
            }
            info!("Using prompt overrides from {}", dir.display());
        }

        Ok(Self {
            prompts_dir,
            cache: HashMap::new(),
        })
    }

    /// Get a prompt without substitution; pair with [`render`]
    pub fn get_prompt_metadata(&mut self, prompt_id: &str) -> Result<Prompt, PromptError> {
        self.load_prompt(prompt_id)
    }

    /// Load a prompt with caching; overrides win over bundled prompts
    fn load_prompt(&mut self, prompt_id: &str) -> Result<Prompt, PromptError> {
        if let Some(prompt) = self.cache.get(prompt_id) {
            return Ok(prompt.clone());
        }

        let prompt = match self.override_path(prompt_id) {
            Some(path) => load_prompt_from_path(&path)?,
            None => {
                let (_, json) = BUILTIN_PROMPTS
                    .iter()
                    .find(|(id, _)| *id == prompt_id)
                    .ok_or_else(|| PromptError::NotFound(prompt_id.to_string()))?;
                parse_prompt(json, prompt_id)?
            }
        };

        self.cache.insert(prompt_id.to_string(), prompt.clone());
        Ok(prompt)
    }

    fn override_path(&self, prompt_id: &str) -> Option<PathBuf> {
        let path = self
            .prompts_dir
            .as_ref()?
            .join("system")
            .join(format!("{}.json", prompt_id));
        path.exists().then_some(path)
    }
}

/// Substitute `{{parameter}}` placeholders in a template.
///
/// Every name in `required_params` must be supplied.
pub fn render(
    template: &str,
    parameters: &[(&str, &str)],
    required_params: &[String],
) -> Result<String, PromptError> {
    let param_map: HashMap<&str, &str> = parameters.iter().copied().collect();

    for required in required_params {
        if !param_map.contains_key(required.as_str()) {
            return Err(PromptError::MissingParameter(required.clone()));
        }
    }

    let mut result = template.to_string();
    for (key, value) in parameters {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    Ok(result)
}

/// Load a prompt from a specific file path
fn load_prompt_from_path(path: &Path) -> Result<Prompt, PromptError> {
    info!("Loading prompt override {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_prompt(&content, &path.display().to_string())
}

fn parse_prompt(content: &str, source: &str) -> Result<Prompt, PromptError> {
    let prompt: Prompt = serde_json::from_str(content)?;

    // Basic validation
    if prompt.id.is_empty() || prompt.template.is_empty() || prompt.category.is_empty() {
        return Err(PromptError::InvalidFormat(format!(
            "Invalid prompt format in {}",
            source
        )));
    }

    for param in &prompt.parameters {
        if !prompt.template.contains(&format!("{{{{{}}}}}", param)) {
            warn!("Prompt {} declares parameter {} but never uses it", source, param);
            return Err(PromptError::InvalidFormat(format!(
                "Template in {} has no placeholder for parameter '{}'",
                source, param
            )));
        }
    }

    Ok(prompt)
}
