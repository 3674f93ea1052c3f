// ABOUTME: Turn result types returned to the chat caller
// ABOUTME: Defines recommendation entries, the per-turn result, and the output mode

use serde::{Deserialize, Serialize};

pub use innerspell_ai::{ChatMessage, ChatRole};

/// One recommended consultant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    /// Catalog id of the consultant
    pub id: String,
    pub reason: String,
}

/// What the caller receives for every turn, success or failure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationResult {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    /// Quick-choice labels for the question asked this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl RecommendationResult {
    /// A plain message with neither options nor recommendations
    pub fn message(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            recommendations: None,
            options: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.recommendations
            .as_ref()
            .is_some_and(|recs| !recs.is_empty())
    }
}

/// How question turns are negotiated with the model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every turn uses the structured output schema
    #[default]
    Structured,
    /// Question turns are free text with bracketed options
    Text,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(OutputMode::Structured),
            "text" => Ok(OutputMode::Text),
            other => Err(format!("unknown output mode: {}", other)),
        }
    }
}
