// ABOUTME: Error types for the recommender package
// ABOUTME: Maps turn failures onto configuration, generation, schema and empty-history kinds

use innerspell_ai::AIServiceError;
use innerspell_prompts::PromptError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Recommender is not configured: {0}")]
    Configuration(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] AIServiceError),

    #[error("Model output violates the response schema: {0}")]
    SchemaViolation(String),

    #[error("No slot to ask about: the policy defines no slots")]
    EmptyHistory,

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl RecommenderError {
    /// Whether the failure needs an administrator rather than a retry
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RecommenderError::Configuration(_)
                | RecommenderError::Prompt(_)
                | RecommenderError::Generation(AIServiceError::NoApiKey)
        )
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_counts_as_configuration() {
        assert!(RecommenderError::from(AIServiceError::NoApiKey).is_configuration());
        assert!(RecommenderError::Configuration("x".into()).is_configuration());
    }

    #[test]
    fn test_provider_failures_are_recoverable() {
        assert!(!RecommenderError::from(AIServiceError::InvalidResponse).is_configuration());
        assert!(!RecommenderError::SchemaViolation("bad".into()).is_configuration());
        assert!(!RecommenderError::EmptyHistory.is_configuration());
    }
}
