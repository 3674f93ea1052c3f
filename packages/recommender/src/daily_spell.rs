// ABOUTME: Daily spell card generation
// ABOUTME: One structured model call per draw, with a fixed card when the model is unavailable

use std::sync::Arc;

use chrono::NaiveDate;
use innerspell_ai::{ChatMessage, GenerationRequest, ModelGateway};
use innerspell_prompts::{render, Prompt, PromptManager, DAILY_SPELL_PROMPT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{RecommenderError, Result};

const DRAW_REQUEST: &str = "오늘의 스펠카드를 뽑아 주세요.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySpell {
    pub title: String,
    pub description: String,
}

impl DailySpell {
    /// Card shown when generation fails
    pub fn fallback() -> Self {
        Self {
            title: "지혜의 샘물".to_string(),
            description: "오늘은 마음의 소리에 귀 기울여 보세요. 필요한 답은 이미 당신 안에 있습니다."
                .to_string(),
        }
    }
}

pub struct DailySpellGenerator {
    gateway: Arc<dyn ModelGateway>,
    prompt: Prompt,
    output_schema: Value,
}

impl DailySpellGenerator {
    pub fn new(gateway: Arc<dyn ModelGateway>, prompts: &mut PromptManager) -> Result<Self> {
        let prompt = prompts.get_prompt_metadata(DAILY_SPELL_PROMPT)?;
        let output_schema = prompt.output_schema.clone().ok_or_else(|| {
            RecommenderError::Configuration(format!(
                "Prompt {} declares no output schema",
                DAILY_SPELL_PROMPT
            ))
        })?;

        Ok(Self {
            gateway,
            prompt,
            output_schema,
        })
    }

    /// Draw the card for a date, falling back to the fixed card on any error
    pub async fn draw(&self, date: NaiveDate) -> DailySpell {
        match self.try_draw(date).await {
            Ok(spell) => spell,
            Err(e) => {
                warn!("Daily spell generation failed, using fallback card: {}", e);
                DailySpell::fallback()
            }
        }
    }

    pub async fn try_draw(&self, date: NaiveDate) -> Result<DailySpell> {
        self.gateway
            .ensure_configured()
            .map_err(|e| RecommenderError::Configuration(e.to_string()))?;

        let date = date.format("%Y-%m-%d").to_string();
        let system = render(
            &self.prompt.template,
            &[("date", date.as_str())],
            &self.prompt.parameters,
        )?;

        let request = GenerationRequest::new(system, vec![ChatMessage::user(DRAW_REQUEST)])
            .with_output_schema(self.output_schema.clone());
        let output = self.gateway.generate(request).await?;

        let value = output.structured.ok_or_else(|| {
            RecommenderError::SchemaViolation("daily spell returned no structured output".to_string())
        })?;
        let spell: DailySpell = serde_json::from_value(value)
            .map_err(|e| RecommenderError::SchemaViolation(format!("malformed daily spell: {}", e)))?;

        if spell.title.trim().is_empty() || spell.description.trim().is_empty() {
            return Err(RecommenderError::SchemaViolation(
                "daily spell has an empty title or description".to_string(),
            ));
        }

        info!("Drew daily spell '{}' for {}", spell.title, date);
        Ok(spell)
    }
}
