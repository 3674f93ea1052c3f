// ABOUTME: Output validator and normalizer
// ABOUTME: Checks model output against the turn's contract and builds the caller-facing result

use std::collections::HashSet;

use innerspell_ai::GenerationOutput;
use innerspell_core::ConsultantCatalog;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::conversation::{OutputMode, Recommendation, RecommendationResult};
use crate::error::{RecommenderError, Result};
use crate::options::{extract_bracket_options, strip_bracket_options};
use crate::slots::{NextStep, SlotSpec};

/// Closing remark used when the model's response was nothing but reasons
pub const DEFAULT_CLOSING: &str =
    "말씀해 주신 내용을 바탕으로 꼭 맞는 상담사를 찾아봤어요. 아래 추천을 확인해 보세요!";

/// Everything the validator needs to judge one turn
pub struct TurnContext<'a> {
    pub next: NextStep,
    /// Spec of the slot being asked, when the turn is a question
    pub slot: Option<&'a SlotSpec>,
    pub catalog: &'a dyn ConsultantCatalog,
    pub mode: OutputMode,
    pub recommendation_count: usize,
    /// Catalog tool invocations observed this turn
    pub tool_calls: usize,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    recommendations: Option<Vec<RawRecommendation>>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    id: String,
    #[serde(default)]
    reason: String,
}

/// Validate a model output and turn it into the result for the caller
pub fn normalize(output: GenerationOutput, ctx: &TurnContext<'_>) -> Result<RecommendationResult> {
    let text_question = ctx.mode == OutputMode::Text && !ctx.next.is_recommend();

    let raw = if text_question {
        RawOutput {
            response: Some(output.text),
            recommendations: None,
        }
    } else {
        let value = output.structured.ok_or_else(|| {
            RecommenderError::SchemaViolation("model returned no structured output".to_string())
        })?;
        serde_json::from_value::<RawOutput>(value)
            .map_err(|e| RecommenderError::SchemaViolation(format!("malformed output: {}", e)))?
    };

    let response = raw
        .response
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| RecommenderError::SchemaViolation("missing response".to_string()))?;

    // An empty array is the same as no recommendations
    let recommendations = raw.recommendations.filter(|recs| !recs.is_empty());

    match ctx.next {
        NextStep::Recommend => {
            let recs = recommendations.ok_or_else(|| {
                RecommenderError::SchemaViolation(
                    "all slots are filled but no recommendations were returned".to_string(),
                )
            })?;
            let recommendations = check_recommendations(recs, ctx)?;
            let response = strip_reasons(&response, &recommendations);

            Ok(RecommendationResult {
                response,
                recommendations: Some(recommendations),
                options: None,
            })
        }
        NextStep::Ask(kind) => {
            if recommendations.is_some() {
                return Err(RecommenderError::SchemaViolation(format!(
                    "recommendations returned while {} is still unanswered",
                    kind
                )));
            }
            if ctx.tool_calls > 0 {
                warn!(
                    "Model called the catalog tool while {} is still unanswered; passing the question through",
                    kind
                );
            }

            let mut options = extract_bracket_options(&response);
            if options.is_empty() {
                if let Some(spec) = ctx.slot.filter(|s| s.is_enumerable()) {
                    debug!("No bracket options in reply, attaching canonical {} options", kind);
                    options = spec.options.clone();
                }
            }

            let response = match ctx.mode {
                OutputMode::Structured => response,
                OutputMode::Text => {
                    let stripped = strip_bracket_options(&response);
                    if stripped.is_empty() {
                        ctx.slot
                            .map(|s| s.question.clone())
                            .unwrap_or(response)
                    } else {
                        stripped
                    }
                }
            };

            Ok(RecommendationResult {
                response,
                recommendations: None,
                options: (!options.is_empty()).then_some(options),
            })
        }
    }
}

fn check_recommendations(
    recs: Vec<RawRecommendation>,
    ctx: &TurnContext<'_>,
) -> Result<Vec<Recommendation>> {
    if ctx.tool_calls == 0 {
        return Err(RecommenderError::SchemaViolation(
            "recommendations were produced without consulting the catalog".to_string(),
        ));
    }
    if recs.len() != ctx.recommendation_count {
        return Err(RecommenderError::SchemaViolation(format!(
            "expected {} recommendations, got {}",
            ctx.recommendation_count,
            recs.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(recs.len());
    for rec in recs {
        let id = rec.id.trim().to_string();
        let reason = rec.reason.trim().to_string();

        if !ctx.catalog.contains(&id) {
            return Err(RecommenderError::SchemaViolation(format!(
                "unknown consultant id '{}'",
                id
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(RecommenderError::SchemaViolation(format!(
                "consultant '{}' recommended twice",
                id
            )));
        }
        if reason.is_empty() {
            return Err(RecommenderError::SchemaViolation(format!(
                "no reason given for consultant '{}'",
                id
            )));
        }
        checked.push(Recommendation { id, reason });
    }

    Ok(checked)
}

/// Drop reason text the model repeated inside the response
fn strip_reasons(response: &str, recommendations: &[Recommendation]) -> String {
    let mut cleaned = response.to_string();
    for rec in recommendations {
        if cleaned.contains(&rec.reason) {
            warn!("Response repeated the reason for consultant {}; removing it", rec.id);
            cleaned = cleaned.replace(&rec.reason, "");
        }
    }

    let cleaned = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        DEFAULT_CLOSING.to_string()
    } else {
        cleaned
    }
}
