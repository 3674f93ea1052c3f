// ABOUTME: Recommendation policy and the system-prompt assembler
// ABOUTME: Slot order and option sets as data, plus rendering of the behavioural contract for the model

use innerspell_prompts::{render, PromptError, PromptManager, RECOMMENDER_PROMPT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RecommenderError, Result};
use crate::slots::{NextStep, SlotKind, SlotSpec, SlotState};
use crate::tool::CATALOG_TOOL;

/// Consultants returned on the final turn
pub const RECOMMENDATION_COUNT: usize = 3;

pub const CONCERN_OPTIONS: &[&str] = &[
    "연애/재회/궁합",
    "직장/사업/재물",
    "가족/인간관계",
    "학업/진로",
    "심리/건강",
    "기타",
];

pub const STYLE_OPTIONS: &[&str] = &[
    "따뜻하고 공감하는 스타일",
    "명쾌하고 직설적인 스타일",
    "논리적이고 분석적인 스타일",
    "편안하고 친근한 스타일",
];

pub const PRICE_TIER_OPTIONS: &[&str] = &[
    "합리적인 가격",
    "일반 가격",
    "경험 많은 상담사",
    "프리미엄 상담사",
    "상관없음",
];

/// Behavioural rules the model must follow, rendered verbatim into every policy
pub const POLICY_RULES: [&str; 5] = [
    "Ask exactly one question per turn. Never combine two questions in one reply.",
    "Whenever you ask about a step that has options, present the complete, exact option list with every option wrapped in square brackets (for example [연애/재회/궁합]), in addition to your natural-language phrasing.",
    "Call the getConsultants tool ONLY after every step above has been answered. Calling it earlier is a contract violation.",
    "When recommending, produce exactly 3 consultants. Each must use a real id returned by the getConsultants tool (never invent an id) and carry an individual reason that refers to the user's answers and the consultant's keywords.",
    "When the recommendations field is filled, the response field must never contain the recommendation reasons. Use it only for a short closing remark.",
];

const STEPS_PLACEHOLDER: &str = "{{steps}}";
const RULES_PLACEHOLDER: &str = "{{rules}}";

/// Which slots are collected, in what order, and with which options.
///
/// Built once at startup and handed to the recommender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyConfig {
    pub slots: Vec<SlotSpec>,
    pub recommendation_count: usize,
    /// Admin-edited template replacing the bundled one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_override: Option<String>,
}

impl PolicyConfig {
    /// Concern, style, price tier, then free text
    pub fn full() -> Self {
        Self::from_slots(vec![
            concern_slot(),
            style_slot(),
            price_tier_slot(),
            free_text_slot(),
        ])
    }

    /// Concern, style, then free text
    pub fn without_price_tier() -> Self {
        Self::from_slots(vec![concern_slot(), style_slot(), free_text_slot()])
    }

    /// Concern and style only
    pub fn minimal() -> Self {
        Self::from_slots(vec![concern_slot(), style_slot()])
    }

    pub fn from_slots(slots: Vec<SlotSpec>) -> Self {
        Self {
            slots,
            recommendation_count: RECOMMENDATION_COUNT,
            template_override: None,
        }
    }

    /// Preset by name: `full`, `no-price` or `minimal`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "full" => Some(Self::full()),
            "no-price" | "no_price" | "without-price-tier" => Some(Self::without_price_tier()),
            "minimal" => Some(Self::minimal()),
            _ => None,
        }
    }

    pub fn with_template_override(mut self, template: impl Into<String>) -> Self {
        self.template_override = Some(template.into());
        self
    }

    pub fn slot(&self, kind: SlotKind) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() {
            return Err(RecommenderError::EmptyHistory);
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::full()
    }
}

fn concern_slot() -> SlotSpec {
    SlotSpec::new(
        SlotKind::Concern,
        "Ask for the concern area",
        "안녕하세요! 어떤 고민이 있으신가요?",
    )
    .with_options(CONCERN_OPTIONS)
    .with_cues(&["고민", "분야", "어떤 일로"])
}

fn style_slot() -> SlotSpec {
    SlotSpec::new(
        SlotKind::Style,
        "Ask for the consultation style",
        "어떤 스타일의 상담을 원하시나요?",
    )
    .with_options(STYLE_OPTIONS)
    .with_cues(&["스타일", "상담 방식", "성향"])
}

fn price_tier_slot() -> SlotSpec {
    SlotSpec::new(
        SlotKind::PriceTier,
        "Ask for the price range",
        "원하시는 상담 가격대가 있으신가요?",
    )
    .with_options(PRICE_TIER_OPTIONS)
    .with_cues(&["가격", "예산", "비용", "금액"])
}

fn free_text_slot() -> SlotSpec {
    SlotSpec::new(
        SlotKind::FreeText,
        "Ask for details",
        "마지막으로, 지금 고민에 대해 조금 더 자세히 이야기해 주시겠어요?",
    )
    .with_cues(&["자세히", "구체적", "더 이야기", "더 알려"])
}

/// Renders the policy into the system prompt sent on every turn
#[derive(Debug, Clone)]
pub struct PolicyAssembler {
    instructions: String,
    output_schema: Value,
}

impl PolicyAssembler {
    /// Render the policy once. The template comes from the policy's
    /// override when set, otherwise from the prompt manager.
    pub fn new(policy: &PolicyConfig, prompts: &mut PromptManager) -> Result<Self> {
        policy.validate()?;

        let prompt = prompts.get_prompt_metadata(RECOMMENDER_PROMPT)?;
        let template = match &policy.template_override {
            Some(template) => {
                info!("Using admin policy template override");
                template.clone()
            }
            None => prompt.template.clone(),
        };

        for placeholder in [STEPS_PLACEHOLDER, RULES_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(PromptError::InvalidFormat(format!(
                    "Recommender template must contain {}",
                    placeholder
                ))
                .into());
            }
        }

        let output_schema = prompt.output_schema.ok_or_else(|| {
            RecommenderError::Configuration(format!(
                "Prompt {} declares no output schema",
                RECOMMENDER_PROMPT
            ))
        })?;

        let steps = render_steps(policy);
        let rules = render_rules();
        let instructions = render(
            &template,
            &[("steps", steps.as_str()), ("rules", rules.as_str())],
            &["steps".to_string(), "rules".to_string()],
        )?;

        if let Some(missing) = POLICY_RULES.iter().find(|rule| !instructions.contains(*rule)) {
            return Err(RecommenderError::Configuration(format!(
                "Rendered policy is missing rule: {}",
                missing
            )));
        }

        debug!("Assembled policy ({} chars)", instructions.len());
        Ok(Self {
            instructions,
            output_schema,
        })
    }

    /// The rendered behavioural contract, identical on every turn
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Policy plus a note on what has been collected and what comes next
    pub fn system_prompt(&self, policy: &PolicyConfig, state: &SlotState, next: NextStep) -> String {
        let mut prompt = self.instructions.clone();
        prompt.push_str("\n\nCURRENT CONVERSATION STATE:\n");

        for (index, spec) in policy.slots.iter().enumerate() {
            let answer = state
                .get(spec.kind)
                .map(|value| format!("\"{}\"", value.display()))
                .unwrap_or_else(|| "(not answered yet)".to_string());
            prompt.push_str(&format!("- Step {} ({}): {}\n", index + 1, spec.kind, answer));
        }

        match next {
            NextStep::Ask(kind) => {
                let step = policy
                    .slots
                    .iter()
                    .position(|s| s.kind == kind)
                    .map(|i| i + 1)
                    .unwrap_or(1);
                prompt.push_str(&format!(
                    "NEXT ACTION: Ask step {} ({}) now. Do not call {} and do not recommend yet.",
                    step, kind, CATALOG_TOOL
                ));
            }
            NextStep::Recommend => {
                prompt.push_str(&format!(
                    "NEXT ACTION: Every step is answered. Call {} once, then recommend exactly {} consultants.",
                    CATALOG_TOOL, policy.recommendation_count
                ));
            }
        }

        prompt
    }
}

fn render_steps(policy: &PolicyConfig) -> String {
    let mut steps = Vec::with_capacity(policy.slots.len() + 1);

    for (index, spec) in policy.slots.iter().enumerate() {
        let mut step = format!(
            "{}. **Step {}: {}.**\n   - Ask: \"{}\"",
            index + 1,
            index + 1,
            spec.title,
            spec.question
        );
        if spec.is_enumerable() {
            let options = spec
                .options
                .iter()
                .map(|o| format!("[{}]", o))
                .collect::<Vec<_>>()
                .join(" ");
            step.push_str(&format!(
                "\n   - You MUST present these exact options: {}",
                options
            ));
        } else {
            step.push_str("\n   - Let the user answer freely. Do not offer options.");
        }
        steps.push(step);
    }

    let last = policy.slots.len() + 1;
    steps.push(format!(
        "{}. **Step {}: Get consultants and recommend.**\n   - Once every step above is answered, immediately call the `{}` tool. Do not ask any more questions.\n   - Select exactly {} consultants that best match the user's answers and return them in the recommendations field with a reason for each.",
        last, last, CATALOG_TOOL, policy.recommendation_count
    ));

    steps.join("\n\n")
}

fn render_rules() -> String {
    POLICY_RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n")
}
