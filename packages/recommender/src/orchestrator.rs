// ABOUTME: Turn orchestrator, the single entry point of the recommendation flow
// ABOUTME: Sequences extraction, generation and validation and converts every failure into a chat reply

use std::sync::Arc;

use innerspell_ai::{ChatMessage, GenerationRequest, ModelGateway};
use innerspell_core::ConsultantCatalog;
use innerspell_prompts::PromptManager;
use tracing::{error, info, warn};

use crate::conversation::{OutputMode, RecommendationResult};
use crate::error::{RecommenderError, Result};
use crate::extractor::analyze;
use crate::policy::{PolicyAssembler, PolicyConfig};
use crate::tool::CatalogTool;
use crate::validator::{normalize, TurnContext};

/// Reply for any recoverable failure; the user retries by sending again
pub const APOLOGY_MESSAGE: &str =
    "죄송합니다. AI 응답을 받아오는 과정에서 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Reply when the service cannot work until an administrator fixes it
pub const CONFIGURATION_MESSAGE: &str =
    "AI 상담 기능이 아직 설정되지 않았습니다. 관리자에게 문의해 주세요.";

/// Drives one conversation turn at a time.
///
/// Holds no per-conversation state: everything is recomputed from the
/// history passed to [`Recommender::advance_conversation`].
pub struct Recommender {
    gateway: Arc<dyn ModelGateway>,
    catalog: Arc<dyn ConsultantCatalog>,
    policy: PolicyConfig,
    assembler: PolicyAssembler,
    mode: OutputMode,
}

impl Recommender {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        catalog: Arc<dyn ConsultantCatalog>,
        policy: PolicyConfig,
        prompts: &mut PromptManager,
    ) -> Result<Self> {
        let assembler = PolicyAssembler::new(&policy, prompts)?;
        info!(
            "Recommender ready: {} slots, {} consultants",
            policy.slots.len(),
            catalog.consultants().len()
        );

        Ok(Self {
            gateway,
            catalog,
            policy,
            assembler,
            mode: OutputMode::default(),
        })
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn output_mode(&self) -> OutputMode {
        self.mode
    }

    pub fn catalog(&self) -> &Arc<dyn ConsultantCatalog> {
        &self.catalog
    }

    /// Produce the reply for the latest turn. Never fails: errors become an
    /// apology or an administrator notice.
    pub async fn advance_conversation(&self, history: &[ChatMessage]) -> RecommendationResult {
        match self.run_turn(history).await {
            Ok(result) => result,
            Err(e) if e.is_configuration() => {
                error!("Recommender configuration error: {}", e);
                RecommendationResult::message(CONFIGURATION_MESSAGE)
            }
            Err(e) => {
                warn!("Turn failed, replying with apology: {}", e);
                RecommendationResult::message(APOLOGY_MESSAGE)
            }
        }
    }

    /// One turn with errors surfaced
    pub async fn run_turn(&self, history: &[ChatMessage]) -> Result<RecommendationResult> {
        self.gateway
            .ensure_configured()
            .map_err(|e| RecommenderError::Configuration(e.to_string()))?;

        let (state, next) = analyze(history, &self.policy);
        let system = self.assembler.system_prompt(&self.policy, &state, next);

        let tool = Arc::new(CatalogTool::new(self.catalog.clone()));
        let mut request = GenerationRequest::new(system, history.to_vec()).with_tool(tool.clone());

        // Recommendation data always travels as structured output
        if self.mode == OutputMode::Structured || next.is_recommend() {
            request = request.with_output_schema(self.assembler.output_schema().clone());
        }

        let output = self.gateway.generate(request).await?;
        let tool_calls = output.tool_calls.max(tool.call_count());

        let ctx = TurnContext {
            next,
            slot: next.slot().and_then(|kind| self.policy.slot(kind)),
            catalog: self.catalog.as_ref(),
            mode: self.mode,
            recommendation_count: self.policy.recommendation_count,
            tool_calls,
        };
        let result = normalize(output, &ctx)?;

        info!(
            "Turn complete: history={}, next={:?}, tool_calls={}, recommendations={}",
            history.len(),
            next,
            tool_calls,
            result.recommendations.as_ref().map_or(0, Vec::len)
        );
        Ok(result)
    }
}
