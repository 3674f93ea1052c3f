// ABOUTME: Conversational consultant recommendation for Innerspell
// ABOUTME: Slot extraction, policy assembly, catalog tool, output validation and the turn orchestrator

pub mod conversation;
pub mod daily_spell;
pub mod error;
pub mod extractor;
pub mod options;
pub mod orchestrator;
pub mod policy;
pub mod slots;
pub mod tool;
pub mod validator;

pub use conversation::{ChatMessage, ChatRole, OutputMode, Recommendation, RecommendationResult};
pub use daily_spell::{DailySpell, DailySpellGenerator};
pub use error::{RecommenderError, Result};
pub use extractor::{analyze, extract, next_step};
pub use options::{extract_bracket_options, strip_bracket_options};
pub use orchestrator::{Recommender, APOLOGY_MESSAGE, CONFIGURATION_MESSAGE};
pub use policy::{PolicyAssembler, PolicyConfig, POLICY_RULES, RECOMMENDATION_COUNT};
pub use slots::{NextStep, SlotKind, SlotSpec, SlotState, SlotValue};
pub use tool::{CatalogTool, CATALOG_TOOL};
pub use validator::{normalize, TurnContext, DEFAULT_CLOSING};
