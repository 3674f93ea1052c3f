// ABOUTME: Slot definitions for the preference-collection dialogue
// ABOUTME: Slot kinds, their specs and option matching, and the state derived from history

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shortest answer that may match an option by being part of it
const MIN_PARTIAL_ANSWER_CHARS: usize = 2;

/// A piece of information collected before recommending
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Concern,
    Style,
    PriceTier,
    FreeText,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Concern => "concern",
            SlotKind::Style => "style",
            SlotKind::PriceTier => "price_tier",
            SlotKind::FreeText => "free_text",
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one slot is asked and recognised
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotSpec {
    pub kind: SlotKind,
    /// Short heading used in the policy steps
    pub title: String,
    /// Natural-language question the model should ask
    pub question: String,
    /// Canonical choices; empty for a free-form slot
    #[serde(default)]
    pub options: Vec<String>,
    /// Phrases that identify a question about this slot
    #[serde(default)]
    pub cues: Vec<String>,
}

impl SlotSpec {
    pub fn new(kind: SlotKind, title: &str, question: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            question: question.to_string(),
            options: Vec::new(),
            cues: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_cues(mut self, cues: &[&str]) -> Self {
        self.cues = cues.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn is_enumerable(&self) -> bool {
        !self.options.is_empty()
    }

    /// Match a user answer to one of the canonical options.
    ///
    /// Tried in order: exact match, the answer containing an option, the
    /// answer containing any `/` segment of an option, an option containing
    /// the answer. The last step needs at least two characters of answer.
    pub fn match_option(&self, answer: &str) -> Option<&str> {
        let answer = normalize_answer(answer);
        if answer.is_empty() {
            return None;
        }

        let options = self.options.iter().map(String::as_str);

        if let Some(found) = options.clone().find(|o| *o == answer) {
            return Some(found);
        }
        if let Some(found) = options.clone().find(|o| answer.contains(*o)) {
            return Some(found);
        }
        if let Some(found) = options.clone().find(|o| {
            o.split('/')
                .map(str::trim)
                .any(|segment| !segment.is_empty() && answer.contains(segment))
        }) {
            return Some(found);
        }
        if answer.chars().count() < MIN_PARTIAL_ANSWER_CHARS {
            return None;
        }
        options.clone().find(|o| o.contains(answer.as_str()))
    }

    /// Number of the given tokens that name one of this slot's options
    pub fn option_overlap(&self, tokens: &[String]) -> usize {
        tokens
            .iter()
            .filter(|token| self.options.iter().any(|o| o == token.trim()))
            .count()
    }

    pub fn matches_cue(&self, text: &str) -> bool {
        self.cues.iter().any(|cue| text.contains(cue.as_str()))
    }
}

fn normalize_answer(answer: &str) -> String {
    answer
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .to_string()
}

/// An answer recorded for a slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotValue {
    /// The user's text as sent
    pub raw: String,
    /// Canonical option the answer matched, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl SlotValue {
    /// Canonical option when matched, otherwise the raw answer
    pub fn display(&self) -> &str {
        self.option.as_deref().unwrap_or(self.raw.trim())
    }
}

/// What has been learned so far. Recomputed from history on every turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotState {
    values: BTreeMap<SlotKind, SlotValue>,
}

impl SlotState {
    pub fn get(&self, kind: SlotKind) -> Option<&SlotValue> {
        self.values.get(&kind)
    }

    pub fn is_filled(&self, kind: SlotKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn filled_count(&self) -> usize {
        self.values.len()
    }

    pub fn set(&mut self, kind: SlotKind, value: SlotValue) {
        self.values.insert(kind, value);
    }

    pub fn concern(&self) -> Option<&SlotValue> {
        self.get(SlotKind::Concern)
    }

    pub fn style(&self) -> Option<&SlotValue> {
        self.get(SlotKind::Style)
    }

    pub fn price_tier(&self) -> Option<&SlotValue> {
        self.get(SlotKind::PriceTier)
    }

    pub fn free_text(&self) -> Option<&SlotValue> {
        self.get(SlotKind::FreeText)
    }
}

/// What the current turn should do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", content = "slot", rename_all = "snake_case")]
pub enum NextStep {
    Ask(SlotKind),
    Recommend,
}

impl NextStep {
    pub fn is_recommend(&self) -> bool {
        matches!(self, NextStep::Recommend)
    }

    pub fn slot(&self) -> Option<SlotKind> {
        match self {
            NextStep::Ask(kind) => Some(*kind),
            NextStep::Recommend => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn concern() -> SlotSpec {
        SlotSpec::new(SlotKind::Concern, "Concern", "어떤 고민이 있으신가요?").with_options(&[
            "연애/재회/궁합",
            "직장/사업/재물",
            "가족/인간관계",
            "기타",
        ])
    }

    #[test]
    fn test_exact_option_match() {
        assert_eq!(concern().match_option("연애/재회/궁합"), Some("연애/재회/궁합"));
        assert_eq!(concern().match_option("[가족/인간관계]"), Some("가족/인간관계"));
    }

    #[test]
    fn test_segment_match_in_typed_answer() {
        assert_eq!(
            concern().match_option("요즘 재회 문제로 고민이에요"),
            Some("연애/재회/궁합")
        );
        assert_eq!(concern().match_option("사업이 잘 안돼요"), Some("직장/사업/재물"));
    }

    #[test]
    fn test_single_character_does_not_match_inside_option() {
        assert_eq!(concern().match_option("사"), None);
        assert_eq!(concern().match_option("재회/궁"), Some("연애/재회/궁합"));
    }

    #[test]
    fn test_no_match_for_unrelated_answer() {
        assert_eq!(concern().match_option("잘 모르겠어요"), None);
        assert_eq!(concern().match_option("   "), None);
    }

    #[test]
    fn test_option_overlap_counts_exact_tokens() {
        let tokens = vec!["연애/재회/궁합".to_string(), "기타".to_string(), "없음".to_string()];
        assert_eq!(concern().option_overlap(&tokens), 2);
    }

    #[test]
    fn test_free_form_slot_is_not_enumerable() {
        let spec = SlotSpec::new(SlotKind::FreeText, "Details", "자세히 알려주세요");
        assert!(!spec.is_enumerable());
        assert_eq!(spec.match_option("무엇이든"), None);
    }

    #[test]
    fn test_next_step_wire_format() {
        assert_eq!(
            serde_json::to_value(NextStep::Ask(SlotKind::PriceTier)).unwrap(),
            serde_json::json!({"step": "ask", "slot": "price_tier"})
        );
        assert_eq!(
            serde_json::to_value(NextStep::Recommend).unwrap(),
            serde_json::json!({"step": "recommend"})
        );
    }
}
