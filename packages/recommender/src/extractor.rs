// ABOUTME: Conversation state extractor
// ABOUTME: Recomputes slot answers from the message history and decides the next step

use tracing::debug;

use crate::conversation::ChatMessage;
use crate::options::extract_bracket_options;
use crate::policy::PolicyConfig;
use crate::slots::{NextStep, SlotKind, SlotSpec, SlotState, SlotValue};

/// Replay the history against the policy and collect every answered slot.
///
/// Pure function of its inputs: the same history always yields the same
/// state.
pub fn extract(history: &[ChatMessage], policy: &PolicyConfig) -> SlotState {
    let mut state = SlotState::default();
    let mut pending: Option<SlotKind> = None;

    for turn in history {
        if all_filled(&state, policy) {
            break;
        }

        if !turn.is_user() {
            pending = asked_slot(&turn.content, policy, &state);
            continue;
        }

        let answer = turn.content.trim();
        match pending.take().and_then(|kind| policy.slot(kind)) {
            Some(spec) => {
                // An explicit question was asked; any non-empty reply answers it
                if !answer.is_empty() {
                    state.set(spec.kind, value_for(spec, answer));
                }
            }
            None => {
                if let Some(spec) = first_unfilled(&state, policy) {
                    if !spec.is_enumerable() && !answer.is_empty() {
                        state.set(spec.kind, value_for(spec, answer));
                    } else if let Some(option) = spec.match_option(answer) {
                        state.set(
                            spec.kind,
                            SlotValue {
                                raw: answer.to_string(),
                                option: Some(option.to_string()),
                            },
                        );
                    }
                }
            }
        }
    }

    state
}

/// First unanswered slot in policy order, or `Recommend` once all are filled
pub fn next_step(state: &SlotState, policy: &PolicyConfig) -> NextStep {
    first_unfilled(state, policy)
        .map(|spec| NextStep::Ask(spec.kind))
        .unwrap_or(NextStep::Recommend)
}

/// Extract and decide in one call
pub fn analyze(history: &[ChatMessage], policy: &PolicyConfig) -> (SlotState, NextStep) {
    let state = extract(history, policy);
    let next = next_step(&state, policy);
    debug!(
        "Extracted {} of {} slots from {} turns, next step {:?}",
        state.filled_count(),
        policy.slots.len(),
        history.len(),
        next
    );
    (state, next)
}

fn all_filled(state: &SlotState, policy: &PolicyConfig) -> bool {
    first_unfilled(state, policy).is_none()
}

fn first_unfilled<'a>(state: &SlotState, policy: &'a PolicyConfig) -> Option<&'a SlotSpec> {
    policy.slots.iter().find(|spec| !state.is_filled(spec.kind))
}

fn value_for(spec: &SlotSpec, answer: &str) -> SlotValue {
    SlotValue {
        raw: answer.to_string(),
        option: spec.match_option(answer).map(str::to_string),
    }
}

/// Work out which slot an assistant turn asked about.
///
/// Bracketed options decide first (largest overlap with a slot's option
/// set), then cue phrases of unanswered slots, then the first unanswered
/// slot. Answered slots are never targeted again.
fn asked_slot(content: &str, policy: &PolicyConfig, state: &SlotState) -> Option<SlotKind> {
    let unfilled: Vec<&SlotSpec> = policy
        .slots
        .iter()
        .filter(|spec| !state.is_filled(spec.kind))
        .collect();

    let tokens = extract_bracket_options(content);
    if !tokens.is_empty() {
        let best = unfilled
            .iter()
            .map(|spec| (spec.option_overlap(&tokens), *spec))
            .filter(|(overlap, _)| *overlap > 0)
            .fold(None::<(usize, &SlotSpec)>, |best, (overlap, spec)| match best {
                Some((top, _)) if top >= overlap => best,
                _ => Some((overlap, spec)),
            });
        if let Some((_, spec)) = best {
            return Some(spec.kind);
        }
    }

    unfilled
        .iter()
        .find(|spec| spec.matches_cue(content))
        .or_else(|| unfilled.first())
        .map(|spec| spec.kind)
}
