//! Game State Engine — drives the 7-day career simulator.
//!
//! Flow per turn: render prompt → prompt client (with timeout) →
//! extract JSON envelope → apply deltas and clamp → check endings.
//!
//! Every failure is recovered. Internally a turn is
//! `Result<GameState, TurnFailure>`; `start_game` and `process_turn` collapse
//! that into a playable `GameState` so a session never dies on a bad model
//! response or a provider outage.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::career::models::{fallback_options, GameState};
use crate::career::prompts;
use crate::career::rules::{self, MAX_OPTIONS};
use crate::llm_client::extract::extract_json_object;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmError, PromptClient, PromptTemplate, PromptVars};

/// Why a turn could not produce a new state.
#[derive(Debug, Error)]
pub enum TurnFailure {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Field '{field}' is not a number: {value}")]
    MalformedDelta { field: &'static str, value: String },

    #[error("Model response has no opening scenario")]
    MissingScenario,

    #[error("Game is already over")]
    GameFinished,
}

/// The opening envelope: `{scenario, options}`.
#[derive(Debug)]
struct Opening {
    scenario: String,
    options: Vec<String>,
}

impl Opening {
    fn from_envelope(envelope: &Map<String, Value>) -> Result<Self, TurnFailure> {
        let scenario = text_field(envelope, "scenario")
            .filter(|s| !s.trim().is_empty())
            .ok_or(TurnFailure::MissingScenario)?;
        let options = option_list(envelope, "options");
        Ok(Self { scenario, options })
    }
}

/// The turn envelope:
/// `{consequence, reputation_change, stress_change, next_scenario, next_options}`.
/// Absent fields fall back to zero deltas and empty narrative.
#[derive(Debug)]
struct TurnOutcome {
    consequence: Option<String>,
    reputation_change: i64,
    stress_change: i64,
    next_scenario: String,
    next_options: Vec<String>,
}

impl TurnOutcome {
    fn from_envelope(envelope: &Map<String, Value>) -> Result<Self, TurnFailure> {
        Ok(Self {
            consequence: text_field(envelope, "consequence"),
            reputation_change: delta_field(envelope, "reputation_change")?,
            stress_change: delta_field(envelope, "stress_change")?,
            next_scenario: text_field(envelope, "next_scenario").unwrap_or_default(),
            next_options: option_list(envelope, "next_options"),
        })
    }
}

/// Stateless engine; cheap to clone and share across requests.
#[derive(Clone)]
pub struct GameEngine {
    llm: Arc<dyn PromptClient>,
    call_timeout: Duration,
}

impl GameEngine {
    pub fn new(llm: Arc<dyn PromptClient>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Starts a new game on day 1. Falls back to the fixed opening scenario
    /// if the model cannot provide one.
    pub async fn start_game(&self, role: &str, industry: &str) -> GameState {
        match self.try_start(role, industry).await {
            Ok(state) => {
                info!("Started game: role={role:?}, industry={industry:?}");
                state
            }
            Err(e) => {
                warn!("Opening scenario unavailable for {role:?}/{industry:?}, using fallback: {e}");
                GameState::with_fallback_opening(role, industry)
            }
        }
    }

    /// Plays one day. `action` is free text and is not checked against the
    /// offered options. Finished games come back unchanged; any other
    /// failure yields the retry ("glitch") state.
    pub async fn process_turn(&self, state: &GameState, action: &str) -> GameState {
        match self.try_turn(state, action).await {
            Ok(next) => next,
            Err(TurnFailure::GameFinished) => {
                warn!("Ignoring action on a finished game (day {})", state.day);
                state.clone()
            }
            Err(e) => {
                error!("Error in turn for day {}: {e}", state.day);
                state.glitch()
            }
        }
    }

    async fn try_start(&self, role: &str, industry: &str) -> Result<GameState, TurnFailure> {
        let vars = [
            ("role", role.to_string()),
            ("industry", industry.to_string()),
            ("json_only", JSON_ONLY_INSTRUCTION.to_string()),
        ];
        let envelope = self.ask(&prompts::OPENING, &vars).await?;
        let opening = Opening::from_envelope(&envelope)?;

        let options = if opening.options.is_empty() {
            fallback_options()
        } else {
            opening.options
        };

        Ok(GameState {
            current_scenario: opening.scenario,
            options,
            ..GameState::new(role, industry)
        })
    }

    async fn try_turn(&self, state: &GameState, action: &str) -> Result<GameState, TurnFailure> {
        if state.is_terminal() {
            return Err(TurnFailure::GameFinished);
        }

        let next_day = state.day.saturating_add(1);
        let vars = [
            ("role", state.role.clone()),
            ("industry", state.industry.clone()),
            ("day", state.day.to_string()),
            ("reputation", state.reputation.to_string()),
            ("stress", state.stress.to_string()),
            ("scenario", state.current_scenario.clone()),
            ("action", action.to_string()),
            ("next_day", next_day.to_string()),
            ("json_only", JSON_ONLY_INSTRUCTION.to_string()),
        ];
        let envelope = self.ask(&prompts::TURN, &vars).await?;
        let outcome = TurnOutcome::from_envelope(&envelope)?;

        Ok(advance(state, next_day, outcome))
    }

    /// One bounded call to the prompt client, parsed best-effort.
    async fn ask(
        &self,
        template: &PromptTemplate,
        vars: &PromptVars<'_>,
    ) -> Result<Map<String, Value>, TurnFailure> {
        let text = tokio::time::timeout(self.call_timeout, self.llm.generate(template, vars))
            .await
            .map_err(|_| TurnFailure::Timeout(self.call_timeout))??;
        Ok(extract_json_object(&text))
    }
}

/// Builds the next snapshot. The previous state is left untouched.
fn advance(state: &GameState, next_day: u32, outcome: TurnOutcome) -> GameState {
    let reputation = rules::apply_delta(state.reputation, outcome.reputation_change);
    let stress = rules::apply_delta(state.stress, outcome.stress_change);

    let mut next = GameState {
        day: next_day,
        reputation,
        stress,
        current_scenario: outcome.next_scenario,
        options: outcome.next_options,
        last_consequence: outcome.consequence,
        history: state.history.clone(),
        ..GameState::new(&state.role, &state.industry)
    };

    if let Some(ending) = rules::evaluate_ending(next_day, reputation, stress) {
        info!(
            "Game ended on day {next_day}: {ending:?} (reputation={reputation}, stress={stress})"
        );
        next.game_over = true;
        next.ending = Some(ending);
        next.message = Some(ending.message().to_string());
        next.options.clear();
    }

    next
}

/// Narrative field: strings as-is, other non-null values stringified.
fn text_field(envelope: &Map<String, Value>, field: &str) -> Option<String> {
    match envelope.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric delta: absent or null is 0, fractional values are rounded,
/// anything else is a malformed turn.
fn delta_field(envelope: &Map<String, Value>, field: &'static str) -> Result<i64, TurnFailure> {
    match envelope.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => Ok(n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.round() as i64))),
        Some(other) => Err(TurnFailure::MalformedDelta {
            field,
            value: other.to_string(),
        }),
    }
}

/// Up to three non-blank options; a non-list value yields none.
fn option_list(envelope: &Map<String, Value>, field: &str) -> Vec<String> {
    envelope
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.trim().is_empty())
                .take(MAX_OPTIONS)
                .collect()
        })
        .unwrap_or_default()
}
