use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::career::rules::{self, Ending};

/// Scenario used when the opening scenario cannot be generated.
pub const FALLBACK_SCENARIO: &str =
    "You arrive at the office on your first day, but the internet is down.";
pub const FALLBACK_OPTIONS: [&str; 3] = ["Panic", "Try to fix it", "Go for coffee"];

pub const GLITCH_ERROR: &str = "Failed to process turn";
pub const GLITCH_SCENARIO: &str = "The simulation encountered a glitch. Please try again.";
pub const GLITCH_OPTION: &str = "Retry";

/// One snapshot of a 7-day game.
///
/// The whole game lives in this value: the client sends it back with every
/// action and receives a fresh snapshot, so the server keeps no sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub industry: String,
    pub day: u32,
    pub reputation: i32,
    pub stress: i32,
    pub current_scenario: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_consequence: Option<String>,
    /// Opaque to the server: whatever the client keeps here comes back
    /// untouched on every new snapshot.
    #[serde(default)]
    pub history: Vec<Value>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending: Option<Ending>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Only set on the glitch state returned when a turn fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GameState {
    /// Day 1 with starting stats and no scenario yet.
    pub fn new(role: &str, industry: &str) -> Self {
        Self {
            role: role.to_string(),
            industry: industry.to_string(),
            day: 1,
            reputation: rules::START_REPUTATION,
            stress: rules::START_STRESS,
            current_scenario: String::new(),
            options: Vec::new(),
            last_consequence: None,
            history: Vec::new(),
            game_over: false,
            ending: None,
            message: None,
            error: None,
        }
    }

    /// Day 1 with the fixed internet-outage scenario.
    pub fn with_fallback_opening(role: &str, industry: &str) -> Self {
        Self {
            current_scenario: FALLBACK_SCENARIO.to_string(),
            options: fallback_options(),
            ..Self::new(role, industry)
        }
    }

    /// The retry state handed back when a turn fails. Stats and day are the
    /// ones the turn started from.
    pub fn glitch(&self) -> Self {
        Self {
            role: self.role.clone(),
            industry: self.industry.clone(),
            day: self.day,
            reputation: self.reputation,
            stress: self.stress,
            current_scenario: GLITCH_SCENARIO.to_string(),
            options: vec![GLITCH_OPTION.to_string()],
            last_consequence: None,
            history: self.history.clone(),
            game_over: false,
            ending: None,
            message: None,
            error: Some(GLITCH_ERROR.to_string()),
        }
    }

    /// No transitions leave a finished game.
    pub fn is_terminal(&self) -> bool {
        self.game_over || self.day > rules::MAX_DAYS
    }
}

pub fn fallback_options() -> Vec<String> {
    FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_starting_stats() {
        let state = GameState::new("Engineer", "Tech");
        assert_eq!(state.day, 1);
        assert_eq!(state.reputation, 50);
        assert_eq!(state.stress, 20);
        assert!(!state.game_over);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_glitch_keeps_original_stats() {
        let mut state = GameState::with_fallback_opening("Nurse", "Health");
        state.day = 4;
        state.reputation = 12;
        state.stress = 88;
        state.last_consequence = Some("You skipped lunch.".to_string());

        let glitch = state.glitch();
        assert_eq!(glitch.day, 4);
        assert_eq!(glitch.reputation, 12);
        assert_eq!(glitch.stress, 88);
        assert_eq!(glitch.role, "Nurse");
        assert_eq!(glitch.error.as_deref(), Some(GLITCH_ERROR));
        assert_eq!(glitch.options, vec!["Retry".to_string()]);
        assert!(glitch.last_consequence.is_none());
    }

    #[test]
    fn test_history_survives_glitch() {
        let mut state = GameState::new("Nurse", "Health");
        state.history = vec![serde_json::json!({"day": 1, "action": "Triage"})];

        assert_eq!(state.glitch().history, state.history);
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let state = GameState::with_fallback_opening("Engineer", "Tech");
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["day"], 1);
        assert_eq!(value["game_over"], false);
        assert!(value.get("ending").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("last_consequence").is_none());
        assert_eq!(value["history"], serde_json::json!([]));
    }

    #[test]
    fn test_deserializes_minimal_client_state() {
        // Glitch states from older clients carried no role/industry/options.
        let json = r#"{
            "day": 3,
            "reputation": 40,
            "stress": 35,
            "current_scenario": "A client is shouting.",
            "ending": null
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.day, 3);
        assert!(state.role.is_empty());
        assert!(state.options.is_empty());
        assert!(state.history.is_empty());
        assert!(state.ending.is_none());
    }

    #[test]
    fn test_client_history_round_trips() {
        let json = r#"{
            "day": 2,
            "reputation": 55,
            "stress": 25,
            "current_scenario": "Standup ran long.",
            "history": [{"day": 1, "action": "Ship it"}, "free-form note"]
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.history.len(), 2);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["history"][0]["action"], "Ship it");
        assert_eq!(value["history"][1], "free-form note");
    }

    #[test]
    fn test_ending_serializes_as_plain_name() {
        let mut state = GameState::new("Engineer", "Tech");
        state.game_over = true;
        state.ending = Some(Ending::Burnout);
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["ending"], "Burnout");
    }

    #[test]
    fn test_day_eight_is_terminal_even_without_flag() {
        let mut state = GameState::new("Engineer", "Tech");
        state.day = 8;
        assert!(state.is_terminal());
    }
}
