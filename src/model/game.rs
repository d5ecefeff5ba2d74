use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::util::text;

/// Input lock after a number is called, in milliseconds.
pub const COUNTDOWN_MS: i64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Lobby,
    InProgress,
    Cancelled,
    Finished,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Cancelled | GameStatus::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndRule {
    Timer,
    FirstSubmission,
    WhicheverFirst,
}

impl EndRule {
    /// Whether the first submission closes the round immediately.
    pub fn ends_on_first_submission(self) -> bool {
        matches!(self, EndRule::FirstSubmission | EndRule::WhicheverFirst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManualEndPolicy {
    HostOrCaller,
    CallerOnly,
    CallerOrTimer,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    #[serde(rename = "FIXED_10")]
    Fixed10,
    #[serde(rename = "SHARED_10")]
    Shared10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    Timer,
    FirstSubmission,
    ManualEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub round_seconds: u32,
    pub end_rule: EndRule,
    pub manual_end_policy: ManualEndPolicy,
    pub scoring_mode: ScoringMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60,
            end_rule: EndRule::Timer,
            manual_end_policy: ManualEndPolicy::HostOrCaller,
            scoring_mode: ScoringMode::Fixed10,
        }
    }
}

/// Partial config supplied on game start; unset fields take defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfigInput {
    pub round_seconds: Option<u32>,
    pub end_rule: Option<EndRule>,
    pub manual_end_policy: Option<ManualEndPolicy>,
    pub scoring_mode: Option<ScoringMode>,
}

impl GameConfigInput {
    pub fn resolve(self) -> GameConfig {
        let defaults = GameConfig::default();
        GameConfig {
            round_seconds: self.round_seconds.unwrap_or(defaults.round_seconds),
            end_rule: self.end_rule.unwrap_or(defaults.end_rule),
            manual_end_policy: self
                .manual_end_policy
                .unwrap_or(defaults.manual_end_policy),
            scoring_mode: self.scoring_mode.unwrap_or(defaults.scoring_mode),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Answers {
    pub name: String,
    pub animal: String,
    pub place: String,
    pub thing: String,
    pub food: String,
}

impl Answers {
    pub fn fields(&self) -> [&str; 5] {
        [&self.name, &self.animal, &self.place, &self.thing, &self.food]
    }
}

/// Partial answers from a draft or submit request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswersPatch {
    pub name: Option<String>,
    pub animal: Option<String>,
    pub place: Option<String>,
    pub thing: Option<String>,
    pub food: Option<String>,
}

impl AnswersPatch {
    /// Overlay the present fields onto `answers`, normalised and truncated.
    pub fn apply_to(&self, answers: &mut Answers) {
        if let Some(v) = &self.name {
            answers.name = text::normalize_answer(v);
        }
        if let Some(v) = &self.animal {
            answers.animal = text::normalize_answer(v);
        }
        if let Some(v) = &self.place {
            answers.place = text::normalize_answer(v);
        }
        if let Some(v) = &self.thing {
            answers.thing = text::normalize_answer(v);
        }
        if let Some(v) = &self.food {
            answers.food = text::normalize_answer(v);
        }
    }
}

/// Host marks, one per answer field. All five are required on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marks {
    pub name: bool,
    pub animal: bool,
    pub place: bool,
    pub thing: bool,
    pub food: bool,
}

impl Marks {
    pub fn fields(&self) -> [bool; 5] {
        [self.name, self.animal, self.place, self.thing, self.food]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldScores {
    pub name: f64,
    pub animal: f64,
    pub place: f64,
    pub thing: f64,
    pub food: f64,
    pub total: f64,
}

impl FieldScores {
    pub fn from_fields(fields: [f64; 5], total: f64) -> Self {
        Self {
            name: fields[0],
            animal: fields[1],
            place: fields[2],
            thing: fields[3],
            food: fields[4],
            total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Review {
    pub marks: Marks,
    pub scores: FieldScores,
    pub marked_by_id: String,
    pub marked_by_name: String,
    pub marked_at: i64,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub participant_id: String,
    pub participant_name: String,
    pub answers: Answers,
    pub submitted_at: i64,
    pub review: Option<Review>,
}

/// Letter for a called number: 1 → A, 26 → Z.
pub fn active_letter(n: u8) -> char {
    (64 + n) as char
}

#[derive(Debug, Clone)]
pub struct ActiveRound {
    pub round_number: u32,
    pub turn_participant_id: String,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: i64,
    pub countdown_ends_at: i64,
    pub ends_at: Option<i64>,
    pub submissions: Vec<Submission>,
    pub drafts: HashMap<String, Answers>,
}

impl ActiveRound {
    /// Inputs are locked during the countdown.
    pub fn is_open(&self, now: i64) -> bool {
        now >= self.countdown_ends_at
    }

    pub fn has_submitted(&self, participant_id: &str) -> bool {
        self.submissions
            .iter()
            .any(|s| s.participant_id == participant_id)
    }
}

#[derive(Debug, Clone)]
pub struct CompletedRound {
    pub round_number: u32,
    pub turn_participant_id: String,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: i64,
    pub countdown_ends_at: i64,
    pub ends_at: Option<i64>,
    pub submissions: Vec<Submission>,
    pub ended_at: i64,
    pub end_reason: EndReason,
    pub score_published_at: Option<i64>,
}

impl CompletedRound {
    /// Seal an active round; drafts are dropped here and never surface.
    pub fn from_active(round: ActiveRound, end_reason: EndReason, ended_at: i64) -> Self {
        Self {
            round_number: round.round_number,
            turn_participant_id: round.turn_participant_id,
            turn_participant_name: round.turn_participant_name,
            called_number: round.called_number,
            active_letter: round.active_letter,
            started_at: round.started_at,
            countdown_ends_at: round.countdown_ends_at,
            ends_at: round.ends_at,
            submissions: round.submissions,
            ended_at,
            end_reason,
            score_published_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.score_published_at.is_some()
    }

    pub fn is_fully_reviewed(&self) -> bool {
        self.submissions.iter().all(|s| s.review.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    pub status: GameStatus,
    pub started_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub config: Option<GameConfig>,
    pub turn_order: Vec<String>,
    pub current_turn_index: usize,
    pub active_round: Option<ActiveRound>,
    pub completed_rounds: Vec<CompletedRound>,
}

impl Game {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Lobby,
            started_at: None,
            cancelled_at: None,
            finished_at: None,
            config: None,
            turn_order: Vec::new(),
            current_turn_index: 0,
            active_round: None,
            completed_rounds: Vec::new(),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_one_to_twenty_six() {
        assert_eq!(active_letter(1), 'A');
        assert_eq!(active_letter(3), 'C');
        assert_eq!(active_letter(26), 'Z');
    }

    #[test]
    fn config_input_overlays_defaults() {
        let input = GameConfigInput {
            round_seconds: Some(15),
            end_rule: Some(EndRule::WhicheverFirst),
            ..Default::default()
        };
        let config = input.resolve();
        assert_eq!(config.round_seconds, 15);
        assert_eq!(config.end_rule, EndRule::WhicheverFirst);
        assert_eq!(config.manual_end_policy, ManualEndPolicy::HostOrCaller);
        assert_eq!(config.scoring_mode, ScoringMode::Fixed10);
    }

    #[test]
    fn scoring_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&ScoringMode::Fixed10).unwrap(),
            "\"FIXED_10\""
        );
        assert_eq!(
            serde_json::to_string(&ScoringMode::Shared10).unwrap(),
            "\"SHARED_10\""
        );
        assert_eq!(
            serde_json::to_string(&EndRule::WhicheverFirst).unwrap(),
            "\"WHICHEVER_FIRST\""
        );
    }
}
