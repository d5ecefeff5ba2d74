//! Client-visible projection of a room. Everything the wire carries comes
//! through here; `host_token` and per-participant drafts never do.

use serde::Serialize;

use crate::model::{
    Answers, CompletedRound, EndReason, FieldScores, GameConfig, GameStatus, Marks, Participant,
    ParticipantStatus, RoomState, Submission,
};
use crate::rules::score::round2;
use crate::util::clock;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub meta: RoomMeta,
    pub participants: Vec<ParticipantView>,
    pub counts: Counts,
    pub game: GameView,
}

impl RoomSnapshot {
    pub fn participant(&self, id: &str) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn completed_round(&self, round_number: u32) -> Option<&CompletedRoundView> {
        self.game
            .completed_rounds
            .iter()
            .find(|r| r.round_number == round_number)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMeta {
    pub room_code: String,
    pub host_name: String,
    pub max_participants: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    pub status: ParticipantStatus,
    pub is_host: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub admitted: usize,
    pub pending: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub status: GameStatus,
    pub started_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub finished_at: Option<String>,
    pub config: Option<GameConfig>,
    pub turn_order: Vec<String>,
    pub current_turn_index: usize,
    pub current_turn_participant_id: Option<String>,
    pub active_round: Option<ActiveRoundView>,
    pub completed_rounds: Vec<CompletedRoundView>,
    pub scoring: ScoringSummary,
}

/// Active-round projection: who has submitted, never what they answered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRoundView {
    pub round_number: u32,
    pub turn_participant_id: String,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: String,
    pub countdown_ends_at: String,
    pub ends_at: Option<String>,
    pub submissions: Vec<SubmissionStub>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStub {
    pub participant_id: String,
    pub participant_name: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRoundView {
    pub round_number: u32,
    pub turn_participant_id: String,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: String,
    pub countdown_ends_at: String,
    pub ends_at: Option<String>,
    pub submissions: Vec<SubmissionView>,
    pub ended_at: String,
    pub end_reason: EndReason,
    pub score_published_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub participant_id: String,
    pub participant_name: String,
    pub answers: Answers,
    pub submitted_at: String,
    pub review: Option<ReviewView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub marks: Marks,
    pub scores: FieldScores,
    pub marked_by_id: String,
    pub marked_by_name: String,
    pub marked_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSummary {
    pub rounds_per_player: u32,
    pub max_rounds: u32,
    pub rounds_played: usize,
    pub published_rounds: usize,
    pub pending_publication_rounds: Vec<u32>,
    pub used_numbers: Vec<u8>,
    pub available_numbers: Vec<u8>,
    pub is_complete: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub participant_id: String,
    pub participant_name: String,
    pub total_score: f64,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub round_number: u32,
    pub called_number: u8,
    pub active_letter: char,
    pub score: f64,
    pub cumulative_score: f64,
    pub reviewed: bool,
}

pub fn project(state: &RoomState) -> RoomSnapshot {
    let participants: Vec<ParticipantView> =
        state.participants.iter().map(participant_view).collect();

    let counts = Counts {
        admitted: state.count_with_status(ParticipantStatus::Admitted),
        pending: state.count_with_status(ParticipantStatus::Pending),
        rejected: state.count_with_status(ParticipantStatus::Rejected),
    };

    let game = &state.game;
    let game_view = GameView {
        status: game.status,
        started_at: game.started_at.map(clock::iso),
        cancelled_at: game.cancelled_at.map(clock::iso),
        finished_at: game.finished_at.map(clock::iso),
        config: game.config,
        turn_order: game.turn_order.clone(),
        current_turn_index: game.current_turn_index,
        current_turn_participant_id: state.current_caller().map(str::to_string),
        active_round: game.active_round.as_ref().map(active_round_view),
        completed_rounds: game.completed_rounds.iter().map(completed_round_view).collect(),
        scoring: scoring_summary(state),
    };

    RoomSnapshot {
        meta: RoomMeta {
            room_code: state.code.clone(),
            host_name: state.host_name.clone(),
            max_participants: state.max_participants,
        },
        participants,
        counts,
        game: game_view,
    }
}

fn participant_view(p: &Participant) -> ParticipantView {
    ParticipantView {
        id: p.id.clone(),
        name: p.name.clone(),
        status: p.status,
        is_host: p.is_host,
        created_at: clock::iso(p.created_at),
        updated_at: clock::iso(p.updated_at),
    }
}

fn active_round_view(round: &crate::model::ActiveRound) -> ActiveRoundView {
    ActiveRoundView {
        round_number: round.round_number,
        turn_participant_id: round.turn_participant_id.clone(),
        turn_participant_name: round.turn_participant_name.clone(),
        called_number: round.called_number,
        active_letter: round.active_letter,
        started_at: clock::iso(round.started_at),
        countdown_ends_at: clock::iso(round.countdown_ends_at),
        ends_at: round.ends_at.map(clock::iso),
        submissions: round
            .submissions
            .iter()
            .map(|s| SubmissionStub {
                participant_id: s.participant_id.clone(),
                participant_name: s.participant_name.clone(),
                submitted_at: clock::iso(s.submitted_at),
            })
            .collect(),
    }
}

fn completed_round_view(round: &CompletedRound) -> CompletedRoundView {
    CompletedRoundView {
        round_number: round.round_number,
        turn_participant_id: round.turn_participant_id.clone(),
        turn_participant_name: round.turn_participant_name.clone(),
        called_number: round.called_number,
        active_letter: round.active_letter,
        started_at: clock::iso(round.started_at),
        countdown_ends_at: clock::iso(round.countdown_ends_at),
        ends_at: round.ends_at.map(clock::iso),
        submissions: round.submissions.iter().map(submission_view).collect(),
        ended_at: clock::iso(round.ended_at),
        end_reason: round.end_reason,
        score_published_at: round.score_published_at.map(clock::iso),
    }
}

fn submission_view(s: &Submission) -> SubmissionView {
    SubmissionView {
        participant_id: s.participant_id.clone(),
        participant_name: s.participant_name.clone(),
        answers: s.answers.clone(),
        submitted_at: clock::iso(s.submitted_at),
        review: s.review.as_ref().map(|r| ReviewView {
            marks: r.marks,
            scores: r.scores,
            marked_by_id: r.marked_by_id.clone(),
            marked_by_name: r.marked_by_name.clone(),
            marked_at: clock::iso(r.marked_at),
        }),
    }
}

fn scoring_summary(state: &RoomState) -> ScoringSummary {
    let game = &state.game;
    let used_numbers = state.used_numbers();
    let available_numbers: Vec<u8> = (1..=26).filter(|n| !used_numbers.contains(n)).collect();
    let max_rounds = state.max_fair_rounds();

    let mut pending_publication_rounds: Vec<u32> = game
        .completed_rounds
        .iter()
        .filter(|r| !r.is_published())
        .map(|r| r.round_number)
        .collect();
    pending_publication_rounds.sort_unstable();

    ScoringSummary {
        rounds_per_player: state.rounds_per_player(),
        max_rounds,
        rounds_played: game.completed_rounds.len(),
        published_rounds: game.completed_rounds.iter().filter(|r| r.is_published()).count(),
        pending_publication_rounds,
        used_numbers,
        available_numbers,
        is_complete: game.completed_rounds.len() as u32 >= max_rounds && max_rounds > 0,
        leaderboard: leaderboard(state),
    }
}

/// Leaderboard over published rounds only, in round-number order per player.
fn leaderboard(state: &RoomState) -> Vec<LeaderboardEntry> {
    let mut published: Vec<&CompletedRound> = state
        .game
        .completed_rounds
        .iter()
        .filter(|r| r.is_published())
        .collect();
    published.sort_unstable_by_key(|r| r.round_number);

    let members: Vec<&Participant> = if state.game.turn_order.is_empty() {
        state.participants.iter().filter(|p| p.is_admitted()).collect()
    } else {
        state
            .game
            .turn_order
            .iter()
            .filter_map(|id| state.participant(id))
            .collect()
    };

    let mut entries: Vec<LeaderboardEntry> = members
        .into_iter()
        .map(|p| {
            let mut cumulative = 0.0;
            let history: Vec<HistoryEntry> = published
                .iter()
                .map(|round| {
                    let submission = round
                        .submissions
                        .iter()
                        .find(|s| s.participant_id == p.id);
                    let review = submission.and_then(|s| s.review.as_ref());
                    let score = review.map(|r| r.scores.total).unwrap_or(0.0);
                    cumulative = round2(cumulative + score);
                    HistoryEntry {
                        round_number: round.round_number,
                        called_number: round.called_number,
                        active_letter: round.active_letter,
                        score,
                        cumulative_score: cumulative,
                        reviewed: review.is_some(),
                    }
                })
                .collect();
            LeaderboardEntry {
                participant_id: p.id.clone(),
                participant_name: p.name.clone(),
                total_score: cumulative,
                history,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.participant_name.cmp(&b.participant_name))
    });
    entries
}
