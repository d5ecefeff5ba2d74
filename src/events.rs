//! Domain events produced by transitions and the push messages built from
//! them. Every broadcast carries the fresh snapshot so clients can resync
//! unconditionally; the extra fields are listener convenience.

use serde::Serialize;

use crate::model::EndReason;
use crate::snapshot::{CompletedRoundView, ParticipantView, RoomSnapshot};

/// What a transition wants announced, by reference into the new state.
#[derive(Debug, Clone)]
pub enum Event {
    JoinRequest { participant_id: String },
    AdmissionUpdate { participant_id: String },
    GameStarted,
    TurnCalled,
    SubmissionReceived { participant_id: String },
    RoundEnded { reason: EndReason, round_number: u32 },
    SubmissionScored { participant_id: String, round_number: u32 },
    RoundScoresPublished { round_number: u32 },
    RoundScoresDiscarded { round_number: u32 },
    GameCancelled,
    GameEnded,
}

/// Push-stream message shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Connected,
    Presence {
        count: usize,
    },
    Snapshot {
        snapshot: RoomSnapshot,
    },
    JoinRequest {
        participant: ParticipantView,
        snapshot: RoomSnapshot,
    },
    AdmissionUpdate {
        participant: ParticipantView,
        snapshot: RoomSnapshot,
    },
    GameStarted {
        snapshot: RoomSnapshot,
    },
    TurnCalled {
        snapshot: RoomSnapshot,
    },
    SubmissionReceived {
        participant_id: String,
        snapshot: RoomSnapshot,
    },
    RoundEnded {
        reason: EndReason,
        completed_round: CompletedRoundView,
        snapshot: RoomSnapshot,
    },
    SubmissionScored {
        participant_id: String,
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    RoundScoresPublished {
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    RoundScoresDiscarded {
        round_number: u32,
        snapshot: RoomSnapshot,
    },
    GameCancelled {
        snapshot: RoomSnapshot,
    },
    GameEnded {
        snapshot: RoomSnapshot,
    },
}

impl Event {
    /// Pair the event with the snapshot taken after the transition. The
    /// referenced participant/round is present in that snapshot by
    /// construction.
    pub fn into_server_event(self, snapshot: RoomSnapshot) -> ServerEvent {
        match self {
            Event::JoinRequest { participant_id } => ServerEvent::JoinRequest {
                participant: snapshot
                    .participant(&participant_id)
                    .cloned()
                    .expect("join participant in snapshot"),
                snapshot,
            },
            Event::AdmissionUpdate { participant_id } => ServerEvent::AdmissionUpdate {
                participant: snapshot
                    .participant(&participant_id)
                    .cloned()
                    .expect("reviewed participant in snapshot"),
                snapshot,
            },
            Event::GameStarted => ServerEvent::GameStarted { snapshot },
            Event::TurnCalled => ServerEvent::TurnCalled { snapshot },
            Event::SubmissionReceived { participant_id } => ServerEvent::SubmissionReceived {
                participant_id,
                snapshot,
            },
            Event::RoundEnded {
                reason,
                round_number,
            } => ServerEvent::RoundEnded {
                reason,
                completed_round: snapshot
                    .completed_round(round_number)
                    .cloned()
                    .expect("completed round in snapshot"),
                snapshot,
            },
            Event::SubmissionScored {
                participant_id,
                round_number,
            } => ServerEvent::SubmissionScored {
                participant_id,
                round_number,
                snapshot,
            },
            Event::RoundScoresPublished { round_number } => ServerEvent::RoundScoresPublished {
                round_number,
                snapshot,
            },
            Event::RoundScoresDiscarded { round_number } => ServerEvent::RoundScoresDiscarded {
                round_number,
                snapshot,
            },
            Event::GameCancelled => ServerEvent::GameCancelled { snapshot },
            Event::GameEnded => ServerEvent::GameEnded { snapshot },
        }
    }
}
