//! Pure transitions: `(state, command, now) -> (state', event)` or a tagged
//! failure. No I/O and no clock reads; ids and `now` come in as arguments so
//! every function is deterministic and directly testable.

pub mod lifecycle;
pub mod lobby;
pub mod round;
pub mod score;

pub use lifecycle::{cancel_game, end_game};
pub use lobby::{create_room, review_join, start_game, submit_join};
pub use round::{call_number, end_round_early, submit_answers, timer_expired, update_draft};
pub use score::{discard_round, publish_round, score_submission};

use crate::error::{RoomError, RoomResult};
use crate::events::Event;
use crate::model::{GameStatus, Participant, RoomState};

/// Successful transition: the replacement state plus at most one event to
/// broadcast. Commands that must stay silent (draft updates) carry `None`.
#[derive(Debug)]
pub struct Transition {
    pub state: RoomState,
    pub event: Option<Event>,
}

impl Transition {
    pub fn new(state: RoomState, event: Event) -> Self {
        Self {
            state,
            event: Some(event),
        }
    }

    pub fn silent(state: RoomState) -> Self {
        Self { state, event: None }
    }
}

pub(crate) fn require_host(state: &RoomState, token: &str) -> RoomResult<()> {
    if token.is_empty() || token != state.host_token {
        return Err(RoomError::unauthorized("invalid host token"));
    }
    Ok(())
}

pub(crate) fn require_in_progress(state: &RoomState) -> RoomResult<()> {
    if state.game.status != GameStatus::InProgress {
        return Err(RoomError::conflict("game is not in progress"));
    }
    Ok(())
}

/// Look up a participant that is allowed to play.
pub(crate) fn require_admitted<'a>(
    state: &'a RoomState,
    participant_id: &str,
) -> RoomResult<&'a Participant> {
    let participant = state
        .participant(participant_id)
        .ok_or_else(|| RoomError::not_found("participant not found"))?;
    if !participant.is_admitted() {
        return Err(RoomError::forbidden("only admitted participants may play"));
    }
    Ok(participant)
}
