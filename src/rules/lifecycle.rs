//! Terminal transitions: cancelling a game and ending it with publication.

use crate::error::{RoomError, RoomResult};
use crate::events::Event;
use crate::model::{GameStatus, RoomState};

use super::{require_host, require_in_progress, Transition};

/// Host aborts the game from LOBBY or IN_PROGRESS. The active round and any
/// scheduled deadline die with it.
pub fn cancel_game(state: &RoomState, host_token: &str, now: i64) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    if state.game.status.is_terminal() {
        return Err(RoomError::conflict("game is already over"));
    }

    let mut next = state.clone();
    next.game.active_round = None;
    next.game.status = GameStatus::Cancelled;
    next.game.cancelled_at = Some(now);
    Ok(Transition::new(next, Event::GameCancelled))
}

/// Host finishes the game. Completed rounds that are fully reviewed but not
/// yet published are stamped now; partially reviewed rounds stay
/// unpublished and never reach the leaderboard.
pub fn end_game(state: &RoomState, host_token: &str, now: i64) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    require_in_progress(state)?;

    let mut next = state.clone();
    for round in &mut next.game.completed_rounds {
        if !round.is_published() && round.is_fully_reviewed() {
            round.score_published_at = Some(now);
        }
    }
    next.game.active_round = None;
    next.game.status = GameStatus::Finished;
    next.game.finished_at = Some(now);
    Ok(Transition::new(next, Event::GameEnded))
}
