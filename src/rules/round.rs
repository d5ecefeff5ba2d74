//! In-round transitions: calling a number, drafting, submitting, and the
//! three ways a round can end.

use crate::error::{RoomError, RoomResult};
use crate::events::Event;
use crate::model::{
    active_letter, ActiveRound, AnswersPatch, CompletedRound, EndReason, EndRule, GameStatus,
    ManualEndPolicy, RoomState, Submission, COUNTDOWN_MS,
};

use super::{require_admitted, require_in_progress, Transition};

/// The caller picks a number; the letter round begins after a 3s countdown.
pub fn call_number(
    state: &RoomState,
    participant_id: &str,
    number: u8,
    now: i64,
) -> RoomResult<Transition> {
    require_in_progress(state)?;
    let caller = require_admitted(state, participant_id)?;
    if state.current_caller() != Some(participant_id) {
        return Err(RoomError::forbidden("it is not your turn to call"));
    }
    if state.game.active_round.is_some() {
        return Err(RoomError::conflict("a round is already in progress"));
    }
    if state.game.completed_rounds.iter().any(|r| !r.is_published()) {
        return Err(RoomError::conflict(
            "previous round scores must be published first",
        ));
    }
    if !(1..=26).contains(&number) {
        return Err(RoomError::bad_request("number must be between 1 and 26"));
    }
    if state.used_numbers().contains(&number) {
        return Err(RoomError::conflict("number has already been called"));
    }
    if state.game.completed_rounds.len() as u32 >= state.max_fair_rounds() {
        return Err(RoomError::conflict("maximum fair rounds reached"));
    }

    let config = state.game.config.expect("config set when in progress");
    let countdown_ends_at = now + COUNTDOWN_MS;
    let ends_at = if config.end_rule == EndRule::FirstSubmission {
        None
    } else {
        Some(countdown_ends_at + i64::from(config.round_seconds) * 1_000)
    };

    let mut next = state.clone();
    next.game.active_round = Some(ActiveRound {
        round_number: state.game.completed_rounds.len() as u32 + 1,
        turn_participant_id: caller.id.clone(),
        turn_participant_name: caller.name.clone(),
        called_number: number,
        active_letter: active_letter(number),
        started_at: now,
        countdown_ends_at,
        ends_at,
        submissions: Vec::new(),
        drafts: Default::default(),
    });
    Ok(Transition::new(next, Event::TurnCalled))
}

fn open_round_guard<'a>(
    state: &'a RoomState,
    participant_id: &str,
    now: i64,
) -> RoomResult<&'a ActiveRound> {
    require_in_progress(state)?;
    require_admitted(state, participant_id)?;
    let round = state
        .game
        .active_round
        .as_ref()
        .ok_or_else(|| RoomError::not_found("no active round"))?;
    if !round.is_open(now) {
        return Err(RoomError::conflict("round has not started yet"));
    }
    if round.has_submitted(participant_id) {
        return Err(RoomError::conflict("answers already submitted"));
    }
    Ok(round)
}

/// Merge a partial draft; silent (drafts are revealed to no one).
pub fn update_draft(
    state: &RoomState,
    participant_id: &str,
    patch: &AnswersPatch,
    now: i64,
) -> RoomResult<Transition> {
    open_round_guard(state, participant_id, now)?;

    let mut next = state.clone();
    let round = next.game.active_round.as_mut().expect("guard checked round");
    let draft = round.drafts.entry(participant_id.to_string()).or_default();
    patch.apply_to(draft);
    Ok(Transition::silent(next))
}

/// Final answers: overlay the request onto the stored draft, then append.
/// Under FIRST_SUBMISSION/WHICHEVER_FIRST the first submission closes the
/// round for everyone.
pub fn submit_answers(
    state: &RoomState,
    participant_id: &str,
    patch: &AnswersPatch,
    now: i64,
) -> RoomResult<Transition> {
    open_round_guard(state, participant_id, now)?;
    let participant_name = state
        .participant(participant_id)
        .map(|p| p.name.clone())
        .expect("guard checked participant");

    let mut next = state.clone();
    let round = next.game.active_round.as_mut().expect("guard checked round");
    let mut answers = round.drafts.remove(participant_id).unwrap_or_default();
    patch.apply_to(&mut answers);
    round.submissions.push(Submission {
        participant_id: participant_id.to_string(),
        participant_name,
        answers,
        submitted_at: now,
        review: None,
    });

    let config = next.game.config.expect("config set when in progress");
    if config.end_rule.ends_on_first_submission() {
        let round = next.game.active_round.take().expect("round still active");
        let round_number = close_round(&mut next, round, EndReason::FirstSubmission, now);
        return Ok(Transition::new(
            next,
            Event::RoundEnded {
                reason: EndReason::FirstSubmission,
                round_number,
            },
        ));
    }

    Ok(Transition::new(
        next,
        Event::SubmissionReceived {
            participant_id: participant_id.to_string(),
        },
    ))
}

/// Manual early end, gated by the configured policy.
pub fn end_round_early(
    state: &RoomState,
    participant_id: &str,
    now: i64,
) -> RoomResult<Transition> {
    require_in_progress(state)?;
    let participant = require_admitted(state, participant_id)?;
    let round = state
        .game
        .active_round
        .as_ref()
        .ok_or_else(|| RoomError::not_found("no active round"))?;

    let config = state.game.config.expect("config set when in progress");
    let is_caller = round.turn_participant_id == participant_id;
    let allowed = match config.manual_end_policy {
        ManualEndPolicy::HostOrCaller => participant.is_host || is_caller,
        ManualEndPolicy::CallerOnly | ManualEndPolicy::CallerOrTimer => is_caller,
        ManualEndPolicy::None => false,
    };
    if !allowed {
        return Err(RoomError::forbidden(
            "ending the round early is not allowed",
        ));
    }

    let mut next = state.clone();
    let round = next.game.active_round.take().expect("round checked above");
    let round_number = close_round(&mut next, round, EndReason::ManualEnd, now);
    Ok(Transition::new(
        next,
        Event::RoundEnded {
            reason: EndReason::ManualEnd,
            round_number,
        },
    ))
}

/// Scheduler callback. Late fires (state moved on) return `None`.
pub fn timer_expired(state: &RoomState, now: i64) -> Option<Transition> {
    if state.game.status != GameStatus::InProgress {
        return None;
    }
    let round = state.game.active_round.as_ref()?;
    let ends_at = round.ends_at?;
    if ends_at > now {
        return None;
    }

    let mut next = state.clone();
    let round = next.game.active_round.take().expect("round present");
    let round_number = close_round(&mut next, round, EndReason::Timer, now);
    Some(Transition::new(
        next,
        Event::RoundEnded {
            reason: EndReason::Timer,
            round_number,
        },
    ))
}

/// Seal a round: force-submit everyone missing (draft or empty answers),
/// append the completed round, rotate the turn.
fn close_round(
    state: &mut RoomState,
    mut round: ActiveRound,
    reason: EndReason,
    now: i64,
) -> u32 {
    for participant_id in state.game.turn_order.clone() {
        if round.has_submitted(&participant_id) {
            continue;
        }
        let participant_name = state
            .participant(&participant_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let answers = round.drafts.remove(&participant_id).unwrap_or_default();
        round.submissions.push(Submission {
            participant_id,
            participant_name,
            answers,
            submitted_at: now,
            review: None,
        });
    }

    let round_number = round.round_number;
    state
        .game
        .completed_rounds
        .push(CompletedRound::from_active(round, reason, now));
    let players = state.game.turn_order.len();
    state.game.current_turn_index = (state.game.current_turn_index + 1) % players;
    round_number
}
