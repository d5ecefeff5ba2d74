//! Lobby-phase transitions: room creation, join requests, host review,
//! game start.

use crate::error::{RoomError, RoomResult};
use crate::events::Event;
use crate::model::{
    EndRule, Game, GameConfigInput, GameStatus, ManualEndPolicy, Participant, ParticipantStatus,
    RoomState,
};
use crate::util::text;

use super::{require_host, Transition};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 24;

fn validated_name(raw: &str) -> RoomResult<String> {
    let name = text::normalize(raw);
    let chars = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(RoomError::bad_request(format!(
            "name must be {NAME_MIN_CHARS}-{NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name)
}

/// Initial state for a fresh room: LOBBY with the host already admitted.
pub fn create_room(
    code: String,
    host_name: &str,
    max_participants: u8,
    host_token: String,
    now: i64,
) -> RoomResult<RoomState> {
    let host_name = validated_name(host_name)?;
    if !(1..=10).contains(&max_participants) {
        return Err(RoomError::bad_request(
            "maxParticipants must be between 1 and 10",
        ));
    }
    Ok(RoomState {
        code,
        host_name: host_name.clone(),
        max_participants,
        host_token,
        created_at: now,
        participants: vec![Participant::host(host_name, now)],
        game: Game::new(),
    })
}

/// A visitor asks to join. Only valid while the room is still in LOBBY.
pub fn submit_join(
    state: &RoomState,
    participant_id: String,
    raw_name: &str,
    now: i64,
) -> RoomResult<Transition> {
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::gone("room is no longer accepting join requests"));
    }
    let name = validated_name(raw_name)?;
    if state.name_taken(&name) {
        return Err(RoomError::conflict("name is already taken"));
    }
    if state.admitted_count() >= state.max_participants as usize {
        return Err(RoomError::conflict("room is full"));
    }

    let mut next = state.clone();
    next.participants
        .push(Participant::pending(participant_id.clone(), name, now));
    Ok(Transition::new(next, Event::JoinRequest { participant_id }))
}

/// Host approves or rejects a pending join request.
pub fn review_join(
    state: &RoomState,
    host_token: &str,
    request_id: &str,
    approve: bool,
    now: i64,
) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::conflict("game already started"));
    }
    let target = state
        .participant(request_id)
        .ok_or_else(|| RoomError::not_found("join request not found"))?;
    if target.status != ParticipantStatus::Pending {
        return Err(RoomError::conflict("join request already reviewed"));
    }
    if approve && state.admitted_count() >= state.max_participants as usize {
        return Err(RoomError::conflict("room is full"));
    }

    let mut next = state.clone();
    let participant = next
        .participant_mut(request_id)
        .expect("pending participant still present");
    participant.status = if approve {
        ParticipantStatus::Admitted
    } else {
        ParticipantStatus::Rejected
    };
    participant.updated_at = now;
    Ok(Transition::new(
        next,
        Event::AdmissionUpdate {
            participant_id: request_id.to_string(),
        },
    ))
}

/// Host starts the game: freezes the admitted roster into the turn order
/// and drops everyone else.
pub fn start_game(
    state: &RoomState,
    host_token: &str,
    config: Option<GameConfigInput>,
    now: i64,
) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::conflict("game already started"));
    }
    if state.count_with_status(ParticipantStatus::Pending) > 0 {
        return Err(RoomError::conflict(
            "pending join requests must be reviewed first",
        ));
    }
    if state.admitted_count() < 2 {
        return Err(RoomError::conflict(
            "at least two admitted participants are required",
        ));
    }

    let config = config.unwrap_or_default().resolve();
    if !(5..=120).contains(&config.round_seconds) {
        return Err(RoomError::bad_request(
            "roundSeconds must be between 5 and 120",
        ));
    }
    if config.manual_end_policy == ManualEndPolicy::CallerOrTimer
        && config.end_rule == EndRule::FirstSubmission
    {
        return Err(RoomError::bad_request(
            "CALLER_OR_TIMER requires a round timer",
        ));
    }

    let mut next = state.clone();
    next.participants.retain(|p| p.is_admitted());
    next.game.turn_order = next.participants.iter().map(|p| p.id.clone()).collect();
    if next.max_fair_rounds() < 1 {
        return Err(RoomError::conflict("too many participants for a fair game"));
    }
    next.game.current_turn_index = 0;
    next.game.config = Some(config);
    next.game.status = GameStatus::InProgress;
    next.game.started_at = Some(now);
    Ok(Transition::new(next, Event::GameStarted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::ScoringMode;

    pub(crate) fn fresh_room() -> RoomState {
        create_room("QZ23AB".into(), "Qudus", 4, "token".into(), 1_000).unwrap()
    }

    #[test]
    fn create_validates_inputs() {
        assert_eq!(
            create_room("A".repeat(6), "Q", 4, "t".into(), 0)
                .unwrap_err()
                .kind,
            ErrorKind::BadRequest
        );
        assert!(create_room("A".repeat(6), "Al", 1, "t".into(), 0).is_ok());
        assert!(create_room("A".repeat(6), &"x".repeat(24), 10, "t".into(), 0).is_ok());
        assert_eq!(
            create_room("A".repeat(6), &"x".repeat(25), 4, "t".into(), 0)
                .unwrap_err()
                .kind,
            ErrorKind::BadRequest
        );
        assert_eq!(
            create_room("A".repeat(6), "Al", 0, "t".into(), 0)
                .unwrap_err()
                .kind,
            ErrorKind::BadRequest
        );
        assert_eq!(
            create_room("A".repeat(6), "Al", 11, "t".into(), 0)
                .unwrap_err()
                .kind,
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn join_normalises_and_rejects_duplicates() {
        let state = fresh_room();
        let tr = submit_join(&state, "p1".into(), "  Ada   Lovelace ", 2_000).unwrap();
        assert_eq!(tr.state.participants[1].name, "Ada Lovelace");
        assert_eq!(
            tr.state.participants[1].status,
            ParticipantStatus::Pending
        );

        let err = submit_join(&tr.state, "p2".into(), "ada lovelace", 2_100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn join_rejects_host_name_collision() {
        let state = fresh_room();
        let err = submit_join(&state, "p1".into(), "QUDUS", 2_000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn review_requires_pending_target() {
        let state = fresh_room();
        let state = submit_join(&state, "p1".into(), "Ada", 2_000).unwrap().state;
        let state = review_join(&state, "token", "p1", true, 3_000).unwrap().state;
        assert_eq!(
            state.participant("p1").unwrap().status,
            ParticipantStatus::Admitted
        );

        let err = review_join(&state, "token", "p1", false, 3_100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = review_join(&state, "token", "ghost", true, 3_100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = review_join(&state, "bad", "p1", true, 3_100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn admission_respects_capacity() {
        let state = create_room("QZ23AB".into(), "Qudus", 1, "token".into(), 0).unwrap();
        let state = submit_join(&state, "p1".into(), "Ada", 1_000).unwrap_err();
        // Host already fills the single seat.
        assert_eq!(state.kind, ErrorKind::Conflict);
    }

    #[test]
    fn start_requires_reviewed_lobby_and_two_players() {
        let state = fresh_room();
        let err = start_game(&state, "token", None, 5_000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict); // host alone

        let state = submit_join(&state, "p1".into(), "Ada", 2_000).unwrap().state;
        let err = start_game(&state, "token", None, 5_000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict); // pending review

        let state = review_join(&state, "token", "p1", true, 3_000).unwrap().state;
        let tr = start_game(&state, "token", None, 5_000).unwrap();
        assert_eq!(tr.state.game.status, GameStatus::InProgress);
        assert_eq!(tr.state.game.turn_order, vec!["host", "p1"]);
        assert_eq!(tr.state.game.current_turn_index, 0);
        let config = tr.state.game.config.unwrap();
        assert_eq!(config.round_seconds, 60);
        assert_eq!(config.scoring_mode, ScoringMode::Fixed10);
    }

    #[test]
    fn start_purges_rejected_and_pending_free_lobby() {
        let state = fresh_room();
        let state = submit_join(&state, "p1".into(), "Ada", 2_000).unwrap().state;
        let state = submit_join(&state, "p2".into(), "Bea", 2_100).unwrap().state;
        let state = review_join(&state, "token", "p1", true, 3_000).unwrap().state;
        let state = review_join(&state, "token", "p2", false, 3_100).unwrap().state;
        let state = start_game(&state, "token", None, 5_000).unwrap().state;
        assert_eq!(state.participants.len(), 2);
        assert!(state.participant("p2").is_none());
    }

    #[test]
    fn start_validates_config() {
        let state = fresh_room();
        let state = submit_join(&state, "p1".into(), "Ada", 2_000).unwrap().state;
        let state = review_join(&state, "token", "p1", true, 3_000).unwrap().state;

        for seconds in [4, 121] {
            let input = GameConfigInput {
                round_seconds: Some(seconds),
                ..Default::default()
            };
            let err = start_game(&state, "token", Some(input), 5_000).unwrap_err();
            assert_eq!(err.kind, ErrorKind::BadRequest);
        }
        for seconds in [5, 120] {
            let input = GameConfigInput {
                round_seconds: Some(seconds),
                ..Default::default()
            };
            assert!(start_game(&state, "token", Some(input), 5_000).is_ok());
        }

        let input = GameConfigInput {
            end_rule: Some(EndRule::FirstSubmission),
            manual_end_policy: Some(ManualEndPolicy::CallerOrTimer),
            ..Default::default()
        };
        let err = start_game(&state, "token", Some(input), 5_000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn join_after_terminal_is_gone() {
        let state = fresh_room();
        let mut cancelled = state.clone();
        cancelled.game.status = GameStatus::Cancelled;
        let err = submit_join(&cancelled, "p1".into(), "Ada", 2_000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Gone);
    }
}
