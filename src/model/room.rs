use super::game::{CompletedRound, Game, GameStatus};
use super::participant::{Participant, ParticipantStatus};

/// Authoritative state of one room. Owned exclusively by the room actor;
/// transitions build a replacement value rather than mutating in place.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub code: String,
    pub host_name: String,
    pub max_participants: u8,
    pub host_token: String,
    pub created_at: i64,
    pub participants: Vec<Participant>,
    pub game: Game,
}

impl RoomState {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Case-insensitive name collision check over all participants.
    pub fn name_taken(&self, normalized: &str) -> bool {
        let lowered = normalized.to_lowercase();
        self.participants
            .iter()
            .any(|p| p.name.to_lowercase() == lowered)
    }

    pub fn count_with_status(&self, status: ParticipantStatus) -> usize {
        self.participants
            .iter()
            .filter(|p| p.status == status)
            .count()
    }

    pub fn admitted_count(&self) -> usize {
        self.count_with_status(ParticipantStatus::Admitted)
    }

    /// The participant whose turn it is, if the game is running.
    pub fn current_caller(&self) -> Option<&str> {
        if self.game.status != GameStatus::InProgress {
            return None;
        }
        self.game
            .turn_order
            .get(self.game.current_turn_index)
            .map(String::as_str)
    }

    /// Player count the fair-round limit is computed against. Before the
    /// game starts `turn_order` is empty, so fall back to admitted count.
    pub fn fair_player_count(&self) -> usize {
        if self.game.turn_order.is_empty() {
            self.admitted_count()
        } else {
            self.game.turn_order.len()
        }
    }

    pub fn rounds_per_player(&self) -> u32 {
        let players = self.fair_player_count() as u32;
        if players == 0 {
            0
        } else {
            26 / players
        }
    }

    /// `⌊26 / players⌋ · players`: every player gets the same turn count.
    pub fn max_fair_rounds(&self) -> u32 {
        self.rounds_per_player() * self.fair_player_count() as u32
    }

    /// Called numbers across completed and active rounds, ascending.
    pub fn used_numbers(&self) -> Vec<u8> {
        let mut used: Vec<u8> = self
            .game
            .completed_rounds
            .iter()
            .map(|r| r.called_number)
            .chain(self.game.active_round.iter().map(|r| r.called_number))
            .collect();
        used.sort_unstable();
        used
    }

    pub fn completed_round(&self, round_number: u32) -> Option<&CompletedRound> {
        self.game
            .completed_rounds
            .iter()
            .find(|r| r.round_number == round_number)
    }

    pub fn completed_round_mut(&mut self, round_number: u32) -> Option<&mut CompletedRound> {
        self.game
            .completed_rounds
            .iter_mut()
            .find(|r| r.round_number == round_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HOST_ID;

    fn room_with_admitted(n: usize) -> RoomState {
        let mut state = RoomState {
            code: "AB23CD".into(),
            host_name: "Host".into(),
            max_participants: 10,
            host_token: "secret".into(),
            created_at: 0,
            participants: vec![Participant::host("Host".into(), 0)],
            game: Game::new(),
        };
        for i in 1..n {
            let mut p = Participant::pending(format!("p{i}"), format!("Player {i}"), 0);
            p.status = ParticipantStatus::Admitted;
            state.participants.push(p);
        }
        state.game.turn_order = state.participants.iter().map(|p| p.id.clone()).collect();
        state
    }

    #[test]
    fn fair_rounds_examples() {
        assert_eq!(room_with_admitted(2).max_fair_rounds(), 26);
        assert_eq!(room_with_admitted(3).max_fair_rounds(), 24);
        assert_eq!(room_with_admitted(10).max_fair_rounds(), 20);
        assert_eq!(room_with_admitted(10).rounds_per_player(), 2);
    }

    #[test]
    fn host_is_always_first_participant() {
        let state = room_with_admitted(4);
        assert_eq!(state.participants[0].id, HOST_ID);
        assert!(state.participants[0].is_host);
    }
}
