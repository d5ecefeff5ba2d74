//! Room state value: participants, game, rounds. Immutable by convention;
//! transitions clone and replace under the owning actor.

mod game;
mod participant;
mod room;

pub use game::{
    active_letter, ActiveRound, Answers, AnswersPatch, CompletedRound, EndReason, EndRule,
    FieldScores, Game, GameConfig, GameConfigInput, GameStatus, ManualEndPolicy, Marks, Review,
    ScoringMode, Submission, COUNTDOWN_MS,
};
pub use participant::{Participant, ParticipantStatus, HOST_ID};
pub use room::RoomState;
