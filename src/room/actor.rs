//! The room actor: one task per room owning the state, applying every
//! command in arrival order, running the round deadline, and fanning out
//! events. Nothing outside this task ever touches a `RoomState`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use crate::error::{RoomError, RoomResult};
use crate::events::ServerEvent;
use crate::model::{AnswersPatch, GameConfigInput, Marks, RoomState};
use crate::rules::{self, Transition};
use crate::snapshot::{self, ParticipantView, RoomSnapshot};
use crate::util::{clock, id};

use super::hub::Hub;

/// Command queue depth per room; producers backpressure beyond this.
pub const COMMAND_BUFFER: usize = 64;

pub type Responder<T> = oneshot::Sender<RoomResult<T>>;

/// Accepted join request: the id doubles as the admission request id.
#[derive(Debug)]
pub struct JoinAccepted {
    pub request_id: String,
    pub participant: ParticipantView,
}

/// A live push stream handed to one WebSocket connection.
#[derive(Debug)]
pub struct Subscription {
    pub subscriber_id: u64,
    pub events: mpsc::Receiver<ServerEvent>,
}

#[derive(Debug)]
pub enum Command {
    SubmitJoin {
        name: String,
        reply: Responder<JoinAccepted>,
    },
    ReviewJoin {
        host_token: String,
        request_id: String,
        approve: bool,
        reply: Responder<RoomSnapshot>,
    },
    StartGame {
        host_token: String,
        config: Option<GameConfigInput>,
        reply: Responder<RoomSnapshot>,
    },
    CallNumber {
        participant_id: String,
        number: u8,
        reply: Responder<RoomSnapshot>,
    },
    UpdateDraft {
        participant_id: String,
        answers: AnswersPatch,
        reply: Responder<()>,
    },
    SubmitAnswers {
        participant_id: String,
        answers: AnswersPatch,
        reply: Responder<RoomSnapshot>,
    },
    EndRoundEarly {
        participant_id: String,
        reply: Responder<RoomSnapshot>,
    },
    ScoreSubmission {
        host_token: String,
        round_number: u32,
        participant_id: String,
        marks: Marks,
        reply: Responder<RoomSnapshot>,
    },
    PublishRound {
        host_token: String,
        round_number: u32,
        reply: Responder<RoomSnapshot>,
    },
    DiscardRound {
        host_token: String,
        round_number: u32,
        reply: Responder<RoomSnapshot>,
    },
    CancelGame {
        host_token: String,
        reply: Responder<RoomSnapshot>,
    },
    EndGame {
        host_token: String,
        reply: Responder<RoomSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        subscriber_id: u64,
    },
}

/// Cheap clonable address of a room actor.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<Command>,
}

fn room_gone() -> RoomError {
    RoomError::not_found("room not found")
}

impl RoomHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> Command,
    ) -> RoomResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| room_gone())?;
        rx.await.map_err(|_| room_gone())?
    }

    pub async fn submit_join(&self, name: String) -> RoomResult<JoinAccepted> {
        self.request(|reply| Command::SubmitJoin { name, reply }).await
    }

    pub async fn review_join(
        &self,
        host_token: String,
        request_id: String,
        approve: bool,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::ReviewJoin {
            host_token,
            request_id,
            approve,
            reply,
        })
        .await
    }

    pub async fn start_game(
        &self,
        host_token: String,
        config: Option<GameConfigInput>,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::StartGame {
            host_token,
            config,
            reply,
        })
        .await
    }

    pub async fn call_number(&self, participant_id: String, number: u8) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::CallNumber {
            participant_id,
            number,
            reply,
        })
        .await
    }

    pub async fn update_draft(
        &self,
        participant_id: String,
        answers: AnswersPatch,
    ) -> RoomResult<()> {
        self.request(|reply| Command::UpdateDraft {
            participant_id,
            answers,
            reply,
        })
        .await
    }

    pub async fn submit_answers(
        &self,
        participant_id: String,
        answers: AnswersPatch,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::SubmitAnswers {
            participant_id,
            answers,
            reply,
        })
        .await
    }

    pub async fn end_round_early(&self, participant_id: String) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::EndRoundEarly {
            participant_id,
            reply,
        })
        .await
    }

    pub async fn score_submission(
        &self,
        host_token: String,
        round_number: u32,
        participant_id: String,
        marks: Marks,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::ScoreSubmission {
            host_token,
            round_number,
            participant_id,
            marks,
            reply,
        })
        .await
    }

    pub async fn publish_round(
        &self,
        host_token: String,
        round_number: u32,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::PublishRound {
            host_token,
            round_number,
            reply,
        })
        .await
    }

    pub async fn discard_round(
        &self,
        host_token: String,
        round_number: u32,
    ) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::DiscardRound {
            host_token,
            round_number,
            reply,
        })
        .await
    }

    pub async fn cancel_game(&self, host_token: String) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::CancelGame { host_token, reply })
            .await
    }

    pub async fn end_game(&self, host_token: String) -> RoomResult<RoomSnapshot> {
        self.request(|reply| Command::EndGame { host_token, reply })
            .await
    }

    pub async fn snapshot(&self) -> RoomResult<RoomSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| room_gone())?;
        rx.await.map_err(|_| room_gone())
    }

    pub async fn subscribe(&self) -> RoomResult<Subscription> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Subscribe { reply })
            .await
            .map_err(|_| room_gone())?;
        rx.await.map_err(|_| room_gone())
    }

    /// Fire-and-forget; a room that is already gone needs no bookkeeping.
    pub async fn unsubscribe(&self, subscriber_id: u64) {
        let _ = self.tx.send(Command::Unsubscribe { subscriber_id }).await;
    }
}

pub struct RoomActor {
    state: RoomState,
    hub: Hub,
    rx: mpsc::Receiver<Command>,
    rooms: Arc<DashMap<String, RoomHandle>>,
}

impl RoomActor {
    /// Spawn the owning task for a fresh room and return its address.
    pub fn spawn(state: RoomState, rooms: Arc<DashMap<String, RoomHandle>>) -> RoomHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = RoomActor {
            state,
            hub: Hub::new(),
            rx,
            rooms,
        };
        tokio::spawn(actor.run());
        RoomHandle { tx }
    }

    async fn run(mut self) {
        loop {
            let deadline = self.armed_deadline();
            tokio::select! {
                maybe = self.rx.recv() => match maybe {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = async { sleep_until(deadline.expect("deadline armed")).await },
                    if deadline.is_some() =>
                {
                    self.fire_deadline();
                }
            }

            // A terminal room with no listeners left has nothing to do.
            if self.state.game.status.is_terminal() && self.hub.is_empty() {
                self.rooms.remove(&self.state.code);
                tracing::info!(room = %self.state.code, "room retired");
                break;
            }
        }
    }

    /// The single armed deadline: the active round's `ends_at`, if any.
    fn armed_deadline(&self) -> Option<Instant> {
        let ends_at = self.state.game.active_round.as_ref()?.ends_at?;
        let remaining = (ends_at - clock::now_ms()).max(0) as u64;
        Some(Instant::now() + Duration::from_millis(remaining))
    }

    fn fire_deadline(&mut self) {
        match rules::timer_expired(&self.state, clock::now_ms()) {
            Some(transition) => {
                self.commit(transition);
            }
            None => {
                tracing::debug!(room = %self.state.code, "stale deadline fire ignored");
            }
        }
    }

    /// Swap in the new state, project once, broadcast at most one event.
    fn commit(&mut self, transition: Transition) -> RoomSnapshot {
        self.state = transition.state;
        let snapshot = snapshot::project(&self.state);
        if let Some(event) = transition.event {
            self.hub.broadcast(event.into_server_event(snapshot.clone()));
        }
        snapshot
    }

    fn mutate(&mut self, reply: Responder<RoomSnapshot>, result: RoomResult<Transition>) {
        let response = result.map(|transition| self.commit(transition));
        let _ = reply.send(response);
    }

    fn handle(&mut self, command: Command) {
        let now = clock::now_ms();
        match command {
            Command::SubmitJoin { name, reply } => {
                let participant_id = id::new_participant_id();
                let result = rules::submit_join(&self.state, participant_id.clone(), &name, now)
                    .map(|transition| {
                        let snapshot = self.commit(transition);
                        let participant = snapshot
                            .participant(&participant_id)
                            .cloned()
                            .expect("joined participant in snapshot");
                        JoinAccepted {
                            request_id: participant_id,
                            participant,
                        }
                    });
                let _ = reply.send(result);
            }
            Command::ReviewJoin {
                host_token,
                request_id,
                approve,
                reply,
            } => {
                let result = rules::review_join(&self.state, &host_token, &request_id, approve, now);
                self.mutate(reply, result);
            }
            Command::StartGame {
                host_token,
                config,
                reply,
            } => {
                let result = rules::start_game(&self.state, &host_token, config, now);
                self.mutate(reply, result);
            }
            Command::CallNumber {
                participant_id,
                number,
                reply,
            } => {
                let result = rules::call_number(&self.state, &participant_id, number, now);
                self.mutate(reply, result);
            }
            Command::UpdateDraft {
                participant_id,
                answers,
                reply,
            } => {
                let result = rules::update_draft(&self.state, &participant_id, &answers, now)
                    .map(|transition| {
                        self.commit(transition);
                    });
                let _ = reply.send(result);
            }
            Command::SubmitAnswers {
                participant_id,
                answers,
                reply,
            } => {
                let result = rules::submit_answers(&self.state, &participant_id, &answers, now);
                self.mutate(reply, result);
            }
            Command::EndRoundEarly {
                participant_id,
                reply,
            } => {
                let result = rules::end_round_early(&self.state, &participant_id, now);
                self.mutate(reply, result);
            }
            Command::ScoreSubmission {
                host_token,
                round_number,
                participant_id,
                marks,
                reply,
            } => {
                let result = rules::score_submission(
                    &self.state,
                    &host_token,
                    round_number,
                    &participant_id,
                    marks,
                    now,
                );
                self.mutate(reply, result);
            }
            Command::PublishRound {
                host_token,
                round_number,
                reply,
            } => {
                let result = rules::publish_round(&self.state, &host_token, round_number, now);
                self.mutate(reply, result);
            }
            Command::DiscardRound {
                host_token,
                round_number,
                reply,
            } => {
                let result = rules::discard_round(&self.state, &host_token, round_number, now);
                self.mutate(reply, result);
            }
            Command::CancelGame { host_token, reply } => {
                let result = rules::cancel_game(&self.state, &host_token, now);
                self.mutate(reply, result);
            }
            Command::EndGame { host_token, reply } => {
                let result = rules::end_game(&self.state, &host_token, now);
                self.mutate(reply, result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(snapshot::project(&self.state));
            }
            Command::Subscribe { reply } => {
                let (subscriber_id, events) = self.hub.subscribe();
                self.hub.send_to(subscriber_id, ServerEvent::Connected);
                self.hub.send_to(
                    subscriber_id,
                    ServerEvent::Snapshot {
                        snapshot: snapshot::project(&self.state),
                    },
                );
                self.hub.broadcast_presence();
                let _ = reply.send(Subscription {
                    subscriber_id,
                    events,
                });
            }
            Command::Unsubscribe { subscriber_id } => {
                if self.hub.remove(subscriber_id) {
                    self.hub.broadcast_presence();
                }
            }
        }
    }
}
