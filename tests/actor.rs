//! Live-room tests: registry, actor serialisation, and the push stream.

use std::time::Duration;

use lexiparty_backend::error::ErrorKind;
use lexiparty_backend::events::ServerEvent;
use lexiparty_backend::model::{AnswersPatch, EndRule, GameConfigInput, GameStatus};
use lexiparty_backend::room::actor::Subscription;
use lexiparty_backend::room::registry::RoomRegistry;
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn next_event(events: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event within deadline")
        .expect("stream open")
}

#[tokio::test]
async fn create_join_admit_start_round_trip() {
    let registry = RoomRegistry::new(None);
    let created = registry.create_room("Qudus", 4).await.unwrap();
    assert_eq!(created.room_code.len(), 6);
    let room = registry.get(&created.room_code).unwrap();

    let Subscription {
        subscriber_id: _,
        events: mut rx,
    } = room.subscribe().await.unwrap();
    assert!(matches!(next_event(&mut rx).await, ServerEvent::Connected));
    match next_event(&mut rx).await {
        ServerEvent::Snapshot { snapshot } => {
            assert_eq!(snapshot.meta.room_code, created.room_code);
            assert_eq!(snapshot.game.status, GameStatus::Lobby);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut rx).await,
        ServerEvent::Presence { count: 1 }
    ));

    let accepted = room.submit_join("Ada".into()).await.unwrap();
    match next_event(&mut rx).await {
        ServerEvent::JoinRequest {
            participant,
            snapshot,
        } => {
            assert_eq!(participant.name, "Ada");
            assert_eq!(snapshot.counts.pending, 1);
        }
        other => panic!("expected join_request, got {other:?}"),
    }

    let snapshot = room
        .review_join(created.host_token.clone(), accepted.request_id.clone(), true)
        .await
        .unwrap();
    assert_eq!(snapshot.counts.admitted, 2);
    assert!(matches!(
        next_event(&mut rx).await,
        ServerEvent::AdmissionUpdate { .. }
    ));

    let config = GameConfigInput {
        end_rule: Some(EndRule::FirstSubmission),
        ..Default::default()
    };
    let snapshot = room
        .start_game(created.host_token.clone(), Some(config))
        .await
        .unwrap();
    assert_eq!(snapshot.game.status, GameStatus::InProgress);
    assert!(matches!(
        next_event(&mut rx).await,
        ServerEvent::GameStarted { .. }
    ));

    let snapshot = room.call_number("host".into(), 3).await.unwrap();
    let active = snapshot.game.active_round.unwrap();
    assert_eq!(active.active_letter, 'C');
    assert!(matches!(
        next_event(&mut rx).await,
        ServerEvent::TurnCalled { .. }
    ));

    // Inputs stay locked through the 3s countdown.
    let err = room
        .update_draft(
            accepted.request_id.clone(),
            AnswersPatch {
                name: Some("Cora".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    tokio::time::sleep(Duration::from_millis(3_200)).await;
    room.update_draft(
        accepted.request_id.clone(),
        AnswersPatch {
            name: Some("Cora".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let snapshot = room
        .submit_answers(accepted.request_id.clone(), AnswersPatch::default())
        .await
        .unwrap();
    assert!(snapshot.game.active_round.is_none());
    assert_eq!(snapshot.game.current_turn_index, 1);

    match next_event(&mut rx).await {
        ServerEvent::RoundEnded {
            completed_round, ..
        } => {
            assert_eq!(completed_round.submissions.len(), 2);
            let ada = completed_round
                .submissions
                .iter()
                .find(|s| s.participant_id == accepted.request_id)
                .unwrap();
            assert_eq!(ada.answers.name, "Cora");
        }
        other => panic!("expected round_ended, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_room_rejects_joins_and_retires() {
    let registry = RoomRegistry::new(None);
    let created = registry.create_room("Qudus", 4).await.unwrap();
    let room = registry.get(&created.room_code).unwrap();

    let subscription = room.subscribe().await.unwrap();

    let snapshot = room.cancel_game(created.host_token.clone()).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Cancelled);

    let err = room.submit_join("Zed".into()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);

    // Last subscriber leaves a terminal room: the actor retires itself.
    room.unsubscribe(subscription.subscriber_id).await;
    let mut retired = false;
    for _ in 0..50 {
        if registry.get(&created.room_code).is_none() {
            retired = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(retired, "room should leave the registry once drained");
}

#[tokio::test]
async fn wrong_host_token_is_unauthorized() {
    let registry = RoomRegistry::new(None);
    let created = registry.create_room("Qudus", 4).await.unwrap();
    let room = registry.get(&created.room_code).unwrap();

    let err = room.cancel_game("wrong".into()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
    let err = room
        .start_game(String::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn room_log_append_is_best_effort() {
    let dir = std::env::temp_dir().join(format!("lexiparty-test-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("rooms.log");

    let registry = RoomRegistry::new(Some(path.clone()));
    let created = registry.create_room("Qudus", 4).await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(contents.contains(&created.room_code));
    assert!(contents.contains("LOBBY"));

    // A bad path only warns; creation still succeeds.
    let broken = RoomRegistry::new(Some(dir.join("missing").join("rooms.log")));
    assert!(broken.create_room("Qudus", 4).await.is_ok());

    tokio::fs::remove_dir_all(&dir).await.ok();
}

#[tokio::test]
async fn registry_codes_are_unique_per_room() {
    let registry = RoomRegistry::new(None);
    let a = registry.create_room("Ann", 4).await.unwrap();
    let b = registry.create_room("Ben", 4).await.unwrap();
    assert_ne!(a.room_code, b.room_code);
    assert_ne!(a.host_token, b.host_token);
    assert_eq!(registry.len(), 2);
}
