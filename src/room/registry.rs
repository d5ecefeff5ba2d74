//! Registry of live rooms and room creation.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::AsyncWriteExt;

use crate::error::RoomResult;
use crate::rules;
use crate::util::{clock, id};

use super::actor::{RoomActor, RoomHandle};

/// Everything a host needs after creating a room. The token only ever
/// travels in this response; snapshots never carry it.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_code: String,
    pub host_name: String,
    pub max_participants: u8,
    pub host_token: String,
}

#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, RoomHandle>>,
    log_path: Option<PathBuf>,
}

impl RoomRegistry {
    pub fn new(log_path: Option<PathBuf>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            log_path,
        }
    }

    /// Create a room: fresh unique code, host admitted, actor spawned.
    pub async fn create_room(
        &self,
        host_name: &str,
        max_participants: u8,
    ) -> RoomResult<CreatedRoom> {
        let now = clock::now_ms();
        let host_token = id::new_host_token();

        let code = loop {
            let candidate = id::new_room_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let state = rules::create_room(
            code.clone(),
            host_name,
            max_participants,
            host_token.clone(),
            now,
        )?;
        let created = CreatedRoom {
            room_code: state.code.clone(),
            host_name: state.host_name.clone(),
            max_participants: state.max_participants,
            host_token,
        };

        let handle = RoomActor::spawn(state, Arc::clone(&self.rooms));
        self.rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, "room created");

        self.append_room_log(&created, now).await;
        Ok(created)
    }

    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Best-effort append to the room log; failures are logged and ignored.
    async fn append_room_log(&self, created: &CreatedRoom, now: i64) {
        let Some(path) = &self.log_path else {
            return;
        };
        let line = format!(
            "{}\t{}\t{}\tLOBBY\t{}\n",
            created.room_code,
            created.host_name,
            created.max_participants,
            clock::iso(now)
        );
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await
        }
        .await;
        if let Err(error) = result {
            tracing::warn!(%error, path = %path.display(), "room log append failed");
        }
    }
}
