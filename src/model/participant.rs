use serde::{Deserialize, Serialize};

/// Reserved id of the room host; every other participant gets a random id.
pub const HOST_ID: &str = "host";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Pending,
    Admitted,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub status: ParticipantStatus,
    pub is_host: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Participant {
    pub fn host(name: String, now: i64) -> Self {
        Self {
            id: HOST_ID.to_string(),
            name,
            status: ParticipantStatus::Admitted,
            is_host: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pending(id: String, name: String, now: i64) -> Self {
        Self {
            id,
            name,
            status: ParticipantStatus::Pending,
            is_host: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.status == ParticipantStatus::Admitted
    }
}
