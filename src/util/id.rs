//! ID utilities (room codes, participant ids, host tokens).

use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

/// Room code alphabet. Skips 0/O/1/I so codes survive being read aloud.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const ROOM_CODE_LEN: usize = 6;

/// Generate a 6-character room code. The registry retries on collision.
pub fn new_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Opaque participant id (128-bit random).
pub fn new_participant_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Opaque host bearer secret. Never leaves the server in any snapshot.
pub fn new_host_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Upper-case a client-supplied room code and validate `[A-Z0-9]{4,10}`.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = (4..=10).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    valid.then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_code_uses_alphabet() {
        for _ in 0..50 {
            let code = new_room_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn host_token_is_long_enough() {
        assert_eq!(new_host_token().len(), 32);
    }

    #[test]
    fn room_code_normalization() {
        assert_eq!(normalize_room_code(" ab12 "), Some("AB12".into()));
        assert_eq!(normalize_room_code("abcdef"), Some("ABCDEF".into()));
        assert_eq!(normalize_room_code("abc"), None);
        assert_eq!(normalize_room_code("abcdefghijk"), None);
        assert_eq!(normalize_room_code("ab-12"), None);
    }
}
