//! Shared string normalisation. Names, drafts, submissions and SHARED_10
//! keys all go through here so scoring comparisons stay consistent.

/// Max stored length of an answer, in characters.
pub const MAX_ANSWER_CHARS: usize = 48;

/// Trim and collapse runs of whitespace to single spaces.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise an answer string and truncate it to [`MAX_ANSWER_CHARS`].
pub fn normalize_answer(input: &str) -> String {
    let normalized = normalize(input);
    normalized.chars().take(MAX_ANSWER_CHARS).collect()
}

/// Case-folded key used to group identical answers in SHARED_10 scoring.
pub fn share_key(answer: &str) -> String {
    normalize(answer).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_collapses() {
        assert_eq!(normalize("  Ada   Lovelace \t"), "Ada Lovelace");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn answers_are_truncated() {
        let long = "x".repeat(100);
        assert_eq!(normalize_answer(&long).chars().count(), MAX_ANSWER_CHARS);
        assert_eq!(normalize_answer("  Cup "), "Cup");
    }

    #[test]
    fn share_key_folds_case_and_spacing() {
        assert_eq!(share_key(" CAIRO "), "cairo");
        assert_eq!(share_key("New  York"), share_key("new york"));
    }
}
