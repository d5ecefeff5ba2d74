//! Host review and the scoring engine. Scores for a round are recomputed
//! wholesale on every review change so shared-answer splits stay correct.

use std::collections::HashMap;

use crate::error::{RoomError, RoomResult};
use crate::events::Event;
use crate::model::{
    CompletedRound, FieldScores, Marks, Review, RoomState, ScoringMode, HOST_ID,
};
use crate::util::text;

use super::{require_host, Transition};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn unpublished_round<'a>(
    state: &'a RoomState,
    round_number: u32,
) -> RoomResult<&'a CompletedRound> {
    let round = state
        .completed_round(round_number)
        .ok_or_else(|| RoomError::not_found("round not found"))?;
    if round.is_published() {
        return Err(RoomError::conflict("round scores are already published"));
    }
    Ok(round)
}

/// Host marks one submission; every reviewed submission in the round is
/// then rescored under the configured mode.
pub fn score_submission(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    participant_id: &str,
    marks: Marks,
    now: i64,
) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    let round = unpublished_round(state, round_number)?;
    if !round
        .submissions
        .iter()
        .any(|s| s.participant_id == participant_id)
    {
        return Err(RoomError::not_found("submission not found"));
    }
    let scoring_mode = state
        .game
        .config
        .map(|c| c.scoring_mode)
        .unwrap_or(ScoringMode::Fixed10);
    let host_name = state.host_name.clone();

    let mut next = state.clone();
    let round = next
        .completed_round_mut(round_number)
        .expect("round checked above");
    let submission = round
        .submissions
        .iter_mut()
        .find(|s| s.participant_id == participant_id)
        .expect("submission checked above");
    submission.review = Some(Review {
        marks,
        scores: FieldScores::default(),
        marked_by_id: HOST_ID.to_string(),
        marked_by_name: host_name,
        marked_at: now,
    });
    rescore_round(round, scoring_mode);

    Ok(Transition::new(
        next,
        Event::SubmissionScored {
            participant_id: participant_id.to_string(),
            round_number,
        },
    ))
}

/// Freeze a fully reviewed round into the leaderboard.
pub fn publish_round(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    now: i64,
) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    let round = unpublished_round(state, round_number)?;
    if !round.is_fully_reviewed() {
        return Err(RoomError::conflict(
            "every submission must be reviewed before publishing",
        ));
    }

    let mut next = state.clone();
    next.completed_round_mut(round_number)
        .expect("round checked above")
        .score_published_at = Some(now);
    Ok(Transition::new(
        next,
        Event::RoundScoresPublished { round_number },
    ))
}

/// Finalise a round with zero contribution: reviews are cleared and the
/// publication stamp is set so the round can never be reopened.
pub fn discard_round(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    now: i64,
) -> RoomResult<Transition> {
    require_host(state, host_token)?;
    unpublished_round(state, round_number)?;

    let mut next = state.clone();
    let round = next
        .completed_round_mut(round_number)
        .expect("round checked above");
    for submission in &mut round.submissions {
        submission.review = None;
    }
    round.score_published_at = Some(now);
    Ok(Transition::new(
        next,
        Event::RoundScoresDiscarded { round_number },
    ))
}

/// Recompute every reviewed submission's field and total scores.
pub fn rescore_round(round: &mut CompletedRound, mode: ScoringMode) {
    // SHARED_10 splits 10 points between identical correct answers; count
    // the reviewed-correct group size per field and normalised answer.
    let mut groups: [HashMap<String, u32>; 5] = Default::default();
    if mode == ScoringMode::Shared10 {
        for submission in round.submissions.iter().filter(|s| s.review.is_some()) {
            let marks = submission.review.as_ref().map(|r| r.marks).unwrap();
            let answers = submission.answers.fields();
            for (field, marked) in marks.fields().into_iter().enumerate() {
                if !marked {
                    continue;
                }
                let key = text::share_key(answers[field]);
                if key.is_empty() {
                    continue;
                }
                *groups[field].entry(key).or_insert(0) += 1;
            }
        }
    }

    for submission in &mut round.submissions {
        let Some(review) = submission.review.as_mut() else {
            continue;
        };
        let answers = submission.answers.fields();
        let mut fields = [0.0; 5];
        for (field, marked) in review.marks.fields().into_iter().enumerate() {
            if !marked {
                continue;
            }
            fields[field] = match mode {
                ScoringMode::Fixed10 => 10.0,
                ScoringMode::Shared10 => {
                    let key = text::share_key(answers[field]);
                    if key.is_empty() {
                        0.0
                    } else {
                        let shares = groups[field].get(&key).copied().unwrap_or(1);
                        round2(10.0 / f64::from(shares))
                    }
                }
            };
        }
        let total = round2(fields.iter().sum());
        review.scores = FieldScores::from_fields(fields, total);
    }
}
