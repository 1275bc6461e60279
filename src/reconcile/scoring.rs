//! Retroactive scoring of forecasts against decided matches

use crate::data::Database;
use crate::{MatchRecord, Result};

/// Outcome from team A's side: 1.0 win, 0.0 loss, 0.5 tie.
///
/// A 0-0 result carries no outcome and is never scored.
pub fn match_outcome(score_a: i32, score_b: i32) -> Option<f64> {
    if score_a == 0 && score_b == 0 {
        return None;
    }
    Some(match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => 0.0,
        std::cmp::Ordering::Equal => 0.5,
    })
}

/// Brier-style squared error of a forecast against an outcome
pub fn squared_error(outcome: f64, predicted_prob: f64) -> f64 {
    (outcome - predicted_prob).powi(2)
}

/// Score every prediction attached to `record`, overwriting earlier scores.
///
/// Returns the number of predictions scored.
pub fn score_predictions(db: &Database, record: &MatchRecord) -> Result<usize> {
    if record.is_marker() {
        return Ok(0);
    }
    let Some(outcome) = match_outcome(record.score_a, record.score_b) else {
        return Ok(0);
    };

    let predictions = db.predictions_for_match(record.id)?;
    for prediction in &predictions {
        let score = squared_error(outcome, prediction.predicted_team_a_win_prob);
        db.set_prediction_score(prediction.id, score)?;
    }
    if !predictions.is_empty() {
        log::debug!(
            "Scored {} predictions for {} (outcome {})",
            predictions.len(),
            record.id,
            outcome
        );
    }
    Ok(predictions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::NewMatch;
    use crate::{NewTeam, Region};
    use chrono::{TimeZone, Utc};

    fn stored_match(db: &Database, score_a: i32, score_b: i32, best_of: i32) -> MatchRecord {
        let mut ids = Vec::new();
        for (name, short) in [("Cloud9", "C9"), ("Team SoloMid", "TSM")] {
            let team = db
                .insert_team(&NewTeam {
                    continuity_id: 0,
                    name: name.to_string(),
                    short_name: short.to_string(),
                    region: Region::NorthAmerica,
                })
                .unwrap();
            ids.push(team.id);
        }
        db.insert_match(&NewMatch {
            team_a: ids[0],
            team_b: ids[1],
            score_a,
            score_b,
            start: Utc.with_ymd_and_hms(2019, 3, 2, 22, 0, 0).unwrap(),
            best_of,
            match_info: "Week 6".to_string(),
            region: Region::NorthAmerica,
        })
        .unwrap()
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(match_outcome(2, 1), Some(1.0));
        assert_eq!(match_outcome(0, 3), Some(0.0));
        assert_eq!(match_outcome(1, 1), Some(0.5));
        assert_eq!(match_outcome(0, 0), None);
    }

    #[test]
    fn test_tie_scores() {
        let db = Database::in_memory().unwrap();
        let record = stored_match(&db, 1, 1, 1);
        db.insert_prediction(record.id, "even", 0.5).unwrap();
        db.insert_prediction(record.id, "sure", 1.0).unwrap();

        assert_eq!(score_predictions(&db, &record).unwrap(), 2);

        let preds = db.predictions_for_match(record.id).unwrap();
        assert_eq!(preds[0].score, Some(0.0));
        assert_eq!(preds[1].score, Some(0.25));
    }

    #[test]
    fn test_team_a_win_scores() {
        let db = Database::in_memory().unwrap();
        let record = stored_match(&db, 1, 0, 1);
        db.insert_prediction(record.id, "user", 0.8).unwrap();

        score_predictions(&db, &record).unwrap();

        let score = db.predictions_for_match(record.id).unwrap()[0]
            .score
            .unwrap();
        assert!((score - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let record = stored_match(&db, 0, 2, 3);
        db.insert_prediction(record.id, "user", 0.3).unwrap();

        score_predictions(&db, &record).unwrap();
        let first = db.predictions_for_match(record.id).unwrap();
        score_predictions(&db, &record).unwrap();
        let second = db.predictions_for_match(record.id).unwrap();

        assert_eq!(first, second);
        assert!((second[0].score.unwrap() - 0.09).abs() < 1e-9);
    }

    #[test]
    fn test_void_match_is_not_scored() {
        let db = Database::in_memory().unwrap();
        let record = stored_match(&db, 0, 0, 1);
        db.insert_prediction(record.id, "user", 0.6).unwrap();

        assert_eq!(score_predictions(&db, &record).unwrap(), 0);
        assert_eq!(db.predictions_for_match(record.id).unwrap()[0].score, None);
    }
}
