//! Season boundary markers
//!
//! The rating engine resets or dampens ratings at calendar transitions. Those
//! transitions are written into the ledger as synthetic marker entries, derived
//! from the chronologically sorted tournament sequence.

use crate::data::Database;
use crate::{MarkerKind, MatchRecord, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

/// Tournament names containing this start the summer split
pub const SUMMER_INDICATOR: &str = "Summer";

/// Tournament names containing any of these are international events
pub const INTERNATIONAL_INDICATORS: [&str; 2] = ["Worlds", "MSI"];

/// Running state over a sorted tournament sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonTracker {
    last_year: Option<i32>,
    summer_reset_emitted: bool,
}

impl SeasonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the next tournament (call in start-date order) and return the
    /// marker to emit before its matches, if any
    pub fn observe(&mut self, start_date: NaiveDate, tournament: &str) -> Option<MarkerKind> {
        let year = start_date.year();
        if self.last_year != Some(year) {
            self.last_year = Some(year);
            self.summer_reset_emitted = false;
            Some(MarkerKind::SpringReset)
        } else if !self.summer_reset_emitted && tournament.contains(SUMMER_INDICATOR) {
            self.summer_reset_emitted = true;
            Some(MarkerKind::SummerReset)
        } else if INTERNATIONAL_INDICATORS
            .iter()
            .any(|indicator| tournament.contains(indicator))
        {
            Some(MarkerKind::InternationalTournament)
        } else {
            None
        }
    }
}

/// Markers sit at midnight UTC on the day before the tournament starts
pub fn marker_start(tournament_start: NaiveDate) -> DateTime<Utc> {
    (tournament_start - Duration::days(1))
        .and_time(NaiveTime::default())
        .and_utc()
}

/// Write a marker for a tournament starting on `tournament_start`.
///
/// Returns the marker and whether it was newly created.
pub fn emit_marker(
    db: &Database,
    kind: MarkerKind,
    tournament_start: NaiveDate,
) -> Result<(MatchRecord, bool)> {
    let start = marker_start(tournament_start);
    let (record, created) = db.atomically(|db| db.get_or_create_marker(kind, start))?;
    log::info!(
        "Season reset: {} on {} -- {}",
        kind,
        tournament_start,
        if created { "new record" } else { "exists" }
    );
    Ok((record, created))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_years_one_marker_per_split() {
        let sequence = [
            (date(2019, 1, 14), "LCK 2019 Spring"),
            (date(2019, 1, 18), "LEC 2019 Spring"),
            (date(2019, 1, 26), "LCS 2019 Spring"),
            (date(2019, 6, 5), "LCK 2019 Summer"),
            (date(2019, 6, 7), "LEC 2019 Summer"),
            (date(2019, 6, 8), "LCS 2019 Summer"),
            (date(2020, 1, 24), "LEC 2020 Spring"),
            (date(2020, 2, 5), "LCK 2020 Spring"),
            (date(2020, 6, 12), "LEC 2020 Summer"),
            (date(2020, 6, 17), "LCK 2020 Summer"),
        ];

        let mut tracker = SeasonTracker::new();
        let emitted: Vec<_> = sequence
            .iter()
            .filter_map(|(start, name)| tracker.observe(*start, name).map(|k| (start.year(), k)))
            .collect();

        assert_eq!(
            emitted,
            vec![
                (2019, MarkerKind::SpringReset),
                (2019, MarkerKind::SummerReset),
                (2020, MarkerKind::SpringReset),
                (2020, MarkerKind::SummerReset),
            ]
        );
    }

    #[test]
    fn test_international_markers_repeat() {
        let mut tracker = SeasonTracker::new();
        assert_eq!(
            tracker.observe(date(2018, 1, 12), "NA LCS 2018 Spring"),
            Some(MarkerKind::SpringReset)
        );
        assert_eq!(
            tracker.observe(date(2018, 5, 3), "2018 Mid-Season Invitational MSI"),
            Some(MarkerKind::InternationalTournament)
        );
        assert_eq!(
            tracker.observe(date(2018, 10, 1), "2018 Season World Championship Worlds"),
            Some(MarkerKind::InternationalTournament)
        );
        assert_eq!(
            tracker.observe(date(2018, 10, 20), "Worlds 2018 Knockout"),
            Some(MarkerKind::InternationalTournament)
        );
    }

    #[test]
    fn test_new_year_takes_precedence() {
        // First event of a year is always a spring reset, whatever its name
        let mut tracker = SeasonTracker::new();
        assert_eq!(
            tracker.observe(date(2021, 1, 1), "Worlds 2021 Summer"),
            Some(MarkerKind::SpringReset)
        );
        assert_eq!(tracker.observe(date(2021, 2, 1), "LCK 2021 Spring"), None);
    }

    #[test]
    fn test_marker_start_is_day_before() {
        let start = marker_start(date(2020, 1, 1));
        assert_eq!(start.date_naive(), date(2019, 12, 31));
        assert_eq!(start.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_emit_marker_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let (first, created) = emit_marker(&db, MarkerKind::SpringReset, date(2020, 1, 24)).unwrap();
        assert!(created);
        let (second, created) = emit_marker(&db, MarkerKind::SpringReset, date(2020, 1, 24)).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(first.start.date_naive(), date(2020, 1, 23));
        assert_eq!(db.get_stats().unwrap().marker_count, 1);
    }
}
