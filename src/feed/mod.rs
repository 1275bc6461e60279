//! Upstream match data feeds

pub mod leaguepedia;

use crate::{Region, Result};
use chrono::NaiveDate;

pub use leaguepedia::LeaguepediaFeed;

/// A tournament (season or split) as listed by the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentListing {
    pub name: String,
    pub start_date: NaiveDate,
}

/// A match row exactly as the feed reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub team_a: String,
    pub team_b: String,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    /// UTC-naive `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub best_of: Option<i32>,
    /// Stage label, e.g. "Week 3" or "Finals"
    pub stage: String,
}

/// Source of tournament listings and raw match results
pub trait MatchFeed {
    /// Tournaments in `region` starting on or after `since`
    fn list_tournaments(&self, region: Region, since: NaiveDate)
        -> Result<Vec<TournamentListing>>;

    /// All match rows recorded for a tournament
    fn list_matches(&self, tournament: &str) -> Result<Vec<RawMatch>>;
}

/// Backoff stops doubling after this many attempts
const MAX_BACKOFF_EXPONENT: u32 = 10;

fn backoff_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(100 * 2u64.pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

/// Retry a feed operation with exponential backoff
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if attempt + 1 < max_attempts => {
                log::warn!("Attempt {} failed: {}", attempt + 1, e);
                std::thread::sleep(backoff_delay(attempt));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoeError;
    use std::cell::Cell;

    #[test]
    fn test_retry_succeeds_after_failures() {
        let calls = Cell::new(0);
        let result = with_retry(
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 2 {
                    Err(LoeError::Parse("flaky".to_string()))
                } else {
                    Ok(7)
                }
            },
            3,
        );
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_gives_up() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(
            || {
                calls.set(calls.get() + 1);
                Err(LoeError::Parse("down".to_string()))
            },
            2,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let result = with_retry(
            || {
                calls.set(calls.get() + 1);
                Ok(())
            },
            0,
        );
        assert!(result.is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        assert_eq!(backoff_delay(3), std::time::Duration::from_millis(800));
        assert_eq!(backoff_delay(70), backoff_delay(MAX_BACKOFF_EXPONENT));
    }
}
