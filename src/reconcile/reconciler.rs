//! Match reconciliation
//!
//! Decides how each raw feed row maps onto the ledger. The feed is eventually
//! consistent, so a row may repeat an entry we already hold, move it in time,
//! flip its sides, or describe a series that is still being played. The
//! decision ([`plan`]) is a pure function over the entries already stored
//! near the incoming match; [`Reconciler`] turns it into store mutations.

use super::directory::{Resolution, TeamDirectory, UnresolvedReason};
use super::scoring::score_predictions;
use crate::data::database::{parse_timestamp, NewMatch};
use crate::data::Database;
use crate::feed::RawMatch;
use crate::{MatchId, MatchRecord, Region, Result, Team, TeamId};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Stored entries this close in time with the same teams and result are retimed
pub const RETIME_WINDOW_DAYS: i64 = 14;

/// Stored entries this close in time with reversed teams are side-swapped
pub const SWAP_WINDOW_DAYS: i64 = 1;

/// A feed row after team resolution and normalisation
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMatch {
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub score_a: i32,
    pub score_b: i32,
    pub start: DateTime<Utc>,
    pub best_of: i32,
    pub match_info: String,
    pub region: Region,
}

impl IncomingMatch {
    /// Missing scores count as 0, a missing or zero best-of as 1
    #[allow(clippy::too_many_arguments)]
    pub fn normalize(
        team_a: TeamId,
        team_b: TeamId,
        score_a: Option<i32>,
        score_b: Option<i32>,
        start: DateTime<Utc>,
        best_of: Option<i32>,
        match_info: &str,
        region: Region,
    ) -> Self {
        IncomingMatch {
            team_a,
            team_b,
            score_a: score_a.unwrap_or(0),
            score_b: score_b.unwrap_or(0),
            start,
            best_of: best_of.filter(|&n| n > 0).unwrap_or(1),
            match_info: match_info.to_string(),
            region,
        }
    }

    /// Games needed to take the series
    pub fn majority(&self) -> i32 {
        self.best_of / 2 + self.best_of % 2
    }

    /// A series is still running while the leader is short of a majority.
    /// 0-0 is never in progress.
    pub fn in_progress(&self) -> bool {
        let lead = self.score_a.max(self.score_b);
        0 < lead && lead < self.majority()
    }

    fn same_result(&self, stored: &MatchRecord) -> bool {
        stored.score_a == self.score_a
            && stored.score_b == self.score_b
            && stored.best_of == self.best_of
            && stored.match_info == self.match_info
            && stored.region == self.region
    }

    fn same_sides(&self, stored: &MatchRecord) -> bool {
        stored.team_a == self.team_a && stored.team_b == self.team_b
    }

    fn reversed_sides(&self, stored: &MatchRecord) -> bool {
        stored.team_a == self.team_b && stored.team_b == self.team_a
    }

    fn within(&self, stored: &MatchRecord, days: i64) -> bool {
        let window = Duration::days(days);
        stored.start >= self.start - window && stored.start <= self.start + window
    }

    fn to_new_match(&self) -> NewMatch {
        NewMatch {
            team_a: self.team_a,
            team_b: self.team_b,
            score_a: self.score_a,
            score_b: self.score_b,
            start: self.start,
            best_of: self.best_of,
            match_info: self.match_info.clone(),
            region: self.region,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    UnresolvedTeam {
        name: String,
        reason: UnresolvedReason,
    },
    /// The feed timestamp could not be parsed
    InvalidTimestamp(String),
    /// An identical entry is already in the ledger
    Exists,
    /// The series has not been decided yet
    InProgress,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnresolvedTeam { name, reason } => write!(f, "{}: '{}'", reason, name),
            SkipReason::InvalidTimestamp(ts) => write!(f, "invalid timestamp '{}'", ts),
            SkipReason::Exists => write!(f, "exists"),
            SkipReason::InProgress => write!(f, "in progress"),
        }
    }
}

/// Result of reconciling one feed row
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Skipped(SkipReason),
    Created(MatchRecord),
    Updated(MatchRecord),
}

/// Store mutation chosen for an incoming match
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Skip(SkipReason),
    /// Move a stored entry to the incoming start time
    Retime(MatchId),
    /// Flip the team references of a stored entry
    Swap(MatchId),
    /// Write the result, over the entry with the same key if there is one
    Store(Option<MatchId>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Whether both teams get marked active before the action runs
    pub activate_teams: bool,
    pub action: Action,
}

impl Plan {
    fn passive(action: Action) -> Self {
        Plan {
            activate_teams: false,
            action,
        }
    }
}

/// Decide what to do with `incoming` given the stored entries near it.
///
/// `nearby` must hold every entry between the two teams (either side order)
/// with the same stage label and region, starting within
/// [`RETIME_WINDOW_DAYS`] of the incoming start. The checks run in order and
/// the first that applies wins.
pub fn plan(incoming: &IncomingMatch, nearby: &[MatchRecord]) -> Plan {
    let exists = nearby.iter().any(|stored| {
        incoming.same_sides(stored) && incoming.same_result(stored) && stored.start == incoming.start
    });
    if exists {
        return Plan::passive(Action::Skip(SkipReason::Exists));
    }

    if let Some(stored) = nearby.iter().find(|stored| {
        incoming.same_sides(stored)
            && incoming.same_result(stored)
            && incoming.within(stored, RETIME_WINDOW_DAYS)
    }) {
        return Plan::passive(Action::Retime(stored.id));
    }

    if let Some(stored) = nearby.iter().find(|stored| {
        incoming.reversed_sides(stored)
            && incoming.same_result(stored)
            && incoming.within(stored, SWAP_WINDOW_DAYS)
    }) {
        return Plan::passive(Action::Swap(stored.id));
    }

    if incoming.in_progress() {
        return Plan {
            activate_teams: true,
            action: Action::Skip(SkipReason::InProgress),
        };
    }

    let keyed = nearby.iter().find(|stored| {
        incoming.same_sides(stored)
            && stored.start == incoming.start
            && stored.match_info == incoming.match_info
            && stored.region == incoming.region
    });
    Plan {
        activate_teams: true,
        action: Action::Store(keyed.map(|stored| stored.id)),
    }
}

/// Applies reconciliation decisions to the ledger
pub struct Reconciler<'a> {
    db: &'a Database,
    directory: TeamDirectory<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Reconciler {
            db,
            directory: TeamDirectory::new(db),
        }
    }

    /// Reconcile one feed row from a tournament in `region`
    pub fn reconcile(&self, raw: &RawMatch, region: Region) -> Result<Outcome> {
        let team_a = match self.resolve(&raw.team_a)? {
            Ok(team) => team,
            Err(skip) => return Ok(Outcome::Skipped(skip)),
        };
        let team_b = match self.resolve(&raw.team_b)? {
            Ok(team) => team,
            Err(skip) => return Ok(Outcome::Skipped(skip)),
        };

        let Ok(start) = parse_timestamp(&raw.timestamp) else {
            return Ok(Outcome::Skipped(SkipReason::InvalidTimestamp(
                raw.timestamp.clone(),
            )));
        };

        let incoming = IncomingMatch::normalize(
            team_a.id,
            team_b.id,
            raw.score_a,
            raw.score_b,
            start,
            raw.best_of,
            &raw.stage,
            region,
        );
        self.apply(&incoming)
    }

    /// Reconcile an already-resolved match
    pub fn apply(&self, incoming: &IncomingMatch) -> Result<Outcome> {
        self.db.atomically(|db| {
            let window = Duration::days(RETIME_WINDOW_DAYS);
            let nearby = db.matches_between(
                incoming.team_a,
                incoming.team_b,
                &incoming.match_info,
                incoming.region,
                incoming.start - window,
                incoming.start + window,
            )?;

            let plan = plan(incoming, &nearby);
            if plan.activate_teams {
                db.set_team_active(incoming.team_a)?;
                db.set_team_active(incoming.team_b)?;
            }

            match plan.action {
                Action::Skip(reason) => Ok(Outcome::Skipped(reason)),
                Action::Retime(id) => Ok(Outcome::Updated(db.set_match_start(id, incoming.start)?)),
                Action::Swap(id) => Ok(Outcome::Updated(db.swap_match_teams(id)?)),
                Action::Store(Some(id)) => {
                    let record = db.update_match_result(
                        id,
                        incoming.score_a,
                        incoming.score_b,
                        incoming.best_of,
                    )?;
                    score_predictions(db, &record)?;
                    Ok(Outcome::Updated(record))
                }
                Action::Store(None) => {
                    let record = db.insert_match(&incoming.to_new_match())?;
                    score_predictions(db, &record)?;
                    Ok(Outcome::Created(record))
                }
            }
        })
    }

    fn resolve(&self, name: &str) -> Result<std::result::Result<Team, SkipReason>> {
        Ok(match self.directory.resolve(name)? {
            Resolution::Resolved(team) => Ok(team),
            Resolution::Unresolved(reason) => Err(SkipReason::UnresolvedTeam {
                name: name.to_string(),
                reason,
            }),
        })
    }
}
