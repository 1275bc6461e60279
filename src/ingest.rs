//! Ingestion driver
//!
//! Pulls tournament listings for each configured region, drops excluded
//! tournaments, walks the rest in start-date order emitting season markers and
//! reconciling every match row.

use crate::data::Database;
use crate::feed::{MatchFeed, RawMatch};
use crate::reconcile::seasons::emit_marker;
use crate::reconcile::{Outcome, Reconciler, SeasonTracker, SkipReason};
use crate::{IngestConfig, Region, Result};
use chrono::NaiveDate;
use std::fmt;

/// A tournament queued for ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTournament {
    pub start_date: NaiveDate,
    pub name: String,
    pub region: Region,
}

/// Tallies of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub tournaments: usize,
    pub created: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub in_progress: usize,
    /// Rows skipped for an empty or TBD side
    pub placeholders: usize,
    /// Rows skipped for unknown or ambiguous team names
    pub unresolved: usize,
    pub invalid: usize,
    pub markers_created: usize,
    /// Tournaments or regions whose feed pull failed
    pub failed: Vec<String>,
}

impl IngestSummary {
    /// New plus updated ledger entries
    pub fn changed(&self) -> usize {
        self.created + self.updated
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created(_) => self.created += 1,
            Outcome::Updated(_) => self.updated += 1,
            Outcome::Skipped(SkipReason::Exists) => self.duplicates += 1,
            Outcome::Skipped(SkipReason::InProgress) => self.in_progress += 1,
            Outcome::Skipped(SkipReason::InvalidTimestamp(_)) => self.invalid += 1,
            Outcome::Skipped(SkipReason::UnresolvedTeam { reason, .. }) => {
                if reason.needs_attention() {
                    self.unresolved += 1;
                } else {
                    self.placeholders += 1;
                }
            }
        }
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} new/updated matches", self.changed())?;
        writeln!(f, "  Tournaments:  {}", self.tournaments)?;
        writeln!(f, "  Created:      {}", self.created)?;
        writeln!(f, "  Updated:      {}", self.updated)?;
        writeln!(f, "  Duplicates:   {}", self.duplicates)?;
        writeln!(f, "  In progress:  {}", self.in_progress)?;
        writeln!(f, "  TBD sides:    {}", self.placeholders)?;
        writeln!(f, "  Unresolved:   {}", self.unresolved)?;
        writeln!(f, "  Bad rows:     {}", self.invalid)?;
        write!(f, "  Markers:      {}", self.markers_created)?;
        if !self.failed.is_empty() {
            write!(f, "\n  Failed pulls: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// True if `name` contains any excluded label
pub fn is_excluded(name: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|label| name.contains(label.as_str()))
}

/// Runs the feed through the reconciler
pub struct Ingestor<'a, F: MatchFeed> {
    db: &'a Database,
    feed: &'a F,
    config: &'a IngestConfig,
}

impl<'a, F: MatchFeed> Ingestor<'a, F> {
    pub fn new(db: &'a Database, feed: &'a F, config: &'a IngestConfig) -> Self {
        Ingestor { db, feed, config }
    }

    /// List, filter and sort tournaments for all configured regions.
    ///
    /// Regions whose listing fails are logged and added to `failed`.
    pub fn schedule(
        &self,
        start_year: i32,
        failed: &mut Vec<String>,
    ) -> Result<Vec<ScheduledTournament>> {
        let since = NaiveDate::from_ymd_opt(start_year, 1, 1).ok_or_else(|| {
            crate::LoeError::Config(format!("Invalid start year: {}", start_year))
        })?;

        let mut schedule = Vec::new();
        for &region in &self.config.regions {
            match self.feed.list_tournaments(region, since) {
                Ok(listings) => schedule.extend(listings.into_iter().map(|t| {
                    ScheduledTournament {
                        start_date: t.start_date,
                        name: t.name,
                        region,
                    }
                })),
                Err(e) => {
                    log::warn!("Failed to list {} tournaments: {}", region, e);
                    failed.push(format!("{} tournament list", region));
                }
            }
        }

        let before = schedule.len();
        schedule.retain(|t| !is_excluded(&t.name, &self.config.excluded_tournaments));
        log::debug!("Excluded {} tournaments", before - schedule.len());

        // Stable, so same-day tournaments keep region order
        schedule.sort_by_key(|t| t.start_date);
        Ok(schedule)
    }

    /// Ingest every tournament from `start_year` onwards.
    ///
    /// Only storage failures abort the run; it can be repeated from scratch.
    pub fn run(&self, start_year: i32) -> Result<IngestSummary> {
        log::info!("Loading match data from {}", start_year);
        let mut summary = IngestSummary::default();
        let schedule = self.schedule(start_year, &mut summary.failed)?;
        let reconciler = Reconciler::new(self.db);
        let mut tracker = SeasonTracker::new();

        for tournament in &schedule {
            if let Some(kind) = tracker.observe(tournament.start_date, &tournament.name) {
                let (_, created) = emit_marker(self.db, kind, tournament.start_date)?;
                if created {
                    summary.markers_created += 1;
                }
            }

            log::info!("{} ({}, {})", tournament.name, tournament.region, tournament.start_date);
            summary.tournaments += 1;

            let matches = match self.feed.list_matches(&tournament.name) {
                Ok(matches) => matches,
                Err(e) => {
                    log::warn!("Skipping {}: {}", tournament.name, e);
                    summary.failed.push(tournament.name.clone());
                    continue;
                }
            };

            for raw in &matches {
                let outcome = reconciler.reconcile(raw, tournament.region)?;
                report(raw, &outcome);
                summary.record(&outcome);
            }
        }

        log::info!("{} new/updated matches", summary.changed());
        Ok(summary)
    }
}

fn report(raw: &RawMatch, outcome: &Outcome) {
    match outcome {
        Outcome::Created(record) => log::info!("Created {}", record),
        Outcome::Updated(record) => log::info!("Updated {}", record),
        Outcome::Skipped(reason @ SkipReason::UnresolvedTeam { reason: why, .. })
            if why.needs_attention() =>
        {
            log::warn!("Skipped {} vs {} at {}: {}", raw.team_a, raw.team_b, raw.timestamp, reason)
        }
        Outcome::Skipped(reason @ SkipReason::InvalidTimestamp(_)) => {
            log::warn!("Skipped {} vs {}: {}", raw.team_a, raw.team_b, reason)
        }
        Outcome::Skipped(reason) => {
            log::debug!("Skipped {} vs {} at {}: {}", raw.team_a, raw.team_b, raw.timestamp, reason)
        }
    }
}
