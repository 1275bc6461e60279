//! SQLite storage for teams, the match ledger and predictions

use crate::{
    LoeError, MarkerKind, MatchId, MatchRecord, NewTeam, Prediction, PredictionId, Region,
    Result, Team, TeamId, NULL_TEAM_NAME, SEASON_RESET_INFO, TIMESTAMP_FORMAT,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const TEAM_COLUMNS: &str = "id, continuity_id, name, short_name, region, is_active";

const MATCH_COLUMNS: &str =
    "id, team_a_id, team_b_id, score_a, score_b, start_timestamp, best_of, match_info, region";

/// Values for a ledger entry that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub score_a: i32,
    pub score_b: i32,
    pub start: DateTime<Utc>,
    pub best_of: i32,
    pub match_info: String,
    pub region: Region,
}

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                continuity_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                short_name TEXT NOT NULL,
                region TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_a_id INTEGER NOT NULL REFERENCES teams(id),
                team_b_id INTEGER NOT NULL REFERENCES teams(id),
                score_a INTEGER NOT NULL,
                score_b INTEGER NOT NULL,
                start_timestamp TEXT NOT NULL,
                best_of INTEGER NOT NULL,
                match_info TEXT NOT NULL,
                region TEXT NOT NULL,
                UNIQUE(team_a_id, team_b_id, score_a, score_b, start_timestamp,
                       best_of, match_info, region)
            );

            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL REFERENCES matches(id),
                username TEXT NOT NULL,
                predicted_team_a_win_prob REAL NOT NULL,
                score REAL
            );

            CREATE INDEX IF NOT EXISTS idx_teams_name ON teams(name);
            CREATE INDEX IF NOT EXISTS idx_teams_short_name ON teams(short_name);
            CREATE INDEX IF NOT EXISTS idx_matches_start ON matches(start_timestamp);
            CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(team_a_id, team_b_id);
            CREATE INDEX IF NOT EXISTS idx_predictions_match ON predictions(match_id);
            "#,
        )?;

        // Season markers point both sides at this team
        self.conn.execute(
            "INSERT INTO teams (continuity_id, name, short_name, region, is_active)
             SELECT 0, ?1, 'NULL', 'INT', 0
             WHERE NOT EXISTS (SELECT 1 FROM teams WHERE name = ?1)",
            params![NULL_TEAM_NAME],
        )?;
        Ok(())
    }

    /// Run `operation` inside a transaction, committing only if it succeeds
    pub fn atomically<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = operation(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ==================== Team Operations ====================

    pub fn insert_team(&self, team: &NewTeam) -> Result<Team> {
        self.conn.execute(
            "INSERT INTO teams (continuity_id, name, short_name, region, is_active)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                team.continuity_id,
                team.name,
                team.short_name,
                team.region.code()
            ],
        )?;
        self.get_team(TeamId(self.conn.last_insert_rowid()))
    }

    /// Teams whose canonical name is exactly `name`
    pub fn teams_by_name(&self, name: &str) -> Result<Vec<Team>> {
        self.query_teams(
            &format!("SELECT {} FROM teams WHERE name = ?1 ORDER BY id", TEAM_COLUMNS),
            name,
        )
    }

    /// Teams whose short code is exactly `short_name`
    pub fn teams_by_short_name(&self, short_name: &str) -> Result<Vec<Team>> {
        self.query_teams(
            &format!(
                "SELECT {} FROM teams WHERE short_name = ?1 ORDER BY id",
                TEAM_COLUMNS
            ),
            short_name,
        )
    }

    fn query_teams(&self, sql: &str, value: &str) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(sql)?;
        let teams = stmt
            .query_map(params![value], Self::row_to_team)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    pub fn get_team(&self, id: TeamId) -> Result<Team> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM teams WHERE id = ?1", TEAM_COLUMNS),
                params![id.0],
                Self::row_to_team,
            )
            .optional()?
            .ok_or(LoeError::TeamNotFound(id))
    }

    /// All teams except the season-marker sentinel
    pub fn get_all_teams(&self) -> Result<Vec<Team>> {
        self.query_teams(
            &format!(
                "SELECT {} FROM teams WHERE name != ?1 ORDER BY region, name",
                TEAM_COLUMNS
            ),
            NULL_TEAM_NAME,
        )
    }

    pub fn null_team(&self) -> Result<Team> {
        self.teams_by_name(NULL_TEAM_NAME)?
            .into_iter()
            .next()
            .ok_or(LoeError::NullTeamMissing)
    }

    /// Mark a team active. Never cleared here once set.
    pub fn set_team_active(&self, id: TeamId) -> Result<()> {
        self.conn.execute(
            "UPDATE teams SET is_active = 1 WHERE id = ?1",
            params![id.0],
        )?;
        Ok(())
    }

    fn row_to_team(row: &rusqlite::Row) -> rusqlite::Result<Team> {
        let region_code: String = row.get(4)?;
        let region = Region::from_code(&region_code)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(4, "region".into(), Type::Text))?;
        Ok(Team {
            id: TeamId(row.get(0)?),
            continuity_id: row.get(1)?,
            name: row.get(2)?,
            short_name: row.get(3)?,
            region,
            is_active: row.get(5)?,
        })
    }

    // ==================== Match Operations ====================

    pub fn get_match(&self, id: MatchId) -> Result<MatchRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS),
                params![id.0],
                Self::row_to_match,
            )
            .optional()?
            .ok_or(LoeError::MatchNotFound(id))
    }

    /// Entries between two teams, in either side order, sharing stage label and
    /// region, whose start falls within `[from, to]`
    pub fn matches_between(
        &self,
        team_a: TeamId,
        team_b: TeamId,
        match_info: &str,
        region: Region,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches
             WHERE ((team_a_id = ?1 AND team_b_id = ?2) OR (team_a_id = ?2 AND team_b_id = ?1))
               AND match_info = ?3
               AND region = ?4
               AND start_timestamp >= ?5
               AND start_timestamp <= ?6
             ORDER BY id",
            MATCH_COLUMNS
        ))?;

        let matches = stmt
            .query_map(
                params![
                    team_a.0,
                    team_b.0,
                    match_info,
                    region.code(),
                    format_timestamp(&from),
                    format_timestamp(&to)
                ],
                Self::row_to_match,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(matches)
    }

    pub fn insert_match(&self, record: &NewMatch) -> Result<MatchRecord> {
        self.conn.execute(
            "INSERT INTO matches (team_a_id, team_b_id, score_a, score_b, start_timestamp,
                                  best_of, match_info, region)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.team_a.0,
                record.team_b.0,
                record.score_a,
                record.score_b,
                format_timestamp(&record.start),
                record.best_of,
                record.match_info,
                record.region.code(),
            ],
        )?;
        self.get_match(MatchId(self.conn.last_insert_rowid()))
    }

    /// Overwrite the result fields of an existing entry
    pub fn update_match_result(
        &self,
        id: MatchId,
        score_a: i32,
        score_b: i32,
        best_of: i32,
    ) -> Result<MatchRecord> {
        self.conn.execute(
            "UPDATE matches SET score_a = ?1, score_b = ?2, best_of = ?3 WHERE id = ?4",
            params![score_a, score_b, best_of, id.0],
        )?;
        self.get_match(id)
    }

    pub fn set_match_start(&self, id: MatchId, start: DateTime<Utc>) -> Result<MatchRecord> {
        self.conn.execute(
            "UPDATE matches SET start_timestamp = ?1 WHERE id = ?2",
            params![format_timestamp(&start), id.0],
        )?;
        self.get_match(id)
    }

    /// Exchange the team references of an entry; scores stay in place
    pub fn swap_match_teams(&self, id: MatchId) -> Result<MatchRecord> {
        self.conn.execute(
            "UPDATE matches SET team_a_id = team_b_id, team_b_id = team_a_id WHERE id = ?1",
            params![id.0],
        )?;
        self.get_match(id)
    }

    /// Find or create the season marker of `kind` at `start`.
    ///
    /// Returns the marker and whether it was newly created.
    pub fn get_or_create_marker(
        &self,
        kind: MarkerKind,
        start: DateTime<Utc>,
    ) -> Result<(MatchRecord, bool)> {
        let null_team = self.null_team()?;
        let marker = NewMatch {
            team_a: null_team.id,
            team_b: null_team.id,
            score_a: kind.code(),
            score_b: kind.code(),
            start,
            best_of: 0,
            match_info: SEASON_RESET_INFO.to_string(),
            region: Region::International,
        };

        let existing = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM matches
                     WHERE team_a_id = ?1 AND team_b_id = ?1
                       AND score_a = ?2 AND score_b = ?2
                       AND start_timestamp = ?3 AND best_of = 0
                       AND match_info = ?4 AND region = ?5",
                    MATCH_COLUMNS
                ),
                params![
                    null_team.id.0,
                    kind.code(),
                    format_timestamp(&start),
                    SEASON_RESET_INFO,
                    Region::International.code()
                ],
                Self::row_to_match,
            )
            .optional()?;

        match existing {
            Some(record) => Ok((record, false)),
            None => Ok((self.insert_match(&marker)?, true)),
        }
    }

    /// The full ledger in chronological order, markers included
    pub fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches ORDER BY start_timestamp, id",
            MATCH_COLUMNS
        ))?;
        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// Ledger entries for one region plus all season markers, chronologically
    pub fn get_region_matches(&self, region: Region) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches
             WHERE region = ?1 OR match_info = ?2
             ORDER BY start_timestamp, id",
            MATCH_COLUMNS
        ))?;
        let matches = stmt
            .query_map(params![region.code(), SEASON_RESET_INFO], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
        let start_str: String = row.get(5)?;
        let start = NaiveDateTime::parse_from_str(&start_str, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
            .and_utc();

        let region_code: String = row.get(8)?;
        let region = Region::from_code(&region_code)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(8, "region".into(), Type::Text))?;

        Ok(MatchRecord {
            id: MatchId(row.get(0)?),
            team_a: TeamId(row.get(1)?),
            team_b: TeamId(row.get(2)?),
            score_a: row.get(3)?,
            score_b: row.get(4)?,
            start,
            best_of: row.get(6)?,
            match_info: row.get(7)?,
            region,
        })
    }

    // ==================== Prediction Operations ====================

    pub fn insert_prediction(
        &self,
        match_id: MatchId,
        username: &str,
        predicted_team_a_win_prob: f64,
    ) -> Result<Prediction> {
        if !(0.0..=1.0).contains(&predicted_team_a_win_prob) {
            return Err(LoeError::Parse(format!(
                "Win probability must be between 0 and 1, got {}",
                predicted_team_a_win_prob
            )));
        }
        self.get_match(match_id)?;
        self.conn.execute(
            "INSERT INTO predictions (match_id, username, predicted_team_a_win_prob)
             VALUES (?1, ?2, ?3)",
            params![match_id.0, username, predicted_team_a_win_prob],
        )?;
        Ok(Prediction {
            id: PredictionId(self.conn.last_insert_rowid()),
            match_id,
            username: username.to_string(),
            predicted_team_a_win_prob,
            score: None,
        })
    }

    pub fn predictions_for_match(&self, match_id: MatchId) -> Result<Vec<Prediction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, match_id, username, predicted_team_a_win_prob, score
             FROM predictions
             WHERE match_id = ?1
             ORDER BY id",
        )?;
        let predictions = stmt
            .query_map(params![match_id.0], |row| {
                Ok(Prediction {
                    id: PredictionId(row.get(0)?),
                    match_id: MatchId(row.get(1)?),
                    username: row.get(2)?,
                    predicted_team_a_win_prob: row.get(3)?,
                    score: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(predictions)
    }

    pub fn set_prediction_score(&self, id: PredictionId, score: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE predictions SET score = ?1 WHERE id = ?2",
            params![score, id.0],
        )?;
        Ok(())
    }

    // ==================== Statistics ====================

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let team_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE name != ?1",
            params![NULL_TEAM_NAME],
            |row| row.get(0),
        )?;

        let active_team_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE is_active = 1 AND name != ?1",
            params![NULL_TEAM_NAME],
            |row| row.get(0),
        )?;

        let match_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE match_info != ?1",
            params![SEASON_RESET_INFO],
            |row| row.get(0),
        )?;

        let marker_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE match_info = ?1",
            params![SEASON_RESET_INFO],
            |row| row.get(0),
        )?;

        let (prediction_count, scored_prediction_count): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(score) FROM predictions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let (min_ts, max_ts): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(start_timestamp), MAX(start_timestamp) FROM matches WHERE match_info != ?1",
            params![SEASON_RESET_INFO],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DatabaseStats {
            team_count: team_count as usize,
            active_team_count: active_team_count as usize,
            match_count: match_count as usize,
            marker_count: marker_count as usize,
            prediction_count: prediction_count as usize,
            scored_prediction_count: scored_prediction_count as usize,
            earliest_match: min_ts.and_then(|s| parse_timestamp(&s).ok()),
            latest_match: max_ts.and_then(|s| parse_timestamp(&s).ok()),
        })
    }
}

/// Format a timestamp the way it is stored and compared in the ledger
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a UTC-naive `YYYY-MM-DD HH:MM:SS` timestamp
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| LoeError::Parse(format!("Invalid timestamp '{}': {}", text, e)))
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub active_team_count: usize,
    pub match_count: usize,
    pub marker_count: usize,
    pub prediction_count: usize,
    pub scored_prediction_count: usize,
    pub earliest_match: Option<DateTime<Utc>>,
    pub latest_match: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn team(db: &Database, name: &str, short_name: &str) -> Team {
        db.insert_team(&NewTeam {
            continuity_id: 1,
            name: name.to_string(),
            short_name: short_name.to_string(),
            region: Region::Korea,
        })
        .unwrap()
    }

    fn new_match(a: &Team, b: &Team, start: DateTime<Utc>) -> NewMatch {
        NewMatch {
            team_a: a.id,
            team_b: b.id,
            score_a: 2,
            score_b: 1,
            start,
            best_of: 3,
            match_info: "Week 1".to_string(),
            region: Region::Korea,
        }
    }

    #[test]
    fn test_create_database_seeds_null_team() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 0);
        assert_eq!(stats.match_count, 0);
        assert!(stats.earliest_match.is_none());

        let null_team = db.null_team().unwrap();
        assert_eq!(null_team.name, NULL_TEAM_NAME);
        assert_eq!(null_team.region, Region::International);
    }

    #[test]
    fn test_team_lookup_and_activation() {
        let db = Database::in_memory().unwrap();
        let t1 = team(&db, "T1", "T1");
        team(&db, "Gen.G", "GEN");

        assert_eq!(db.teams_by_name("T1").unwrap(), vec![t1.clone()]);
        assert_eq!(db.teams_by_short_name("GEN").unwrap().len(), 1);
        assert!(db.teams_by_name("t1").unwrap().is_empty());
        assert!(!t1.is_active);

        db.set_team_active(t1.id).unwrap();
        db.set_team_active(t1.id).unwrap();
        assert!(db.get_team(t1.id).unwrap().is_active);
        assert_eq!(db.get_stats().unwrap().active_team_count, 1);
    }

    #[test]
    fn test_matches_between_covers_both_orders() {
        let db = Database::in_memory().unwrap();
        let a = team(&db, "T1", "T1");
        let b = team(&db, "Gen.G", "GEN");
        let start = Utc.with_ymd_and_hms(2022, 1, 12, 8, 0, 0).unwrap();

        db.insert_match(&new_match(&a, &b, start)).unwrap();
        db.insert_match(&new_match(&b, &a, start + Duration::days(3)))
            .unwrap();
        db.insert_match(&new_match(&a, &b, start + Duration::days(30)))
            .unwrap();

        let nearby = db
            .matches_between(
                a.id,
                b.id,
                "Week 1",
                Region::Korea,
                start - Duration::days(14),
                start + Duration::days(14),
            )
            .unwrap();
        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].start, start);
        assert_eq!(nearby[1].team_a, b.id);

        let other_stage = db
            .matches_between(
                a.id,
                b.id,
                "Week 2",
                Region::Korea,
                start - Duration::days(14),
                start + Duration::days(14),
            )
            .unwrap();
        assert!(other_stage.is_empty());
    }

    #[test]
    fn test_retime_and_swap_in_place() {
        let db = Database::in_memory().unwrap();
        let a = team(&db, "T1", "T1");
        let b = team(&db, "Gen.G", "GEN");
        let start = Utc.with_ymd_and_hms(2022, 1, 12, 8, 0, 0).unwrap();
        let stored = db.insert_match(&new_match(&a, &b, start)).unwrap();

        let moved = db
            .set_match_start(stored.id, start + Duration::hours(6))
            .unwrap();
        assert_eq!(moved.start, start + Duration::hours(6));

        let swapped = db.swap_match_teams(stored.id).unwrap();
        assert_eq!((swapped.team_a, swapped.team_b), (b.id, a.id));
        assert_eq!((swapped.score_a, swapped.score_b), (2, 1));
        assert_eq!(db.get_all_matches().unwrap().len(), 1);
    }

    #[test]
    fn test_identity_tuple_is_unique() {
        let db = Database::in_memory().unwrap();
        let a = team(&db, "T1", "T1");
        let b = team(&db, "Gen.G", "GEN");
        let start = Utc.with_ymd_and_hms(2022, 1, 12, 8, 0, 0).unwrap();

        db.insert_match(&new_match(&a, &b, start)).unwrap();
        assert!(db.insert_match(&new_match(&a, &b, start)).is_err());
    }

    #[test]
    fn test_marker_get_or_create_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let date = Utc.with_ymd_and_hms(2021, 1, 10, 0, 0, 0).unwrap();

        let (first, created) = db.get_or_create_marker(MarkerKind::SpringReset, date).unwrap();
        assert!(created);
        assert_eq!(first.marker_kind(), Some(MarkerKind::SpringReset));

        let (second, created) = db.get_or_create_marker(MarkerKind::SpringReset, date).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        let (_, created) = db
            .get_or_create_marker(MarkerKind::InternationalTournament, date)
            .unwrap();
        assert!(created);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.marker_count, 2);
        assert_eq!(stats.match_count, 0);
    }

    #[test]
    fn test_prediction_scores() {
        let db = Database::in_memory().unwrap();
        let a = team(&db, "T1", "T1");
        let b = team(&db, "Gen.G", "GEN");
        let start = Utc.with_ymd_and_hms(2022, 1, 12, 8, 0, 0).unwrap();
        let stored = db.insert_match(&new_match(&a, &b, start)).unwrap();

        let pred = db.insert_prediction(stored.id, "faker_fan", 0.7).unwrap();
        assert!(db.insert_prediction(stored.id, "bad", 1.5).is_err());
        assert!(db.insert_prediction(MatchId(999), "ghost", 0.5).is_err());

        db.set_prediction_score(pred.id, 0.09).unwrap();
        let stored_preds = db.predictions_for_match(stored.id).unwrap();
        assert_eq!(stored_preds.len(), 1);
        assert_eq!(stored_preds[0].score, Some(0.09));
        assert_eq!(db.get_stats().unwrap().scored_prediction_count, 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();
        let a = team(&db, "T1", "T1");
        let b = team(&db, "Gen.G", "GEN");
        let start = Utc.with_ymd_and_hms(2022, 1, 12, 8, 0, 0).unwrap();

        let result: Result<()> = db.atomically(|db| {
            db.insert_match(&new_match(&a, &b, start))?;
            Err(LoeError::Parse("abort".to_string()))
        });
        assert!(result.is_err());
        assert!(db.get_all_matches().unwrap().is_empty());

        db.atomically(|db| db.insert_match(&new_match(&a, &b, start)))
            .unwrap();
        assert_eq!(db.get_all_matches().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2020-06-12 09:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 6, 12, 9, 0, 0).unwrap());
        assert_eq!(format_timestamp(&ts), "2020-06-12 09:00:00");
        assert!(parse_timestamp("2020-06-12").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
