//! League match ledger
//!
//! Reconciles esports match results from an eventually-consistent upstream feed
//! into a deduplicated match ledger with season-boundary markers, and scores
//! user forecasts once results are known.

pub mod data;
pub mod feed;
pub mod ingest;
pub mod reconcile;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storage format for match timestamps (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the sentinel team referenced by season markers
pub const NULL_TEAM_NAME: &str = "Null Team";

/// Match info label carried by every season marker
pub const SEASON_RESET_INFO: &str = "inter_season_reset";

/// Unique identifier for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub i64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionId(pub i64);

/// League region a team or match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "KR")]
    Korea,
    #[serde(rename = "CN")]
    China,
    #[serde(rename = "INT")]
    International,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Korea,
        Region::China,
        Region::International,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "NA",
            Region::Europe => "EU",
            Region::Korea => "KR",
            Region::China => "CN",
            Region::International => "INT",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "NA" => Some(Region::NorthAmerica),
            "EU" => Some(Region::Europe),
            "KR" => Some(Region::Korea),
            "CN" => Some(Region::China),
            "INT" => Some(Region::International),
            _ => None,
        }
    }

    /// Region label used by the upstream feed's tournament table
    pub fn feed_name(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Korea => "Korea",
            Region::China => "China",
            Region::International => "International",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Region::from_code(s)
            .ok_or_else(|| format!("Unknown region: {}. Use NA, EU, KR, CN, or INT.", s))
    }
}

/// A team known to the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Links a team across renames and re-rosters
    pub continuity_id: i64,
    pub name: String,
    pub short_name: String,
    pub region: Region,
    pub is_active: bool,
}

/// Team data supplied by an operator when seeding the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub continuity_id: i64,
    pub name: String,
    pub short_name: String,
    pub region: Region,
}

/// Kind of synthetic season-boundary marker.
///
/// Markers reuse the score columns of a ledger entry to carry this code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    SpringReset,
    SummerReset,
    InternationalTournament,
}

impl MarkerKind {
    pub fn code(&self) -> i32 {
        match self {
            MarkerKind::SpringReset => -1,
            MarkerKind::SummerReset => -2,
            MarkerKind::InternationalTournament => -3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(MarkerKind::SpringReset),
            -2 => Some(MarkerKind::SummerReset),
            -3 => Some(MarkerKind::InternationalTournament),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::SpringReset => write!(f, "spring"),
            MarkerKind::SummerReset => write!(f, "summer"),
            MarkerKind::InternationalTournament => write!(f, "international tournament"),
        }
    }
}

/// A reconciled ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub score_a: i32,
    pub score_b: i32,
    pub start: DateTime<Utc>,
    pub best_of: i32,
    pub match_info: String,
    pub region: Region,
}

impl MatchRecord {
    /// Returns the marker kind if this entry is a season marker rather than a game
    pub fn marker_kind(&self) -> Option<MarkerKind> {
        if self.best_of != 0 || self.match_info != SEASON_RESET_INFO {
            return None;
        }
        MarkerKind::from_code(self.score_a)
    }

    pub fn is_marker(&self) -> bool {
        self.marker_kind().is_some()
    }

    /// Returns the winning team, or None for a draw
    pub fn winner(&self) -> Option<TeamId> {
        match self.score_a.cmp(&self.score_b) {
            std::cmp::Ordering::Greater => Some(self.team_a),
            std::cmp::Ordering::Less => Some(self.team_b),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.marker_kind() {
            Some(kind) => write!(
                f,
                "[{}] season reset: {}",
                self.start.format(TIMESTAMP_FORMAT),
                kind
            ),
            None => write!(
                f,
                "[{}] {} {} {}-{} {} (Bo{}, {}, {})",
                self.start.format(TIMESTAMP_FORMAT),
                self.id,
                self.team_a,
                self.score_a,
                self.score_b,
                self.team_b,
                self.best_of,
                self.match_info,
                self.region
            ),
        }
    }
}

/// A user's forecast attached to a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub match_id: MatchId,
    pub username: String,
    /// Forecast probability (0-1) that team A wins
    pub predicted_team_a_win_prob: f64,
    /// Squared error against the outcome, once the match is decided
    pub score: Option<f64>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum LoeError {
    #[error("Feed request failed for {query}: {message}")]
    Feed { query: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Team not found with ID: {0}")]
    TeamNotFound(TeamId),

    #[error("Match not found with ID: {0}")]
    MatchNotFound(MatchId),

    #[error("Sentinel team '{}' is missing from the database", NULL_TEAM_NAME)]
    NullTeamMissing,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LoeError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ingest: IngestConfig,
    pub feed: FeedConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// First calendar year to pull tournaments from
    pub start_year: i32,
    pub regions: Vec<Region>,
    /// Tournaments whose name contains any of these are ignored
    pub excluded_tournaments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    /// Optional directory for cached API responses
    #[serde(default)]
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            start_year: 2015,
            regions: Region::ALL.to_vec(),
            excluded_tournaments: [
                "Promotion",
                "Play-In",
                "Rift Rivals",
                "EU Face-Off",
                "Mid-Season Showdown 2020",
                "Streamathon",
                "TCL",
                "SKE",
                "IWCT",
                "Season Opening",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            api_url: feed::leaguepedia::DEFAULT_API_URL.to_string(),
            user_agent: "loe-ingest/0.1".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            cache_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ingest: IngestConfig::default(),
            feed: FeedConfig::default(),
            data: DataConfig {
                database_path: "data/loe.db".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoeError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| LoeError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LoeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
