//! Leaguepedia cargo API client
//!
//! Lists tournaments per region from the `Tournaments` table and pulls match
//! rows from `MatchSchedule`. Responses can be cached on disk for offline runs.

use super::{with_retry, MatchFeed, RawMatch, TournamentListing};
use crate::{FeedConfig, LoeError, Region, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://lol.fandom.com/api.php";

/// Rows per cargo request; the API caps anonymous queries at 500
const PAGE_SIZE: usize = 500;

/// Query parameters that name a cached page
const CACHE_KEY_PARAMS: [&str; 3] = ["tables", "where", "offset"];

/// Client for the Leaguepedia cargo query API
pub struct LeaguepediaFeed {
    client: reqwest::blocking::Client,
    api_url: String,
    max_attempts: u32,
    /// Optional cache directory for API responses
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

#[derive(Debug, Deserialize)]
struct CargoResponse<T> {
    #[serde(default = "Vec::new")]
    cargoquery: Vec<CargoRow<T>>,
    error: Option<CargoError>,
}

#[derive(Debug, Deserialize)]
struct CargoRow<T> {
    title: T,
}

#[derive(Debug, Deserialize)]
struct CargoError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct TournamentRow {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "DateStart")]
    date_start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    #[serde(rename = "Team1")]
    team1: Option<String>,
    #[serde(rename = "Team2")]
    team2: Option<String>,
    #[serde(rename = "Team1Score")]
    team1_score: Option<String>,
    #[serde(rename = "Team2Score")]
    team2_score: Option<String>,
    #[serde(rename = "DateTime")]
    date_time: Option<String>,
    #[serde(rename = "BestOf")]
    best_of: Option<String>,
    #[serde(rename = "Tab")]
    tab: Option<String>,
}

impl LeaguepediaFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        let feed = LeaguepediaFeed {
            client,
            api_url: config.api_url.clone(),
            max_attempts: config.max_attempts,
            cache_dir: None,
            offline_only: false,
        };
        Ok(match &config.cache_dir {
            Some(dir) => feed.with_cache(dir),
            None => feed,
        })
    }

    /// Create feed with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    fn cache_path(&self, query: &[(&str, String)]) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| {
            // Build a safe filename from the parts that identify the page
            let key = query
                .iter()
                .filter(|(name, _)| CACHE_KEY_PARAMS.contains(name))
                .map(|(_, value)| value.as_str())
                .collect::<Vec<_>>()
                .join("_");
            let filename: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect();
            dir.join(filename + ".json")
        })
    }

    fn load_from_cache(&self, query: &[(&str, String)]) -> Option<String> {
        let path = self.cache_path(query)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, query: &[(&str, String)], body: &str) -> Result<()> {
        if let Some(path) = self.cache_path(query) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    /// Fetch one cargo page. Offline runs read the cache, online runs always
    /// hit the API and refresh it.
    fn fetch(&self, label: &str, query: &[(&str, String)]) -> Result<String> {
        if self.offline_only {
            return self.load_from_cache(query).ok_or_else(|| LoeError::Feed {
                query: label.to_string(),
                message: "not cached and offline mode is enabled".to_string(),
            });
        }

        let body = with_retry(
            || {
                let response = self.client.get(&self.api_url).query(query).send()?;
                if !response.status().is_success() {
                    return Err(LoeError::Feed {
                        query: label.to_string(),
                        message: format!("API returned {}", response.status()),
                    });
                }
                Ok(response.text()?)
            },
            self.max_attempts,
        )?;

        self.save_to_cache(query, &body)?;
        Ok(body)
    }

    /// Run a cargo query, following offsets until a short page comes back
    fn cargo_query<T, P>(&self, label: &str, base: Vec<(&str, String)>, parse: P) -> Result<Vec<T>>
    where
        P: Fn(&str) -> Result<Vec<T>>,
    {
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let mut query = base.clone();
            query.push(("limit", PAGE_SIZE.to_string()));
            query.push(("offset", offset.to_string()));

            let body = self.fetch(label, &query)?;
            let page = parse(&body).map_err(|e| LoeError::Feed {
                query: label.to_string(),
                message: e.to_string(),
            })?;
            let page_len = page.len();
            rows.extend(page);

            if page_len < PAGE_SIZE {
                return Ok(rows);
            }
            offset += PAGE_SIZE;
        }
    }
}

impl MatchFeed for LeaguepediaFeed {
    fn list_tournaments(
        &self,
        region: Region,
        since: NaiveDate,
    ) -> Result<Vec<TournamentListing>> {
        log::info!("Listing {} tournaments since {}", region, since);
        let query = vec![
            ("action", "cargoquery".to_string()),
            ("format", "json".to_string()),
            ("tables", "Tournaments".to_string()),
            ("fields", "Tournaments.Name=Name,Tournaments.DateStart=DateStart".to_string()),
            (
                "where",
                format!(
                    "Tournaments.Region=\"{}\" AND Tournaments.DateStart >= \"{}\"",
                    region.feed_name(),
                    since.format("%Y-%m-%d")
                ),
            ),
            ("order_by", "Tournaments.DateStart".to_string()),
        ];
        self.cargo_query(region.feed_name(), query, parse_tournaments)
    }

    fn list_matches(&self, tournament: &str) -> Result<Vec<RawMatch>> {
        let query = vec![
            ("action", "cargoquery".to_string()),
            ("format", "json".to_string()),
            ("tables", "MatchSchedule=MS,Tournaments=T".to_string()),
            ("join_on", "MS.OverviewPage=T.OverviewPage".to_string()),
            (
                "fields",
                "MS.Team1=Team1,MS.Team2=Team2,MS.Team1Score=Team1Score,\
                 MS.Team2Score=Team2Score,MS.DateTime_UTC=DateTime,MS.BestOf=BestOf,MS.Tab=Tab"
                    .to_string(),
            ),
            ("where", format!("T.Name=\"{}\"", escape_cargo(tournament))),
            ("order_by", "MS.DateTime_UTC".to_string()),
        ];
        self.cargo_query(tournament, query, parse_matches)
    }
}

fn escape_cargo(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let response: CargoResponse<T> = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(LoeError::Parse(format!(
            "cargo query failed ({}): {}",
            error.code, error.info
        )));
    }
    Ok(response.cargoquery.into_iter().map(|row| row.title).collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(value: Option<String>) -> Option<i32> {
    non_empty(value).and_then(|v| v.parse().ok())
}

/// Parse a cargo response body from the `Tournaments` table
pub fn parse_tournaments(body: &str) -> Result<Vec<TournamentListing>> {
    let rows: Vec<TournamentRow> = decode(body)?;
    let mut listings = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(name), Some(date)) = (non_empty(row.name), non_empty(row.date_start)) else {
            continue;
        };
        match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(start_date) => listings.push(TournamentListing { name, start_date }),
            Err(e) => log::warn!("Skipping tournament {} with bad start date {}: {}", name, date, e),
        }
    }
    Ok(listings)
}

/// Parse a cargo response body from the `MatchSchedule` table
pub fn parse_matches(body: &str) -> Result<Vec<RawMatch>> {
    let rows: Vec<ScheduleRow> = decode(body)?;
    Ok(rows
        .into_iter()
        .map(|row| RawMatch {
            team_a: non_empty(row.team1).unwrap_or_default(),
            team_b: non_empty(row.team2).unwrap_or_default(),
            score_a: parse_number(row.team1_score),
            score_b: parse_number(row.team2_score),
            timestamp: non_empty(row.date_time).unwrap_or_default(),
            best_of: parse_number(row.best_of),
            stage: non_empty(row.tab).unwrap_or_default(),
        })
        .collect())
}
