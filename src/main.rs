//! League match ledger CLI
//!
//! Ingests match results from Leaguepedia into the local ledger.

use clap::{Parser, Subcommand};
use loe::{Config, Region, Result};

#[derive(Parser)]
#[command(name = "loe")]
#[command(about = "Esports match ledger ingestion and prediction scoring", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull tournaments and reconcile their matches into the ledger
    Ingest {
        /// Year to start fetching data from (defaults to config)
        start_year: Option<i32>,
        /// Only ingest these regions (repeatable)
        #[arg(long = "region")]
        regions: Vec<Region>,
        /// Cache directory for API responses
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached responses (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Show database status
    Status,
    /// Team directory commands
    Teams {
        #[command(subcommand)]
        action: TeamCommands,
    },
    /// Print the ledger in chronological order
    Ledger {
        /// Only this region (season markers are always shown)
        #[arg(long)]
        region: Option<Region>,
        /// Show only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Prediction commands
    Predict {
        #[command(subcommand)]
        action: PredictCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum TeamCommands {
    /// Add a team to the directory
    Add {
        /// Canonical team name as the feed spells it
        name: String,
        /// Short code, e.g. FNC
        short_name: String,
        #[arg(long)]
        region: Region,
        /// Continuity id linking renamed rosters
        #[arg(long, default_value = "0")]
        continuity_id: i64,
    },
    /// List teams
    List {
        /// Only show teams marked active
        #[arg(long)]
        active: bool,
    },
    /// Import teams from a JSON array
    Import {
        /// Path to the JSON file
        file: String,
    },
}

#[derive(Subcommand)]
enum PredictCommands {
    /// Attach a forecast to a ledger entry
    Add {
        /// Ledger entry id
        match_id: i64,
        username: String,
        /// Probability (0-1) that team A wins
        probability: f64,
    },
    /// Show forecasts and scores for a ledger entry
    Show { match_id: i64 },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Ingest {
            start_year,
            regions,
            cache,
            offline,
        } => commands::ingest(&config, start_year, regions, cache, offline),
        Commands::Status => commands::status(&config),
        Commands::Teams { action } => match action {
            TeamCommands::Add {
                name,
                short_name,
                region,
                continuity_id,
            } => commands::team_add(&config, name, short_name, region, continuity_id),
            TeamCommands::List { active } => commands::team_list(&config, active),
            TeamCommands::Import { file } => commands::team_import(&config, &file),
        },
        Commands::Ledger { region, limit } => commands::ledger(&config, region, limit),
        Commands::Predict { action } => match action {
            PredictCommands::Add {
                match_id,
                username,
                probability,
            } => commands::predict_add(&config, match_id, &username, probability),
            PredictCommands::Show { match_id } => commands::predict_show(&config, match_id),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use loe::data::Database;
    use loe::feed::LeaguepediaFeed;
    use loe::ingest::Ingestor;
    use loe::{MatchId, MatchRecord, NewTeam, Team, TeamId};
    use std::collections::HashMap;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        if let Some(parent) = std::path::Path::new(&config.data.database_path).parent() {
            std::fs::create_dir_all(parent)?;
            println!("Created {} directory", parent.display());
        }

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'loe teams import teams.json' to seed the team directory");
        println!("  3. Run 'loe ingest' to fetch and reconcile match data");

        Ok(())
    }

    pub fn ingest(
        config: &Config,
        start_year: Option<i32>,
        regions: Vec<Region>,
        cache: Option<String>,
        offline: bool,
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;

        let mut feed = LeaguepediaFeed::new(&config.feed)?;
        if let Some(cache_dir) = cache {
            println!("Using cache directory: {}", cache_dir);
            feed = feed.with_cache(&cache_dir);
        }
        if offline {
            println!("Offline mode: using cached responses only");
            feed = feed.offline_only(true);
        }

        let mut ingest_config = config.ingest.clone();
        if !regions.is_empty() {
            ingest_config.regions = regions;
        }
        let start_year = start_year.unwrap_or(ingest_config.start_year);

        let summary = Ingestor::new(&db, &feed, &ingest_config).run(start_year)?;
        println!("{}", summary);

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:        {}", config.data.database_path);
        println!(
            "  Teams:       {} ({} active)",
            stats.team_count, stats.active_team_count
        );
        println!("  Matches:     {}", stats.match_count);
        println!("  Markers:     {}", stats.marker_count);
        println!(
            "  Predictions: {} ({} scored)",
            stats.prediction_count, stats.scored_prediction_count
        );
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!(
                "  Range:       {} to {}",
                earliest.date_naive(),
                latest.date_naive()
            );
        }

        Ok(())
    }

    pub fn team_add(
        config: &Config,
        name: String,
        short_name: String,
        region: Region,
        continuity_id: i64,
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let team = db.insert_team(&NewTeam {
            continuity_id,
            name,
            short_name,
            region,
        })?;
        println!("Added {} ({}) as {}", team.name, team.short_name, team.id);
        Ok(())
    }

    pub fn team_list(config: &Config, active_only: bool) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let teams: Vec<Team> = db
            .get_all_teams()?
            .into_iter()
            .filter(|t| !active_only || t.is_active)
            .collect();

        println!("{:<6} {:<4} {:<6} {:<30} Active", "ID", "Reg", "Short", "Name");
        for team in &teams {
            println!(
                "{:<6} {:<4} {:<6} {:<30} {}",
                team.id.0,
                team.region,
                team.short_name,
                team.name,
                if team.is_active { "yes" } else { "" }
            );
        }
        println!("\n{} teams", teams.len());
        Ok(())
    }

    pub fn team_import(config: &Config, file: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let content = std::fs::read_to_string(file)?;
        let teams: Vec<NewTeam> = serde_json::from_str(&content)?;

        let imported = db.atomically(|db| {
            let mut count: usize = 0;
            for team in &teams {
                if db.teams_by_name(&team.name)?.is_empty() {
                    db.insert_team(team)?;
                    count += 1;
                } else {
                    log::debug!("{} already in directory", team.name);
                }
            }
            Ok(count)
        })?;

        println!(
            "Imported {} teams ({} already present)",
            imported,
            teams.len() - imported
        );
        Ok(())
    }

    pub fn ledger(config: &Config, region: Option<Region>, limit: Option<usize>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let matches = match region {
            Some(region) => db.get_region_matches(region)?,
            None => db.get_all_matches()?,
        };

        let names: HashMap<TeamId, String> = db
            .get_all_teams()?
            .into_iter()
            .map(|t| (t.id, t.short_name))
            .collect();

        let skip = limit.map_or(0, |n| matches.len().saturating_sub(n));
        for record in &matches[skip..] {
            println!("{}", describe(record, &names));
        }
        Ok(())
    }

    fn describe(record: &MatchRecord, names: &HashMap<TeamId, String>) -> String {
        if record.is_marker() {
            return record.to_string();
        }
        let name = |id: &TeamId| names.get(id).cloned().unwrap_or_else(|| id.to_string());
        format!(
            "{:>6}  {}  {:<4} {:>6} {}-{} {:<6} Bo{}  {}",
            record.id.0,
            record.start.format(loe::TIMESTAMP_FORMAT),
            record.region,
            name(&record.team_a),
            record.score_a,
            record.score_b,
            name(&record.team_b),
            record.best_of,
            record.match_info
        )
    }

    pub fn predict_add(
        config: &Config,
        match_id: i64,
        username: &str,
        probability: f64,
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let prediction = db.insert_prediction(MatchId(match_id), username, probability)?;
        println!(
            "Recorded {} forecasting {:.1}% for team A in {}",
            prediction.username,
            prediction.predicted_team_a_win_prob * 100.0,
            prediction.match_id
        );
        Ok(())
    }

    pub fn predict_show(config: &Config, match_id: i64) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let record = db.get_match(MatchId(match_id))?;
        println!("{}", record);

        for prediction in db.predictions_for_match(record.id)? {
            let score = prediction
                .score
                .map(|s| format!("{:.4}", s))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<20} {:>6.1}%  score {}",
                prediction.username,
                prediction.predicted_team_a_win_prob * 100.0,
                score
            );
        }
        Ok(())
    }
}
