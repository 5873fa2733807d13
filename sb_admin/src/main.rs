//! Administrative command line for tournament brackets.
//!
//! Talks to PostgreSQL directly through the `sports_bracket` managers and
//! prints results as JSON.

use std::sync::Arc;

use anyhow::{Error, bail};
use chrono::{DateTime, Utc};
use log::{info, warn};
use pico_args::Arguments;
use serde_json::to_string_pretty;
use sports_bracket::{
    matches::{MatchManager, MatchResult, MatchStatus, NewMatch, Round},
    rules::RuleSet,
    store::{Database, DatabaseConfig, PgStore, schema},
    tournament::{NewTournament, Sport, TournamentFormat, TournamentManager, TournamentStatus},
};

const HELP: &str = "\
Manage sport tournaments, matches and brackets

USAGE:
  sb_admin [OPTIONS] <COMMAND> [ARGS]

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

COMMANDS:
  init-schema                                   Create tables and indexes
  create-tournament --sport S --format F [--status S]
  list-tournaments  [--status S]
  set-format        --id N --format F
  set-tournament-status --id N --status S
  delete-tournament --id N
  create-match      --tournament N --round R --team1 A --team2 B [--at RFC3339]
  submit-result     --match N --score1 X --score2 Y --winner W
  set-status        --match N --status S
  matches           --tournament N [--round R]
  bracket           (--sport S | --id N)

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Pool size                   [default: 20]
  DB_QUERY_TIMEOUT         Per-query deadline, seconds [default: 5]
  (See DatabaseConfig::from_env for all configuration options)
";

struct Managers {
    tournaments: TournamentManager,
    matches: MatchManager,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    env_logger::builder().format_target(false).init();

    let db_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let db_config = DatabaseConfig::from_env_with_url(db_url)?;

    let Some(command) = pargs.subcommand()? else {
        print!("{HELP}");
        bail!("missing command");
    };

    let db = Database::new(&db_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    db.health_check().await?;
    info!("Database connected successfully");

    if command == "init-schema" {
        schema::ensure_schema(db.pool()).await?;
        db.close().await;
        return Ok(());
    }

    let store = Arc::new(PgStore::from_database(&db));
    let rules = Arc::new(RuleSet::default());
    let managers = Managers {
        tournaments: TournamentManager::new(store.clone(), store.clone(), rules.clone()),
        matches: MatchManager::new(store, rules),
    };

    let outcome = run(&command, &mut pargs, &managers).await;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        warn!("Ignoring unused arguments: {remaining:?}");
    }
    db.close().await;

    let output = outcome?;
    println!("{output}");
    Ok(())
}

async fn run(command: &str, pargs: &mut Arguments, m: &Managers) -> Result<String, Error> {
    let output = match command {
        "create-tournament" => {
            let sport: Sport = pargs.value_from_str("--sport")?;
            let format: TournamentFormat = pargs.value_from_str("--format")?;
            let status: Option<TournamentStatus> = pargs.opt_value_from_str("--status")?;

            let mut new = NewTournament::new(sport, format);
            if let Some(status) = status {
                new = new.with_status(status);
            }
            to_string_pretty(&m.tournaments.create(new).await?)?
        }
        "list-tournaments" => {
            let tournaments = match pargs.opt_value_from_str::<_, TournamentStatus>("--status")? {
                Some(status) => m.tournaments.get_by_status(status).await?,
                None => m.tournaments.get_all().await?,
            };
            to_string_pretty(&tournaments)?
        }
        "set-format" => {
            let id: i64 = pargs.value_from_str("--id")?;
            let format: TournamentFormat = pargs.value_from_str("--format")?;
            m.tournaments.update_format(id, format).await?;
            to_string_pretty(&m.tournaments.get_by_id(id).await?)?
        }
        "set-tournament-status" => {
            let id: i64 = pargs.value_from_str("--id")?;
            let status: TournamentStatus = pargs.value_from_str("--status")?;
            m.tournaments.update_status(id, status).await?;
            to_string_pretty(&m.tournaments.get_by_id(id).await?)?
        }
        "delete-tournament" => {
            let id: i64 = pargs.value_from_str("--id")?;
            m.tournaments.delete(id).await?;
            format!("deleted tournament {id}")
        }
        "create-match" => {
            let scheduled_at: Option<DateTime<Utc>> = pargs.opt_value_from_str("--at")?;
            let new = NewMatch {
                tournament_id: pargs.value_from_str("--tournament")?,
                round: pargs.value_from_str("--round")?,
                team1: pargs.value_from_str("--team1")?,
                team2: pargs.value_from_str("--team2")?,
                scheduled_at: scheduled_at.unwrap_or_else(Utc::now),
            };
            to_string_pretty(&m.matches.create(new).await?)?
        }
        "submit-result" => {
            let id: i64 = pargs.value_from_str("--match")?;
            let result = MatchResult {
                score1: pargs.value_from_str("--score1")?,
                score2: pargs.value_from_str("--score2")?,
                winner: pargs.value_from_str("--winner")?,
            };
            to_string_pretty(&m.matches.update_result(id, result).await?)?
        }
        "set-status" => {
            let id: i64 = pargs.value_from_str("--match")?;
            let status: MatchStatus = pargs.value_from_str("--status")?;
            to_string_pretty(&m.matches.update_status(id, status).await?)?
        }
        "matches" => {
            let tournament_id: i64 = pargs.value_from_str("--tournament")?;
            let matches = match pargs.opt_value_from_str::<_, Round>("--round")? {
                Some(round) => {
                    m.matches
                        .get_by_tournament_and_round(tournament_id, round)
                        .await?
                }
                None => m.matches.get_by_tournament(tournament_id).await?,
            };
            to_string_pretty(&matches)?
        }
        "bracket" => {
            let bracket = match pargs.opt_value_from_str::<_, i64>("--id")? {
                Some(id) => m.tournaments.get_tournament_bracket_by_id(id).await?,
                None => {
                    let sport: Sport = pargs.value_from_str("--sport")?;
                    m.tournaments.get_tournament_bracket(sport).await?
                }
            };
            if !bracket.excluded.is_empty() {
                warn!(
                    "{} match(es) are outside the bracket rounds: {:?}",
                    bracket.excluded.len(),
                    bracket.excluded
                );
            }
            to_string_pretty(&bracket)?
        }
        other => bail!("unknown command '{other}', see --help"),
    };
    Ok(output)
}
