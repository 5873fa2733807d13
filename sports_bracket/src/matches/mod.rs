//! Match scheduling and the result state machine.
//!
//! A match is created `pending`, may be started (`in_progress`) or
//! `cancelled` administratively, and becomes `completed` exactly once when
//! its result is submitted. Completed and cancelled matches are frozen.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use sports_bracket::matches::{MatchManager, MatchResult, NewMatch, Round};
//! use sports_bracket::rules::RuleSet;
//! use sports_bracket::store::InMemoryStore;
//! use sports_bracket::tournament::{NewTournament, Sport, TournamentFormat, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let rules = Arc::new(RuleSet::default());
//!     let tournaments = TournamentManager::new(store.clone(), store.clone(), rules.clone());
//!     let matches = MatchManager::new(store, rules);
//!
//!     let t = tournaments
//!         .create(NewTournament::new(Sport::Soccer, TournamentFormat::Standard))
//!         .await?;
//!     let m = matches
//!         .create(NewMatch {
//!             tournament_id: t.id,
//!             round: Round::FirstRound,
//!             team1: "Sharks".to_string(),
//!             team2: "Owls".to_string(),
//!             scheduled_at: Utc::now(),
//!         })
//!         .await?;
//!
//!     matches.update_result(m.id, MatchResult::new(3, 1, "Sharks")).await?;
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::MatchManager;
pub use models::{Match, MatchId, MatchResult, MatchStatus, MatchUpdate, NewMatch, Round};
