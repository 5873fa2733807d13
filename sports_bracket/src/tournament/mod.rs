//! Tournament module for sport tournaments and their brackets.
//!
//! This module provides:
//! - Tournament creation with sport/format/status validation
//! - Lookup by id, by sport (most recent first) and by status
//! - Format switches such as sunny to rainy for table tennis
//! - Bracket views assembled from the stored matches
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sports_bracket::rules::RuleSet;
//! use sports_bracket::store::InMemoryStore;
//! use sports_bracket::tournament::{NewTournament, Sport, TournamentFormat, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let manager = TournamentManager::new(store.clone(), store, Arc::new(RuleSet::default()));
//!
//!     let t = manager
//!         .create(NewTournament::new(Sport::TableTennis, TournamentFormat::Sunny))
//!         .await?;
//!     manager.update_format(t.id, TournamentFormat::Rainy).await?;
//!
//!     let bracket = manager.get_tournament_bracket(Sport::TableTennis).await?;
//!     println!("{} rounds", bracket.rounds.len());
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::TournamentManager;
pub use models::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
