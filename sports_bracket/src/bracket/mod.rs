//! Bracket construction.
//!
//! A bracket is a read-only view: the stored matches of one tournament
//! regrouped into the rounds its (sport, format) pair defines. Every round
//! appears exactly once, in canonical order, even before any match has
//! been scheduled for it.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use sports_bracket::bracket::BracketBuilder;
//! use sports_bracket::matches::Round;
//! use sports_bracket::rules::RuleSet;
//! use sports_bracket::tournament::{Sport, Tournament, TournamentFormat, TournamentStatus};
//!
//! let builder = BracketBuilder::new(Arc::new(RuleSet::default()));
//! let tournament = Tournament {
//!     id: 1,
//!     sport: Sport::TableTennis,
//!     format: TournamentFormat::Rainy,
//!     status: TournamentStatus::Active,
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let bracket = builder.build(&tournament, Vec::new());
//! assert_eq!(bracket.rounds.last().map(|r| r.name), Some(Round::LoserBracket));
//! ```

pub mod builder;

pub use builder::{Bracket, BracketBuilder, BracketRound};
