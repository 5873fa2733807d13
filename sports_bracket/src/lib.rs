//! # Sports Bracket
//!
//! Tournament bracket management for a multi-sport event: volleyball,
//! table tennis and soccer tournaments, their scheduled matches, match
//! results and the bracket view built from them.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Tournament records and the tournament manager
//! - [`matches`]: Matches, results and the match status state machine
//! - [`bracket`]: Read-only bracket views grouped by round
//! - [`rules`]: The sport/format/round/status rule set and validators
//! - [`store`]: Persistence traits plus PostgreSQL and in-memory stores
//! - [`errors`]: Domain error type shared by every operation
//!
//! ## Example
//!
//! ```
//! use sports_bracket::rules::RuleSet;
//! use sports_bracket::tournament::{Sport, TournamentFormat};
//!
//! let rules = RuleSet::default();
//! assert!(rules.is_valid_format_for_sport(Sport::TableTennis, TournamentFormat::Rainy));
//! assert!(!rules.is_valid_format_for_sport(Sport::Soccer, TournamentFormat::Rainy));
//! ```

/// Bracket views.
pub mod bracket;

/// Domain errors.
pub mod errors;
pub use errors::{DomainError, DomainResult, ErrorKind};

/// Matches and results.
pub mod matches;

/// Validation rules.
pub mod rules;

/// Persistence layer.
pub mod store;

/// Tournaments.
pub mod tournament;
