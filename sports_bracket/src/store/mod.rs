//! Persistence capabilities consumed by the managers.
//!
//! The managers only see [`TournamentStore`] and [`MatchStore`]. Two
//! implementations ship with the crate: [`PgStore`] over PostgreSQL and
//! [`InMemoryStore`] for tests and tooling. Both report failures through
//! the [`DomainError`](crate::errors::DomainError) taxonomy.
//!
//! Result submission and status changes go through conditional writes
//! (`... WHERE status = <expected>`): when two writers race for the same
//! match, exactly one sees [`ConditionalWrite::Applied`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;
use crate::matches::models::{
    Match, MatchId, MatchResult, MatchStatus, MatchUpdate, NewMatch, Round,
};
use crate::tournament::models::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};

pub mod config;
pub mod database;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use database::Database;
pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Outcome of a write conditioned on the stored match status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalWrite {
    /// Row updated; carries the stored match after the write
    Applied(Match),
    /// Row exists but its status did not satisfy the condition
    Conflict(MatchStatus),
    /// No row with that id
    Missing,
}

/// Tournament listing filter; `None` fields match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TournamentFilter {
    pub sport: Option<Sport>,
    pub format: Option<TournamentFormat>,
    pub status: Option<TournamentStatus>,
}

impl TournamentFilter {
    pub fn matches(&self, t: &Tournament) -> bool {
        self.sport.is_none_or(|sport| t.sport == sport)
            && self.format.is_none_or(|format| t.format == format)
            && self.status.is_none_or(|status| t.status == status)
    }
}

/// Match listing filter; `None` fields match everything.
///
/// The schedule window is inclusive on both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub tournament_id: Option<TournamentId>,
    pub sport: Option<Sport>,
    pub round: Option<Round>,
    pub status: Option<MatchStatus>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

impl MatchFilter {
    pub fn tournament(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id: Some(tournament_id),
            ..Default::default()
        }
    }

    pub fn status(status: MatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn sport(sport: Sport) -> Self {
        Self {
            sport: Some(sport),
            ..Default::default()
        }
    }

    pub fn scheduled_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            scheduled_from: Some(from),
            scheduled_to: Some(to),
            ..Default::default()
        }
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    /// Everything except the sport, which needs the owning tournament.
    pub fn matches_row(&self, m: &Match) -> bool {
        self.tournament_id.is_none_or(|id| m.tournament_id == id)
            && self.round.is_none_or(|round| m.round == round)
            && self.status.is_none_or(|status| m.status == status)
            && self.scheduled_from.is_none_or(|from| m.scheduled_at >= from)
            && self.scheduled_to.is_none_or(|to| m.scheduled_at <= to)
    }
}

/// Tournament persistence
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Insert and return the stored row with id and timestamps assigned
    async fn insert_tournament(&self, tournament: &NewTournament) -> DomainResult<Tournament>;

    async fn find_tournament(&self, id: TournamentId) -> DomainResult<Option<Tournament>>;

    /// Most recently created tournament of a sport
    async fn latest_tournament_by_sport(&self, sport: Sport) -> DomainResult<Option<Tournament>>;

    /// Newest first
    async fn list_tournaments(&self, filter: TournamentFilter) -> DomainResult<Vec<Tournament>>;

    /// Overwrite format and status; `None` when the id does not exist
    async fn update_tournament(
        &self,
        id: TournamentId,
        format: TournamentFormat,
        status: TournamentStatus,
    ) -> DomainResult<Option<Tournament>>;

    /// Returns whether a row was affected
    async fn update_tournament_format(
        &self,
        id: TournamentId,
        format: TournamentFormat,
    ) -> DomainResult<bool>;

    /// Returns whether a row was affected
    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> DomainResult<bool>;

    /// Remove the tournament together with its matches, atomically
    async fn delete_tournament(&self, id: TournamentId) -> DomainResult<bool>;
}

/// Match persistence
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert a pending match; a missing tournament is a `Constraint` error
    async fn insert_match(&self, new_match: &NewMatch) -> DomainResult<Match>;

    async fn find_match(&self, id: MatchId) -> DomainResult<Option<Match>>;

    /// Ordered by schedule, then id
    async fn list_matches(&self, filter: MatchFilter) -> DomainResult<Vec<Match>>;

    async fn count_matches(&self, filter: MatchFilter) -> DomainResult<i64>;

    /// Apply `update` if the stored status is still `expected`
    async fn update_match_details(
        &self,
        id: MatchId,
        expected: MatchStatus,
        update: &MatchUpdate,
    ) -> DomainResult<ConditionalWrite>;

    /// Record the result if the match is pending or in progress
    async fn complete_match(
        &self,
        id: MatchId,
        result: &MatchResult,
    ) -> DomainResult<ConditionalWrite>;

    /// Move from `from` to `to` if the stored status is still `from`
    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> DomainResult<ConditionalWrite>;

    /// Returns whether a row was removed
    async fn delete_match(&self, id: MatchId) -> DomainResult<bool>;
}
