//! Tournament manager for creating, updating and viewing tournaments.

use std::sync::Arc;

use log::{debug, info};

use super::models::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
use crate::bracket::{Bracket, BracketBuilder};
use crate::errors::{DomainError, DomainResult};
use crate::rules::{RuleSet, validate_id};
use crate::store::{MatchFilter, MatchStore, TournamentFilter, TournamentStore};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    tournaments: Arc<dyn TournamentStore>,
    matches: Arc<dyn MatchStore>,
    rules: Arc<RuleSet>,
    brackets: BracketBuilder,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(
        tournaments: Arc<dyn TournamentStore>,
        matches: Arc<dyn MatchStore>,
        rules: Arc<RuleSet>,
    ) -> Self {
        let brackets = BracketBuilder::new(rules.clone());
        Self {
            tournaments,
            matches,
            rules,
            brackets,
        }
    }

    /// Validate and store a new tournament
    ///
    /// # Errors
    ///
    /// * `DomainError::Validation` - unsupported sport, format not valid
    ///   for the sport, or disallowed status
    pub async fn create(&self, tournament: NewTournament) -> DomainResult<Tournament> {
        self.rules
            .validate_tournament(tournament.sport, tournament.format, tournament.status)?;

        let created = self.tournaments.insert_tournament(&tournament).await?;
        info!(
            "Created {} tournament {} ({}, {})",
            created.sport, created.id, created.format, created.status
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: TournamentId) -> DomainResult<Tournament> {
        validate_id("tournament id", id)?;
        self.load(id).await
    }

    /// Most recently created tournament of `sport`
    pub async fn get_by_sport(&self, sport: Sport) -> DomainResult<Tournament> {
        self.rules.validate_sport(sport)?;
        self.tournaments
            .latest_tournament_by_sport(sport)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("tournament for sport {sport}")))
    }

    /// Newest first
    pub async fn get_all(&self) -> DomainResult<Vec<Tournament>> {
        self.list(TournamentFilter::default()).await
    }

    pub async fn get_by_status(&self, status: TournamentStatus) -> DomainResult<Vec<Tournament>> {
        self.rules.validate_tournament_status(status)?;
        self.list(TournamentFilter {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    /// Active tournaments played in `format`
    pub async fn get_active_by_format(
        &self,
        format: TournamentFormat,
    ) -> DomainResult<Vec<Tournament>> {
        if !self.rules.is_valid_tournament_format(format.as_str()) {
            return Err(DomainError::validation(format!(
                "format '{format}' is not used by any sport"
            )));
        }
        self.list(TournamentFilter {
            format: Some(format),
            status: Some(TournamentStatus::Active),
            ..Default::default()
        })
        .await
    }

    /// Replace format and status. The sport of a tournament never changes.
    pub async fn update(&self, tournament: &Tournament) -> DomainResult<Tournament> {
        validate_id("tournament id", tournament.id)?;
        self.rules
            .validate_tournament(tournament.sport, tournament.format, tournament.status)?;

        let current = self.load(tournament.id).await?;
        if current.sport != tournament.sport {
            return Err(DomainError::validation(format!(
                "tournament {} is a {} tournament; sport cannot change to {}",
                current.id, current.sport, tournament.sport
            )));
        }

        let updated = self
            .tournaments
            .update_tournament(tournament.id, tournament.format, tournament.status)
            .await?
            .ok_or_else(|| missing(tournament.id))?;
        info!("Updated tournament {}", updated.id);
        Ok(updated)
    }

    /// Switch format, e.g. a table tennis event moving indoors when it rains
    pub async fn update_format(
        &self,
        id: TournamentId,
        format: TournamentFormat,
    ) -> DomainResult<()> {
        validate_id("tournament id", id)?;
        let current = self.load(id).await?;
        self.rules.validate_format(current.sport, format)?;

        if !self.tournaments.update_tournament_format(id, format).await? {
            return Err(missing(id));
        }
        info!("Tournament {id} format {} -> {format}", current.format);
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> DomainResult<()> {
        validate_id("tournament id", id)?;
        self.rules.validate_tournament_status(status)?;

        if !self.tournaments.update_tournament_status(id, status).await? {
            return Err(missing(id));
        }
        info!("Tournament {id} status -> {status}");
        Ok(())
    }

    /// Administrative delete; removes the tournament's matches as well
    pub async fn delete(&self, id: TournamentId) -> DomainResult<()> {
        validate_id("tournament id", id)?;
        if !self.tournaments.delete_tournament(id).await? {
            return Err(missing(id));
        }
        info!("Deleted tournament {id} and its matches");
        Ok(())
    }

    /// Bracket of the most recent tournament of `sport`
    pub async fn get_tournament_bracket(&self, sport: Sport) -> DomainResult<Bracket> {
        let tournament = self.get_by_sport(sport).await?;
        self.bracket_for(&tournament).await
    }

    pub async fn get_tournament_bracket_by_id(&self, id: TournamentId) -> DomainResult<Bracket> {
        let tournament = self.get_by_id(id).await?;
        self.bracket_for(&tournament).await
    }

    async fn bracket_for(&self, tournament: &Tournament) -> DomainResult<Bracket> {
        let matches = self
            .matches
            .list_matches(MatchFilter::tournament(tournament.id))
            .await?;
        Ok(self.brackets.build(tournament, matches))
    }

    async fn load(&self, id: TournamentId) -> DomainResult<Tournament> {
        self.tournaments
            .find_tournament(id)
            .await?
            .ok_or_else(|| missing(id))
    }

    async fn list(&self, filter: TournamentFilter) -> DomainResult<Vec<Tournament>> {
        let tournaments = self.tournaments.list_tournaments(filter).await?;
        debug!(
            "Tournament query {filter:?} returned {} rows",
            tournaments.len()
        );
        Ok(tournaments)
    }
}

fn missing(id: TournamentId) -> DomainError {
    DomainError::not_found(format!("tournament {id}"))
}
