//! Match manager: scheduling, result submission and status changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use super::models::{Match, MatchId, MatchResult, MatchStatus, MatchUpdate, NewMatch, Round};
use crate::errors::{DomainError, DomainResult};
use crate::rules::{
    RuleSet, validate_id, validate_match_result, validate_result_for_match, validate_teams,
};
use crate::store::{ConditionalWrite, MatchFilter, MatchStore};
use crate::tournament::models::{Sport, TournamentId};

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    store: Arc<dyn MatchStore>,
    rules: Arc<RuleSet>,
}

impl MatchManager {
    /// Create a new match manager
    pub fn new(store: Arc<dyn MatchStore>, rules: Arc<RuleSet>) -> Self {
        Self { store, rules }
    }

    /// Schedule a new pending match
    ///
    /// # Errors
    ///
    /// * `DomainError::Validation` - bad tournament id, round or teams
    /// * `DomainError::Constraint` - the tournament does not exist
    pub async fn create(&self, new_match: NewMatch) -> DomainResult<Match> {
        self.rules.validate_new_match(&new_match)?;

        let created = self.store.insert_match(&new_match).await?;
        info!(
            "Scheduled match {} ({} vs {}) in {} of tournament {}",
            created.id, created.team1, created.team2, created.round, created.tournament_id
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: MatchId) -> DomainResult<Match> {
        validate_id("match id", id)?;
        self.load(id).await
    }

    /// Edit round, teams or schedule of a match that has not been played.
    pub async fn update(&self, id: MatchId, update: MatchUpdate) -> DomainResult<Match> {
        validate_id("match id", id)?;
        if update.is_empty() {
            return Err(DomainError::validation("match update has no changes"));
        }
        if let Some(round) = update.round {
            self.rules.validate_round(round)?;
        }

        let current = self.load(id).await?;
        match current.status {
            MatchStatus::Completed => return Err(DomainError::MatchAlreadyCompleted(id)),
            MatchStatus::Cancelled => {
                return Err(DomainError::validation(format!("match {id} is cancelled")));
            }
            MatchStatus::Pending | MatchStatus::InProgress => {}
        }
        validate_teams(
            update.team1.as_deref().unwrap_or(current.team1.as_str()),
            update.team2.as_deref().unwrap_or(current.team2.as_str()),
        )?;

        match self
            .store
            .update_match_details(id, current.status, &update)
            .await?
        {
            ConditionalWrite::Applied(updated) => {
                info!("Updated match {id}");
                Ok(updated)
            }
            ConditionalWrite::Conflict(MatchStatus::Completed) => {
                Err(DomainError::MatchAlreadyCompleted(id))
            }
            ConditionalWrite::Conflict(actual) => Err(DomainError::validation(format!(
                "match {id} changed to {actual} while being updated"
            ))),
            ConditionalWrite::Missing => Err(missing(id)),
        }
    }

    pub async fn delete(&self, id: MatchId) -> DomainResult<()> {
        validate_id("match id", id)?;
        if !self.store.delete_match(id).await? {
            return Err(missing(id));
        }
        info!("Deleted match {id}");
        Ok(())
    }

    /// Record the final score of a match.
    ///
    /// The write is conditioned on the stored status still accepting a
    /// result, so of two concurrent submissions only one succeeds; the
    /// other gets `MatchAlreadyCompleted`.
    ///
    /// # Errors
    ///
    /// * `DomainError::Validation` - non-positive id
    /// * `DomainError::InvalidMatchResult` - negative score, draw, empty
    ///   winner, or winner not on the higher score
    /// * `DomainError::NotFound` - no such match (including a delete racing
    ///   the write)
    /// * `DomainError::MatchAlreadyCompleted` - a result is already stored
    /// * `DomainError::InvalidTransition` - the match was cancelled
    ///
    /// A malformed result (negative score, draw, empty winner) is rejected
    /// with `InvalidMatchResult` before the match is loaded, so it reports
    /// that error even when the match is already completed. The stored
    /// result is never changed by a rejected submission.
    pub async fn update_result(&self, id: MatchId, result: MatchResult) -> DomainResult<Match> {
        validate_id("match id", id)?;
        validate_match_result(&result)?;

        let current = self.load(id).await?;
        match current.status {
            MatchStatus::Completed => {
                warn!("Rejected result for match {id}: already completed");
                return Err(DomainError::MatchAlreadyCompleted(id));
            }
            MatchStatus::Cancelled => {
                return Err(DomainError::InvalidTransition {
                    from: MatchStatus::Cancelled,
                    to: MatchStatus::Completed,
                });
            }
            MatchStatus::Pending | MatchStatus::InProgress => {}
        }
        validate_result_for_match(&current, &result)?;

        match self.store.complete_match(id, &result).await? {
            ConditionalWrite::Applied(completed) => {
                info!(
                    "Match {id} completed {}-{}, winner {}",
                    result.score1, result.score2, result.winner
                );
                Ok(completed)
            }
            ConditionalWrite::Conflict(MatchStatus::Completed) => {
                warn!("Rejected result for match {id}: lost race with another submission");
                Err(DomainError::MatchAlreadyCompleted(id))
            }
            ConditionalWrite::Conflict(actual) => Err(DomainError::InvalidTransition {
                from: actual,
                to: MatchStatus::Completed,
            }),
            ConditionalWrite::Missing => Err(missing(id)),
        }
    }

    /// Administrative status change, restricted to the state machine in
    /// [`MatchStatus::can_transition_to`]. A completed match cannot be
    /// reopened through this path.
    pub async fn update_status(&self, id: MatchId, status: MatchStatus) -> DomainResult<Match> {
        validate_id("match id", id)?;
        self.rules.validate_match_status(status)?;

        let current = self.load(id).await?;
        check_transition(id, current.status, status)?;

        match self
            .store
            .transition_status(id, current.status, status)
            .await?
        {
            ConditionalWrite::Applied(updated) => {
                info!("Match {id} status {} -> {status}", current.status);
                Ok(updated)
            }
            ConditionalWrite::Conflict(actual) => {
                check_transition(id, actual, status)?;
                Err(DomainError::validation(format!(
                    "match {id} changed to {actual} while its status was being updated"
                )))
            }
            ConditionalWrite::Missing => Err(missing(id)),
        }
    }

    pub async fn get_by_sport(&self, sport: Sport) -> DomainResult<Vec<Match>> {
        self.rules.validate_sport(sport)?;
        self.list(MatchFilter::sport(sport)).await
    }

    pub async fn get_by_tournament(&self, tournament_id: TournamentId) -> DomainResult<Vec<Match>> {
        validate_id("tournament id", tournament_id)?;
        self.list(MatchFilter::tournament(tournament_id)).await
    }

    pub async fn get_by_tournament_and_round(
        &self,
        tournament_id: TournamentId,
        round: Round,
    ) -> DomainResult<Vec<Match>> {
        validate_id("tournament id", tournament_id)?;
        self.rules.validate_round(round)?;
        self.list(MatchFilter::tournament(tournament_id).with_round(round))
            .await
    }

    pub async fn get_by_status(&self, status: MatchStatus) -> DomainResult<Vec<Match>> {
        self.rules.validate_match_status(status)?;
        self.list(MatchFilter::status(status)).await
    }

    pub async fn get_pending_matches(&self) -> DomainResult<Vec<Match>> {
        self.get_by_status(MatchStatus::Pending).await
    }

    pub async fn get_completed_matches(&self) -> DomainResult<Vec<Match>> {
        self.get_by_status(MatchStatus::Completed).await
    }

    /// Matches scheduled within `[start, end]`
    pub async fn get_matches_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Match>> {
        if start > end {
            return Err(DomainError::validation(format!(
                "date range start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        self.list(MatchFilter::scheduled_between(start, end)).await
    }

    pub async fn count_by_tournament(&self, tournament_id: TournamentId) -> DomainResult<i64> {
        validate_id("tournament id", tournament_id)?;
        self.store
            .count_matches(MatchFilter::tournament(tournament_id))
            .await
    }

    pub async fn count_by_status(&self, status: MatchStatus) -> DomainResult<i64> {
        self.rules.validate_match_status(status)?;
        self.store.count_matches(MatchFilter::status(status)).await
    }

    async fn load(&self, id: MatchId) -> DomainResult<Match> {
        self.store.find_match(id).await?.ok_or_else(|| missing(id))
    }

    async fn list(&self, filter: MatchFilter) -> DomainResult<Vec<Match>> {
        let matches = self.store.list_matches(filter).await?;
        debug!("Match query {filter:?} returned {} rows", matches.len());
        Ok(matches)
    }
}

fn missing(id: MatchId) -> DomainError {
    DomainError::not_found(format!("match {id}"))
}

fn check_transition(id: MatchId, from: MatchStatus, to: MatchStatus) -> DomainResult<()> {
    if from == MatchStatus::Completed {
        return Err(DomainError::MatchAlreadyCompleted(id));
    }
    if !from.can_transition_to(to) {
        return Err(DomainError::InvalidTransition { from, to });
    }
    Ok(())
}
