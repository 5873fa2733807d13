//! In-memory store for tests and tooling.
//!
//! Behaves like the PostgreSQL store: ids start at 1, a match needs an
//! existing tournament, deleting a tournament removes its matches, and
//! conditional writes are atomic because every call holds the same lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{ConditionalWrite, MatchFilter, MatchStore, TournamentFilter, TournamentStore};
use crate::errors::{DomainError, DomainResult};
use crate::matches::models::{
    Match, MatchId, MatchResult, MatchStatus, MatchUpdate, NewMatch,
};
use crate::tournament::models::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};

#[derive(Default)]
struct State {
    tournaments: BTreeMap<TournamentId, Tournament>,
    matches: BTreeMap<MatchId, Match>,
    next_tournament_id: TournamentId,
    next_match_id: MatchId,
}

impl State {
    fn sport_of(&self, tournament_id: TournamentId) -> Option<Sport> {
        self.tournaments.get(&tournament_id).map(|t| t.sport)
    }

    fn filtered_matches(&self, filter: &MatchFilter) -> Vec<&Match> {
        let mut matches: Vec<&Match> = self
            .matches
            .values()
            .filter(|m| filter.matches_row(m))
            .filter(|m| {
                filter
                    .sport
                    .is_none_or(|sport| self.sport_of(m.tournament_id) == Some(sport))
            })
            .collect();
        matches.sort_by_key(|m| (m.scheduled_at, m.id));
        matches
    }
}

/// Shared in-memory tournament and match store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a `Connection` error until
    /// switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn tournament_count(&self) -> usize {
        self.lock().tournaments.len()
    }

    pub fn match_count(&self) -> usize {
        self.lock().matches.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connect(&self) -> DomainResult<MutexGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DomainError::connection("in-memory store is offline"));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl TournamentStore for InMemoryStore {
    async fn insert_tournament(&self, tournament: &NewTournament) -> DomainResult<Tournament> {
        let mut state = self.connect()?;
        state.next_tournament_id += 1;
        let now = Utc::now();
        let stored = Tournament {
            id: state.next_tournament_id,
            sport: tournament.sport,
            format: tournament.format,
            status: tournament.status,
            created_at: now,
            updated_at: now,
        };
        state.tournaments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_tournament(&self, id: TournamentId) -> DomainResult<Option<Tournament>> {
        Ok(self.connect()?.tournaments.get(&id).cloned())
    }

    async fn latest_tournament_by_sport(&self, sport: Sport) -> DomainResult<Option<Tournament>> {
        let state = self.connect()?;
        Ok(state
            .tournaments
            .values()
            .filter(|t| t.sport == sport)
            .max_by_key(|t| (t.created_at, t.id))
            .cloned())
    }

    async fn list_tournaments(&self, filter: TournamentFilter) -> DomainResult<Vec<Tournament>> {
        let state = self.connect()?;
        let mut tournaments: Vec<Tournament> = state
            .tournaments
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tournaments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(tournaments)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        format: TournamentFormat,
        status: TournamentStatus,
    ) -> DomainResult<Option<Tournament>> {
        let mut state = self.connect()?;
        Ok(state.tournaments.get_mut(&id).map(|t| {
            t.format = format;
            t.status = status;
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn update_tournament_format(
        &self,
        id: TournamentId,
        format: TournamentFormat,
    ) -> DomainResult<bool> {
        let mut state = self.connect()?;
        Ok(state
            .tournaments
            .get_mut(&id)
            .map(|t| {
                t.format = format;
                t.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> DomainResult<bool> {
        let mut state = self.connect()?;
        Ok(state
            .tournaments
            .get_mut(&id)
            .map(|t| {
                t.status = status;
                t.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete_tournament(&self, id: TournamentId) -> DomainResult<bool> {
        let mut state = self.connect()?;
        if state.tournaments.remove(&id).is_none() {
            return Ok(false);
        }
        state.matches.retain(|_, m| m.tournament_id != id);
        Ok(true)
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn insert_match(&self, new_match: &NewMatch) -> DomainResult<Match> {
        let mut state = self.connect()?;
        if !state.tournaments.contains_key(&new_match.tournament_id) {
            return Err(DomainError::constraint(format!(
                "tournament {} does not exist",
                new_match.tournament_id
            )));
        }

        state.next_match_id += 1;
        let now = Utc::now();
        let stored = Match {
            id: state.next_match_id,
            tournament_id: new_match.tournament_id,
            round: new_match.round,
            team1: new_match.team1.clone(),
            team2: new_match.team2.clone(),
            score1: None,
            score2: None,
            winner: None,
            status: MatchStatus::Pending,
            scheduled_at: new_match.scheduled_at,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.matches.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_match(&self, id: MatchId) -> DomainResult<Option<Match>> {
        Ok(self.connect()?.matches.get(&id).cloned())
    }

    async fn list_matches(&self, filter: MatchFilter) -> DomainResult<Vec<Match>> {
        let state = self.connect()?;
        Ok(state
            .filtered_matches(&filter)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn count_matches(&self, filter: MatchFilter) -> DomainResult<i64> {
        let state = self.connect()?;
        Ok(state.filtered_matches(&filter).len() as i64)
    }

    async fn update_match_details(
        &self,
        id: MatchId,
        expected: MatchStatus,
        update: &MatchUpdate,
    ) -> DomainResult<ConditionalWrite> {
        let mut state = self.connect()?;
        let Some(m) = state.matches.get_mut(&id) else {
            return Ok(ConditionalWrite::Missing);
        };
        if m.status != expected {
            return Ok(ConditionalWrite::Conflict(m.status));
        }

        if let Some(round) = update.round {
            m.round = round;
        }
        if let Some(team1) = &update.team1 {
            m.team1 = team1.clone();
        }
        if let Some(team2) = &update.team2 {
            m.team2 = team2.clone();
        }
        if let Some(scheduled_at) = update.scheduled_at {
            m.scheduled_at = scheduled_at;
        }
        m.updated_at = Utc::now();
        Ok(ConditionalWrite::Applied(m.clone()))
    }

    async fn complete_match(
        &self,
        id: MatchId,
        result: &MatchResult,
    ) -> DomainResult<ConditionalWrite> {
        let mut state = self.connect()?;
        let Some(m) = state.matches.get_mut(&id) else {
            return Ok(ConditionalWrite::Missing);
        };
        if !m.status.accepts_result() {
            return Ok(ConditionalWrite::Conflict(m.status));
        }

        let now = Utc::now();
        m.score1 = Some(result.score1);
        m.score2 = Some(result.score2);
        m.winner = Some(result.winner.clone());
        m.status = MatchStatus::Completed;
        m.completed_at = Some(now);
        m.updated_at = now;
        Ok(ConditionalWrite::Applied(m.clone()))
    }

    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> DomainResult<ConditionalWrite> {
        let mut state = self.connect()?;
        let Some(m) = state.matches.get_mut(&id) else {
            return Ok(ConditionalWrite::Missing);
        };
        if m.status != from {
            return Ok(ConditionalWrite::Conflict(m.status));
        }

        m.status = to;
        m.updated_at = Utc::now();
        Ok(ConditionalWrite::Applied(m.clone()))
    }

    async fn delete_match(&self, id: MatchId) -> DomainResult<bool> {
        Ok(self.connect()?.matches.remove(&id).is_some())
    }
}
