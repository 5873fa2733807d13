//! Validation rules for tournaments, matches and submitted results.
//!
//! The allowed members of every enumerated category live in a [`RuleSet`]
//! value handed to the managers at construction time. All checks are pure.

use std::collections::BTreeMap;

use crate::errors::{DomainError, DomainResult};
use crate::matches::models::{Match, MatchResult, MatchStatus, NewMatch, Round};
use crate::tournament::models::{Sport, TournamentFormat, TournamentId, TournamentStatus};

/// Per-sport configuration
#[derive(Debug, Clone, PartialEq, Eq)]
struct SportRules {
    formats: Vec<TournamentFormat>,
    rounds: Vec<Round>,
}

/// Immutable table of allowed enum members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    sports: BTreeMap<Sport, SportRules>,
    rounds: Vec<Round>,
    tournament_statuses: Vec<TournamentStatus>,
    match_statuses: Vec<MatchStatus>,
}

impl RuleSet {
    /// Rule set with every round and status but no sports
    pub fn empty() -> Self {
        Self {
            sports: BTreeMap::new(),
            rounds: Round::ALL.to_vec(),
            tournament_statuses: TournamentStatus::ALL.to_vec(),
            match_statuses: MatchStatus::ALL.to_vec(),
        }
    }

    /// Register a sport with its formats and bracket rounds.
    ///
    /// Rounds are kept in canonical order without duplicates regardless
    /// of the order given. Formats keep the order of first appearance.
    pub fn with_sport(
        mut self,
        sport: Sport,
        formats: &[TournamentFormat],
        rounds: &[Round],
    ) -> Self {
        let mut unique_formats = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique_formats.contains(format) {
                unique_formats.push(*format);
            }
        }
        let mut rounds = rounds.to_vec();
        rounds.sort();
        rounds.dedup();
        self.sports.insert(
            sport,
            SportRules {
                formats: unique_formats,
                rounds,
            },
        );
        self
    }

    /// Restrict the round vocabulary
    pub fn with_rounds(mut self, rounds: &[Round]) -> Self {
        let mut rounds = rounds.to_vec();
        rounds.sort();
        rounds.dedup();
        self.rounds = rounds;
        self
    }

    /// Restrict the tournament statuses
    pub fn with_tournament_statuses(mut self, statuses: &[TournamentStatus]) -> Self {
        self.tournament_statuses = statuses.to_vec();
        self
    }

    /// Restrict the match statuses
    pub fn with_match_statuses(mut self, statuses: &[MatchStatus]) -> Self {
        self.match_statuses = statuses.to_vec();
        self
    }

    pub fn sports(&self) -> impl Iterator<Item = Sport> + '_ {
        self.sports.keys().copied()
    }

    pub fn is_valid_sport(&self, sport: &str) -> bool {
        sport
            .parse::<Sport>()
            .is_ok_and(|sport| self.supports_sport(sport))
    }

    pub fn supports_sport(&self, sport: Sport) -> bool {
        self.sports.contains_key(&sport)
    }

    pub fn is_valid_tournament_status(&self, status: &str) -> bool {
        status
            .parse::<TournamentStatus>()
            .is_ok_and(|status| self.tournament_statuses.contains(&status))
    }

    /// Format known to at least one sport
    pub fn is_valid_tournament_format(&self, format: &str) -> bool {
        format.parse::<TournamentFormat>().is_ok_and(|format| {
            self.sports
                .values()
                .any(|rules| rules.formats.contains(&format))
        })
    }

    pub fn is_valid_format_for_sport(&self, sport: Sport, format: TournamentFormat) -> bool {
        self.sports
            .get(&sport)
            .is_some_and(|rules| rules.formats.contains(&format))
    }

    pub fn is_valid_round(&self, round: &str) -> bool {
        round
            .parse::<Round>()
            .is_ok_and(|round| self.rounds.contains(&round))
    }

    pub fn is_valid_match_status(&self, status: &str) -> bool {
        status
            .parse::<MatchStatus>()
            .is_ok_and(|status| self.match_statuses.contains(&status))
    }

    /// Bracket rounds of a sport in canonical order
    pub fn valid_rounds_for_sport(&self, sport: Sport) -> Vec<Round> {
        self.sports
            .get(&sport)
            .map(|rules| rules.rounds.clone())
            .unwrap_or_default()
    }

    pub fn validate_sport(&self, sport: Sport) -> DomainResult<()> {
        if !self.supports_sport(sport) {
            return Err(DomainError::validation(format!(
                "sport '{sport}' is not supported"
            )));
        }
        Ok(())
    }

    pub fn validate_tournament_status(&self, status: TournamentStatus) -> DomainResult<()> {
        if !self.tournament_statuses.contains(&status) {
            return Err(DomainError::validation(format!(
                "tournament status '{status}' is not allowed"
            )));
        }
        Ok(())
    }

    pub fn validate_format(&self, sport: Sport, format: TournamentFormat) -> DomainResult<()> {
        if !self.is_valid_format_for_sport(sport, format) {
            return Err(DomainError::validation(format!(
                "format '{format}' is not valid for {sport}"
            )));
        }
        Ok(())
    }

    pub fn validate_match_status(&self, status: MatchStatus) -> DomainResult<()> {
        if !self.match_statuses.contains(&status) {
            return Err(DomainError::validation(format!(
                "match status '{status}' is not allowed"
            )));
        }
        Ok(())
    }

    pub fn validate_round(&self, round: Round) -> DomainResult<()> {
        if !self.rounds.contains(&round) {
            return Err(DomainError::validation(format!(
                "round '{round}' is not allowed"
            )));
        }
        Ok(())
    }

    /// Sport, sport/format pairing and status
    pub fn validate_tournament(
        &self,
        sport: Sport,
        format: TournamentFormat,
        status: TournamentStatus,
    ) -> DomainResult<()> {
        self.validate_sport(sport)?;
        self.validate_format(sport, format)?;
        self.validate_tournament_status(status)
    }

    pub fn validate_new_match(&self, new_match: &NewMatch) -> DomainResult<()> {
        self.validate_match_fields(
            new_match.tournament_id,
            new_match.round,
            &new_match.team1,
            &new_match.team2,
            MatchStatus::Pending,
        )
    }

    pub fn validate_match(&self, m: &Match) -> DomainResult<()> {
        self.validate_match_fields(m.tournament_id, m.round, &m.team1, &m.team2, m.status)
    }

    fn validate_match_fields(
        &self,
        tournament_id: TournamentId,
        round: Round,
        team1: &str,
        team2: &str,
        status: MatchStatus,
    ) -> DomainResult<()> {
        validate_id("tournament_id", tournament_id)?;
        self.validate_round(round)?;
        validate_teams(team1, team2)?;
        self.validate_match_status(status)
    }
}

impl Default for RuleSet {
    /// Standard rules: volleyball plays a full single-elimination bracket,
    /// table tennis skips the third-place match and adds the sunny/rainy
    /// formats, soccer goes straight from the first round to semifinals.
    fn default() -> Self {
        use Round::*;
        use TournamentFormat::*;

        Self::empty()
            .with_sport(
                Sport::Volleyball,
                &[Standard],
                &[FirstRound, Quarterfinal, Semifinal, ThirdPlace, Final],
            )
            .with_sport(
                Sport::TableTennis,
                &[Standard, Sunny, Rainy],
                &[FirstRound, Quarterfinal, Semifinal, Final],
            )
            .with_sport(
                Sport::Soccer,
                &[Standard],
                &[FirstRound, Semifinal, ThirdPlace, Final],
            )
    }
}

/// Identifiers are assigned by the store and always positive.
pub fn validate_id(field: &str, id: i64) -> DomainResult<()> {
    if id <= 0 {
        return Err(DomainError::validation(format!(
            "{field} must be positive, got {id}"
        )));
    }
    Ok(())
}

/// Teams must be non-empty and distinct.
pub fn validate_teams(team1: &str, team2: &str) -> DomainResult<()> {
    if team1.trim().is_empty() {
        return Err(DomainError::validation("team1 must not be empty"));
    }
    if team2.trim().is_empty() {
        return Err(DomainError::validation("team2 must not be empty"));
    }
    if team1.trim() == team2.trim() {
        return Err(DomainError::validation("team1 and team2 must differ"));
    }
    Ok(())
}

/// Checks that need no knowledge of the match: non-negative scores, no
/// draw, winner present.
pub fn validate_match_result(result: &MatchResult) -> DomainResult<()> {
    if result.score1 < 0 || result.score2 < 0 {
        return Err(DomainError::InvalidMatchResult(format!(
            "scores must be non-negative, got {}-{}",
            result.score1, result.score2
        )));
    }
    if result.score1 == result.score2 {
        return Err(DomainError::InvalidMatchResult(format!(
            "draws are not allowed ({}-{})",
            result.score1, result.score2
        )));
    }
    if result.winner.trim().is_empty() {
        return Err(DomainError::InvalidMatchResult(
            "winner must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// The winner must be the team with the strictly higher score.
pub fn validate_result_for_match(m: &Match, result: &MatchResult) -> DomainResult<()> {
    validate_match_result(result)?;

    let expected = if result.score1 > result.score2 {
        &m.team1
    } else {
        &m.team2
    };
    if result.winner != *expected {
        return Err(DomainError::InvalidMatchResult(format!(
            "winner '{}' does not match the higher score ({}-{}, expected '{}')",
            result.winner, result.score1, result.score2, expected
        )));
    }
    Ok(())
}
