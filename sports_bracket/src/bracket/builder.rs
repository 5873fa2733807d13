//! Groups a tournament's matches into its canonical round list.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::matches::models::{Match, MatchId, Round};
use crate::rules::RuleSet;
use crate::tournament::models::{Sport, Tournament, TournamentFormat, TournamentId};

/// One stage of a bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRound {
    pub name: Round,
    /// Matches in the order they were supplied; may be empty
    pub matches: Vec<Match>,
}

/// Round-by-round view of a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    pub sport: Sport,
    pub format: TournamentFormat,
    pub rounds: Vec<BracketRound>,
    /// Matches left out of the view because their round is not part of
    /// this bracket, or because they belong to another tournament.
    /// They stay in storage untouched.
    pub excluded: Vec<MatchId>,
}

impl Bracket {
    pub fn round(&self, name: Round) -> Option<&BracketRound> {
        self.rounds.iter().find(|round| round.name == name)
    }

    pub fn round_names(&self) -> Vec<Round> {
        self.rounds.iter().map(|round| round.name).collect()
    }

    /// Number of matches placed in the view
    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(|round| round.matches.len()).sum()
    }
}

/// Builds [`Bracket`] views from a rule set
#[derive(Debug, Clone)]
pub struct BracketBuilder {
    rules: Arc<RuleSet>,
}

impl BracketBuilder {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Rounds of a (sport, format) pair in canonical order.
    ///
    /// Rainy table tennis runs a consolation bracket, so `loser_bracket` is
    /// added in its canonical slot when the sport does not already include it.
    pub fn rounds_for(&self, sport: Sport, format: TournamentFormat) -> Vec<Round> {
        let mut rounds = self.rules.valid_rounds_for_sport(sport);
        if sport == Sport::TableTennis && format == TournamentFormat::Rainy {
            let slot = rounds.partition_point(|r| *r < Round::LoserBracket);
            if rounds.get(slot) != Some(&Round::LoserBracket) {
                rounds.insert(slot, Round::LoserBracket);
            }
        }
        rounds
    }

    /// Partition `matches` by round into the tournament's full round list.
    pub fn build(&self, tournament: &Tournament, matches: Vec<Match>) -> Bracket {
        let names = self.rounds_for(tournament.sport, tournament.format);

        let mut by_round: HashMap<Round, Vec<Match>> =
            names.iter().map(|name| (*name, Vec::new())).collect();
        let mut excluded = Vec::new();

        for m in matches {
            if m.tournament_id != tournament.id {
                warn!(
                    "Match {} belongs to tournament {}, not {}; excluded from bracket",
                    m.id, m.tournament_id, tournament.id
                );
                excluded.push(m.id);
                continue;
            }
            match by_round.get_mut(&m.round) {
                Some(slot) => slot.push(m),
                None => {
                    warn!(
                        "Match {} has round '{}' outside the {} {} bracket; excluded",
                        m.id, m.round, tournament.sport, tournament.format
                    );
                    excluded.push(m.id);
                }
            }
        }

        let rounds = names
            .into_iter()
            .map(|name| BracketRound {
                name,
                matches: by_round.remove(&name).unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        debug!(
            "Built bracket for tournament {} with {} rounds ({} excluded matches)",
            tournament.id,
            rounds.len(),
            excluded.len()
        );

        Bracket {
            tournament_id: tournament.id,
            sport: tournament.sport,
            format: tournament.format,
            rounds,
            excluded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::models::MatchStatus;
    use crate::tournament::models::TournamentStatus;
    use chrono::{Duration, Utc};

    fn tournament(sport: Sport, format: TournamentFormat) -> Tournament {
        let now = Utc::now();
        Tournament {
            id: 1,
            sport,
            format,
            status: TournamentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn scheduled(id: MatchId, round: Round) -> Match {
        let now = Utc::now();
        Match {
            id,
            tournament_id: 1,
            round,
            team1: format!("Home {id}"),
            team2: format!("Away {id}"),
            score1: None,
            score2: None,
            winner: None,
            status: MatchStatus::Pending,
            scheduled_at: now + Duration::hours(id),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn builder() -> BracketBuilder {
        BracketBuilder::new(Arc::new(RuleSet::default()))
    }

    #[test]
    fn test_empty_bracket_has_every_round() {
        let bracket = builder().build(
            &tournament(Sport::Volleyball, TournamentFormat::Standard),
            Vec::new(),
        );
        assert_eq!(
            bracket.round_names(),
            vec![
                Round::FirstRound,
                Round::Quarterfinal,
                Round::Semifinal,
                Round::ThirdPlace,
                Round::Final
            ]
        );
        assert!(bracket.rounds.iter().all(|r| r.matches.is_empty()));
        assert_eq!(bracket.match_count(), 0);
    }

    #[test]
    fn test_rainy_table_tennis_gains_loser_bracket() {
        let b = builder();
        let rainy = b.rounds_for(Sport::TableTennis, TournamentFormat::Rainy);
        let sunny = b.rounds_for(Sport::TableTennis, TournamentFormat::Sunny);

        assert_eq!(rainy.last(), Some(&Round::LoserBracket));
        assert_eq!(rainy.len(), sunny.len() + 1);
        assert!(!sunny.contains(&Round::LoserBracket));
    }

    #[test]
    fn test_loser_bracket_not_duplicated() {
        let rules = RuleSet::empty().with_sport(
            Sport::TableTennis,
            &[TournamentFormat::Rainy],
            &[Round::Semifinal, Round::Final, Round::LoserBracket],
        );
        let b = BracketBuilder::new(Arc::new(rules));
        let rounds = b.rounds_for(Sport::TableTennis, TournamentFormat::Rainy);
        assert_eq!(
            rounds,
            vec![Round::Semifinal, Round::Final, Round::LoserBracket]
        );
    }

    #[test]
    fn test_loser_bracket_keeps_canonical_order() {
        let rules = RuleSet::empty().with_sport(
            Sport::TableTennis,
            &[TournamentFormat::Rainy],
            &[Round::Semifinal, Round::Final, Round::Other],
        );
        let b = BracketBuilder::new(Arc::new(rules));
        let rounds = b.rounds_for(Sport::TableTennis, TournamentFormat::Rainy);
        assert_eq!(
            rounds,
            vec![
                Round::Semifinal,
                Round::Final,
                Round::LoserBracket,
                Round::Other
            ]
        );

        let t = tournament(Sport::TableTennis, TournamentFormat::Rainy);
        let bracket = b.build(&t, vec![scheduled(1, Round::Other)]);
        assert_eq!(bracket.round_names(), rounds);
        assert_eq!(bracket.round(Round::Other).unwrap().matches.len(), 1);
    }

    #[test]
    fn test_matches_grouped_in_input_order() {
        let matches = vec![
            scheduled(3, Round::Final),
            scheduled(1, Round::FirstRound),
            scheduled(2, Round::FirstRound),
        ];
        let bracket = builder().build(
            &tournament(Sport::Soccer, TournamentFormat::Standard),
            matches,
        );

        let first = bracket.round(Round::FirstRound).unwrap();
        let ids: Vec<_> = first.matches.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(bracket.round(Round::Final).unwrap().matches.len(), 1);
        assert!(bracket.round(Round::Semifinal).unwrap().matches.is_empty());
        assert!(bracket.excluded.is_empty());
    }

    #[test]
    fn test_out_of_bracket_rounds_are_excluded() {
        // Soccer has no quarterfinal and a sunny day has no loser bracket
        let soccer = builder().build(
            &tournament(Sport::Soccer, TournamentFormat::Standard),
            vec![scheduled(1, Round::Quarterfinal), scheduled(2, Round::Final)],
        );
        assert_eq!(soccer.excluded, vec![1]);
        assert_eq!(soccer.match_count(), 1);
        assert!(soccer.round(Round::Quarterfinal).is_none());

        let sunny = builder().build(
            &tournament(Sport::TableTennis, TournamentFormat::Sunny),
            vec![scheduled(5, Round::LoserBracket), scheduled(6, Round::Other)],
        );
        assert_eq!(sunny.excluded, vec![5, 6]);
    }

    #[test]
    fn test_foreign_matches_are_excluded() {
        let mut foreign = scheduled(9, Round::Final);
        foreign.tournament_id = 2;
        let bracket = builder().build(
            &tournament(Sport::Volleyball, TournamentFormat::Standard),
            vec![foreign],
        );
        assert_eq!(bracket.excluded, vec![9]);
        assert_eq!(bracket.match_count(), 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let matches: Vec<_> = (1..=12)
            .map(|id| scheduled(id, Round::ALL[(id as usize) % Round::ALL.len()]))
            .collect();
        let t = tournament(Sport::TableTennis, TournamentFormat::Rainy);
        let first = builder().build(&t, matches.clone());
        let second = builder().build(&t, matches);
        assert_eq!(first, second);
    }
}
