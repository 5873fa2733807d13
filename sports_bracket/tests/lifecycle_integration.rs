//! Integration tests for the tournament and match lifecycle
//!
//! Runs the managers against the in-memory store, from tournament creation
//! through result submission and the bracket view.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sports_bracket::errors::{DomainError, ErrorKind};
use sports_bracket::matches::{
    Match, MatchManager, MatchResult, MatchStatus, MatchUpdate, NewMatch, Round,
};
use sports_bracket::rules::RuleSet;
use sports_bracket::store::InMemoryStore;
use sports_bracket::tournament::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentManager, TournamentStatus,
};

struct Fixture {
    store: InMemoryStore,
    tournaments: TournamentManager,
    matches: MatchManager,
}

fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let rules = Arc::new(RuleSet::default());
    let tournaments = TournamentManager::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        rules.clone(),
    );
    let matches = MatchManager::new(Arc::new(store.clone()), rules);
    Fixture {
        store,
        tournaments,
        matches,
    }
}

fn kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap()
}

fn new_match(tournament_id: i64, round: Round, team1: &str, team2: &str) -> NewMatch {
    NewMatch {
        tournament_id,
        round,
        team1: team1.to_string(),
        team2: team2.to_string(),
        scheduled_at: kickoff(),
    }
}

async fn active_tournament(f: &Fixture, sport: Sport, format: TournamentFormat) -> Tournament {
    f.tournaments
        .create(NewTournament::new(sport, format).with_status(TournamentStatus::Active))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_volleyball_result_flow() {
    let f = fixture();

    // Tournament gets the first id and is found by sport
    let t = active_tournament(&f, Sport::Volleyball, TournamentFormat::Standard).await;
    assert_eq!(t.id, 1);
    assert_eq!(f.tournaments.get_by_sport(Sport::Volleyball).await.unwrap(), t);

    // New matches start pending
    let m = f
        .matches
        .create(new_match(t.id, Round::FirstRound, "A", "B"))
        .await
        .unwrap();
    assert!(m.id > 0);
    assert_eq!(m.status, MatchStatus::Pending);
    assert!(m.completed_at.is_none());

    // First result completes the match
    let completed = f
        .matches
        .update_result(m.id, MatchResult::new(3, 1, "A"))
        .await
        .unwrap();
    assert_eq!(completed.status, MatchStatus::Completed);
    assert_eq!(completed.winner.as_deref(), Some("A"));
    assert!(completed.completed_at.is_some());

    // A second result is rejected and nothing changes
    let err = f
        .matches
        .update_result(m.id, MatchResult::new(1, 3, "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::MatchAlreadyCompleted(id) if id == m.id));
    assert_eq!(err.code(), "BUSINESS_MATCH_ALREADY_COMPLETED");

    let stored = f.matches.get_by_id(m.id).await.unwrap();
    assert_eq!(stored, completed);
}

#[tokio::test]
async fn test_draw_leaves_match_pending() {
    let f = fixture();
    let t = active_tournament(&f, Sport::Soccer, TournamentFormat::Standard).await;
    let m = f
        .matches
        .create(new_match(t.id, Round::FirstRound, "A", "B"))
        .await
        .unwrap();

    let err = f
        .matches
        .update_result(m.id, MatchResult::new(2, 2, "A"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.code(), "BUSINESS_INVALID_MATCH_RESULT");

    let stored = f.matches.get_by_id(m.id).await.unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
    assert!(stored.score1.is_none());
}

#[tokio::test]
async fn test_rainy_table_tennis_has_loser_bracket() {
    let f = fixture();
    let t = active_tournament(&f, Sport::TableTennis, TournamentFormat::Rainy).await;
    f.matches
        .create(new_match(t.id, Round::FirstRound, "A", "B"))
        .await
        .unwrap();

    let bracket = f
        .tournaments
        .get_tournament_bracket(Sport::TableTennis)
        .await
        .unwrap();
    assert_eq!(bracket.tournament_id, t.id);
    assert_eq!(
        bracket.round_names(),
        vec![
            Round::FirstRound,
            Round::Quarterfinal,
            Round::Semifinal,
            Round::Final,
            Round::LoserBracket,
        ]
    );
    assert!(bracket.round(Round::LoserBracket).unwrap().matches.is_empty());
    assert_eq!(bracket.round(Round::FirstRound).unwrap().matches.len(), 1);
}

#[tokio::test]
async fn test_rain_switch_changes_bracket() {
    let f = fixture();
    let t = active_tournament(&f, Sport::TableTennis, TournamentFormat::Sunny).await;

    let sunny = f.tournaments.get_tournament_bracket_by_id(t.id).await.unwrap();
    assert!(sunny.round(Round::LoserBracket).is_none());

    f.tournaments
        .update_format(t.id, TournamentFormat::Rainy)
        .await
        .unwrap();
    let rainy = f.tournaments.get_tournament_bracket_by_id(t.id).await.unwrap();
    assert_eq!(rainy.format, TournamentFormat::Rainy);
    assert!(rainy.round(Round::LoserBracket).is_some());
}

#[tokio::test]
async fn test_match_round_trip() {
    let f = fixture();
    let t = active_tournament(&f, Sport::Volleyball, TournamentFormat::Standard).await;
    let request = new_match(t.id, Round::Semifinal, "Sharks", "Owls");

    let created = f.matches.create(request.clone()).await.unwrap();
    let fetched = f.matches.get_by_id(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.tournament_id, request.tournament_id);
    assert_eq!(fetched.round, request.round);
    assert_eq!(fetched.team1, request.team1);
    assert_eq!(fetched.team2, request.team2);
    assert_eq!(fetched.scheduled_at, request.scheduled_at);
}

#[tokio::test]
async fn test_completed_match_rejects_every_later_result() {
    let f = fixture();
    let t = active_tournament(&f, Sport::Soccer, TournamentFormat::Standard).await;
    let m = f
        .matches
        .create(new_match(t.id, Round::Final, "Reds", "Blues"))
        .await
        .unwrap();
    let completed = f
        .matches
        .update_result(m.id, MatchResult::new(2, 1, "Reds"))
        .await
        .unwrap();

    let attempts = [
        MatchResult::new(2, 1, "Reds"),
        MatchResult::new(0, 4, "Blues"),
        MatchResult::new(5, 0, "Blues"),
        MatchResult::new(1, 1, "Reds"),
        MatchResult::new(-1, 2, "Blues"),
    ];
    for attempt in attempts {
        let err = f.matches.update_result(m.id, attempt).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.matches.get_by_id(m.id).await.unwrap(), completed);
    }
}

#[tokio::test]
async fn test_match_for_missing_tournament() {
    let f = fixture();
    let err = f
        .matches
        .create(new_match(42, Round::FirstRound, "A", "B"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);
    assert_eq!(f.store.match_count(), 0);
}

#[tokio::test]
async fn test_status_machine() {
    let f = fixture();
    let t = active_tournament(&f, Sport::Volleyball, TournamentFormat::Standard).await;
    let m = f
        .matches
        .create(new_match(t.id, Round::Quarterfinal, "A", "B"))
        .await
        .unwrap();

    let started = f
        .matches
        .update_status(m.id, MatchStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(started.status, MatchStatus::InProgress);

    // completed is reached only with a result
    let err = f
        .matches
        .update_status(m.id, MatchStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    f.matches
        .update_result(m.id, MatchResult::new(3, 2, "B"))
        .await
        .unwrap();
    let err = f
        .matches
        .update_status(m.id, MatchStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::MatchAlreadyCompleted(_)));
}

#[tokio::test]
async fn test_cancelled_match_is_frozen() {
    let f = fixture();
    let t = active_tournament(&f, Sport::Soccer, TournamentFormat::Standard).await;
    let m = f
        .matches
        .create(new_match(t.id, Round::ThirdPlace, "A", "B"))
        .await
        .unwrap();
    f.matches
        .update_status(m.id, MatchStatus::Cancelled)
        .await
        .unwrap();

    let err = f
        .matches
        .update_result(m.id, MatchResult::new(1, 0, "A"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransition {
            from: MatchStatus::Cancelled,
            to: MatchStatus::Completed
        }
    ));

    let err = f
        .matches
        .update(
            m.id,
            MatchUpdate {
                team1: Some("C".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_queries_and_counts() {
    let f = fixture();
    let vb = active_tournament(&f, Sport::Volleyball, TournamentFormat::Standard).await;
    let soccer = active_tournament(&f, Sport::Soccer, TournamentFormat::Standard).await;

    let mut created: Vec<Match> = Vec::new();
    for (i, (t, round)) in [
        (vb.id, Round::FirstRound),
        (vb.id, Round::FirstRound),
        (vb.id, Round::Final),
        (soccer.id, Round::Semifinal),
    ]
    .into_iter()
    .enumerate()
    {
        let mut request = new_match(t, round, "Home", "Away");
        request.scheduled_at = kickoff() + Duration::hours(i as i64);
        created.push(f.matches.create(request).await.unwrap());
    }
    f.matches
        .update_result(created[0].id, MatchResult::new(2, 0, "Home"))
        .await
        .unwrap();

    assert_eq!(f.matches.get_by_tournament(vb.id).await.unwrap().len(), 3);
    assert_eq!(
        f.matches
            .get_by_tournament_and_round(vb.id, Round::FirstRound)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(f.matches.get_by_sport(Sport::Soccer).await.unwrap().len(), 1);
    assert!(f.matches.get_by_sport(Sport::TableTennis).await.unwrap().is_empty());
    assert_eq!(f.matches.get_pending_matches().await.unwrap().len(), 3);
    assert_eq!(f.matches.get_completed_matches().await.unwrap().len(), 1);
    assert_eq!(f.matches.count_by_tournament(vb.id).await.unwrap(), 3);
    assert_eq!(
        f.matches
            .count_by_status(MatchStatus::Completed)
            .await
            .unwrap(),
        1
    );

    let window = f
        .matches
        .get_matches_by_date_range(kickoff() + Duration::hours(1), kickoff() + Duration::hours(2))
        .await
        .unwrap();
    let ids: Vec<i64> = window.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![created[1].id, created[2].id]);

    let err = f
        .matches
        .get_matches_by_date_range(kickoff() + Duration::hours(2), kickoff())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_tournament_listings() {
    let f = fixture();
    let first = active_tournament(&f, Sport::TableTennis, TournamentFormat::Sunny).await;
    let second = active_tournament(&f, Sport::TableTennis, TournamentFormat::Rainy).await;
    f.tournaments
        .create(NewTournament::new(Sport::Soccer, TournamentFormat::Standard))
        .await
        .unwrap();

    assert_eq!(f.tournaments.get_all().await.unwrap().len(), 3);
    assert_eq!(
        f.tournaments.get_by_sport(Sport::TableTennis).await.unwrap().id,
        second.id
    );
    assert_eq!(
        f.tournaments
            .get_by_status(TournamentStatus::Registration)
            .await
            .unwrap()
            .len(),
        1
    );

    let sunny = f
        .tournaments
        .get_active_by_format(TournamentFormat::Sunny)
        .await
        .unwrap();
    assert_eq!(sunny.len(), 1);
    assert_eq!(sunny[0].id, first.id);
}

#[tokio::test]
async fn test_store_outage_is_retryable() {
    let f = fixture();
    f.store.set_offline(true);

    let err = f
        .tournaments
        .create(NewTournament::new(Sport::Volleyball, TournamentFormat::Standard))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.is_retryable());

    f.store.set_offline(false);
    assert!(
        f.tournaments
            .create(NewTournament::new(Sport::Volleyball, TournamentFormat::Standard))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_validation_runs_before_store() {
    let f = fixture();
    f.store.set_offline(true);

    // Bad input is reported as validation even while the store is down
    let err = f
        .tournaments
        .create(NewTournament::new(Sport::Volleyball, TournamentFormat::Sunny))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = f
        .matches
        .update_result(1, MatchResult::new(1, 1, "A"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
