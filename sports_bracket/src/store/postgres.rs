//! PostgreSQL implementation of the store traits.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_timeout};
use super::{ConditionalWrite, Database, MatchFilter, MatchStore, TournamentFilter, TournamentStore};
use crate::errors::{DomainError, DomainResult, ErrorKind};
use crate::matches::models::{Match, MatchId, MatchResult, MatchStatus, MatchUpdate, NewMatch};
use crate::tournament::models::{
    NewTournament, Sport, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};

const TOURNAMENT_COLUMNS: &str = "id, sport, format, status, created_at, updated_at";

const MATCH_COLUMNS: &str = "m.id, m.tournament_id, m.round, m.team1, m.team2, m.score1, m.score2, \
     m.winner, m.status, m.scheduled_at, m.completed_at, m.created_at, m.updated_at";

const RETURNING_MATCH: &str = "RETURNING id, tournament_id, round, team1, team2, score1, score2, \
     winner, status, scheduled_at, completed_at, created_at, updated_at";

/// Tournament and match store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone(), db.query_timeout())
    }

    /// Status of a row the conditional write skipped, or `Missing`
    async fn explain_skipped_write(&self, id: MatchId) -> DomainResult<ConditionalWrite> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT status FROM matches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let status: String = row.try_get("status")?;
                Ok(ConditionalWrite::Conflict(status.parse()?))
            }
            None => Ok(ConditionalWrite::Missing),
        }
    }

    async fn conditional(
        &self,
        id: MatchId,
        row: Option<PgRow>,
    ) -> DomainResult<ConditionalWrite> {
        match row {
            Some(row) => Ok(ConditionalWrite::Applied(match_from_row(&row)?)),
            None => self.explain_skipped_write(id).await,
        }
    }
}

/// Timeouts stay retryable; anything else is a transaction failure.
fn transaction_error(step: &str, err: DomainError) -> DomainError {
    match err.kind() {
        ErrorKind::Connection => err,
        _ => DomainError::transaction(format!("{step} failed: {err}")),
    }
}

fn tournament_from_row(row: &PgRow) -> DomainResult<Tournament> {
    Ok(Tournament {
        id: row.try_get("id")?,
        sport: row.try_get::<String, _>("sport")?.parse()?,
        format: row.try_get::<String, _>("format")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
        updated_at: row
            .try_get::<chrono::NaiveDateTime, _>("updated_at")?
            .and_utc(),
    })
}

fn match_from_row(row: &PgRow) -> DomainResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round: row.try_get::<String, _>("round")?.parse()?,
        team1: row.try_get("team1")?,
        team2: row.try_get("team2")?,
        score1: row.try_get("score1")?,
        score2: row.try_get("score2")?,
        winner: row.try_get("winner")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        scheduled_at: row
            .try_get::<chrono::NaiveDateTime, _>("scheduled_at")?
            .and_utc(),
        completed_at: row
            .try_get::<Option<chrono::NaiveDateTime>, _>("completed_at")?
            .map(|dt| dt.and_utc()),
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
        updated_at: row
            .try_get::<chrono::NaiveDateTime, _>("updated_at")?
            .and_utc(),
    })
}

fn push_tournament_filter(query: &mut QueryBuilder<'_, Postgres>, filter: TournamentFilter) {
    query.push(" WHERE TRUE");
    if let Some(sport) = filter.sport {
        query.push(" AND sport = ").push_bind(sport.as_str());
    }
    if let Some(format) = filter.format {
        query.push(" AND format = ").push_bind(format.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
}

fn push_match_filter(query: &mut QueryBuilder<'_, Postgres>, filter: MatchFilter) {
    query.push(" FROM matches m JOIN tournaments t ON t.id = m.tournament_id WHERE TRUE");
    if let Some(tournament_id) = filter.tournament_id {
        query.push(" AND m.tournament_id = ").push_bind(tournament_id);
    }
    if let Some(sport) = filter.sport {
        query.push(" AND t.sport = ").push_bind(sport.as_str());
    }
    if let Some(round) = filter.round {
        query.push(" AND m.round = ").push_bind(round.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND m.status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.scheduled_from {
        query.push(" AND m.scheduled_at >= ").push_bind(from.naive_utc());
    }
    if let Some(to) = filter.scheduled_to {
        query.push(" AND m.scheduled_at <= ").push_bind(to.naive_utc());
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn insert_tournament(&self, tournament: &NewTournament) -> DomainResult<Tournament> {
        let sql = format!(
            "INSERT INTO tournaments (sport, format, status) VALUES ($1, $2, $3) RETURNING {TOURNAMENT_COLUMNS}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(tournament.sport.as_str())
                .bind(tournament.format.as_str())
                .bind(tournament.status.as_str())
                .fetch_one(&self.pool),
        )
        .await?;

        tournament_from_row(&row)
    }

    async fn find_tournament(&self, id: TournamentId) -> DomainResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn latest_tournament_by_sport(&self, sport: Sport) -> DomainResult<Option<Tournament>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE sport = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(sport.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(&self, filter: TournamentFilter) -> DomainResult<Vec<Tournament>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments"
        ));
        push_tournament_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = with_timeout(
            self.query_timeout,
            query.build().fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        format: TournamentFormat,
        status: TournamentStatus,
    ) -> DomainResult<Option<Tournament>> {
        let sql = format!(
            "UPDATE tournaments SET format = $2, status = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {TOURNAMENT_COLUMNS}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(id)
                .bind(format.as_str())
                .bind(status.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn update_tournament_format(
        &self,
        id: TournamentId,
        format: TournamentFormat,
    ) -> DomainResult<bool> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("UPDATE tournaments SET format = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(format.as_str())
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> DomainResult<bool> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("UPDATE tournaments SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tournament(&self, id: TournamentId) -> DomainResult<bool> {
        let mut tx = with_timeout(self.query_timeout, self.pool.begin())
            .await
            .map_err(|e| transaction_error("begin", e))?;

        with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
                .bind(id)
                .execute(&mut *tx),
        )
        .await?;

        let result = with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            sqlx::query("DELETE FROM tournaments WHERE id = $1")
                .bind(id)
                .execute(&mut *tx),
        )
        .await?;

        with_timeout(self.query_timeout, tx.commit())
            .await
            .map_err(|e| transaction_error("commit", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchStore for PgStore {
    async fn insert_match(&self, new_match: &NewMatch) -> DomainResult<Match> {
        let sql = format!(
            "INSERT INTO matches (tournament_id, round, team1, team2, status, scheduled_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5) {RETURNING_MATCH}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(new_match.tournament_id)
                .bind(new_match.round.as_str())
                .bind(&new_match.team1)
                .bind(&new_match.team2)
                .bind(new_match.scheduled_at.naive_utc())
                .fetch_one(&self.pool),
        )
        .await?;

        match_from_row(&row)
    }

    async fn find_match(&self, id: MatchId) -> DomainResult<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches m WHERE m.id = $1");
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, filter: MatchFilter) -> DomainResult<Vec<Match>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {MATCH_COLUMNS}"));
        push_match_filter(&mut query, filter);
        query.push(" ORDER BY m.scheduled_at, m.id");

        let rows = with_timeout(
            self.query_timeout,
            query.build().fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn count_matches(&self, filter: MatchFilter) -> DomainResult<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total");
        push_match_filter(&mut query, filter);

        let row = with_timeout(
            self.query_timeout,
            query.build().fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("total")?)
    }

    async fn update_match_details(
        &self,
        id: MatchId,
        expected: MatchStatus,
        update: &MatchUpdate,
    ) -> DomainResult<ConditionalWrite> {
        let sql = format!(
            "UPDATE matches SET \
                round = COALESCE($3, round), \
                team1 = COALESCE($4, team1), \
                team2 = COALESCE($5, team2), \
                scheduled_at = COALESCE($6, scheduled_at), \
                updated_at = NOW() \
             WHERE id = $1 AND status = $2 {RETURNING_MATCH}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(id)
                .bind(expected.as_str())
                .bind(update.round.map(|r| r.as_str()))
                .bind(update.team1.as_deref())
                .bind(update.team2.as_deref())
                .bind(update.scheduled_at.map(|dt| dt.naive_utc()))
                .fetch_optional(&self.pool),
        )
        .await?;

        self.conditional(id, row).await
    }

    async fn complete_match(
        &self,
        id: MatchId,
        result: &MatchResult,
    ) -> DomainResult<ConditionalWrite> {
        let sql = format!(
            "UPDATE matches SET score1 = $2, score2 = $3, winner = $4, status = 'completed', \
                completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'in_progress') {RETURNING_MATCH}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(id)
                .bind(result.score1)
                .bind(result.score2)
                .bind(&result.winner)
                .fetch_optional(&self.pool),
        )
        .await?;

        self.conditional(id, row).await
    }

    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> DomainResult<ConditionalWrite> {
        let sql = format!(
            "UPDATE matches SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 {RETURNING_MATCH}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(id)
                .bind(from.as_str())
                .bind(to.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;

        self.conditional(id, row).await
    }

    async fn delete_match(&self, id: MatchId) -> DomainResult<bool> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM matches WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
