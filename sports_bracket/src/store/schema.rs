//! Table definitions for the PostgreSQL store.

use sqlx::PgPool;

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_timeout};
use crate::errors::DomainResult;

const CREATE_TOURNAMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS tournaments (
    id          BIGSERIAL PRIMARY KEY,
    sport       TEXT NOT NULL CHECK (sport IN ('volleyball', 'table_tennis', 'soccer')),
    format      TEXT NOT NULL CHECK (format IN ('standard', 'sunny', 'rainy')),
    status      TEXT NOT NULL CHECK (status IN ('registration', 'active', 'completed', 'cancelled')),
    created_at  TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMP NOT NULL DEFAULT NOW()
)
"#;

const CREATE_MATCHES: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
    id             BIGSERIAL PRIMARY KEY,
    tournament_id  BIGINT NOT NULL REFERENCES tournaments (id) ON DELETE CASCADE,
    round          TEXT NOT NULL CHECK (round IN ('1st_round', 'quarterfinal', 'semifinal',
                       'third_place', 'final', 'loser_bracket', 'other')),
    team1          TEXT NOT NULL CHECK (length(trim(team1)) > 0),
    team2          TEXT NOT NULL CHECK (length(trim(team2)) > 0),
    score1         INTEGER CHECK (score1 >= 0),
    score2         INTEGER CHECK (score2 >= 0),
    winner         TEXT,
    status         TEXT NOT NULL DEFAULT 'pending'
                       CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled')),
    scheduled_at   TIMESTAMP NOT NULL,
    completed_at   TIMESTAMP,
    created_at     TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at     TIMESTAMP NOT NULL DEFAULT NOW(),
    CHECK (team1 <> team2),
    CHECK ((status = 'completed') = (completed_at IS NOT NULL)),
    CHECK ((status = 'completed') = (winner IS NOT NULL AND score1 IS NOT NULL AND score2 IS NOT NULL))
)
"#;

const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_tournaments_sport_created ON tournaments (sport, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_matches_tournament_round ON matches (tournament_id, round)",
    "CREATE INDEX IF NOT EXISTS idx_matches_status ON matches (status)",
];

/// Create tables and indexes if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> DomainResult<()> {
    for statement in [CREATE_TOURNAMENTS, CREATE_MATCHES]
        .into_iter()
        .chain(CREATE_INDEXES)
    {
        with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            sqlx::query(statement).execute(pool),
        )
        .await?;
    }
    log::info!("Tournament schema is up to date");
    Ok(())
}
