//! Tournament data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Tournament ID type
pub type TournamentId = i64;

/// Sport played in a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Volleyball,
    TableTennis,
    Soccer,
}

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Volleyball, Sport::TableTennis, Sport::Soccer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volleyball => "volleyball",
            Self::TableTennis => "table_tennis",
            Self::Soccer => "soccer",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volleyball" => Ok(Self::Volleyball),
            "table_tennis" => Ok(Self::TableTennis),
            "soccer" => Ok(Self::Soccer),
            other => Err(DomainError::validation(format!("unknown sport '{other}'"))),
        }
    }
}

/// Tournament format.
///
/// `Sunny` and `Rainy` are the table tennis weather variants; a rainy
/// table tennis tournament gains a loser's bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    Standard,
    Sunny,
    Rainy,
}

impl TournamentFormat {
    pub const ALL: [TournamentFormat; 3] = [
        TournamentFormat::Standard,
        TournamentFormat::Sunny,
        TournamentFormat::Rainy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Sunny => "sunny",
            Self::Rainy => "rainy",
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "sunny" => Ok(Self::Sunny),
            "rainy" => Ok(Self::Rainy),
            other => Err(DomainError::validation(format!(
                "unknown tournament format '{other}'"
            ))),
        }
    }
}

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting teams
    Registration,
    /// Matches being played
    Active,
    /// All matches played
    Completed,
    /// Tournament called off
    Cancelled,
}

impl TournamentStatus {
    pub const ALL: [TournamentStatus; 4] = [
        TournamentStatus::Registration,
        TournamentStatus::Active,
        TournamentStatus::Completed,
        TournamentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(Self::Registration),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown tournament status '{other}'"
            ))),
        }
    }
}

/// Input for creating a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub sport: Sport,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
}

impl NewTournament {
    pub fn new(sport: Sport, format: TournamentFormat) -> Self {
        Self {
            sport,
            format,
            status: TournamentStatus::Registration,
        }
    }

    pub fn with_status(mut self, status: TournamentStatus) -> Self {
        self.status = status;
        self
    }
}

/// Stored tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Tournament ID
    pub id: TournamentId,
    pub sport: Sport,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
