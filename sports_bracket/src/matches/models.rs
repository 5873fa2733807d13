//! Match data models and the match status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::tournament::models::TournamentId;

/// Match ID type
pub type MatchId = i64;

/// Tournament stage.
///
/// Variants are declared in canonical bracket order, so the derived `Ord`
/// agrees with [`Round::precedence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Round {
    #[serde(rename = "1st_round")]
    FirstRound,
    #[serde(rename = "quarterfinal")]
    Quarterfinal,
    #[serde(rename = "semifinal")]
    Semifinal,
    #[serde(rename = "third_place")]
    ThirdPlace,
    #[serde(rename = "final")]
    Final,
    #[serde(rename = "loser_bracket")]
    LoserBracket,
    #[serde(rename = "other")]
    Other,
}

impl Round {
    /// Every round in canonical order
    pub const ALL: [Round; 7] = [
        Round::FirstRound,
        Round::Quarterfinal,
        Round::Semifinal,
        Round::ThirdPlace,
        Round::Final,
        Round::LoserBracket,
        Round::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstRound => "1st_round",
            Self::Quarterfinal => "quarterfinal",
            Self::Semifinal => "semifinal",
            Self::ThirdPlace => "third_place",
            Self::Final => "final",
            Self::LoserBracket => "loser_bracket",
            Self::Other => "other",
        }
    }

    /// Position in the canonical order (1-indexed)
    pub fn precedence(&self) -> u8 {
        match self {
            Self::FirstRound => 1,
            Self::Quarterfinal => 2,
            Self::Semifinal => 3,
            Self::ThirdPlace => 4,
            Self::Final => 5,
            Self::LoserBracket => 6,
            Self::Other => 7,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Round {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Round::ALL
            .into_iter()
            .find(|round| round.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown round '{s}'")))
    }
}

/// Match state.
///
/// ```text
/// pending ──► in_progress ──► completed
///    │             │
///    └─────────────┴────────► cancelled
/// ```
///
/// `completed` is only reached through result submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 4] = [
        MatchStatus::Pending,
        MatchStatus::InProgress,
        MatchStatus::Completed,
        MatchStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a result may be recorded from this state
    pub fn accepts_result(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Transitions reachable through an administrative status change.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Cancelled)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// Input for scheduling a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub round: Round,
    pub team1: String,
    pub team2: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Editable fields of a match that has not been played
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub round: Option<Round>,
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl MatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.round.is_none()
            && self.team1.is_none()
            && self.team2.is_none()
            && self.scheduled_at.is_none()
    }
}

/// Submitted outcome of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score1: i32,
    pub score2: i32,
    pub winner: String,
}

impl MatchResult {
    pub fn new(score1: i32, score2: i32, winner: impl Into<String>) -> Self {
        Self {
            score1,
            score2,
            winner: winner.into(),
        }
    }
}

/// Stored match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round: Round,
    pub team1: String,
    pub team2: String,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub winner: Option<String>,
    pub status: MatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Result fields are populated exactly when the match is completed.
    pub fn is_consistent(&self) -> bool {
        let result_fields = [
            self.score1.is_some(),
            self.score2.is_some(),
            self.winner.is_some(),
            self.completed_at.is_some(),
        ];
        if self.status == MatchStatus::Completed {
            result_fields.iter().all(|set| *set)
        } else {
            result_fields.iter().all(|set| !*set)
        }
    }

    /// Team that lost a completed match
    pub fn loser(&self) -> Option<&str> {
        let winner = self.winner.as_deref()?;
        if winner == self.team1 {
            Some(&self.team2)
        } else {
            Some(&self.team1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_precedence_matches_ord() {
        for pair in Round::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].precedence() < pair[1].precedence());
        }
    }

    #[test]
    fn test_round_parse() {
        assert_eq!("1st_round".parse::<Round>().unwrap(), Round::FirstRound);
        assert_eq!(
            "loser_bracket".parse::<Round>().unwrap(),
            Round::LoserBracket
        );
        assert!("round_of_16".parse::<Round>().is_err());
    }

    #[test]
    fn test_round_serde_names() {
        let json = serde_json::to_string(&Round::FirstRound).unwrap();
        assert_eq!(json, "\"1st_round\"");
        let round: Round = serde_json::from_str("\"third_place\"").unwrap();
        assert_eq!(round, Round::ThirdPlace);
    }

    #[test]
    fn test_state_machine() {
        use MatchStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
        for next in MatchStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_accepts_result() {
        assert!(MatchStatus::Pending.accepts_result());
        assert!(MatchStatus::InProgress.accepts_result());
        assert!(!MatchStatus::Completed.accepts_result());
        assert!(!MatchStatus::Cancelled.accepts_result());
    }

    #[test]
    fn test_loser() {
        let now = chrono::Utc::now();
        let mut m = Match {
            id: 1,
            tournament_id: 1,
            round: Round::Final,
            team1: "A".to_string(),
            team2: "B".to_string(),
            score1: None,
            score2: None,
            winner: None,
            status: MatchStatus::Pending,
            scheduled_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(m.loser(), None);

        m.winner = Some("B".to_string());
        assert_eq!(m.loser(), Some("A"));
    }

    #[test]
    fn test_match_update_is_empty() {
        assert!(MatchUpdate::default().is_empty());
        let update = MatchUpdate {
            round: Some(Round::Final),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
