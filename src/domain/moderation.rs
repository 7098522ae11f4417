use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Moderation lifecycle of a flagged question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    #[default]
    Pending,
    Reviewed,
    Dismissed,
    Actioned,
}

impl FlagStatus {
    pub const ALL: [FlagStatus; 4] = [
        FlagStatus::Pending,
        FlagStatus::Reviewed,
        FlagStatus::Dismissed,
        FlagStatus::Actioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Pending => "pending",
            FlagStatus::Reviewed => "reviewed",
            FlagStatus::Dismissed => "dismissed",
            FlagStatus::Actioned => "actioned",
        }
    }

    /// Rows written before moderation existed carry no status; they read as pending.
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flag status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for FlagStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(FlagStatus::Pending),
            "reviewed" => Ok(FlagStatus::Reviewed),
            "dismissed" => Ok(FlagStatus::Dismissed),
            "actioned" => Ok(FlagStatus::Actioned),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagAction {
    Flag,
    Unflag,
    Review,
    Dismiss,
    Actioned,
}

impl FlagAction {
    /// History action recorded when a question moves to `status`.
    pub fn for_status(status: FlagStatus) -> Self {
        match status {
            FlagStatus::Pending => FlagAction::Unflag,
            FlagStatus::Reviewed => FlagAction::Review,
            FlagStatus::Dismissed => FlagAction::Dismiss,
            FlagStatus::Actioned => FlagAction::Actioned,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagAction::Flag => "flag",
            FlagAction::Unflag => "unflag",
            FlagAction::Review => "review",
            FlagAction::Dismiss => "dismiss",
            FlagAction::Actioned => "actioned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flag" => Some(FlagAction::Flag),
            "unflag" => Some(FlagAction::Unflag),
            "review" => Some(FlagAction::Review),
            "dismiss" => Some(FlagAction::Dismiss),
            "actioned" => Some(FlagAction::Actioned),
            _ => None,
        }
    }
}

/// Immutable audit record of one moderation action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagHistoryEntry {
    pub id: Uuid,
    pub question_id: String,
    pub action: FlagAction,
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Acting admin, or the reporter for `flag` entries.
    pub actor_id: Option<Uuid>,
}
