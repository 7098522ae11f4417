//! Client-side view computations over the fetched flag list.
//!
//! Everything here is pure and recomputed whenever the list, the status
//! filter or the search term changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::moderation::{FlagStatus, UnknownStatus};
use crate::domain::question::FlaggedQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(FlagStatus),
}

impl StatusFilter {
    pub fn admits(&self, status: FlagStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => f.write_str(status.as_str()),
        }
    }
}

/// Whether `question` belongs in the view for `filter` and `search`.
///
/// A blank search term means no search. Otherwise the term must appear,
/// ignoring case, in the question text, the domain, the difficulty label or
/// any flag reason.
pub fn matches(question: &FlaggedQuestion, filter: StatusFilter, search: &str) -> bool {
    if !filter.admits(question.flag_status) {
        return false;
    }

    let term = search.trim();
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&term);

    contains(&question.question)
        || contains(&question.domain)
        || contains(question.difficulty.as_str())
        || question.flag_reasons.iter().any(|reason| contains(reason))
}

pub fn filter_questions(
    questions: &[FlaggedQuestion],
    filter: StatusFilter,
    search: &str,
) -> Vec<FlaggedQuestion> {
    questions
        .iter()
        .filter(|question| matches(question, filter, search))
        .cloned()
        .collect()
}

/// Tab counts. Always computed over the unfiltered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub reviewed: usize,
    pub dismissed: usize,
    pub actioned: usize,
}

impl StatusCounts {
    pub fn from_questions(questions: &[FlaggedQuestion]) -> Self {
        let mut counts = StatusCounts {
            all: questions.len(),
            ..Default::default()
        };
        for question in questions {
            match question.flag_status {
                FlagStatus::Pending => counts.pending += 1,
                FlagStatus::Reviewed => counts.reviewed += 1,
                FlagStatus::Dismissed => counts.dismissed += 1,
                FlagStatus::Actioned => counts.actioned += 1,
            }
        }
        counts
    }

    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Only(FlagStatus::Pending) => self.pending,
            StatusFilter::Only(FlagStatus::Reviewed) => self.reviewed,
            StatusFilter::Only(FlagStatus::Dismissed) => self.dismissed,
            StatusFilter::Only(FlagStatus::Actioned) => self.actioned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagStats {
    pub total_flagged: usize,
    pub by_status: StatusCounts,
    /// Mean flag count, one decimal place. Zero for an empty list.
    pub average_flags: f64,
}

impl FlagStats {
    pub fn from_questions(questions: &[FlaggedQuestion]) -> Self {
        let by_status = StatusCounts::from_questions(questions);
        let average_flags = if questions.is_empty() {
            0.0
        } else {
            let total: u64 = questions.iter().map(|q| u64::from(q.flag_count)).sum();
            let mean = total as f64 / questions.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        FlagStats {
            total_flagged: questions.len(),
            by_status,
            average_flags,
        }
    }
}
