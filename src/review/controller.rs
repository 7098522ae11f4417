use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::app::flags::{FlagError, FlagService};
use crate::domain::moderation::{FlagHistoryEntry, FlagStatus};
use crate::domain::question::FlaggedQuestion;
use crate::review::filter::{filter_questions, FlagStats, StatusCounts, StatusFilter};
use crate::review::notify::{AdminIdentity, Notice, Notifier};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("an authenticated admin is required")]
    AuthRequired,

    #[error("an action is already in flight for question {0}")]
    Busy(String),

    #[error("question {0} is not in the current list")]
    UnknownQuestion(String),

    #[error("question {0} must be actioned before it can be deleted")]
    NotDeletable(String),

    #[error("no pending delete confirmation for question {0}")]
    NoPendingDelete(String),

    #[error(transparent)]
    Service(#[from] FlagError),
}

#[derive(Default)]
struct ReviewState {
    questions: Vec<FlaggedQuestion>,
    filter: StatusFilter,
    search: String,
    busy: HashSet<String>,
    pending_delete: Option<String>,
    selected: Option<String>,
    history: Vec<FlagHistoryEntry>,
}

impl ReviewState {
    /// True for `None` or an id present in the fetched list.
    fn lists(&self, question_id: Option<&str>) -> bool {
        question_id.map_or(true, |id| self.questions.iter().any(|q| q.id == id))
    }
}

/// Snapshot of everything the moderation view renders.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub filter: StatusFilter,
    pub search: String,
    pub visible: Vec<FlaggedQuestion>,
    pub counts: StatusCounts,
    pub stats: FlagStats,
    pub busy: Vec<String>,
    pub pending_delete: Option<String>,
    pub selected: Option<FlaggedQuestion>,
    pub history: Vec<FlagHistoryEntry>,
}

/// Drives the flag moderation workflow over a [`FlagService`].
///
/// The fetched list is a cache of the store. Successful mutations patch it
/// right away and schedule a full reload after `refresh_delay`; until that
/// reload lands the list may disagree with the store. Overlapping responses
/// are not ordered: whichever arrives last wins.
#[derive(Clone)]
pub struct FlagReviewController {
    service: Arc<dyn FlagService>,
    identity: Arc<dyn AdminIdentity>,
    notifier: Arc<dyn Notifier>,
    refresh_delay: Duration,
    state: Arc<Mutex<ReviewState>>,
}

impl FlagReviewController {
    pub fn new(
        service: Arc<dyn FlagService>,
        identity: Arc<dyn AdminIdentity>,
        notifier: Arc<dyn Notifier>,
        refresh_delay: Duration,
    ) -> Self {
        Self {
            service,
            identity,
            notifier,
            refresh_delay,
            state: Arc::new(Mutex::new(ReviewState::default())),
        }
    }

    pub async fn refresh(&self) -> Result<(), ReviewError> {
        match self.service.list_flagged().await {
            Ok(questions) => {
                let mut state = self.state.lock().await;
                tracing::debug!(count = questions.len(), "flag list refreshed");
                state.questions = questions;
                // Drop references to questions that left the list.
                if !state.lists(state.pending_delete.as_deref()) {
                    state.pending_delete = None;
                }
                if !state.lists(state.selected.as_deref()) {
                    state.selected = None;
                    state.history.clear();
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = ?err, "failed to load flagged questions");
                self.notifier.notify(Notice::error(
                    "Could not load flagged questions",
                    err.to_string(),
                ));
                Err(err.into())
            }
        }
    }

    /// Opens a question for review and loads its history.
    ///
    /// A history that fails to load is shown the same way as an empty one.
    pub async fn select(&self, question_id: &str) {
        {
            let mut state = self.state.lock().await;
            if state.pending_delete.as_deref() != Some(question_id) {
                state.pending_delete = None;
            }
            state.selected = Some(question_id.to_string());
            state.history.clear();
        }

        let history = match self.service.get_history(question_id).await {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(error = ?err, question_id = %question_id, "failed to load flag history");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.selected.as_deref() == Some(question_id) {
            state.history = history;
        }
    }

    pub async fn deselect(&self) {
        let mut state = self.state.lock().await;
        state.selected = None;
        state.history.clear();
        state.pending_delete = None;
    }

    pub async fn set_filter(&self, filter: StatusFilter) {
        let mut state = self.state.lock().await;
        state.filter = filter;
        state.pending_delete = None;
    }

    pub async fn set_search(&self, term: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.search = term.into();
        state.pending_delete = None;
    }

    pub async fn update_status(
        &self,
        question_id: &str,
        status: FlagStatus,
    ) -> Result<(), ReviewError> {
        let admin_id = self.require_admin()?;
        {
            let mut state = self.state.lock().await;
            state.pending_delete = None;
            self.mark_busy(&mut state, question_id)?;
        }

        let result = self
            .service
            .update_status(question_id, status, admin_id)
            .await;

        let mut state = self.state.lock().await;
        state.busy.remove(question_id);
        match result {
            Ok(()) => {
                if let Some(question) = state.questions.iter_mut().find(|q| q.id == question_id) {
                    question.flag_status = status;
                }
                drop(state);

                tracing::info!(question_id = %question_id, status = %status, admin_id = %admin_id, "flag status updated");
                self.notifier.notify(Notice::success(
                    "Flag updated",
                    format!("Question {} marked {}", question_id, status),
                ));
                self.schedule_refresh();
                Ok(())
            }
            Err(err) => {
                drop(state);
                tracing::error!(error = ?err, question_id = %question_id, status = %status, "failed to update flag status");
                self.notifier
                    .notify(Notice::error("Could not update flag", err.to_string()));
                Err(err.into())
            }
        }
    }

    /// First half of the delete protocol. Only actioned questions qualify,
    /// and only one question holds a pending confirmation at a time.
    pub async fn request_delete(&self, question_id: &str) -> Result<(), ReviewError> {
        let mut state = self.state.lock().await;
        let outcome = match state.questions.iter().find(|q| q.id == question_id) {
            None => Err(ReviewError::UnknownQuestion(question_id.to_string())),
            Some(question) if question.flag_status != FlagStatus::Actioned => {
                Err(ReviewError::NotDeletable(question_id.to_string()))
            }
            Some(_) if state.busy.contains(question_id) => {
                Err(ReviewError::Busy(question_id.to_string()))
            }
            Some(_) => Ok(()),
        };

        match outcome {
            Ok(()) => {
                state.pending_delete = Some(question_id.to_string());
                Ok(())
            }
            Err(err) => {
                state.pending_delete = None;
                drop(state);
                self.notifier
                    .notify(Notice::error("Cannot delete question", err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn cancel_delete(&self) {
        self.state.lock().await.pending_delete = None;
    }

    /// Second half of the delete protocol; runs the destructive call.
    pub async fn confirm_delete(&self, question_id: &str) -> Result<(), ReviewError> {
        let admin_id = {
            let mut state = self.state.lock().await;
            if state.pending_delete.as_deref() != Some(question_id) {
                drop(state);
                let err = ReviewError::NoPendingDelete(question_id.to_string());
                self.notifier
                    .notify(Notice::error("Delete not confirmed", err.to_string()));
                return Err(err);
            }
            let admin_id = self.require_admin()?;
            self.mark_busy(&mut state, question_id)?;
            state.pending_delete = None;
            admin_id
        };

        let result = self.service.delete_question(question_id, admin_id).await;

        let mut state = self.state.lock().await;
        state.busy.remove(question_id);
        match result {
            Ok(()) => {
                state.questions.retain(|q| q.id != question_id);
                if state.selected.as_deref() == Some(question_id) {
                    state.selected = None;
                    state.history.clear();
                }
                drop(state);

                tracing::info!(question_id = %question_id, admin_id = %admin_id, "flagged question deleted");
                self.notifier.notify(Notice::success(
                    "Question deleted",
                    format!("Question {} was permanently removed", question_id),
                ));
                self.schedule_refresh();
                Ok(())
            }
            Err(err) => {
                drop(state);
                tracing::error!(error = ?err, question_id = %question_id, "failed to delete question");
                self.notifier
                    .notify(Notice::error("Could not delete question", err.to_string()));
                Err(err.into())
            }
        }
    }

    pub async fn view(&self) -> ReviewView {
        let state = self.state.lock().await;
        let mut busy: Vec<String> = state.busy.iter().cloned().collect();
        busy.sort();

        ReviewView {
            filter: state.filter,
            search: state.search.clone(),
            visible: filter_questions(&state.questions, state.filter, &state.search),
            counts: StatusCounts::from_questions(&state.questions),
            stats: FlagStats::from_questions(&state.questions),
            busy,
            pending_delete: state.pending_delete.clone(),
            selected: state
                .selected
                .as_ref()
                .and_then(|id| state.questions.iter().find(|q| &q.id == id))
                .cloned(),
            history: state.history.clone(),
        }
    }

    pub async fn is_busy(&self, question_id: &str) -> bool {
        self.state.lock().await.busy.contains(question_id)
    }

    fn require_admin(&self) -> Result<Uuid, ReviewError> {
        match self.identity.current_admin() {
            Some(admin_id) => Ok(admin_id),
            None => {
                self.notifier.notify(Notice::error(
                    "Sign-in required",
                    "An admin account is required to moderate flags",
                ));
                Err(ReviewError::AuthRequired)
            }
        }
    }

    fn mark_busy(&self, state: &mut ReviewState, question_id: &str) -> Result<(), ReviewError> {
        if !state.busy.insert(question_id.to_string()) {
            self.notifier.notify(Notice::info(
                "Please wait",
                format!("Question {} is still being updated", question_id),
            ));
            return Err(ReviewError::Busy(question_id.to_string()));
        }
        Ok(())
    }

    fn schedule_refresh(&self) {
        let controller = self.clone();
        let delay = self.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Failures are reported by refresh(); the local patch stays.
            let _ = controller.refresh().await;
        });
    }
}
