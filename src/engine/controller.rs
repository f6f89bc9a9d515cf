//! Feed controller: one per active feed view.
//!
//! Triggers (`activate`, `on_scroll_proximity`, `retry`) are plain `&mut self`
//! methods with no await inside, so the `Idle -> Loading` check-and-set cannot be
//! interleaved with another trigger. Page source calls run on spawned tasks and
//! come back as [`Completion`]s over a channel owned by the caller, which feeds
//! them to [`FeedController::handle_completion`] on the controller's task.

use super::presenter::{Presenter, StatusKind};
use super::state::{CompletionOutcome, FeedState, FeedStatus, FetchTicket};
use crate::feed::types::{FeedCriteria, FetchError, Page};
use crate::feed::PageSource;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const LOADING_MESSAGE: &str = "Loading movies...";
pub const NO_MORE_RESULTS_MESSAGE: &str = "No more results";
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// A finished page source call, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct Completion {
    pub ticket: FetchTicket,
    pub result: Result<Page, FetchError>,
}

pub type CompletionSender = mpsc::UnboundedSender<Completion>;
pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::unbounded_channel()
}

pub struct FeedController<P: Presenter> {
    source: Arc<dyn PageSource>,
    presenter: P,
    state: Option<FeedState>,
    generation: u64,
    completions: CompletionSender,
}

impl<P: Presenter> FeedController<P> {
    pub fn new(source: Arc<dyn PageSource>, presenter: P, completions: CompletionSender) -> Self {
        Self {
            source,
            presenter,
            state: None,
            generation: 0,
            completions,
        }
    }

    pub fn state(&self) -> Option<&FeedState> {
        self.state.as_ref()
    }

    pub fn criteria(&self) -> Option<&FeedCriteria> {
        self.state.as_ref().map(FeedState::criteria)
    }

    pub fn status(&self) -> Option<FeedStatus> {
        self.state.as_ref().map(FeedState::status)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Switch to `criteria`. Same criteria is a no-op; otherwise the display is
    /// cleared, state resets to page 1 and the first page is requested.
    /// Returns whether a reset happened.
    pub fn activate(&mut self, criteria: FeedCriteria) -> bool {
        if self.criteria() == Some(&criteria) {
            tracing::debug!(%criteria, "activate ignored: criteria unchanged");
            return false;
        }

        self.generation += 1;
        tracing::info!(%criteria, generation = self.generation, source = self.source.name(), "activating feed");
        self.presenter.clear();
        self.state = Some(FeedState::new(criteria, self.generation));
        self.request_next_page();
        true
    }

    /// Leave the feed view. In-flight results will be discarded.
    pub fn deactivate(&mut self) {
        if let Some(state) = self.state.take() {
            self.generation += 1;
            tracing::info!(criteria = %state.criteria(), "feed deactivated");
        }
    }

    /// Issue the next page request unless one is in flight, the feed is
    /// exhausted, or the last request failed. Returns whether a request was issued.
    pub fn request_next_page(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let Some(ticket) = state.begin_fetch() else {
            tracing::trace!(status = ?state.status(), "next page suppressed");
            return false;
        };

        tracing::debug!(
            criteria = %ticket.request.criteria,
            page = ticket.request.page,
            generation = ticket.generation,
            "requesting page"
        );
        self.presenter.set_status_message(LOADING_MESSAGE, StatusKind::Info);
        self.spawn_fetch(ticket);
        true
    }

    pub fn on_scroll_proximity(&mut self) -> bool {
        self.request_next_page()
    }

    /// Re-request the page that failed. No effect unless the feed is `Failed`.
    pub fn retry(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if !state.prepare_retry() {
            return false;
        }
        tracing::info!(page = state.next_page_number(), "retrying page");
        self.request_next_page()
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let result = source
                .fetch_page(&ticket.request.criteria, ticket.request.page)
                .await;
            if tx.send(Completion { ticket, result }).is_err() {
                tracing::debug!("completion dropped: feed controller gone");
            }
        });
    }

    /// Apply a finished fetch. Stale completions change nothing.
    pub fn handle_completion(&mut self, completion: Completion) -> CompletionOutcome {
        let Completion { ticket, result } = completion;
        let Some(state) = self.state.as_mut() else {
            tracing::debug!(page = ticket.request.page, "stale completion: no active feed");
            return CompletionOutcome::Stale;
        };

        let outcome = state.apply(&ticket, result);
        match &outcome {
            CompletionOutcome::Stale => {
                tracing::debug!(
                    criteria = %ticket.request.criteria,
                    page = ticket.request.page,
                    generation = ticket.generation,
                    "stale completion discarded"
                );
            }
            CompletionOutcome::Appended { page, items, duplicates } => {
                tracing::debug!(page, count = items.len(), duplicates, "page loaded");
                if items.is_empty() {
                    self.presenter.clear_status();
                } else {
                    self.presenter.append(items);
                }
            }
            CompletionOutcome::Exhausted { page } => {
                tracing::info!(page, "feed exhausted");
                let text = if *page == 1 {
                    NO_RESULTS_MESSAGE
                } else {
                    NO_MORE_RESULTS_MESSAGE
                };
                self.presenter.set_status_message(text, StatusKind::Empty);
            }
            CompletionOutcome::Failed { page, error } => {
                tracing::warn!(page, kind = ?error.kind, error = %error.message, "page fetch failed");
                self.presenter.set_status_message(&error.message, StatusKind::Error);
            }
        }
        outcome
    }
}
