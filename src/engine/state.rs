use crate::feed::types::{ErrorInfo, FeedCriteria, FetchError, Movie, Page, PageRequest};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    /// The source has confirmed there is nothing more for this criteria.
    Exhausted,
    /// Last fetch failed; only `retry` or a criteria change leaves this state.
    Failed,
}

/// Tag attached to an outbound fetch. A completion is applied only if its
/// ticket still matches the in-flight request of the current generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: PageRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Result arrived for a superseded criteria or an unknown request; ignored.
    Stale,
    Appended {
        page: u32,
        items: Vec<Movie>,
        duplicates: usize,
    },
    Exhausted {
        page: u32,
    },
    Failed {
        page: u32,
        error: ErrorInfo,
    },
}

/// Pagination state for one criteria lifetime.
#[derive(Debug)]
pub struct FeedState {
    criteria: FeedCriteria,
    generation: u64,
    current_page: u32,
    loaded_any: bool,
    status: FeedStatus,
    last_error: Option<ErrorInfo>,
    in_flight: Option<FetchTicket>,
    seen_ids: HashSet<u64>,
    item_count: usize,
}

impl FeedState {
    pub fn new(criteria: FeedCriteria, generation: u64) -> Self {
        Self {
            criteria,
            generation,
            current_page: 1,
            loaded_any: false,
            status: FeedStatus::Idle,
            last_error: None,
            in_flight: None,
            seen_ids: HashSet::new(),
            item_count: 0,
        }
    }

    pub fn criteria(&self) -> &FeedCriteria {
        &self.criteria
    }

    /// Last page that returned items (1 before anything has loaded).
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// Items handed to the presenter so far.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn next_page_number(&self) -> u32 {
        if self.loaded_any {
            self.current_page + 1
        } else {
            self.current_page
        }
    }

    /// Check-and-set: `Idle -> Loading` and the ticket for the next page, or
    /// `None` when loading, exhausted or failed. Must stay free of suspension points.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.status != FeedStatus::Idle {
            return None;
        }
        self.status = FeedStatus::Loading;
        let ticket = FetchTicket {
            generation: self.generation,
            request: PageRequest {
                criteria: self.criteria.clone(),
                page: self.next_page_number(),
            },
        };
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// `Failed -> Idle`, clearing the error. False in any other state.
    pub fn prepare_retry(&mut self) -> bool {
        if self.status != FeedStatus::Failed {
            return false;
        }
        self.status = FeedStatus::Idle;
        self.last_error = None;
        true
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.status == FeedStatus::Loading && self.in_flight.as_ref() == Some(ticket)
    }

    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<Page, FetchError>) -> CompletionOutcome {
        if !self.is_current(ticket) {
            return CompletionOutcome::Stale;
        }
        self.in_flight = None;
        let page = ticket.request.page;

        match result {
            Ok(p) if p.is_empty() => {
                self.status = FeedStatus::Exhausted;
                CompletionOutcome::Exhausted { page }
            }
            Ok(p) => {
                self.current_page = page;
                self.loaded_any = true;
                self.status = FeedStatus::Idle;
                let total = p.items.len();
                let items: Vec<Movie> = p
                    .items
                    .into_iter()
                    .filter(|m| self.seen_ids.insert(m.id))
                    .collect();
                self.item_count += items.len();
                CompletionOutcome::Appended {
                    page,
                    duplicates: total - items.len(),
                    items,
                }
            }
            Err(e) => {
                let error = e.to_info();
                self.status = FeedStatus::Failed;
                self.last_error = Some(error.clone());
                CompletionOutcome::Failed { page, error }
            }
        }
    }
}
