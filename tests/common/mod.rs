//! Shared fixtures: a scripted page source and a presenter that records calls.
#![allow(dead_code)]

use async_trait::async_trait;
use cinefeed::engine::controller::CompletionReceiver;
use cinefeed::engine::{CompletionOutcome, FeedController, Presenter, StatusKind};
use cinefeed::feed::types::{FeedCriteria, FetchError, Movie, MovieDetails, Page, PageRequest};
use cinefeed::feed::{DetailsSource, PageSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Script = dyn Fn(&FeedCriteria, u32, usize) -> Result<Page, FetchError> + Send + Sync;

/// Page source driven by a closure of (criteria, page, attempt) where `attempt`
/// counts earlier calls for the same criteria and page.
pub struct ScriptedSource {
    script: Box<Script>,
    calls: Mutex<Vec<PageRequest>>,
    attempts: Mutex<HashMap<(FeedCriteria, u32), usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    details_down: AtomicBool,
}

impl ScriptedSource {
    pub fn new(
        script: impl Fn(&FeedCriteria, u32, usize) -> Result<Page, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            details_down: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, criteria: &FeedCriteria) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|r| &r.criteria == criteria)
            .map(|r| r.page)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Make details lookups fail until switched back.
    pub fn set_details_down(&self, down: bool) {
        self.details_down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, criteria: &FeedCriteria, page: u32) -> Result<Page, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(PageRequest {
            criteria: criteria.clone(),
            page,
        });
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry((criteria.clone(), page)).or_insert(0);
            *n += 1;
            *n - 1
        };

        // Let other tasks run while this request is "on the wire".
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        let result = (self.script)(criteria, page, attempt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Details are "Movie N" with overview "About N"; recommendations are the
/// movie itself followed by ids N+100 and N+101.
#[async_trait]
impl DetailsSource for ScriptedSource {
    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, FetchError> {
        tokio::task::yield_now().await;
        if self.details_down.load(Ordering::SeqCst) {
            return Err(FetchError::Network("connection reset".to_string()));
        }
        let mut movie = Movie::new(movie_id, format!("Movie {}", movie_id));
        movie.overview = Some(format!("About {}", movie_id));
        Ok(MovieDetails::from_movie(movie))
    }

    async fn fetch_recommendations(&self, movie_id: u64) -> Result<Vec<Movie>, FetchError> {
        tokio::task::yield_now().await;
        Ok([movie_id, movie_id + 100, movie_id + 101]
            .iter()
            .map(|&id| Movie::new(id, format!("Movie {}", id)))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear,
    Append(Vec<u64>),
    Status(String, StatusKind),
    ClearStatus,
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<Call>,
}

impl RecordingPresenter {
    /// Calls other than the transient loading notice.
    pub fn render_calls(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Status(_, StatusKind::Info)))
            .cloned()
            .collect()
    }

    /// Status currently on screen: the latest message, unless cleared since.
    pub fn last_status(&self) -> Option<(String, StatusKind)> {
        for call in self.calls.iter().rev() {
            match call {
                Call::Status(text, kind) => return Some((text.clone(), *kind)),
                Call::ClearStatus => return None,
                _ => {}
            }
        }
        None
    }

    pub fn appended_ids(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Append(ids) => Some(ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Clear).count()
    }
}

impl Presenter for RecordingPresenter {
    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn append(&mut self, items: &[Movie]) {
        self.calls.push(Call::Append(items.iter().map(|m| m.id).collect()));
    }

    fn set_status_message(&mut self, text: &str, kind: StatusKind) {
        self.calls.push(Call::Status(text.to_string(), kind));
    }

    fn clear_status(&mut self) {
        self.calls.push(Call::ClearStatus);
    }
}

pub fn page_of(ids: impl IntoIterator<Item = u64>) -> Page {
    Page::new(
        ids.into_iter()
            .map(|id| Movie::new(id, format!("Movie {}", id)))
            .collect(),
    )
}

/// Wait for the next finished fetch and apply it.
pub async fn settle<P: Presenter>(
    controller: &mut FeedController<P>,
    completions: &mut CompletionReceiver,
) -> CompletionOutcome {
    let done = tokio::time::timeout(Duration::from_secs(2), completions.recv())
        .await
        .expect("timed out waiting for a page fetch")
        .expect("completion channel closed");
    controller.handle_completion(done)
}

/// Give spawned fetches a chance to run, then assert nothing arrived.
pub async fn assert_no_completion(completions: &mut CompletionReceiver) {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(
        tokio::time::timeout(Duration::from_millis(50), completions.recv())
            .await
            .is_err(),
        "unexpected page fetch completed"
    );
}
