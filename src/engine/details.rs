//! Details pane loader: one movie open at a time, details and recommendations
//! fetched together on a spawned task and applied on the owner's task.

use crate::feed::types::{ErrorInfo, FetchError, Movie, MovieDetails};
use crate::feed::DetailsSource;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Recommendations shown under a movie's details.
pub const RECOMMENDATION_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailsTicket {
    pub generation: u64,
    pub movie_id: u64,
}

#[derive(Debug)]
pub struct DetailsCompletion {
    pub ticket: DetailsTicket,
    pub details: Result<MovieDetails, FetchError>,
    pub recommendations: Result<Vec<Movie>, FetchError>,
}

pub type DetailsSender = mpsc::UnboundedSender<DetailsCompletion>;
pub type DetailsReceiver = mpsc::UnboundedReceiver<DetailsCompletion>;

pub fn details_channel() -> (DetailsSender, DetailsReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailsOutcome {
    /// Result for a movie that is no longer open.
    Stale,
    Loaded {
        details: MovieDetails,
        recommendations: Vec<Movie>,
    },
    Failed {
        movie_id: u64,
        error: ErrorInfo,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Loaded,
    Failed,
}

pub struct DetailsLoader {
    source: Arc<dyn DetailsSource>,
    completions: DetailsSender,
    generation: u64,
    open: Option<(DetailsTicket, Phase)>,
}

impl DetailsLoader {
    pub fn new(source: Arc<dyn DetailsSource>, completions: DetailsSender) -> Self {
        Self {
            source,
            completions,
            generation: 0,
            open: None,
        }
    }

    pub fn open_movie(&self) -> Option<u64> {
        self.open.map(|(ticket, _)| ticket.movie_id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.open, Some((_, Phase::Loading)))
    }

    /// Open `movie_id` and start fetching. Re-opening the movie already shown
    /// is a no-op unless its last fetch failed. Returns whether a fetch started.
    pub fn open(&mut self, movie_id: u64) -> bool {
        if let Some((ticket, phase)) = self.open {
            if ticket.movie_id == movie_id && phase != Phase::Failed {
                return false;
            }
        }

        self.generation += 1;
        let ticket = DetailsTicket {
            generation: self.generation,
            movie_id,
        };
        self.open = Some((ticket, Phase::Loading));
        tracing::debug!(movie_id, generation = ticket.generation, "opening details");

        let source = Arc::clone(&self.source);
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let (details, recommendations) = tokio::join!(
                source.fetch_details(movie_id),
                source.fetch_recommendations(movie_id)
            );
            let done = DetailsCompletion {
                ticket,
                details,
                recommendations,
            };
            if tx.send(done).is_err() {
                tracing::debug!("details completion dropped: loader gone");
            }
        });
        true
    }

    pub fn close(&mut self) {
        if let Some((ticket, _)) = self.open.take() {
            self.generation += 1;
            tracing::debug!(movie_id = ticket.movie_id, "details closed");
        }
    }

    pub fn handle_completion(&mut self, completion: DetailsCompletion) -> DetailsOutcome {
        let DetailsCompletion {
            ticket,
            details,
            recommendations,
        } = completion;
        let Some((open, phase)) = self.open.as_mut() else {
            return DetailsOutcome::Stale;
        };
        if *open != ticket || *phase != Phase::Loading {
            tracing::debug!(movie_id = ticket.movie_id, "stale details discarded");
            return DetailsOutcome::Stale;
        }

        match details {
            Ok(details) => {
                *phase = Phase::Loaded;
                let recommendations = match recommendations {
                    Ok(movies) => top_recommendations(ticket.movie_id, movies),
                    Err(e) => {
                        // The pane is still useful without them.
                        tracing::warn!(movie_id = ticket.movie_id, error = %e, "recommendations unavailable");
                        Vec::new()
                    }
                };
                DetailsOutcome::Loaded {
                    details,
                    recommendations,
                }
            }
            Err(e) => {
                *phase = Phase::Failed;
                let error = e.to_info();
                tracing::warn!(movie_id = ticket.movie_id, error = %error.message, "details fetch failed");
                DetailsOutcome::Failed {
                    movie_id: ticket.movie_id,
                    error,
                }
            }
        }
    }
}

/// Drop the movie itself and repeats, keep source order, cap at [`RECOMMENDATION_LIMIT`].
pub fn top_recommendations(movie_id: u64, movies: Vec<Movie>) -> Vec<Movie> {
    let mut seen = HashSet::new();
    movies
        .into_iter()
        .filter(|m| m.id != movie_id && seen.insert(m.id))
        .take(RECOMMENDATION_LIMIT)
        .collect()
}
