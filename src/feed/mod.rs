pub mod backend;
pub mod tmdb;
pub mod types;

use async_trait::async_trait;
use types::{FeedCriteria, FetchError, Movie, MovieDetails, Page};

/// Anything that can produce one page of movies for a criteria.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, criteria: &FeedCriteria, page: u32) -> Result<Page, FetchError>;
    fn name(&self) -> &'static str;
}

/// Per-movie lookups behind the details pane.
#[async_trait]
pub trait DetailsSource: Send + Sync {
    /// Full record including trailers and reviews.
    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, FetchError>;
    /// Candidate movies related to `movie_id`, best first.
    async fn fetch_recommendations(&self, movie_id: u64) -> Result<Vec<Movie>, FetchError>;
}

/// Build the HTTP client shared by the page sources.
pub(crate) fn http_client(request_timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .timeout(std::time::Duration::from_millis(request_timeout_ms))
        .build()
        .context("failed to build HTTP client")
}
