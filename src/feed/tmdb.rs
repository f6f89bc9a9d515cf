use super::types::*;
use super::{DetailsSource, PageSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

/// TMDb serves list and search pages 1..=500 only.
pub const MAX_PAGE: u32 = 500;

/// TMDb `status_code` for a page number outside 1..=500.
const INVALID_PAGE_CODE: i64 = 22;

/// Direct TMDb v3 source, for running without the movie backend.
pub struct TmdbSource {
    client: Client,
    api_key: String,
    base_url: String,
}

/// TMDb list/search response (`/trending/movie/week`, `/movie/popular`, `/search/movie`, ...).
#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    results: Vec<Movie>,
    #[serde(default)]
    total_pages: Option<u32>,
}

/// TMDb error body: `{"status_code": 7, "status_message": "Invalid API key ..."}`.
#[derive(Debug, Deserialize)]
struct TmdbError {
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    status_message: Option<String>,
}

/// Path for a criteria. Search ignores the category (TMDb has one search endpoint).
fn endpoint_path(criteria: &FeedCriteria) -> String {
    if criteria.is_search() {
        return "/search/movie".to_string();
    }
    match &criteria.category {
        Category::Trending => "/trending/movie/week".to_string(),
        Category::Popular => "/movie/popular".to_string(),
        Category::TopRated => "/movie/top_rated".to_string(),
        Category::Upcoming => "/movie/upcoming".to_string(),
        Category::NowPlaying => "/movie/now_playing".to_string(),
        // List names are single path segments.
        Category::Custom(name) => {
            let segment: String = name
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect();
            format!("/movie/{}", segment)
        }
    }
}

fn parse_error(status: u16, body: &str) -> FetchError {
    let message = serde_json::from_str::<TmdbError>(body)
        .ok()
        .and_then(|e| e.status_message);
    FetchError::Server { status, message }
}

/// Map a TMDb response to a page or a failure. Pages past `total_pages`, and
/// pages TMDb rejects as out of range, are empty.
pub fn parse_tmdb_response(status: u16, body: &str, requested_page: u32) -> Result<Page, FetchError> {
    if !(200..300).contains(&status) {
        let code = serde_json::from_str::<TmdbError>(body)
            .ok()
            .and_then(|e| e.status_code);
        if code == Some(INVALID_PAGE_CODE) && requested_page > 1 {
            tracing::debug!(requested_page, "TMDb rejected page as out of range");
            return Ok(Page::default());
        }
        return Err(parse_error(status, body));
    }

    let list: TmdbListResponse = serde_json::from_str(body)
        .map_err(|_| FetchError::Server { status, message: None })?;

    if let Some(total) = list.total_pages {
        if requested_page > total {
            return Ok(Page::default());
        }
    }
    if let Some(page) = list.page {
        if page != requested_page {
            tracing::debug!(requested_page, page, "TMDb returned a different page");
        }
    }

    Ok(Page::new(list.results))
}

pub fn parse_tmdb_details(status: u16, body: &str) -> Result<MovieDetails, FetchError> {
    if !(200..300).contains(&status) {
        return Err(parse_error(status, body));
    }
    serde_json::from_str(body).map_err(|_| FetchError::Server { status, message: None })
}

impl TmdbSource {
    pub fn new(api_key: String, base_url: &str, request_timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: super::http_client(request_timeout_ms)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
    }

    fn page_request(&self, criteria: &FeedCriteria, page: u32) -> RequestBuilder {
        let request = self
            .get(&endpoint_path(criteria))
            .query(&[("page", page)]);
        if criteria.is_search() {
            request.query(&[("query", criteria.query.trim())])
        } else {
            request
        }
    }

    fn details_request(&self, movie_id: u64) -> RequestBuilder {
        self.get(&format!("/movie/{}", movie_id))
            .query(&[("append_to_response", "videos,reviews")])
    }

    fn recommendations_request(&self, movie_id: u64) -> RequestBuilder {
        self.get(&format!("/movie/{}/recommendations", movie_id))
            .query(&[("page", 1)])
    }
}

async fn send(request: RequestBuilder) -> Result<(u16, String), FetchError> {
    let resp = request.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok((status, body))
}

#[async_trait]
impl PageSource for TmdbSource {
    async fn fetch_page(&self, criteria: &FeedCriteria, page: u32) -> Result<Page, FetchError> {
        if page > MAX_PAGE {
            tracing::debug!(page, "past TMDb page limit");
            return Ok(Page::default());
        }
        tracing::debug!(path = %endpoint_path(criteria), page, "TMDb page request");
        let (status, body) = send(self.page_request(criteria, page)).await?;
        parse_tmdb_response(status, &body, page)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[async_trait]
impl DetailsSource for TmdbSource {
    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, FetchError> {
        tracing::debug!(movie_id, "TMDb details request");
        let (status, body) = send(self.details_request(movie_id)).await?;
        parse_tmdb_details(status, &body)
    }

    async fn fetch_recommendations(&self, movie_id: u64) -> Result<Vec<Movie>, FetchError> {
        let (status, body) = send(self.recommendations_request(movie_id)).await?;
        parse_tmdb_response(status, &body, 1).map(|page| page.items)
    }
}
