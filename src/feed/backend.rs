use super::types::*;
use super::{DetailsSource, PageSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

/// Client for the movie backend's JSON routes:
/// `GET /load_more?page=N&category=C`, `GET /search?query=Q&page=N&category=C`,
/// `GET /api/movie/{id}` and `GET /movie/{id}/recommendations`.
pub struct BackendSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BackendResponse {
    #[serde(default)]
    movies: Option<Vec<Movie>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackendDetailsResponse {
    #[serde(default)]
    movie: Option<MovieDetails>,
    #[serde(default)]
    error: Option<String>,
}

impl BackendSource {
    pub fn new(base_url: &str, request_timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: super::http_client(request_timeout_ms)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_request(&self, criteria: &FeedCriteria, page: u32) -> RequestBuilder {
        let page = page.to_string();
        let category = criteria.category.wire_name();
        if criteria.is_search() {
            self.client
                .get(format!("{}/search", self.base_url))
                .query(&[
                    ("query", criteria.query.trim()),
                    ("page", page.as_str()),
                    ("category", category),
                ])
        } else {
            self.client
                .get(format!("{}/load_more", self.base_url))
                .query(&[("page", page.as_str()), ("category", category)])
        }
    }

    fn details_request(&self, movie_id: u64) -> RequestBuilder {
        self.client.get(format!("{}/api/movie/{}", self.base_url, movie_id))
    }

    fn recommendations_request(&self, movie_id: u64) -> RequestBuilder {
        self.client
            .get(format!("{}/movie/{}/recommendations", self.base_url, movie_id))
    }
}

/// Failure carried in the body's `error` field, whatever the status.
fn body_error(status: u16, error: Option<&str>) -> Option<FetchError> {
    error
        .filter(|m| !m.trim().is_empty())
        .map(|msg| FetchError::Server {
            status,
            message: Some(msg.to_string()),
        })
}

/// Map a backend response to a page or a failure.
///
/// An `error` field is a failure whatever the status; a non-2xx status without
/// one is a failure with no server message; a 2xx body that cannot be decoded
/// is also treated as a server failure.
pub fn parse_backend_response(status: u16, body: &str) -> Result<Page, FetchError> {
    let parsed: Option<BackendResponse> = serde_json::from_str(body).ok();

    if let Some(err) = body_error(status, parsed.as_ref().and_then(|r| r.error.as_deref())) {
        return Err(err);
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::Server { status, message: None });
    }

    match parsed.and_then(|r| r.movies) {
        Some(movies) => Ok(Page::new(movies)),
        None => Err(FetchError::Server { status, message: None }),
    }
}

/// Same rules as [`parse_backend_response`], for the `{movie, error}` details body.
pub fn parse_backend_details(status: u16, body: &str) -> Result<MovieDetails, FetchError> {
    let parsed: Option<BackendDetailsResponse> = serde_json::from_str(body).ok();

    if let Some(err) = body_error(status, parsed.as_ref().and_then(|r| r.error.as_deref())) {
        return Err(err);
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::Server { status, message: None });
    }

    parsed
        .and_then(|r| r.movie)
        .ok_or(FetchError::Server { status, message: None })
}

async fn send(request: RequestBuilder) -> Result<(u16, String), FetchError> {
    let resp = request.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok((status, body))
}

#[async_trait]
impl PageSource for BackendSource {
    async fn fetch_page(&self, criteria: &FeedCriteria, page: u32) -> Result<Page, FetchError> {
        tracing::debug!(%criteria, page, "backend page request");
        let (status, body) = send(self.page_request(criteria, page)).await?;
        parse_backend_response(status, &body)
    }

    fn name(&self) -> &'static str {
        "backend"
    }
}

#[async_trait]
impl DetailsSource for BackendSource {
    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, FetchError> {
        tracing::debug!(movie_id, "backend details request");
        let (status, body) = send(self.details_request(movie_id)).await?;
        parse_backend_details(status, &body)
    }

    async fn fetch_recommendations(&self, movie_id: u64) -> Result<Vec<Movie>, FetchError> {
        let (status, body) = send(self.recommendations_request(movie_id)).await?;
        parse_backend_response(status, &body).map(|page| page.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> BackendSource {
        BackendSource::new("http://127.0.0.1:5000/", 1000).unwrap()
    }

    fn url_of(request: RequestBuilder) -> String {
        request.build().unwrap().url().to_string()
    }

    #[test]
    fn test_browse_url_uses_load_more() {
        let url = url_of(source().page_request(&FeedCriteria::browse(Category::Popular), 2));
        assert_eq!(url, "http://127.0.0.1:5000/load_more?page=2&category=popular");
    }

    #[test]
    fn test_search_url_encodes_query() {
        let criteria = FeedCriteria::new(Category::Trending, "dune & part two");
        let url = url_of(source().page_request(&criteria, 1));
        assert_eq!(
            url,
            "http://127.0.0.1:5000/search?query=dune+%26+part+two&page=1&category=trending"
        );
    }

    #[test]
    fn test_details_and_recommendation_urls() {
        assert_eq!(url_of(source().details_request(42)), "http://127.0.0.1:5000/api/movie/42");
        assert_eq!(
            url_of(source().recommendations_request(42)),
            "http://127.0.0.1:5000/movie/42/recommendations"
        );
    }

    #[test]
    fn test_parse_details() {
        let body = r#"{"movie": {"id": 1, "title": "Movie 1", "overview": "Desc",
            "videos": {"results": [{"type": "Trailer", "site": "YouTube", "key": "abc"}]},
            "reviews": {"results": [{"author": "ana", "content": "Great."}]}}}"#;
        let d = parse_backend_details(200, body).unwrap();
        assert_eq!(d.movie.title, "Movie 1");
        assert_eq!(d.reviews.len(), 1);
        assert!(d.trailer_url().is_some());
    }

    #[test]
    fn test_parse_details_error() {
        let err = parse_backend_details(404, r#"{"error": "Movie not found"}"#).unwrap_err();
        assert_eq!(err.to_info().message, "Movie not found");
        let err = parse_backend_details(200, r#"{}"#).unwrap_err();
        assert_eq!(err, FetchError::Server { status: 200, message: None });
    }

    #[test]
    fn test_parse_movies_page() {
        let body = r#"{"movies": [
            {"id": 1, "title": "Movie 1", "poster_path": "/a.jpg", "vote_average": 8, "release_date": "2024-03-01"},
            {"id": 2, "title": "Search Movie", "poster_path": "/b.jpg", "vote_average": 7}
        ]}"#;
        let page = parse_backend_response(200, body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Movie 1");
        assert_eq!(page.items[0].vote_average, Some(8.0));
        assert_eq!(page.items[0].release_year(), Some(2024));
    }

    #[test]
    fn test_parse_empty_movies_is_empty_page() {
        let page = parse_backend_response(200, r#"{"movies": []}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_parse_error_with_message() {
        let err = parse_backend_response(500, r#"{"movies": [], "error": "TMDb request failed"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Server { status: 500, message: Some("TMDb request failed".to_string()) }
        );
        assert_eq!(err.to_info().message, "TMDb request failed");
    }

    #[test]
    fn test_parse_error_field_on_success_status_is_failure() {
        let err = parse_backend_response(200, r#"{"error": "API key missing"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Server { status: 200, .. }));
    }

    #[test]
    fn test_parse_non_success_without_body() {
        let err = parse_backend_response(503, "<html>Service Unavailable</html>").unwrap_err();
        assert_eq!(err, FetchError::Server { status: 503, message: None });
        assert_eq!(err.to_info().message, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_parse_malformed_success_body() {
        let err = parse_backend_response(200, "not json").unwrap_err();
        assert_eq!(err, FetchError::Server { status: 200, message: None });
    }
}
