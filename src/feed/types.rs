use serde::{Deserialize, Deserializer};
use std::fmt;

// Normalized feed types shared by every page source (provider-agnostic).

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Trending,
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
    Custom(String),
}

impl Category {
    /// Parse a wire name; unknown names are kept verbatim as `Custom`.
    pub fn from_wire(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "trending" => Category::Trending,
            "popular" => Category::Popular,
            "top_rated" => Category::TopRated,
            "upcoming" => Category::Upcoming,
            "now_playing" => Category::NowPlaying,
            _ => Category::Custom(name.trim().to_string()),
        }
    }

    pub fn wire_name(&self) -> &str {
        match self {
            Category::Trending => "trending",
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
            Category::NowPlaying => "now_playing",
            Category::Custom(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Trending => "Trending",
            Category::Popular => "Popular",
            Category::TopRated => "Top Rated",
            Category::Upcoming => "Upcoming",
            Category::NowPlaying => "Now Playing",
            Category::Custom(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// What is being paginated. Two criteria are equal iff category and query match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedCriteria {
    pub category: Category,
    pub query: String,
}

impl FeedCriteria {
    pub fn new(category: Category, query: impl Into<String>) -> Self {
        Self {
            category,
            query: query.into(),
        }
    }

    pub fn browse(category: Category) -> Self {
        Self::new(category, "")
    }

    pub fn is_search(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

impl fmt::Display for FeedCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_search() {
            write!(f, "{} / \"{}\"", self.category.label(), self.query)
        } else {
            f.write_str(self.category.label())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub criteria: FeedCriteria,
    pub page: u32,
}

/// A movie record. Passed through to the presenter unchanged; the feed only looks at `id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            vote_average: None,
            release_date: None,
            overview: None,
        }
    }

    /// Year from a "YYYY-MM-DD" release date.
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        let raw = self.release_date.as_deref()?;
        chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", image_base.trim_end_matches('/'), p))
    }
}

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub key: String,
}

impl Video {
    /// Watch link for the hosting sites we know how to address.
    pub fn watch_url(&self) -> Option<String> {
        if self.key.is_empty() {
            return None;
        }
        match self.site.as_str() {
            "YouTube" => Some(format!("https://www.youtube.com/watch?v={}", self.key)),
            "Vimeo" => Some(format!("https://vimeo.com/{}", self.key)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// Full record behind the details pane: the list fields plus the appended
/// `videos` and `reviews` collections.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "unwrap_results")]
    pub videos: Vec<Video>,
    #[serde(default, deserialize_with = "unwrap_results")]
    pub reviews: Vec<Review>,
}

impl MovieDetails {
    pub fn from_movie(movie: Movie) -> Self {
        Self {
            movie,
            tagline: None,
            runtime: None,
            genres: Vec::new(),
            videos: Vec::new(),
            reviews: Vec::new(),
        }
    }

    /// First watchable trailer, else any watchable video.
    pub fn trailer_url(&self) -> Option<String> {
        self.videos
            .iter()
            .filter(|v| v.kind == "Trailer")
            .chain(self.videos.iter())
            .find_map(Video::watch_url)
    }

    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `{"results": [...]}` wrappers used by appended TMDb collections.
fn unwrap_results<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper<T> {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
    }
    Ok(Option::<Wrapper<T>>::deserialize(deserializer)?
        .map(|w| w.results)
        .unwrap_or_default())
}

/// One page of results. Empty means the source has no more items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Movie>,
}

impl Page {
    pub fn new(items: Vec<Movie>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to load movies";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchError {
    /// Best available user-facing message: the server's own message, else the
    /// generic fallback, except transport failures which report the transport text.
    pub fn to_info(&self) -> ErrorInfo {
        match self {
            FetchError::Server { message, .. } => ErrorInfo {
                kind: ErrorKind::Server,
                message: non_empty(message.as_deref())
                    .unwrap_or(GENERIC_FAILURE_MESSAGE)
                    .to_string(),
            },
            FetchError::Network(text) => ErrorInfo {
                kind: ErrorKind::Network,
                message: non_empty(Some(text.as_str()))
                    .unwrap_or(GENERIC_FAILURE_MESSAGE)
                    .to_string(),
            },
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl From<reqwest::Error> for FetchError {
    /// The request URL carries credentials for some sources; it never reaches the message.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        let text = match std::error::Error::source(&err) {
            Some(cause) => format!("{}: {}", err, cause),
            None => err.to_string(),
        };
        FetchError::Network(text)
    }
}
