use crate::feed::types::Movie;

/// Client-side narrowing of already loaded movies. Does not touch the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFilter {
    needle: String,
}

impl LocalFilter {
    pub fn new(raw: &str) -> Self {
        Self {
            needle: raw.trim().to_lowercase(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.needle.is_empty()
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Case-insensitive substring match on title or overview.
    pub fn matches(&self, movie: &Movie) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        movie.title.to_lowercase().contains(&self.needle)
            || movie
                .overview
                .as_deref()
                .is_some_and(|o| o.to_lowercase().contains(&self.needle))
    }

    pub fn apply<'a>(&self, movies: &'a [Movie]) -> Vec<&'a Movie> {
        movies.iter().filter(|m| self.matches(m)).collect()
    }
}
