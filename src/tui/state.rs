use crate::engine::{LocalFilter, StatusKind};
use crate::feed::types::{Category, FeedCriteria, Movie, MovieDetails};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub struct AppState {
    pub movies: Vec<Movie>,
    pub categories: Vec<Category>,
    pub category_index: usize,
    pub query: String,
    pub source_name: String,
    pub status: Option<StatusLine>,
    pub loading: bool,
    /// Index of the active item within the visible (filtered) list.
    pub selected: usize,
    pub filter: LocalFilter,
    /// Open details pane, drawn over the movie list.
    pub details: Option<DetailsView>,
    pub logs: VecDeque<LogEntry>,
    pub start_time: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    pub movie: Movie,
    pub pane: DetailsPane,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailsPane {
    Loading,
    Ready {
        details: MovieDetails,
        recommendations: Vec<Movie>,
    },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl AppState {
    pub fn new(categories: Vec<Category>, source_name: &str) -> Self {
        Self {
            movies: Vec::new(),
            categories,
            category_index: 0,
            query: String::new(),
            source_name: source_name.to_string(),
            status: None,
            loading: false,
            selected: 0,
            filter: LocalFilter::default(),
            details: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            start_time: Instant::now(),
        }
    }

    pub fn current_category(&self) -> Category {
        self.categories
            .get(self.category_index)
            .cloned()
            .unwrap_or(Category::Trending)
    }

    pub fn criteria(&self) -> FeedCriteria {
        FeedCriteria::new(self.current_category(), self.query.trim())
    }

    /// Step the category tab by `delta`, wrapping. Returns the new category.
    pub fn cycle_category(&mut self, delta: isize) -> Category {
        let n = self.categories.len();
        if n > 0 {
            let idx = (self.category_index as isize + delta).rem_euclid(n as isize);
            self.category_index = idx as usize;
        }
        self.current_category()
    }

    pub fn visible_movies(&self) -> Vec<&Movie> {
        self.filter.apply(&self.movies)
    }

    pub fn visible_len(&self) -> usize {
        if self.filter.is_active() {
            self.visible_movies().len()
        } else {
            self.movies.len()
        }
    }

    /// The active item of the visible list.
    pub fn selected_movie(&self) -> Option<&Movie> {
        self.visible_movies().get(self.selected).copied()
    }

    /// Move the active item, clamped to the visible list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn set_filter(&mut self, raw: &str) {
        self.filter = LocalFilter::new(raw);
        self.selected = 0;
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}

/// True when the active item is within `threshold` rows of the end of the list.
/// An empty list counts as at the bottom.
pub fn near_bottom(selected: usize, len: usize, threshold: usize) -> bool {
    len == 0 || selected + threshold >= len
}
