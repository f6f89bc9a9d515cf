use crate::feed::types::Category;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Backend,
    Tmdb,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    pub backend_url: String,
    #[serde(default = "default_tmdb_url")]
    pub tmdb_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_provider() -> Provider {
    Provider::Backend
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Rows from the end of the list at which the next page is requested.
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold_rows: usize,
}

fn default_category() -> String {
    "trending".to_string()
}

fn default_categories() -> Vec<String> {
    ["trending", "popular", "top_rated", "upcoming", "now_playing"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_scroll_threshold() -> usize {
    3
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            categories: default_categories(),
            scroll_threshold_rows: default_scroll_threshold(),
        }
    }
}

impl FeedConfig {
    /// Parsed category list; the default category is always included.
    pub fn category_list(&self) -> Vec<Category> {
        let mut out: Vec<Category> = self
            .categories
            .iter()
            .map(|c| Category::from_wire(c))
            .collect();
        let default = self.default_category();
        if !out.contains(&default) {
            out.insert(0, default);
        }
        out
    }

    pub fn default_category(&self) -> Category {
        Category::from_wire(&self.default_category)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file() -> String {
    "cinefeed.log".to_string()
}

fn default_log_filter() -> String {
    "cinefeed=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        if config.feed.scroll_threshold_rows == 0 {
            anyhow::bail!("feed.scroll_threshold_rows must be at least 1");
        }
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// TMDb key from TMDB_API_KEY, or prompted at startup and saved to .env.
    pub fn tmdb_api_key() -> Result<String> {
        match std::env::var("TMDB_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(sanitize_key(&key)),
            _ => {
                let key = prompt("TMDb API Key (themoviedb.org)")?;
                save_env_var("TMDB_API_KEY", &key);
                Ok(key)
            }
        }
    }
}

/// KEY=VALUE pairs from .env content. Comments and blank lines are skipped.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn prompt(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = input.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    if let Err(e) = std::fs::write(path, contents) {
        tracing::warn!(error = %e, "could not save {} to .env", key);
    }
}
