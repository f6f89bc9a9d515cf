use anyhow::{Context, Result};
use cinefeed::config::{Config, Provider};
use cinefeed::engine::{completion_channel, details_channel, DetailsLoader, FeedController};
use cinefeed::feed::{backend::BackendSource, tmdb::TmdbSource, DetailsSource, PageSource};
use cinefeed::pipeline;
use cinefeed::tui::{self, state::AppState, TuiCommand, TuiPresenter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

const DEFAULT_CONFIG: &str = "config.toml";

struct Args {
    config_path: PathBuf,
    force_tmdb: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut config_path = PathBuf::from(DEFAULT_CONFIG);
        let mut force_tmdb = false;
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    config_path = PathBuf::from(path);
                }
                "--tmdb" => force_tmdb = true,
                other => anyhow::bail!("unknown argument: {} (usage: cinefeed [--config PATH] [--tmdb])", other),
            }
        }
        Ok(Self { config_path, force_tmdb })
    }
}

/// One client serving both the feed and the details pane.
fn shared<S>(source: S) -> (Arc<dyn PageSource>, Arc<dyn DetailsSource>)
where
    S: PageSource + DetailsSource + 'static,
{
    let source = Arc::new(source);
    let pages: Arc<dyn PageSource> = source.clone();
    (pages, source as Arc<dyn DetailsSource>)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;
    let config = Config::load(&args.config_path)?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();

    let log_file = std::fs::File::create(&config.logging.file)
        .with_context(|| format!("Failed to create log file: {}", config.logging.file))?;
    tracing_subscriber::fmt()
        .with_env_filter(config.logging.filter.as_str())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let provider = if args.force_tmdb { Provider::Tmdb } else { config.source.provider };
    let timeout_ms = config.source.request_timeout_ms;
    let (source, details_source) = match provider {
        Provider::Backend => shared(BackendSource::new(&config.source.backend_url, timeout_ms)?),
        Provider::Tmdb => {
            let api_key = Config::tmdb_api_key()?;
            shared(TmdbSource::new(api_key, &config.source.tmdb_url, timeout_ms)?)
        }
    };
    tracing::info!(source = source.name(), "starting feed");

    // Channels
    let (state_tx, state_rx) = watch::channel({
        let mut s = AppState::new(config.feed.category_list(), source.name());
        let default = config.feed.default_category();
        s.category_index = s.categories.iter().position(|c| *c == default).unwrap_or(0);
        s
    });
    let (cmd_tx, cmd_rx) = mpsc::channel::<TuiCommand>(16);
    let (completion_tx, completion_rx) = completion_channel();
    let (details_tx, details_rx) = details_channel();

    let controller = FeedController::new(source, TuiPresenter::new(state_tx.clone()), completion_tx);
    let details = DetailsLoader::new(details_source, details_tx);
    let feed_task = tokio::spawn(pipeline::run_feed(
        controller,
        completion_rx,
        details,
        details_rx,
        cmd_rx,
        state_tx,
        config.feed.scroll_threshold_rows,
    ));

    // Run TUI (blocks until quit)
    let result = tui::run_tui(state_rx, cmd_tx).await;

    if let Err(e) = feed_task.await {
        tracing::error!("feed task panicked: {}", e);
    }
    tracing::debug!("shutting down");
    result
}
