pub mod render;
pub mod state;

use crate::engine::{Presenter, StatusKind};
use crate::feed::types::Movie;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::{AppState, StatusLine};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const PAGE_JUMP: isize = 10;

/// Commands the TUI sends to the feed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiCommand {
    Quit,
    Move(isize),
    NextCategory,
    PrevCategory,
    Search(String),
    ClearSearch,
    Filter(String),
    Retry,
    /// Open the details pane for the active item.
    OpenDetails,
    /// Close the details pane, or clear the search when none is open.
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Search,
    Filter,
}

/// Line being typed after `/` or `f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub mode: InputMode,
    pub buffer: String,
}

/// Presenter that renders into the shared [`AppState`].
pub struct TuiPresenter {
    state_tx: watch::Sender<AppState>,
}

impl TuiPresenter {
    pub fn new(state_tx: watch::Sender<AppState>) -> Self {
        Self { state_tx }
    }
}

impl Presenter for TuiPresenter {
    fn clear(&mut self) {
        self.state_tx.send_modify(|s| {
            s.movies.clear();
            s.selected = 0;
            s.status = None;
            s.loading = false;
        });
    }

    fn append(&mut self, items: &[Movie]) {
        self.state_tx.send_modify(|s| {
            s.movies.extend_from_slice(items);
            s.loading = false;
            s.status = None;
        });
    }

    fn set_status_message(&mut self, text: &str, kind: StatusKind) {
        let level = match kind {
            StatusKind::Info => "INFO",
            StatusKind::Empty => "EMPTY",
            StatusKind::Error => "ERROR",
        };
        self.state_tx.send_modify(|s| {
            s.loading = kind == StatusKind::Info;
            s.status = Some(StatusLine {
                text: text.to_string(),
                kind,
            });
            s.push_log(level, text.to_string());
        });
    }

    fn clear_status(&mut self) {
        self.state_tx.send_modify(|s| {
            s.loading = false;
            s.status = None;
        });
    }
}

/// Translate a key press into a command, updating the input line in place.
pub fn handle_key(code: KeyCode, input: &mut Option<InputLine>) -> Option<TuiCommand> {
    if let Some(line) = input.as_mut() {
        match code {
            KeyCode::Esc => {
                *input = None;
            }
            KeyCode::Enter => {
                let line = input.take()?;
                return Some(match line.mode {
                    InputMode::Search if line.buffer.trim().is_empty() => TuiCommand::ClearSearch,
                    InputMode::Search => TuiCommand::Search(line.buffer.trim().to_string()),
                    InputMode::Filter => TuiCommand::Filter(line.buffer),
                });
            }
            KeyCode::Backspace => {
                line.buffer.pop();
            }
            KeyCode::Char(c) => line.buffer.push(c),
            _ => {}
        }
        return None;
    }

    match code {
        KeyCode::Char('q') => Some(TuiCommand::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(TuiCommand::Move(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(TuiCommand::Move(-1)),
        KeyCode::PageDown => Some(TuiCommand::Move(PAGE_JUMP)),
        KeyCode::PageUp => Some(TuiCommand::Move(-PAGE_JUMP)),
        KeyCode::Tab => Some(TuiCommand::NextCategory),
        KeyCode::BackTab => Some(TuiCommand::PrevCategory),
        KeyCode::Char('r') => Some(TuiCommand::Retry),
        KeyCode::Enter => Some(TuiCommand::OpenDetails),
        KeyCode::Esc => Some(TuiCommand::Back),
        KeyCode::Char('/') => {
            *input = Some(InputLine { mode: InputMode::Search, buffer: String::new() });
            None
        }
        KeyCode::Char('f') => {
            *input = Some(InputLine { mode: InputMode::Filter, buffer: String::new() });
            None
        }
        _ => None,
    }
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(state_rx: watch::Receiver<AppState>, cmd_tx: mpsc::Sender<TuiCommand>) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));
    let mut spinner_frame: u8 = 0;
    let mut input: Option<InputLine> = None;

    loop {
        let state = state_rx.borrow_and_update().clone();
        terminal.draw(|f| render::draw(f, &state, spinner_frame, input.as_ref()))?;

        tokio::select! {
            _ = tick.tick() => {
                spinner_frame = spinner_frame.wrapping_add(1);
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(cmd) = handle_key(key.code, &mut input) {
                        let quit = cmd == TuiCommand::Quit;
                        if cmd_tx.send(cmd).await.is_err() || quit {
                            return Ok(());
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::Category;

    fn type_str(input: &mut Option<InputLine>, text: &str) {
        for c in text.chars() {
            assert_eq!(handle_key(KeyCode::Char(c), input), None);
        }
    }

    #[test]
    fn test_navigation_keys() {
        let mut input = None;
        assert_eq!(handle_key(KeyCode::Char('j'), &mut input), Some(TuiCommand::Move(1)));
        assert_eq!(handle_key(KeyCode::Up, &mut input), Some(TuiCommand::Move(-1)));
        assert_eq!(handle_key(KeyCode::PageDown, &mut input), Some(TuiCommand::Move(10)));
        assert_eq!(handle_key(KeyCode::Tab, &mut input), Some(TuiCommand::NextCategory));
        assert_eq!(handle_key(KeyCode::Char('r'), &mut input), Some(TuiCommand::Retry));
        assert_eq!(handle_key(KeyCode::Char('q'), &mut input), Some(TuiCommand::Quit));
        assert_eq!(handle_key(KeyCode::Enter, &mut input), Some(TuiCommand::OpenDetails));
        assert_eq!(handle_key(KeyCode::Esc, &mut input), Some(TuiCommand::Back));
    }

    #[test]
    fn test_search_input() {
        let mut input = None;
        assert_eq!(handle_key(KeyCode::Char('/'), &mut input), None);
        type_str(&mut input, "dunx");
        handle_key(KeyCode::Backspace, &mut input);
        type_str(&mut input, "e");
        // 'q' while typing is text, not quit
        type_str(&mut input, " q");
        assert_eq!(
            handle_key(KeyCode::Enter, &mut input),
            Some(TuiCommand::Search("dune q".to_string()))
        );
        assert!(input.is_none());
    }

    #[test]
    fn test_empty_search_clears_query() {
        let mut input = None;
        handle_key(KeyCode::Char('/'), &mut input);
        assert_eq!(handle_key(KeyCode::Enter, &mut input), Some(TuiCommand::ClearSearch));
    }

    #[test]
    fn test_escape_cancels_input() {
        let mut input = None;
        handle_key(KeyCode::Char('f'), &mut input);
        type_str(&mut input, "abc");
        assert_eq!(handle_key(KeyCode::Esc, &mut input), None);
        assert!(input.is_none());
    }

    #[test]
    fn test_filter_input() {
        let mut input = None;
        handle_key(KeyCode::Char('f'), &mut input);
        type_str(&mut input, "Arr");
        assert_eq!(
            handle_key(KeyCode::Enter, &mut input),
            Some(TuiCommand::Filter("Arr".to_string()))
        );
    }

    #[test]
    fn test_presenter_updates_state() {
        let (tx, rx) = watch::channel(AppState::new(vec![Category::Trending], "backend"));
        let mut presenter = TuiPresenter::new(tx);

        presenter.set_status_message("Loading movies...", StatusKind::Info);
        assert!(rx.borrow().loading);

        presenter.append(&[Movie::new(1, "Dune"), Movie::new(2, "Arrival")]);
        {
            let s = rx.borrow();
            assert_eq!(s.movies.len(), 2);
            assert!(!s.loading);
            assert!(s.status.is_none());
        }

        presenter.set_status_message("No more results", StatusKind::Empty);
        assert_eq!(rx.borrow().status.as_ref().map(|l| l.kind), Some(StatusKind::Empty));
        assert_eq!(rx.borrow().logs.len(), 2);

        presenter.clear();
        assert!(rx.borrow().movies.is_empty());
    }
}
