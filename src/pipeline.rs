//! Feed task: owns the [`FeedController`] and the [`DetailsLoader`] and turns TUI
//! commands and finished fetches into calls on them. Runs on a single task, so
//! their state is only ever touched from here.

use crate::engine::controller::CompletionReceiver;
use crate::engine::details::DetailsReceiver;
use crate::engine::{DetailsLoader, DetailsOutcome, FeedController, Presenter};
use crate::feed::types::Movie;
use crate::tui::state::{near_bottom, AppState, DetailsPane, DetailsView};
use crate::tui::TuiCommand;
use std::ops::ControlFlow;
use tokio::sync::{mpsc, watch};

/// Apply one TUI command. `Break` means the user asked to quit.
pub fn handle_command<P: Presenter>(
    controller: &mut FeedController<P>,
    details: &mut DetailsLoader,
    state_tx: &watch::Sender<AppState>,
    cmd: TuiCommand,
    scroll_threshold_rows: usize,
) -> ControlFlow<()> {
    match cmd {
        TuiCommand::Quit => return ControlFlow::Break(()),
        // The list is covered while details are open.
        TuiCommand::Move(_) if details.open_movie().is_some() => {}
        TuiCommand::Move(delta) => {
            let mut near = false;
            state_tx.send_modify(|s| {
                s.move_selection(delta);
                near = near_bottom(s.selected, s.visible_len(), scroll_threshold_rows);
            });
            // Moving up never pulls the next page.
            if near && delta > 0 {
                controller.on_scroll_proximity();
            }
        }
        TuiCommand::NextCategory => reactivate(controller, details, state_tx, |s| {
            s.cycle_category(1);
            s.query.clear();
        }),
        TuiCommand::PrevCategory => reactivate(controller, details, state_tx, |s| {
            s.cycle_category(-1);
            s.query.clear();
        }),
        TuiCommand::Search(query) => reactivate(controller, details, state_tx, |s| s.query = query),
        TuiCommand::ClearSearch => reactivate(controller, details, state_tx, |s| s.query.clear()),
        TuiCommand::Filter(raw) => {
            state_tx.send_modify(|s| s.set_filter(&raw));
        }
        TuiCommand::OpenDetails => {
            let selected = state_tx.borrow().selected_movie().cloned();
            if let Some(movie) = selected {
                open_details(details, state_tx, movie);
            }
        }
        TuiCommand::Back => {
            if details.open_movie().is_some() {
                details.close();
                state_tx.send_modify(|s| s.details = None);
            } else {
                reactivate(controller, details, state_tx, |s| s.query.clear());
            }
        }
        TuiCommand::Retry => {
            let failed_details = state_tx.borrow().details.as_ref().and_then(|v| match v.pane {
                DetailsPane::Failed(_) => Some(v.movie.clone()),
                _ => None,
            });
            if let Some(movie) = failed_details {
                open_details(details, state_tx, movie);
            } else if !controller.retry() {
                tracing::debug!("retry ignored: feed is not in a failed state");
            }
        }
    }
    ControlFlow::Continue(())
}

fn open_details(details: &mut DetailsLoader, state_tx: &watch::Sender<AppState>, movie: Movie) {
    if details.open(movie.id) {
        state_tx.send_modify(|s| {
            s.details = Some(DetailsView {
                movie,
                pane: DetailsPane::Loading,
            });
        });
    }
}

/// Show a finished details fetch if it is still the open movie.
pub fn apply_details(state_tx: &watch::Sender<AppState>, outcome: DetailsOutcome) {
    match outcome {
        DetailsOutcome::Stale => {}
        DetailsOutcome::Loaded { details, recommendations } => {
            state_tx.send_modify(|s| {
                if let Some(view) = s.details.as_mut().filter(|v| v.movie.id == details.movie.id) {
                    view.pane = DetailsPane::Ready {
                        details,
                        recommendations,
                    };
                }
            });
        }
        DetailsOutcome::Failed { movie_id, error } => {
            state_tx.send_modify(|s| {
                s.push_log("ERROR", format!("details for {}: {}", movie_id, error.message));
                if let Some(view) = s.details.as_mut().filter(|v| v.movie.id == movie_id) {
                    view.pane = DetailsPane::Failed(error.message);
                }
            });
        }
    }
}

/// Update the UI state, then activate whatever criteria it now describes.
/// Unchanged criteria is a no-op inside the controller.
fn reactivate<P: Presenter>(
    controller: &mut FeedController<P>,
    details: &mut DetailsLoader,
    state_tx: &watch::Sender<AppState>,
    update: impl FnOnce(&mut AppState),
) {
    details.close();
    let mut criteria = None;
    state_tx.send_modify(|s| {
        s.details = None;
        update(s);
        criteria = Some(s.criteria());
    });
    if let Some(criteria) = criteria {
        controller.activate(criteria);
    }
}

/// Activate the initial criteria and run until the TUI quits or goes away.
pub async fn run_feed<P: Presenter>(
    mut controller: FeedController<P>,
    mut completions: CompletionReceiver,
    mut details: DetailsLoader,
    mut details_rx: DetailsReceiver,
    mut cmd_rx: mpsc::Receiver<TuiCommand>,
    state_tx: watch::Sender<AppState>,
    scroll_threshold_rows: usize,
) {
    let initial = state_tx.borrow().criteria();
    controller.activate(initial);

    loop {
        tokio::select! {
            Some(done) = completions.recv() => {
                controller.handle_completion(done);
            }
            Some(done) = details_rx.recv() => {
                let outcome = details.handle_completion(done);
                apply_details(&state_tx, outcome);
            }
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => {
                    let flow = handle_command(&mut controller, &mut details, &state_tx, cmd, scroll_threshold_rows);
                    if flow.is_break() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    controller.deactivate();
    details.close();
    tracing::debug!("feed task stopped");
}
