/*
[INPUT]:  Crossterm key events
[OUTPUT]: TUI event routing into session, capture, and view state
[POS]:    TUI key handling
[UPDATE]: When changing hotkeys or per-view routing
*/

use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use tokio::time::Instant;
use tui_input::backend::crossterm::EventHandler;

use crate::capture::{CapturedCode, InputMode};
use crate::engine::{Prompt, ScanOutcome};

use super::app::{AppState, View};

/// Handles key events for the TUI.
///
/// Returns `true` if quit is requested, `false` otherwise.
pub(super) async fn handle_key_event(app: &mut AppState, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.view {
        View::Backlog => handle_backlog_key(app, key.code).await,
        View::Logs => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.switch_view(View::Backlog);
            }
            false
        }
        View::Task => handle_task_key(app, key).await,
    }
}

async fn handle_backlog_key(app: &mut AppState, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Enter => {
            if let Some(id) = app.selected_row_id().map(str::to_string) {
                app.completion_note = None;
                app.status_message = format!("opening {id}");
                app.session.open_order(&id).await;
            }
        }
        KeyCode::Char('v') => {
            app.completion_note = None;
            app.status_message = String::from("opening relocation queue");
            app.session.open_relocations().await;
        }
        KeyCode::Char('r') => {
            app.sync.refresh_now();
            app.status_message = String::from("refreshing backlog");
        }
        KeyCode::Char('l') => app.switch_view(View::Logs),
        _ => {}
    }
    false
}

async fn handle_task_key(app: &mut AppState, key: KeyEvent) -> bool {
    match app.session.engine().prompt() {
        Prompt::Scan(_) => match key.code {
            KeyCode::Tab => toggle_entry_mode(app),
            KeyCode::Left => {
                if app.session.engine_mut().back().is_ok() {
                    app.status_message = String::from("back to source selection");
                }
            }
            KeyCode::Esc => abandon_task(app),
            KeyCode::Enter => {
                if let Some(captured) = app.session.engine_mut().capture_mut().submit_manual() {
                    submit_code(app, captured);
                }
            }
            KeyCode::Backspace => app.session.engine_mut().capture_mut().backspace(),
            KeyCode::Char(ch) => {
                app.session
                    .engine_mut()
                    .capture_mut()
                    .push_char(ch, Instant::now());
            }
            _ => {}
        },
        Prompt::ChooseSource => match key.code {
            KeyCode::Enter => {
                let source = app
                    .session
                    .engine()
                    .task()
                    .map(|task| task.source_id.clone());
                if let Some(source) = source {
                    if app.session.engine_mut().choose_source(&source).is_ok() {
                        app.status_message = format!("source {source} selected");
                    }
                }
            }
            KeyCode::Esc => abandon_task(app),
            _ => {}
        },
        Prompt::Quantity => match key.code {
            KeyCode::Enter => {
                if app.session.confirm_in_flight() {
                    return false;
                }
                let raw = app.quantity.value().to_string();
                if let Err(err) = app.session.confirm(&raw).await {
                    // Local validation failure; the entered value stays put.
                    app.status_message = err.to_string();
                }
            }
            KeyCode::Esc => abandon_task(app),
            _ => {
                app.quantity.handle_event(&CrosstermEvent::Key(key));
            }
        },
        Prompt::None => {
            // Settle window or idle; only an abandon makes sense here.
            if key.code == KeyCode::Esc {
                abandon_task(app);
            }
        }
    }
    false
}

/// Feed a submitted code into the engine and surface the outcome.
pub(super) fn submit_code(app: &mut AppState, captured: CapturedCode) {
    match app.session.handle_code(&captured) {
        Ok(ScanOutcome::Matched) => {
            app.status_message = String::from("match");
        }
        Ok(ScanOutcome::Mismatch { expected }) => {
            app.status_message = format!("wrong value, expected {expected}");
        }
        Err(err) => {
            // A code arrived outside a scan step; drop it.
            tracing::debug!(error = %err, code = %captured.code, "code dropped");
        }
    }
}

fn toggle_entry_mode(app: &mut AppState) {
    let capture = app.session.engine_mut().capture_mut();
    let next = match capture.mode() {
        InputMode::Scan => InputMode::Manual,
        InputMode::Manual => InputMode::Scan,
    };
    capture.set_mode(next);
    app.status_message = match next {
        InputMode::Scan => String::from("scanner entry"),
        InputMode::Manual => String::from("manual entry"),
    };
}

fn abandon_task(app: &mut AppState) {
    app.session.abandon();
    app.status_message = String::from("task abandoned");
    app.switch_view(View::Backlog);
}
