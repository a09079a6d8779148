/*
[INPUT]:  Session events, backlog views, operator key intents
[OUTPUT]: AppState consumed by the renderers and the key router
[POS]:    TUI application state
[UPDATE]: When adding views or UI-owned state
*/

use tui_input::Input;

use crate::session::{SessionEvent, TaskSession};
use crate::sync::{BacklogSync, BacklogView};

/// Which screen the operator is on. The backlog poller runs only while the
/// backlog is actually on screen and the terminal has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Backlog,
    Task,
    Logs,
}

pub struct AppState {
    pub session: TaskSession,
    pub sync: BacklogSync,
    /// Latest published backlog view, copied from the watch channel.
    pub backlog: BacklogView,
    pub selected: usize,
    pub view: View,
    /// Quantity entry for the terminal confirm step. Survives rejections and
    /// failed commits untouched.
    pub quantity: Input,
    pub status_message: String,
    /// Set when the work source reports completion; rendered as the
    /// completion screen over the backlog.
    pub completion_note: Option<String>,
    /// Badge counter fed by ActionConfirmed events.
    pub confirmed_count: u32,
    pub focused: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: TaskSession, sync: BacklogSync) -> Self {
        Self {
            session,
            sync,
            backlog: BacklogView::default(),
            selected: 0,
            view: View::Backlog,
            quantity: Input::default(),
            status_message: String::from("ready"),
            completion_note: None,
            confirmed_count: 0,
            focused: true,
            should_quit: false,
        }
    }

    pub fn selected_row_id(&self) -> Option<&str> {
        self.backlog
            .rows
            .get(self.selected)
            .map(|row| row.id.as_str())
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.backlog.rows.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.backlog.rows.len() - 1;
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(last);
    }

    /// Keep the selection on a valid row after a snapshot shrank the list.
    pub fn clamp_selection(&mut self) {
        if self.backlog.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.backlog.rows.len() {
            self.selected = self.backlog.rows.len() - 1;
        }
    }

    /// Switch screens, keeping the poller's visibility gating in step.
    pub fn switch_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        let was_backlog = self.view == View::Backlog;
        self.view = view;
        match (was_backlog, self.view == View::Backlog) {
            (true, false) => self.sync.pause(),
            (false, true) => {
                if self.focused {
                    self.sync.resume();
                }
            }
            _ => {}
        }
    }

    pub fn on_focus_changed(&mut self, focused: bool) {
        self.focused = focused;
        if self.view == View::Backlog {
            if focused {
                self.sync.resume();
            } else {
                self.sync.pause();
            }
        }
    }

    /// Fold a session event into UI state.
    pub fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TaskLoaded { task_id } => {
                self.quantity = Input::default();
                self.completion_note = None;
                self.status_message = format!("task {task_id} loaded");
                self.switch_view(View::Task);
            }
            SessionEvent::ActionConfirmed {
                quantity, message, ..
            } => {
                self.confirmed_count += 1;
                self.status_message = if message.is_empty() {
                    format!("{quantity} units confirmed")
                } else {
                    message
                };
            }
            SessionEvent::TaskCompleted { .. } => {}
            SessionEvent::NoTasksRemaining { message } => {
                self.completion_note =
                    Some(message.unwrap_or_else(|| "all tasks completed".to_string()));
                self.status_message = String::from("no tasks remaining");
                self.switch_view(View::Backlog);
            }
            SessionEvent::ConflictReassigned { message } => {
                self.status_message = format!("assignment changed: {message}");
            }
            SessionEvent::CommitRejected { message } => {
                self.status_message = format!("rejected: {message}");
            }
            SessionEvent::CommitFailed { message } => {
                self.status_message = format!("confirm failed, retry: {message}");
            }
            SessionEvent::CommitTimedOut => {
                self.status_message = String::from(
                    "confirmation timed out; the action may still have landed - retry or check the backlog",
                );
            }
            SessionEvent::NextWorkFailed { message } => {
                self.status_message = format!("could not fetch work: {message}");
                self.switch_view(View::Backlog);
            }
        }
    }
}
