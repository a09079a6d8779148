/*
[INPUT]:  Session state, backlog views, sync notices, log buffer, key input
[OUTPUT]: Ratatui run loop, rendering dispatch, and log buffer utilities
[POS]:    TUI runtime loop and shared helpers
[UPDATE]: When changing the event loop, deadlines, or runtime controls
[UPDATE]: 2026-07-20 Drive capture debounce and step settle from the loop
*/

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

use crate::engine::Prompt;
use crate::session::SessionEvent;
use crate::sync::SyncNotice;

use super::app::AppState;
use super::events::{handle_key_event, submit_code};
use super::terminal::TerminalGuard;
use super::ui::draw_ui;

const UI_TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub(crate) const LOG_BUFFER_CAPACITY: usize = 2000;

pub type LogBufferHandle = Arc<StdMutex<LogBuffer>>;

#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    pub fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

pub fn new_log_buffer() -> LogBufferHandle {
    Arc::new(StdMutex::new(LogBuffer::new(LOG_BUFFER_CAPACITY)))
}

#[derive(Clone)]
pub struct LogWriterFactory {
    buffer: LogBufferHandle,
}

impl LogWriterFactory {
    pub fn new(buffer: LogBufferHandle) -> Self {
        Self { buffer }
    }
}

pub struct LogWriter {
    buffer: LogBufferHandle,
    partial: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf);
        self.partial.push_str(&chunk);
        while let Some(pos) = self.partial.find('\n') {
            let line = self.partial[..pos].trim_end_matches('\r').to_string();
            self.partial = self.partial[pos + 1..].to_string();
            let mut guard = self.buffer.lock().expect("log buffer lock");
            guard.push_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            let mut guard = self.buffer.lock().expect("log buffer lock");
            guard.push_line(line);
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.buffer.clone(),
            partial: String::new(),
        }
    }
}

enum UiEvent {
    Input(CrosstermEvent),
}

/// Run the operator console until quit or shutdown.
pub async fn run_tui(
    mut app: AppState,
    log_buffer: LogBufferHandle,
    mut session_events: mpsc::UnboundedReceiver<SessionEvent>,
    mut notices: mpsc::UnboundedReceiver<SyncNotice>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut terminal = TerminalGuard::new()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    let input_shutdown_clone = input_shutdown.clone();

    tokio::task::spawn_blocking(move || {
        while !input_shutdown_clone.is_cancelled() {
            if crossterm::event::poll(INPUT_POLL_INTERVAL).unwrap_or(false) {
                if let Ok(event) = crossterm::event::read() {
                    let _ = event_tx.send(UiEvent::Input(event));
                }
            }
        }
    });

    let mut view_rx = app.sync.view();
    let mut tick = tokio::time::interval(UI_TICK_INTERVAL);

    while !app.should_quit {
        // Deadlines owned by capture and engine, surfaced to this loop.
        let debounce_due = app.session.engine().capture().debounce_deadline();
        let settle_due = app.session.engine().settle_deadline();
        let far = Instant::now() + Duration::from_secs(3600);

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {}
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(UiEvent::Input(CrosstermEvent::Key(key))) => {
                        if handle_key_event(&mut app, key).await {
                            app.should_quit = true;
                        }
                    }
                    Some(UiEvent::Input(CrosstermEvent::FocusGained)) => {
                        app.on_focus_changed(true);
                    }
                    Some(UiEvent::Input(CrosstermEvent::FocusLost)) => {
                        app.on_focus_changed(false);
                    }
                    Some(UiEvent::Input(_)) => {}
                    None => break,
                }
            }
            _ = tokio::time::sleep_until(debounce_due.unwrap_or(far)), if debounce_due.is_some() => {
                let flushed = app
                    .session
                    .engine_mut()
                    .capture_mut()
                    .poll_debounce(Instant::now());
                if let Some(captured) = flushed {
                    submit_code(&mut app, captured);
                }
            }
            _ = tokio::time::sleep_until(settle_due.unwrap_or(far)), if settle_due.is_some() => {
                if let Some(prompt) = app.session.engine_mut().poll_settle(Instant::now()) {
                    app.status_message = match prompt {
                        Prompt::Quantity => String::from("enter quantity"),
                        Prompt::Scan(_) => String::from("scan next code"),
                        _ => app.status_message.clone(),
                    };
                }
            }
            changed = view_rx.changed() => {
                if changed.is_ok() {
                    app.backlog = view_rx.borrow_and_update().clone();
                    app.clamp_selection();
                } else {
                    break;
                }
            }
            notice = notices.recv() => {
                if let Some(notice) = notice {
                    app.status_message = notice.message;
                }
            }
        }

        // Session events are emitted synchronously inside session calls;
        // drain whatever the last arm produced.
        while let Ok(event) = session_events.try_recv() {
            app.apply_session_event(event);
        }

        terminal.draw(|frame| draw_ui(frame, &mut app, &log_buffer))?;
    }

    input_shutdown.cancel();
    app.sync.shutdown();
    Ok(())
}
