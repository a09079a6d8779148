/*
[INPUT]:  Key characters from the scan gun wedge or the operator's typing
[OUTPUT]: Submitted (code, source) pairs via debounce or explicit submit
[POS]:    Input layer - unified code capture for both entry modes
[UPDATE]: When changing debounce behavior or entry mode semantics
*/

use std::time::Duration;
use tokio::time::Instant;

/// Which entry mode the capture is in. The operator can toggle at any point
/// before submission; toggling clears the partial buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Hardware scan gun: burst entry, auto-submit on debounce expiry.
    Scan,
    /// Keyboard entry: submit only on an explicit action.
    Manual,
}

/// Where a submitted code came from. Downstream verification treats both the
/// same; the source only matters for feedback wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Scanner,
    Manual,
}

/// A code the capture considers submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCode {
    pub code: String,
    pub source: InputSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Active,
    Paused,
}

/// Unified code capture over scan-gun burst entry and manual typing.
///
/// The scan gun has no terminator character: a burst of keystrokes followed
/// by silence IS the code. The debounce deadline restarts on every character
/// and is exposed to the event loop; when it fires with no further input the
/// buffer is submitted. Manual mode never auto-submits.
///
/// Pause retains buffers but drops every incoming character and disarms the
/// deadline; reset discards everything. The two are not interchangeable:
/// pause bridges the settle window after a match (hardware may echo the scan),
/// reset ends the task context.
#[derive(Debug)]
pub struct InputCapture {
    mode: InputMode,
    state: CaptureState,
    scan_buffer: String,
    manual_buffer: String,
    debounce: Duration,
    debounce_deadline: Option<Instant>,
}

impl InputCapture {
    pub fn new(debounce: Duration) -> Self {
        Self {
            mode: InputMode::Scan,
            state: CaptureState::Active,
            scan_buffer: String::new(),
            manual_buffer: String::new(),
            debounce,
            debounce_deadline: None,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.state == CaptureState::Paused
    }

    /// Buffer content for rendering the input line.
    pub fn pending(&self) -> &str {
        match self.mode {
            InputMode::Scan => &self.scan_buffer,
            InputMode::Manual => &self.manual_buffer,
        }
    }

    /// Deadline the event loop must wake at to flush a scan burst.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce_deadline
    }

    /// Feed one character. Ignored entirely while paused.
    pub fn push_char(&mut self, ch: char, now: Instant) {
        if self.state == CaptureState::Paused {
            return;
        }

        match self.mode {
            InputMode::Scan => {
                self.scan_buffer.push(ch);
                // Every character restarts the burst window.
                self.debounce_deadline = Some(now + self.debounce);
            }
            InputMode::Manual => {
                self.manual_buffer.push(ch);
            }
        }
    }

    /// Delete the last character of the manual buffer. Scan bursts have no
    /// backspace; a stray one from the wedge is ignored.
    pub fn backspace(&mut self) {
        if self.state == CaptureState::Paused {
            return;
        }
        if self.mode == InputMode::Manual {
            self.manual_buffer.pop();
        }
    }

    /// Flush the scan buffer if the debounce deadline has passed.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<CapturedCode> {
        if self.state == CaptureState::Paused || self.mode != InputMode::Scan {
            return None;
        }
        let deadline = self.debounce_deadline?;
        if now < deadline || self.scan_buffer.is_empty() {
            return None;
        }

        self.debounce_deadline = None;
        Some(CapturedCode {
            code: std::mem::take(&mut self.scan_buffer),
            source: InputSource::Scanner,
        })
    }

    /// Explicit submit for manual mode. Returns nothing on an empty buffer
    /// or while paused.
    pub fn submit_manual(&mut self) -> Option<CapturedCode> {
        if self.state == CaptureState::Paused || self.mode != InputMode::Manual {
            return None;
        }
        if self.manual_buffer.is_empty() {
            return None;
        }

        Some(CapturedCode {
            code: std::mem::take(&mut self.manual_buffer),
            source: InputSource::Manual,
        })
    }

    /// Switch entry mode, clearing any partial buffer and disarming the
    /// deadline.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.scan_buffer.clear();
        self.manual_buffer.clear();
        self.debounce_deadline = None;
    }

    /// Stop processing input while keeping buffers. The deadline is disarmed
    /// so a half-captured burst cannot auto-submit mid-pause.
    pub fn pause(&mut self) {
        self.state = CaptureState::Paused;
        self.debounce_deadline = None;
    }

    /// Accept input again. Nothing is re-armed until new characters arrive.
    pub fn resume(&mut self) {
        self.state = CaptureState::Active;
    }

    /// Discard all capture context.
    pub fn reset(&mut self) {
        self.scan_buffer.clear();
        self.manual_buffer.clear();
        self.debounce_deadline = None;
        self.state = CaptureState::Active;
    }
}
