/*
[INPUT]:  Crossterm events, session state, backlog views
[OUTPUT]: Ratatui operator console
[POS]:    TUI module layout
[UPDATE]: When adding panels or reorganizing the TUI modules
*/

pub mod app;
pub mod events;
pub mod runtime;
pub mod terminal;
pub mod ui;

pub use runtime::{LogBuffer, LogBufferHandle, LogWriterFactory, run_tui};
