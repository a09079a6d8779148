/*
[INPUT]:  Public API exports for floorlink-console crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod capture;
pub mod config;
pub mod engine;
pub mod session;
pub mod sync;
pub mod tui;

// Re-export main types for convenience
pub use capture::{CapturedCode, InputCapture, InputMode, InputSource};
pub use config::ConsoleConfig;
pub use engine::StepEngine;
pub use session::TaskSession;
pub use sync::BacklogSync;
