/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public floor task service adapter surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    FloorClient,
    FloorError,
    Result,
    StationContext,
};

// Re-export all types
pub use types::*;
