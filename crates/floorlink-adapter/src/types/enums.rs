/*
[INPUT]:  API schema enum values
[OUTPUT]: Typed enums with serde mappings
[POS]:    Data layer - shared enum definitions
[UPDATE]: When the service adds task kinds, step kinds, or statuses
*/

use serde::{Deserialize, Serialize};

/// Kind of guided task an operator executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Pick units of an item for an order.
    Pick,
    /// Move stock from one location to another.
    Relocate,
}

/// Kind of a single step inside a guided task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Choose the source location/container from a list (no reference check).
    SelectSource,
    /// Scan a location code that must match the declared value.
    ScanLocation,
    /// Scan a product code that must match the declared value.
    ScanProduct,
    /// Enter and commit a quantity.
    ConfirmQuantity,
}

impl StepKind {
    /// Steps whose satisfaction comes from a submitted code.
    pub fn requires_scan(&self) -> bool {
        matches!(self, StepKind::ScanLocation | StepKind::ScanProduct)
    }
}

/// Status of a backlog entry as reported by the snapshot endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogStatus {
    Open,
    Assigned,
    InProgress,
    OnHold,
}

/// Display priority of a backlog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

/// Status values accepted by the fire-and-forget task status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    InProgress,
    Completed,
    Aborted,
}
