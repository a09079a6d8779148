/*
[INPUT]:  Console-side commit and status intents
[OUTPUT]: Serializable request bodies
[POS]:    Data layer - request definitions for API communication
[UPDATE]: When commit or status endpoints change shape
*/

use serde::{Deserialize, Serialize};

use super::enums::WorkStatus;

/// Body for `POST /api/confirm_pick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPickRequest {
    pub task_id: String,
    pub item_ref: String,
    pub quantity: u32,
    /// Client-minted id for this user intent. A re-press after a timeout
    /// carries the same id so the server can de-duplicate.
    pub intent_id: String,
}

/// Body for `POST /api/complete_relocation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteRelocationRequest {
    pub task_id: String,
    pub quantity: u32,
    pub intent_id: String,
}

/// Body for `POST /api/update_task_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub task_id: String,
    pub status: WorkStatus,
}
