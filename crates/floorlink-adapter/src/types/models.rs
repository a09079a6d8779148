/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - model definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{BacklogStatus, Priority, StepKind, TaskKind};

/// One step of a guided task as declared by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub kind: StepKind,
    /// Reference value the submitted code must match. Empty for steps
    /// without a reference check (SelectSource, ConfirmQuantity).
    #[serde(default)]
    pub expected: String,
    /// Human label shown next to the step ("Rack A-01, shelf 2").
    #[serde(default)]
    pub label: Option<String>,
}

/// A unit of guided work handed out by the task service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub task_id: String,
    pub kind: TaskKind,
    pub steps: Vec<StepSpec>,
    /// Upper bound for the quantity commit, in whole units.
    pub max_quantity: u32,
    /// Source container/location this task draws from.
    pub source_id: String,
    /// Item the terminal confirmation refers to (SKU or line reference).
    pub item_ref: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One backlog card as reported by the snapshot endpoint.
///
/// All fields except `id` are mutable display fields and participate in the
/// change signature computed by the console's sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogEntry {
    pub id: String,
    /// Order/transfer reference shown to the operator.
    pub reference: String,
    pub status: BacklogStatus,
    pub priority: Priority,
    pub total_units: u32,
    pub picked_units: u32,
    pub line_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

impl BacklogEntry {
    /// Earliest non-null timestamp among creation, update, and assignment.
    ///
    /// The snapshot ordering key; `None` sorts after every dated entry.
    pub fn anchor_time(&self) -> Option<DateTime<Utc>> {
        [self.created_at, self.updated_at, self.assigned_at]
            .into_iter()
            .flatten()
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry_with_times(
        created: Option<DateTime<Utc>>,
        updated: Option<DateTime<Utc>>,
        assigned: Option<DateTime<Utc>>,
    ) -> BacklogEntry {
        BacklogEntry {
            id: "bl-1".to_string(),
            reference: "ORD-1001".to_string(),
            status: BacklogStatus::Open,
            priority: Priority::Normal,
            total_units: 10,
            picked_units: 0,
            line_count: 3,
            created_at: created,
            updated_at: updated,
            assigned_at: assigned,
        }
    }

    #[test]
    fn test_anchor_time_picks_earliest() {
        let t1 = Utc.with_ymd_and_hms(2026, 7, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap();

        let entry = entry_with_times(Some(t2), Some(t1), None);
        assert_eq!(entry.anchor_time(), Some(t1));
    }

    #[test]
    fn test_anchor_time_none_when_all_missing() {
        let entry = entry_with_times(None, None, None);
        assert_eq!(entry.anchor_time(), None);
    }

    #[test]
    fn test_task_payload_roundtrip() {
        let json = serde_json::json!({
            "task_id": "t-77",
            "kind": "pick",
            "steps": [
                {"kind": "scan_location", "expected": "A-01-R02", "label": "Rack A-01"},
                {"kind": "scan_product", "expected": "SKU123"},
                {"kind": "confirm_quantity"}
            ],
            "max_quantity": 5,
            "source_id": "A-01-R02",
            "item_ref": "SKU123"
        });

        let payload: TaskPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.kind, TaskKind::Pick);
        assert_eq!(payload.steps.len(), 3);
        assert_eq!(payload.steps[1].expected, "SKU123");
        assert_eq!(payload.steps[2].expected, "");
        assert_eq!(payload.description, None);
    }
}
