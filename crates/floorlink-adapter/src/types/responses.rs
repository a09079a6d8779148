/*
[INPUT]:  Raw API response payloads
[OUTPUT]: Typed response structs and the next-work envelope
[POS]:    Data layer - response definitions for API communication
[UPDATE]: When response envelopes change shape
*/

use serde::{Deserialize, Serialize};

use super::models::TaskPayload;

/// Outcome of a commit call. The server is authoritative; `success: false`
/// with a 200 status means the action was rejected by business rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Wire envelope of the next-work endpoints: either a task payload or a
/// completion marker with an optional operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextWorkResponse {
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task: Option<TaskPayload>,
}

/// Decoded next-work outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextWork {
    Task(TaskPayload),
    Complete { message: Option<String> },
}

impl NextWorkResponse {
    /// Collapse the envelope into its meaning. A payload wins over the
    /// completion flag; an envelope carrying neither counts as complete.
    pub fn into_work(self) -> NextWork {
        match self.task {
            Some(task) if !self.complete => NextWork::Task(task),
            _ => NextWork::Complete {
                message: self.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_task() {
        let json = serde_json::json!({
            "task": {
                "task_id": "t-1",
                "kind": "relocate",
                "steps": [],
                "max_quantity": 12,
                "source_id": "B-07",
                "item_ref": "SKU9"
            }
        });
        let resp: NextWorkResponse = serde_json::from_value(json).unwrap();
        match resp.into_work() {
            NextWork::Task(task) => assert_eq!(task.task_id, "t-1"),
            NextWork::Complete { .. } => panic!("expected task"),
        }
    }

    #[test]
    fn test_envelope_complete() {
        let json = serde_json::json!({"complete": true, "message": "order done"});
        let resp: NextWorkResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            resp.into_work(),
            NextWork::Complete {
                message: Some("order done".to_string())
            }
        );
    }

    #[test]
    fn test_empty_envelope_is_complete() {
        let resp: NextWorkResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.into_work(), NextWork::Complete { message: None });
    }
}
