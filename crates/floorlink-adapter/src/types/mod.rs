/*
[INPUT]:  Wire schema of the floor task service
[OUTPUT]: Typed request/response/model definitions
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::{BacklogStatus, Priority, StepKind, TaskKind, WorkStatus};
pub use models::{BacklogEntry, StepSpec, TaskPayload};
pub use requests::{CompleteRelocationRequest, ConfirmPickRequest, UpdateStatusRequest};
pub use responses::{ActionReceipt, NextWork, NextWorkResponse};
