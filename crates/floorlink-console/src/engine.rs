/*
[INPUT]:  Task payloads from the service, captured codes, quantity entry
[OUTPUT]: Validated step transitions, scan outcomes, confirm-ready quantities
[POS]:    Task domain logic - guided step state machine
[UPDATE]: When step kinds, verification rules, or the task lifecycle change
[UPDATE]: 2026-06-24 Gate settle advancement behind an explicit deadline
[UPDATE]: 2026-07-02 Reject payloads whose final step is not a quantity confirm
*/

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use floorlink_adapter::{StepKind, TaskKind, TaskPayload};

use crate::capture::{CapturedCode, InputCapture};

/// Normalize a code for comparison: trim surrounding whitespace, collapse
/// internal whitespace runs to a single space, uppercase.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Check a submitted code against a server-declared reference value.
pub fn verify(observed: &str, expected: &str) -> bool {
    normalize(observed) == normalize(expected)
}

/// One step of the active task, with its satisfaction flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub expected: String,
    pub label: Option<String>,
    pub satisfied: bool,
}

/// The task currently being executed. Exclusively owned and mutated by the
/// engine; discarded on completion or conflict, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTask {
    pub id: String,
    pub kind: TaskKind,
    pub steps: Vec<Step>,
    pub current: usize,
    pub max_quantity: u32,
    pub source_id: String,
    pub item_ref: String,
    pub description: Option<String>,
    /// Operator's choice on a SelectSource step, if one was made.
    pub source_choice: Option<String>,
}

impl ActiveTask {
    fn from_payload(payload: TaskPayload) -> Result<Self, EngineError> {
        if payload.steps.is_empty() {
            return Err(EngineError::MalformedTask {
                task_id: payload.task_id,
                reason: "no steps".to_string(),
            });
        }
        if payload.steps.last().map(|s| s.kind) != Some(StepKind::ConfirmQuantity) {
            return Err(EngineError::MalformedTask {
                task_id: payload.task_id,
                reason: "final step must confirm a quantity".to_string(),
            });
        }
        if payload.max_quantity == 0 {
            return Err(EngineError::MalformedTask {
                task_id: payload.task_id,
                reason: "max_quantity is zero".to_string(),
            });
        }

        Ok(Self {
            id: payload.task_id,
            kind: payload.kind,
            steps: payload
                .steps
                .into_iter()
                .map(|spec| Step {
                    kind: spec.kind,
                    expected: spec.expected,
                    label: spec.label,
                    satisfied: false,
                })
                .collect(),
            current: 0,
            max_quantity: payload.max_quantity,
            source_id: payload.source_id,
            item_ref: payload.item_ref,
            description: payload.description,
            source_choice: None,
        })
    }
}

/// Engine lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    InProgress,
    Confirming,
    Completed,
}

/// Operations that can be attempted against the engine, for transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    HandleCode,
    ChooseSource,
    Confirm,
    Back,
}

/// Quantity entry violations. Local by construction: the engine refuses the
/// confirm transition, so nothing reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("enter a whole number")]
    NotANumber,
    #[error("quantity must be at least 1")]
    TooSmall,
    #[error("quantity exceeds the task limit of {max}")]
    TooLarge { max: u32 },
}

/// Errors occurring during engine operations
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("invalid operation: {from:?} -> {action:?}")]
    InvalidOperation {
        from: EngineStatus,
        action: EngineAction,
    },

    #[error("task {task_id} rejected: {reason}")]
    MalformedTask { task_id: String, reason: String },

    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// Outcome of verifying a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Step satisfied; the engine pauses capture and arms the settle
    /// deadline. Advancement happens when the deadline fires.
    Matched,
    /// Wrong value. The step and capture stay as they were.
    Mismatch { expected: String },
}

/// What the UI should prompt for right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    None,
    ChooseSource,
    Scan(StepKind),
    Quantity,
}

/// Validate a raw quantity entry against the task bound.
pub fn validate_quantity(raw: &str, max: u32) -> Result<u32, QuantityError> {
    let qty: u32 = raw.trim().parse().map_err(|_| QuantityError::NotANumber)?;
    if qty < 1 {
        return Err(QuantityError::TooSmall);
    }
    if qty > max {
        return Err(QuantityError::TooLarge { max });
    }
    Ok(qty)
}

/// State machine driving scan -> verify -> advance -> confirm for the active
/// task. Owns the input capture so the pause/resume discipline cannot drift
/// from step state: capture is live exactly while a scan step awaits input.
#[derive(Debug)]
pub struct StepEngine {
    status: EngineStatus,
    task: Option<ActiveTask>,
    capture: InputCapture,
    settle: Duration,
    settle_deadline: Option<Instant>,
}

impl StepEngine {
    pub fn new(capture: InputCapture, settle: Duration) -> Self {
        let mut capture = capture;
        capture.pause();
        Self {
            status: EngineStatus::Idle,
            task: None,
            capture,
            settle,
            settle_deadline: None,
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn task(&self) -> Option<&ActiveTask> {
        self.task.as_ref()
    }

    pub fn capture(&self) -> &InputCapture {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut InputCapture {
        &mut self.capture
    }

    /// Settle deadline the event loop must wake at, if armed.
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.settle_deadline
    }

    pub fn current_step(&self) -> Option<&Step> {
        let task = self.task.as_ref()?;
        task.steps.get(task.current)
    }

    /// What the operator should be asked for right now.
    pub fn prompt(&self) -> Prompt {
        if self.status != EngineStatus::InProgress || self.settle_deadline.is_some() {
            return Prompt::None;
        }
        match self.current_step().map(|step| step.kind) {
            Some(StepKind::SelectSource) => Prompt::ChooseSource,
            Some(kind) if kind.requires_scan() => Prompt::Scan(kind),
            Some(StepKind::ConfirmQuantity) => Prompt::Quantity,
            _ => Prompt::None,
        }
    }

    /// Begin a new task, discarding whatever was active.
    pub fn start(&mut self, payload: TaskPayload) -> Result<(), EngineError> {
        let task = ActiveTask::from_payload(payload)?;

        self.capture.reset();
        self.settle_deadline = None;
        self.status = EngineStatus::InProgress;
        if !task.steps[0].kind.requires_scan() {
            self.capture.pause();
        }
        self.task = Some(task);
        Ok(())
    }

    /// Verify a submitted code against the current step's reference value.
    pub fn handle_code(
        &mut self,
        captured: &CapturedCode,
        now: Instant,
    ) -> Result<ScanOutcome, EngineError> {
        let invalid = EngineError::InvalidOperation {
            from: self.status,
            action: EngineAction::HandleCode,
        };
        if self.status != EngineStatus::InProgress || self.settle_deadline.is_some() {
            return Err(invalid);
        }
        let Some(task) = self.task.as_mut() else {
            return Err(invalid);
        };
        let Some(step) = task.steps.get_mut(task.current) else {
            return Err(invalid);
        };
        if !step.kind.requires_scan() || step.satisfied {
            return Err(invalid);
        }

        if !verify(&captured.code, &step.expected) {
            tracing::debug!(
                task_id = %task.id,
                step = ?step.kind,
                observed = %captured.code,
                "code mismatch"
            );
            return Ok(ScanOutcome::Mismatch {
                expected: step.expected.clone(),
            });
        }

        step.satisfied = true;
        // Hold input until the settle window elapses; hardware may echo the
        // scan and a double-read must not land on the next step.
        self.capture.pause();
        self.settle_deadline = Some(now + self.settle);

        tracing::debug!(task_id = %task.id, step = ?step.kind, "step satisfied");
        Ok(ScanOutcome::Matched)
    }

    /// Advance past a satisfied step once its settle deadline has passed.
    /// Returns the new prompt when an advancement happened.
    pub fn poll_settle(&mut self, now: Instant) -> Option<Prompt> {
        let deadline = self.settle_deadline?;
        if now < deadline {
            return None;
        }
        self.settle_deadline = None;

        let task = self.task.as_mut()?;
        task.current += 1;

        let next_requires_scan = task
            .steps
            .get(task.current)
            .map(|step| step.kind.requires_scan())
            .unwrap_or(false);
        if next_requires_scan {
            self.capture.resume();
        }

        Some(self.prompt())
    }

    /// Satisfy the non-scan SelectSource step with the operator's choice and
    /// advance immediately (nothing was scanned, so no settle window).
    pub fn choose_source(&mut self, choice: &str) -> Result<(), EngineError> {
        let invalid = EngineError::InvalidOperation {
            from: self.status,
            action: EngineAction::ChooseSource,
        };
        if self.status != EngineStatus::InProgress || self.settle_deadline.is_some() {
            return Err(invalid);
        }
        let Some(task) = self.task.as_mut() else {
            return Err(invalid);
        };
        let Some(step) = task.steps.get_mut(task.current) else {
            return Err(invalid);
        };
        if step.kind != StepKind::SelectSource {
            return Err(invalid);
        }

        step.satisfied = true;
        task.source_choice = Some(choice.to_string());
        task.current += 1;

        if task
            .steps
            .get(task.current)
            .map(|step| step.kind.requires_scan())
            .unwrap_or(false)
        {
            self.capture.resume();
        }
        Ok(())
    }

    /// Validate the entered quantity and move into Confirming. The network
    /// round trip belongs to the session; on a validation error nothing
    /// changes and the entered value stays with the caller.
    pub fn confirm_request(&mut self, raw_quantity: &str) -> Result<u32, EngineError> {
        let invalid = EngineError::InvalidOperation {
            from: self.status,
            action: EngineAction::Confirm,
        };
        if self.status != EngineStatus::InProgress || self.settle_deadline.is_some() {
            return Err(invalid);
        }
        let max = {
            let Some(task) = self.task.as_ref() else {
                return Err(invalid);
            };
            let Some(step) = task.steps.get(task.current) else {
                return Err(invalid);
            };
            if step.kind != StepKind::ConfirmQuantity {
                return Err(invalid);
            }
            task.max_quantity
        };

        let quantity = validate_quantity(raw_quantity, max)?;
        self.status = EngineStatus::Confirming;
        Ok(quantity)
    }

    /// Commit round trip failed; return to the quantity step for retry.
    pub fn confirm_failed(&mut self) {
        if self.status == EngineStatus::Confirming {
            self.status = EngineStatus::InProgress;
        }
    }

    /// Commit accepted by the server.
    pub fn confirm_succeeded(&mut self) {
        if self.status == EngineStatus::Confirming {
            if let Some(task) = self.task.as_mut() {
                if let Some(step) = task.steps.get_mut(task.current) {
                    step.satisfied = true;
                }
            }
            self.status = EngineStatus::Completed;
        }
    }

    /// Step back one position onto a SelectSource step so the operator can
    /// choose again. Earlier satisfied steps keep their flags.
    pub fn back(&mut self) -> Result<(), EngineError> {
        let invalid = EngineError::InvalidOperation {
            from: self.status,
            action: EngineAction::Back,
        };
        if self.status != EngineStatus::InProgress || self.settle_deadline.is_some() {
            return Err(invalid);
        }
        let Some(task) = self.task.as_mut() else {
            return Err(invalid);
        };
        if task.current == 0 {
            return Err(invalid);
        }
        if task.steps[task.current - 1].kind != StepKind::SelectSource {
            return Err(invalid);
        }

        task.current -= 1;
        task.steps[task.current].satisfied = false;
        task.source_choice = None;
        // Landed on a selection step; nothing to scan.
        self.capture.pause();
        Ok(())
    }

    /// Discard the active task and its capture context.
    pub fn reset(&mut self) {
        self.task = None;
        self.settle_deadline = None;
        self.status = EngineStatus::Idle;
        self.capture.reset();
        self.capture.pause();
    }

    /// Leave Completed for Idle once the session has dispatched the
    /// follow-up work request.
    pub fn acknowledge_completion(&mut self) {
        if self.status == EngineStatus::Completed {
            self.task = None;
            self.status = EngineStatus::Idle;
            self.capture.reset();
            self.capture.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::InputSource;
    use floorlink_adapter::StepSpec;

    const SETTLE: Duration = Duration::from_millis(400);

    fn scanned(code: &str) -> CapturedCode {
        CapturedCode {
            code: code.to_string(),
            source: InputSource::Scanner,
        }
    }

    fn pick_payload() -> TaskPayload {
        TaskPayload {
            task_id: "t-9".to_string(),
            kind: TaskKind::Pick,
            steps: vec![
                StepSpec {
                    kind: StepKind::ScanLocation,
                    expected: "A-01-R02".to_string(),
                    label: Some("Rack A-01".to_string()),
                },
                StepSpec {
                    kind: StepKind::ScanProduct,
                    expected: "SKU123".to_string(),
                    label: None,
                },
                StepSpec {
                    kind: StepKind::ConfirmQuantity,
                    expected: String::new(),
                    label: None,
                },
            ],
            max_quantity: 5,
            source_id: "A-01-R02".to_string(),
            item_ref: "SKU123".to_string(),
            description: None,
        }
    }

    fn relocate_payload() -> TaskPayload {
        TaskPayload {
            task_id: "t-20".to_string(),
            kind: TaskKind::Relocate,
            steps: vec![
                StepSpec {
                    kind: StepKind::SelectSource,
                    expected: String::new(),
                    label: None,
                },
                StepSpec {
                    kind: StepKind::ScanLocation,
                    expected: "B-07-R01".to_string(),
                    label: None,
                },
                StepSpec {
                    kind: StepKind::ConfirmQuantity,
                    expected: String::new(),
                    label: None,
                },
            ],
            max_quantity: 12,
            source_id: "B-07".to_string(),
            item_ref: "SKU9".to_string(),
            description: None,
        }
    }

    fn engine() -> StepEngine {
        StepEngine::new(InputCapture::new(Duration::from_millis(120)), SETTLE)
    }

    fn advance_settle(engine: &mut StepEngine) -> Prompt {
        let deadline = engine.settle_deadline().expect("settle armed");
        engine.poll_settle(deadline).expect("advancement")
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["  a-01-r02 ", "SKU  123", "a\tb\nc", "", "   "] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "normalize({raw:?}) not idempotent");
        }
    }

    #[test]
    fn test_verify_case_and_whitespace_insensitive() {
        assert!(verify("a-01-r02", "A-01-R02"));
        assert!(verify(" SKU123", "SKU123"));
        assert!(verify("sku  123", "SKU 123"));
        assert!(!verify("A-01-R03", "A-01-R02"));
    }

    #[test]
    fn test_lowercase_scan_advances() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        assert_eq!(eng.prompt(), Prompt::Scan(StepKind::ScanLocation));

        let outcome = eng.handle_code(&scanned("a-01-r02"), Instant::now()).unwrap();
        assert_eq!(outcome, ScanOutcome::Matched);
        assert!(eng.capture().is_paused());
        assert!(eng.settle_deadline().is_some());
        // Still on the satisfied step until settle elapses.
        assert_eq!(eng.prompt(), Prompt::None);

        assert_eq!(advance_settle(&mut eng), Prompt::Scan(StepKind::ScanProduct));
        assert!(!eng.capture().is_paused());
    }

    #[test]
    fn test_mismatch_keeps_step_and_capture() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();

        let outcome = eng.handle_code(&scanned("B-99"), Instant::now()).unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Mismatch {
                expected: "A-01-R02".to_string()
            }
        );
        assert_eq!(eng.prompt(), Prompt::Scan(StepKind::ScanLocation));
        assert!(!eng.capture().is_paused());
        assert!(eng.settle_deadline().is_none());
        assert!(!eng.task().unwrap().steps[0].satisfied);
    }

    #[test]
    fn test_full_pick_walkthrough() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();

        eng.handle_code(&scanned("A-01-R02"), Instant::now()).unwrap();
        advance_settle(&mut eng);
        eng.handle_code(&scanned("sku123"), Instant::now()).unwrap();
        assert_eq!(advance_settle(&mut eng), Prompt::Quantity);
        // Quantity step: capture stays paused, nothing to scan.
        assert!(eng.capture().is_paused());

        let qty = eng.confirm_request("3").unwrap();
        assert_eq!(qty, 3);
        assert_eq!(eng.status(), EngineStatus::Confirming);

        eng.confirm_succeeded();
        assert_eq!(eng.status(), EngineStatus::Completed);
        assert!(eng.task().unwrap().steps.iter().all(|s| s.satisfied));

        eng.acknowledge_completion();
        assert_eq!(eng.status(), EngineStatus::Idle);
        assert!(eng.task().is_none());
    }

    #[test]
    fn test_steps_satisfied_strictly_in_sequence() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();

        // Scanning the product code while the location step is current is a
        // mismatch, not an out-of-order satisfaction.
        let outcome = eng.handle_code(&scanned("SKU123"), Instant::now()).unwrap();
        assert!(matches!(outcome, ScanOutcome::Mismatch { .. }));
        let task = eng.task().unwrap();
        assert!(!task.steps[0].satisfied);
        assert!(!task.steps[1].satisfied);
    }

    #[test]
    fn test_quantity_bounds_rejected_locally() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        eng.handle_code(&scanned("A-01-R02"), Instant::now()).unwrap();
        advance_settle(&mut eng);
        eng.handle_code(&scanned("SKU123"), Instant::now()).unwrap();
        advance_settle(&mut eng);

        for raw in ["0", "7", "abc", ""] {
            let err = eng.confirm_request(raw).expect_err("must reject");
            assert!(matches!(err, EngineError::Quantity(_)), "{raw:?}: {err}");
            // Rejection leaves the engine exactly where it was.
            assert_eq!(eng.status(), EngineStatus::InProgress);
            assert_eq!(eng.prompt(), Prompt::Quantity);
        }

        assert_eq!(
            validate_quantity("7", 5),
            Err(QuantityError::TooLarge { max: 5 })
        );
        assert_eq!(validate_quantity(" 5 ", 5), Ok(5));
    }

    #[test]
    fn test_confirm_failed_returns_to_quantity_step() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        eng.handle_code(&scanned("A-01-R02"), Instant::now()).unwrap();
        advance_settle(&mut eng);
        eng.handle_code(&scanned("SKU123"), Instant::now()).unwrap();
        advance_settle(&mut eng);

        eng.confirm_request("4").unwrap();
        eng.confirm_failed();

        assert_eq!(eng.status(), EngineStatus::InProgress);
        assert_eq!(eng.prompt(), Prompt::Quantity);
        // A retry with the same value goes through.
        assert_eq!(eng.confirm_request("4").unwrap(), 4);
    }

    #[test]
    fn test_code_during_settle_is_invalid_operation() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        let now = Instant::now();
        eng.handle_code(&scanned("A-01-R02"), now).unwrap();

        let err = eng.handle_code(&scanned("A-01-R02"), now).expect_err("settling");
        assert!(matches!(err, EngineError::InvalidOperation { .. }));
    }

    #[test]
    fn test_choose_source_and_back() {
        let mut eng = engine();
        eng.start(relocate_payload()).unwrap();
        assert_eq!(eng.prompt(), Prompt::ChooseSource);
        assert!(eng.capture().is_paused());

        eng.choose_source("B-07-R01").unwrap();
        assert_eq!(eng.prompt(), Prompt::Scan(StepKind::ScanLocation));
        assert!(!eng.capture().is_paused());
        assert_eq!(eng.task().unwrap().source_choice.as_deref(), Some("B-07-R01"));

        eng.back().unwrap();
        assert_eq!(eng.prompt(), Prompt::ChooseSource);
        assert!(!eng.task().unwrap().steps[0].satisfied);
        assert_eq!(eng.task().unwrap().source_choice, None);

        // back() past the first step is invalid, as is back() onto a scan step.
        let err = eng.back().expect_err("nothing before the first step");
        assert!(matches!(err, EngineError::InvalidOperation { .. }));
    }

    #[test]
    fn test_back_is_select_source_only() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        eng.handle_code(&scanned("A-01-R02"), Instant::now()).unwrap();
        advance_settle(&mut eng);

        // Previous step is ScanLocation, not SelectSource.
        let err = eng.back().expect_err("must not step back onto a scan step");
        assert!(matches!(err, EngineError::InvalidOperation { .. }));
        // The satisfied location step is untouched.
        assert!(eng.task().unwrap().steps[0].satisfied);
    }

    #[test]
    fn test_reset_discards_task() {
        let mut eng = engine();
        eng.start(pick_payload()).unwrap();
        eng.handle_code(&scanned("A-01-R02"), Instant::now()).unwrap();

        eng.reset();
        assert_eq!(eng.status(), EngineStatus::Idle);
        assert!(eng.task().is_none());
        assert!(eng.settle_deadline().is_none());
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        let mut eng = engine();

        let mut no_steps = pick_payload();
        no_steps.steps.clear();
        assert!(matches!(
            eng.start(no_steps),
            Err(EngineError::MalformedTask { .. })
        ));

        let mut no_confirm = pick_payload();
        no_confirm.steps.pop();
        assert!(matches!(
            eng.start(no_confirm),
            Err(EngineError::MalformedTask { .. })
        ));

        let mut zero_max = pick_payload();
        zero_max.max_quantity = 0;
        assert!(matches!(
            eng.start(zero_max),
            Err(EngineError::MalformedTask { .. })
        ));

        assert_eq!(eng.status(), EngineStatus::Idle);
    }
}
