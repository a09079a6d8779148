/*
[INPUT]:  Backlog snapshots from the floor task service + visibility commands
[OUTPUT]: Diffed, ordered backlog views via `watch` + throttled failure notices
[POS]:    Data layer - continuous backlog synchronization (no task logic)
[UPDATE]: When changing poll scheduling, diff semantics, or notice throttling
[UPDATE]: 2026-06-30 Supersede in-flight polls with a generation guard
[UPDATE]: 2026-07-15 Move row storage into the slot arena
*/

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use floorlink_adapter::{BacklogEntry, FloorClient, FloorError};

const NOTICE_COOLDOWN: Duration = Duration::from_secs(15);

/// A prebuilt display row owned by the cache. Built once per signature
/// change; the UI renders it without further formatting work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogRow {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub status_label: String,
    pub urgent: bool,
}

fn build_row(entry: &BacklogEntry) -> BacklogRow {
    use floorlink_adapter::{BacklogStatus, Priority};

    let status_label = match entry.status {
        BacklogStatus::Open => "open",
        BacklogStatus::Assigned => "assigned",
        BacklogStatus::InProgress => "in progress",
        BacklogStatus::OnHold => "on hold",
    }
    .to_string();

    BacklogRow {
        id: entry.id.clone(),
        title: entry.reference.clone(),
        detail: format!(
            "{} lines, {}/{} units",
            entry.line_count, entry.picked_units, entry.total_units
        ),
        status_label,
        urgent: entry.priority >= Priority::High,
    }
}

/// Signature over all mutable display fields. Equal signatures mean the
/// cached row can be reused verbatim; values are only ever compared within
/// one process run.
fn entry_signature(entry: &BacklogEntry) -> u64 {
    let mut hasher = DefaultHasher::new();
    entry.reference.hash(&mut hasher);
    entry.status.hash(&mut hasher);
    entry.priority.hash(&mut hasher);
    entry.total_units.hash(&mut hasher);
    entry.picked_units.hash(&mut hasher);
    entry.line_count.hash(&mut hasher);
    entry.created_at.hash(&mut hasher);
    entry.updated_at.hash(&mut hasher);
    entry.assigned_at.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy)]
struct CacheSlot {
    slot: usize,
    signature: u64,
}

/// Id-keyed cache of owned display rows: a slot arena plus an index into it.
/// Eviction removes the index entry and disposes the slot in one operation,
/// so the two can never disagree.
#[derive(Debug, Default)]
pub(crate) struct BacklogCache {
    slots: Vec<Option<Arc<BacklogRow>>>,
    free: Vec<usize>,
    index: HashMap<String, CacheSlot>,
    rebuild_count: u64,
}

/// Ordering key of a published view row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderKey {
    anchor: Option<DateTime<Utc>>,
    id: String,
}

impl BacklogCache {
    /// Diff one full snapshot into the cache and return the rows in display
    /// order. Untouched signatures keep their row allocation; ids absent
    /// from the snapshot are evicted.
    pub(crate) fn apply_snapshot(&mut self, entries: &[BacklogEntry]) -> Vec<Arc<BacklogRow>> {
        let mut order: Vec<(OrderKey, usize)> = Vec::with_capacity(entries.len());

        for entry in entries {
            let signature = entry_signature(entry);
            let slot = match self.index.get_mut(&entry.id) {
                Some(cached) if cached.signature == signature => cached.slot,
                Some(cached) => {
                    self.slots[cached.slot] = Some(Arc::new(build_row(entry)));
                    cached.signature = signature;
                    self.rebuild_count += 1;
                    cached.slot
                }
                None => {
                    let row = Arc::new(build_row(entry));
                    let slot = match self.free.pop() {
                        Some(slot) => {
                            self.slots[slot] = Some(row);
                            slot
                        }
                        None => {
                            self.slots.push(Some(row));
                            self.slots.len() - 1
                        }
                    };
                    self.rebuild_count += 1;
                    self.index.insert(entry.id.clone(), CacheSlot { slot, signature });
                    slot
                }
            };

            order.push((
                OrderKey {
                    anchor: entry.anchor_time(),
                    id: entry.id.clone(),
                },
                slot,
            ));
        }

        // Evict everything the snapshot no longer mentions.
        let stale: Vec<String> = self
            .index
            .keys()
            .filter(|id| !entries.iter().any(|entry| &entry.id == *id))
            .cloned()
            .collect();
        for id in stale {
            self.evict(&id);
        }

        // Earliest anchor first; undated entries last; ties break on id.
        order.sort_by(|a, b| match (a.0.anchor, b.0.anchor) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.0.id.cmp(&b.0.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.id.cmp(&b.0.id),
        });

        order
            .into_iter()
            .map(|(_, slot)| self.slots[slot].clone().expect("indexed slot is occupied"))
            .collect()
    }

    fn evict(&mut self, id: &str) {
        if let Some(cached) = self.index.remove(id) {
            self.slots[cached.slot] = None;
            self.free.push(cached.slot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }
}

/// Published backlog state. `revision` increments once per applied snapshot.
#[derive(Debug, Clone, Default)]
pub struct BacklogView {
    pub rows: Vec<Arc<BacklogRow>>,
    pub revision: u64,
}

/// Operator-facing sync failure notice, already throttled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub message: String,
}

#[derive(Debug)]
enum SyncCommand {
    Pause,
    Resume,
    RefreshNow,
    Shutdown,
}

/// Handle to the backlog synchronization worker.
///
/// Owns the command channel and the published view. Dropping the handle (or
/// cancelling the shutdown token) stops the worker.
#[derive(Debug)]
pub struct BacklogSync {
    cmd_tx: mpsc::UnboundedSender<SyncCommand>,
    view_rx: watch::Receiver<BacklogView>,
    notice_rx: Option<mpsc::UnboundedReceiver<SyncNotice>>,
}

impl BacklogSync {
    /// Spawn the worker. Polling starts immediately in the visible state.
    pub fn spawn(client: Arc<FloorClient>, interval: Duration, shutdown: CancellationToken) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(BacklogView::default());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let worker = BacklogSyncWorker::new(client, interval, cmd_rx, view_tx, notice_tx, shutdown);
        tokio::spawn(async move { worker.run().await });

        Self {
            cmd_tx,
            view_rx,
            notice_rx: Some(notice_rx),
        }
    }

    /// Subscribe to published views. The receiver always holds the latest.
    pub fn view(&self) -> watch::Receiver<BacklogView> {
        self.view_rx.clone()
    }

    /// Take the notice receiver. Yields `None` after the first call.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<SyncNotice>> {
        self.notice_rx.take()
    }

    /// Suspend polling while the backlog is not visible.
    pub fn pause(&self) {
        let _ = self.cmd_tx.send(SyncCommand::Pause);
    }

    /// Resume polling with an immediate out-of-cycle poll.
    pub fn resume(&self) {
        let _ = self.cmd_tx.send(SyncCommand::Resume);
    }

    /// Start a fresh poll now, superseding any in-flight one.
    pub fn refresh_now(&self) {
        let _ = self.cmd_tx.send(SyncCommand::RefreshNow);
    }

    /// Ask the worker to stop.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(SyncCommand::Shutdown);
    }
}

type PollResult = Result<Vec<BacklogEntry>, FloorError>;

struct BacklogSyncWorker {
    client: Arc<FloorClient>,
    interval: Duration,
    cmd_rx: mpsc::UnboundedReceiver<SyncCommand>,
    results_tx: mpsc::UnboundedSender<(u64, PollResult)>,
    results_rx: mpsc::UnboundedReceiver<(u64, PollResult)>,
    view_tx: watch::Sender<BacklogView>,
    notice_tx: mpsc::UnboundedSender<SyncNotice>,
    shutdown: CancellationToken,
    cache: BacklogCache,
    visible: bool,
    generation: u64,
    revision: u64,
    in_flight: Option<CancellationToken>,
    next_poll_at: Option<Instant>,
    last_notice_at: Option<Instant>,
}

impl BacklogSyncWorker {
    fn new(
        client: Arc<FloorClient>,
        interval: Duration,
        cmd_rx: mpsc::UnboundedReceiver<SyncCommand>,
        view_tx: watch::Sender<BacklogView>,
        notice_tx: mpsc::UnboundedSender<SyncNotice>,
        shutdown: CancellationToken,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            client,
            interval,
            cmd_rx,
            results_tx,
            results_rx,
            view_tx,
            notice_tx,
            shutdown,
            cache: BacklogCache::default(),
            visible: true,
            generation: 0,
            revision: 0,
            in_flight: None,
            next_poll_at: None,
            last_notice_at: None,
        }
    }

    async fn run(mut self) {
        self.start_poll();

        loop {
            let poll_due = self.next_poll_at;
            let poll_deadline =
                poll_due.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::Pause) => self.pause(),
                        Some(SyncCommand::Resume) => self.resume(),
                        Some(SyncCommand::RefreshNow) => self.start_poll(),
                        Some(SyncCommand::Shutdown) | None => break,
                    }
                }
                result = self.results_rx.recv() => {
                    if let Some((generation, result)) = result {
                        self.on_poll_settled(generation, result);
                    }
                }
                _ = tokio::time::sleep_until(poll_deadline), if poll_due.is_some() => {
                    self.start_poll();
                }
            }
        }

        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        debug!("backlog sync worker stopped");
    }

    /// Launch a poll, superseding any still-pending one. The superseded
    /// fetch is cancelled and its result, should it still arrive, is
    /// discarded by the generation guard before it can reach the diff.
    fn start_poll(&mut self) {
        if !self.visible {
            return;
        }
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }

        self.generation += 1;
        self.next_poll_at = None;
        let generation = self.generation;
        let token = self.shutdown.child_token();
        self.in_flight = Some(token.clone());

        let client = self.client.clone();
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = client.list_snapshot() => {
                    let _ = results_tx.send((generation, result));
                }
            }
        });
    }

    fn on_poll_settled(&mut self, generation: u64, result: PollResult) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale poll result dropped");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(entries) => {
                let rows = self.cache.apply_snapshot(&entries);
                self.revision += 1;
                let _ = self.view_tx.send(BacklogView {
                    rows,
                    revision: self.revision,
                });
            }
            Err(err) => {
                // The last good view stays on screen; only the notice is new,
                // and only once per cooldown window.
                warn!(error = %err, "backlog poll failed");
                self.notify_throttled(format!("backlog refresh failed: {err}"));
            }
        }

        if self.visible {
            self.next_poll_at = Some(Instant::now() + self.interval);
        }
    }

    fn notify_throttled(&mut self, message: String) {
        let now = Instant::now();
        let muted = self
            .last_notice_at
            .is_some_and(|at| now.duration_since(at) < NOTICE_COOLDOWN);
        if muted {
            return;
        }
        self.last_notice_at = Some(now);
        let _ = self.notice_tx.send(SyncNotice { message });
    }

    fn pause(&mut self) {
        self.visible = false;
        self.next_poll_at = None;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
            // Anything that fetch still reports is stale by definition.
            self.generation += 1;
        }
    }

    fn resume(&mut self) {
        if !self.visible {
            self.visible = true;
            self.start_poll();
        }
    }
}
