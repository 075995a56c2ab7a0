//! Task queue use case.
//!
//! Priority- and dependency-aware scheduler with bounded concurrency,
//! per-attempt timeouts and exponential retry backoff.
//!
//! # Flow
//!
//! ```text
//! add_task ──► pending ──tick──► running ──handler──► completed
//!                 ▲                  │
//!                 │ backoff timer    ├──► retrying ───┘ (back to pending)
//!                 └──────────────────┘
//!                                    └──► failed
//! ```
//!
//! Every state change wakes the scheduler through a [`Notify`]; the fixed
//! tick interval only acts as a safety net. Persistence and notifications
//! are published as [`QueueEvent`]s and performed by the lifecycle
//! dispatcher, never under the state lock.

use crate::config::QueueConfig;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::queue_event::{EventSink, QueueEvent};
use crate::ports::task_handler::{HandlerError, ProgressSink, TaskContext, TaskHandler};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use taskpilot_domain::{
    FailureOutcome, NewTask, QueueStats, Task, TaskId, TaskStatus, TaskType, select_runnable,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

#[derive(Default)]
struct QueueState {
    tasks: HashMap<TaskId, Task>,
    /// Submission order, for owner listings.
    order: Vec<TaskId>,
    running: HashSet<TaskId>,
    next_sequence: u64,
}

struct Inner {
    config: QueueConfig,
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
    clock: Arc<dyn Clock>,
    events: EventSink,
    state: Mutex<QueueState>,
    /// Wakes the scheduler loop.
    wakeup: Notify,
    /// Wakes `wait_until_settled` callers.
    changed: Notify,
    /// In-flight handlers and retry timers.
    tracker: TaskTracker,
    shutdown: CancellationToken,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

/// Builder for [`TaskQueue`].
pub struct TaskQueueBuilder {
    config: QueueConfig,
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
    clock: Arc<dyn Clock>,
}

impl TaskQueueBuilder {
    /// Register the handler for its task type, replacing any earlier one.
    pub fn handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(handler.task_type(), handler);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self, events: EventSink) -> TaskQueue {
        TaskQueue {
            inner: Arc::new(Inner {
                config: self.config,
                handlers: self.handlers,
                clock: self.clock,
                events,
                state: Mutex::new(QueueState::default()),
                wakeup: Notify::new(),
                changed: Notify::new(),
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                scheduler: Mutex::new(None),
            }),
        }
    }
}

/// Handle to the task queue. Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    pub fn builder(config: QueueConfig) -> TaskQueueBuilder {
        TaskQueueBuilder {
            config,
            handlers: HashMap::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Enqueue a task. Unset retry and timeout limits take the configured
    /// defaults; nothing else is validated.
    pub fn add_task(&self, spec: NewTask) -> TaskId {
        let snapshot = {
            let mut state = self.inner.state();
            let id = TaskId::generate();
            let sequence = state.next_sequence;
            state.next_sequence += 1;

            let task = Task::create(
                id.clone(),
                spec,
                &self.inner.config.task_defaults(),
                sequence,
                self.inner.clock.now(),
            );
            state.order.push(id.clone());
            state.tasks.insert(id, task.clone());
            task
        };

        info!(
            "Queued task {} ({}, {})",
            snapshot.id, snapshot.task_type, snapshot.priority
        );
        let id = snapshot.id.clone();
        self.inner.publish_change(snapshot);
        self.inner.wake();
        id
    }

    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.inner.state().tasks.get(id).cloned()
    }

    /// Tasks submitted by `owner_id`, in submission order.
    pub fn get_user_tasks(&self, owner_id: &str) -> Vec<Task> {
        let state = self.inner.state();
        state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|t| t.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect()
    }

    /// Cancel a pending task. Running, retrying and finished tasks are left
    /// alone and `false` is returned.
    pub fn cancel_task(&self, id: &TaskId) -> bool {
        let snapshot = {
            let mut state = self.inner.state();
            let Some(task) = state.tasks.get_mut(id) else {
                return false;
            };
            if !task.cancel() {
                return false;
            }
            task.clone()
        };

        info!("Cancelled task {}", id);
        self.inner.publish_change(snapshot);
        self.inner.wake();
        true
    }

    pub fn get_stats(&self) -> QueueStats {
        let state = self.inner.state();
        QueueStats::compute(&state.tasks, self.inner.config.concurrency_limit)
    }

    /// Run one scheduling pass and dispatch every admitted task.
    ///
    /// Returns the ids admitted, in admission order. Must be called from
    /// within a tokio runtime.
    pub fn tick(&self) -> Vec<TaskId> {
        if self.inner.shutdown.is_cancelled() {
            return Vec::new();
        }

        let admitted: Vec<Task> = {
            let mut state = self.inner.state();
            let capacity = self
                .inner
                .config
                .concurrency_limit
                .saturating_sub(state.running.len());
            let now = self.inner.clock.now();

            let mut admitted = Vec::new();
            for id in select_runnable(&state.tasks, capacity) {
                let Some(task) = state.tasks.get_mut(&id) else {
                    continue;
                };
                if let Err(e) = task.start(now) {
                    warn!("Skipping task {}: {}", id, e);
                    continue;
                }
                admitted.push(task.clone());
                state.running.insert(id);
            }
            admitted
        };

        if !admitted.is_empty() {
            debug!("Admitted {} task(s)", admitted.len());
        }

        let mut ids = Vec::with_capacity(admitted.len());
        for task in admitted {
            ids.push(task.id.clone());
            self.inner.publish_change(task.clone());
            let inner = Arc::clone(&self.inner);
            self.inner.tracker.spawn(execute(inner, task));
        }
        ids
    }

    /// Start the scheduler loop. Calling it again is a no-op.
    pub fn spawn_scheduler(&self) {
        let mut slot = self
            .inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let queue = self.clone();
        *slot = Some(tokio::spawn(async move {
            let inner = Arc::clone(&queue.inner);
            debug!(
                "Scheduler started (limit {}, tick {:?})",
                inner.config.concurrency_limit, inner.config.tick_interval
            );
            loop {
                queue.tick();
                tokio::select! {
                    _ = inner.shutdown.cancelled() => break,
                    _ = inner.wakeup.notified() => {}
                    _ = tokio::time::sleep(inner.config.tick_interval) => {}
                }
            }
            debug!("Scheduler stopped");
        }));
    }

    /// Resolve once nothing is running, retrying or runnable.
    ///
    /// Pending tasks that can never run (blocked dependencies) do not hold
    /// this up. Runnable tasks are only drained while the scheduler is
    /// running.
    pub async fn wait_until_settled(&self) {
        loop {
            let changed = self.inner.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if self.inner.is_settled() {
                return;
            }
            changed.await;
        }
    }

    /// Stop scheduling, return waiting retries to `pending`, and wait up to
    /// the configured grace period for in-flight handlers.
    pub async fn shutdown(&self) {
        info!("Shutting down task queue");
        self.inner.shutdown.cancel();

        let scheduler = self
            .inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = scheduler
            && let Err(e) = handle.await
        {
            warn!("Scheduler task ended abnormally: {}", e);
        }

        self.inner.tracker.close();
        let grace = self.inner.config.shutdown_grace;
        if tokio::time::timeout(grace, self.inner.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                "{} task(s) still running after {:?} grace period",
                self.inner.state().running.len(),
                grace
            );
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake(&self) {
        self.wakeup.notify_one();
        self.changed.notify_waiters();
    }

    fn publish_change(&self, task: Task) {
        self.events.publish(QueueEvent::TaskChanged(Box::new(task)));
    }

    fn is_settled(&self) -> bool {
        let state = self.state();
        state.running.is_empty()
            && !state
                .tasks
                .values()
                .any(|t| t.status == TaskStatus::Retrying)
            && select_runnable(&state.tasks, 1).is_empty()
    }

    fn report_progress(&self, id: &TaskId, progress: u8) {
        let event = {
            let mut state = self.state();
            let Some(task) = state.tasks.get_mut(id) else {
                return;
            };
            if !task.set_progress(progress) {
                return;
            }
            QueueEvent::Progress {
                task_id: id.clone(),
                owner_id: task.owner_id.clone(),
                status: task.status,
                progress: task.progress,
            }
        };
        self.events.publish(event);
    }

    /// Record the outcome of an attempt and schedule a retry if one is due.
    fn finish(self: &Arc<Self>, id: &TaskId, result: Result<serde_json::Value, HandlerError>) {
        let (snapshot, outcome) = {
            let mut state = self.state();
            state.running.remove(id);
            let now = self.clock.now();
            let Some(task) = state.tasks.get_mut(id) else {
                return;
            };

            let outcome = match result {
                Ok(value) => task.complete(value, now).map(|_| None),
                Err(e) => {
                    let retryable = e.is_retryable();
                    task.record_failure(e.message, retryable, now).map(Some)
                }
            };
            match outcome {
                Ok(outcome) => (task.clone(), outcome),
                Err(e) => {
                    warn!("Dropping result for task {}: {}", id, e);
                    return;
                }
            }
        };

        match outcome {
            None => info!(
                "Task {} completed in {}ms",
                id,
                snapshot.duration().map_or(0, |d| d.as_millis())
            ),
            Some(FailureOutcome::Retry { retry_count }) => {
                let delay = self.config.retry.delay_for(retry_count);
                warn!(
                    "Task {} failed (attempt {}/{}), retrying in {:?}: {}",
                    id,
                    retry_count,
                    snapshot.max_retries + 1,
                    delay,
                    snapshot.error.as_deref().unwrap_or_default()
                );
                self.schedule_requeue(id.clone(), delay);
            }
            Some(FailureOutcome::Failed) => warn!(
                "Task {} failed: {}",
                id,
                snapshot.error.as_deref().unwrap_or_default()
            ),
        }

        self.publish_change(snapshot);
        self.wake();
    }

    fn schedule_requeue(self: &Arc<Self>, id: TaskId, delay: Duration) {
        let inner = Arc::clone(self);
        self.tracker.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = inner.shutdown.cancelled() => {
                    debug!("Retry timer for {} interrupted by shutdown", id);
                }
            }
            inner.requeue(&id);
        });
    }

    fn requeue(&self, id: &TaskId) {
        let snapshot = {
            let mut state = self.state();
            let Some(task) = state.tasks.get_mut(id) else {
                return;
            };
            if let Err(e) = task.requeue() {
                warn!("Cannot requeue task {}: {}", id, e);
                return;
            }
            task.clone()
        };
        debug!("Task {} back to pending", id);
        self.publish_change(snapshot);
        self.wake();
    }
}

/// Run one attempt of `task` on its handler and record the outcome.
async fn execute(inner: Arc<Inner>, task: Task) {
    let result = match inner.handlers.get(&task.task_type) {
        Some(handler) => run_handler(&inner, Arc::clone(handler), &task).await,
        None => Err(HandlerError::permanent(format!(
            "no handler registered for task type {}",
            task.task_type
        ))),
    };
    inner.finish(&task.id, result);
}

async fn run_handler(
    inner: &Arc<Inner>,
    handler: Arc<dyn TaskHandler>,
    task: &Task,
) -> Result<serde_json::Value, HandlerError> {
    let weak: Weak<Inner> = Arc::downgrade(inner);
    let progress_id = task.id.clone();
    let ctx = TaskContext {
        task_id: task.id.clone(),
        task_type: task.task_type,
        owner_id: task.owner_id.clone(),
        payload: task.payload.clone(),
        attempt: task.retry_count + 1,
        progress: ProgressSink::new(move |p| {
            if let Some(inner) = weak.upgrade() {
                inner.report_progress(&progress_id, p);
            }
        }),
        events: inner.events.clone(),
    };

    // A separate tokio task isolates handler panics and lets a timed-out
    // attempt be aborted.
    let mut handle = tokio::spawn(async move { handler.handle(ctx).await });
    let joined = if inner.config.enforce_timeouts {
        match tokio::time::timeout(task.timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(HandlerError::timed_out(task.timeout));
            }
        }
    } else {
        handle.await
    };

    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(HandlerError::permanent("task handler panicked")),
        Err(_) => Err(HandlerError::transient("task handler was cancelled")),
    }
}
