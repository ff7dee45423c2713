//! Deferred execution of respawn tasks.
//!
use std::sync::Mutex;
use std::time::Duration;

pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget delayed execution.
///
/// A submitted task runs exactly once, no earlier than `delay` after submission. Submission
/// never blocks.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, task: ScheduledTask, delay: Duration);
}

/// Runs every task as a timer on the async-std executor
#[cfg(feature = "async-scheduler")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncStdScheduler;

#[cfg(feature = "async-scheduler")]
impl TaskScheduler for AsyncStdScheduler {
    fn schedule(&self, task: ScheduledTask, delay: Duration) {
        async_std::task::spawn(async move {
            async_std::task::sleep(delay).await;
            task();
        });
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    task: ScheduledTask,
}

#[derive(Default)]
struct TickState {
    now: Duration,
    seq: u64,
    queue: Vec<Pending>,
    requested: Vec<Duration>,
}

/// Scheduler driven by an explicit clock.
///
/// The game loop (or a test) calls [advance](TickScheduler::advance) every tick; tasks whose
/// delay elapsed run on the caller's thread, in due order.
#[derive(Default)]
pub struct TickScheduler {
    state: Mutex<TickState>,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TickScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<TickState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Every delay ever submitted, in submission order
    pub fn requested_delays(&self) -> Vec<Duration> {
        self.lock().requested.clone()
    }

    /// Move the clock forward and run the tasks that became due.
    /// Returns the number of tasks executed.
    pub fn advance(&self, dt: Duration) -> usize {
        let now = {
            let mut state = self.lock();
            state.now += dt;
            state.now
        };
        let mut executed = 0;
        loop {
            let due = self.take_due(now);
            if due.is_empty() {
                break;
            }
            executed += due.len();
            // tasks may schedule new tasks, so the lock must not be held here
            for task in due {
                task();
            }
        }
        executed
    }

    /// Run every pending task regardless of its delay, advancing the clock to the latest due time
    pub fn run_all(&self) -> usize {
        let latest = {
            let state = self.lock();
            state.queue.iter().map(|p| p.due).max()
        };
        match latest {
            Some(latest) => {
                let now = self.now();
                self.advance(latest.checked_sub(now).unwrap_or_default())
            }
            None => 0,
        }
    }

    fn take_due(&self, now: Duration) -> Vec<ScheduledTask> {
        let mut state = self.lock();
        let (mut due, rest): (Vec<_>, Vec<_>) = state.queue.drain(..).partition(|p| p.due <= now);
        state.queue = rest;
        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter().map(|p| p.task).collect()
    }
}

impl TaskScheduler for TickScheduler {
    fn schedule(&self, task: ScheduledTask, delay: Duration) {
        let mut state = self.lock();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.requested.push(delay);
        state.queue.push(Pending { due, seq, task });
    }
}
