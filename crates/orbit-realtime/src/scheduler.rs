//! Timer set driving the channels.
//!
//! The scheduler owns one recurring tokio task per armed timer. Timers are
//! armed together by [`Scheduler::start`] and cancelled together by
//! [`Scheduler::stop`]; there is no partially-running state.

use std::sync::Weak;
use std::time::Duration;

use orbit_core::ChannelName;
use orbit_telemetry::Metrics;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// What a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Produce and emit a data channel.
    Channel(ChannelName),
    /// Refresh connection health.
    Heartbeat,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel(channel) => write!(f, "{channel}"),
            Self::Heartbeat => write!(f, "heartbeat"),
        }
    }
}

/// Receiver of timer fires.
pub trait TickHandler: Send + Sync + 'static {
    fn on_tick(&self, timer: TimerKind);
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    /// Incremented on every start.
    generation: u64,
    cancel: Option<CancellationToken>,
    tasks: Vec<JoinHandle<()>>,
}

/// Recurring timer set.
pub struct Scheduler {
    runtime: Handle,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            state: Mutex::new(SchedulerState::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Number of starts so far.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Arm every timer in `plan`.
    ///
    /// Each timer first fires one period after arming. Returns false (and
    /// arms nothing) if already running.
    pub fn start(&self, plan: &[(TimerKind, Duration)], handler: Weak<dyn TickHandler>) -> bool {
        let mut state = self.state.lock();
        if state.running {
            return false;
        }

        let token = CancellationToken::new();
        state.generation += 1;
        state.tasks = plan
            .iter()
            .map(|&(kind, period)| {
                self.runtime
                    .spawn(run_timer(kind, period, handler.clone(), token.clone()))
            })
            .collect();
        state.cancel = Some(token);
        state.running = true;

        Metrics::scheduler_running(true);
        debug!(
            generation = state.generation,
            timers = plan.len(),
            "Scheduler timers armed"
        );
        true
    }

    /// Cancel every timer. Returns false if not running.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }

        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        for task in state.tasks.drain(..) {
            task.abort();
        }
        state.running = false;

        Metrics::scheduler_running(false);
        debug!(generation = state.generation, "Scheduler timers cancelled");
        true
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        for task in state.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn run_timer(
    kind: TimerKind,
    period: Duration,
    handler: Weak<dyn TickHandler>,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // A fire racing with stop() must not reach the handler.
        if token.is_cancelled() {
            break;
        }
        let Some(handler) = handler.upgrade() else {
            break;
        };
        trace!(timer = %kind, "Timer fired");
        handler.on_tick(kind);
    }
}
