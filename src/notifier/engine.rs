use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::error::NotifierError;
use crate::notifier::types::{
    NotificationState, ProgressStep, RunCallback, RunOptions, RunPhase, StepKind,
};

/// Handle to a started run, usable for early cancellation
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub(crate) generation: u64,
}

/// Bookkeeping shared between the notifier and its timer tasks
struct RunState {
    generation: u64,
    phase: RunPhase,
}

pub(crate) struct Shared {
    run_state: Mutex<RunState>,
    state_tx: watch::Sender<NotificationState>,
}

impl Shared {
    /// Apply a state mutation on behalf of the run identified by
    /// `generation`. Returns false (and mutates nothing) if that run
    /// has been superseded or cancelled. The generation check and the
    /// publish happen under the same lock, so a stale timer can never
    /// overwrite a newer run's state.
    pub(crate) async fn apply<F>(
        &self,
        generation: u64,
        phase: Option<RunPhase>,
        update: F,
    ) -> bool
    where
        F: FnOnce(&mut NotificationState),
    {
        let mut run_state = self.run_state.lock().await;
        if run_state.generation != generation {
            trace!(
                generation,
                current = run_state.generation,
                "dropping publish from superseded run"
            );
            return false;
        }
        if let Some(phase) = phase {
            run_state.phase = phase;
        }
        self.state_tx.send_modify(update);
        true
    }

    /// Terminal close chain: hide the banner after the auto-close
    /// delay, then clear the message after the exit-animation delay.
    pub(crate) async fn close_after(&self, generation: u64, config: &NotifierConfig) {
        sleep(config.auto_close()).await;
        let closing = self
            .apply(generation, Some(RunPhase::Closing), |state| {
                state.visible = false;
            })
            .await;
        if !closing {
            return;
        }

        sleep(config.exit_animation()).await;
        let idle = self
            .apply(generation, Some(RunPhase::Idle), |state| {
                state.message.clear();
                state.kind = StepKind::Info;
                state.percent = None;
                state.on_complete = None;
                state.started_at = None;
            })
            .await;
        if idle {
            debug!(generation, "staged run closed");
        }
    }
}

/// Drives a sequence of named steps on the tokio timer wheel,
/// publishing each step's state to a single watch subscriber and
/// terminating in a two-phase auto-close.
///
/// Exactly one run is active at a time. Starting a new run bumps the
/// generation counter, which invalidates every pending timer of the
/// previous run before it can publish again.
pub struct StagedProgressNotifier {
    shared: Arc<Shared>,
    config: NotifierConfig,
    active_task: Mutex<Option<JoinHandle<()>>>,
}

impl StagedProgressNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        let (state_tx, _) = watch::channel(NotificationState::hidden());
        Self {
            shared: Arc::new(Shared {
                run_state: Mutex::new(RunState {
                    generation: 0,
                    phase: RunPhase::Idle,
                }),
                state_tx,
            }),
            config,
            active_task: Mutex::new(None),
        }
    }

    /// Subscribe the rendering consumer to the notification state slot
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.shared.state_tx.subscribe()
    }

    /// Snapshot of the current notification state
    pub fn current(&self) -> NotificationState {
        self.shared.state_tx.borrow().clone()
    }

    /// Lifecycle phase of the active run
    pub async fn phase(&self) -> RunPhase {
        self.shared.run_state.lock().await.phase
    }

    pub(crate) fn timing(&self) -> &NotifierConfig {
        &self.config
    }

    /// Supersede any active run and reset the banner for a new one.
    /// The generation bump and the state reset happen under the same
    /// locks the timer tasks use, so no stale publish can land between
    /// them.
    pub(crate) async fn begin_run(&self) -> (u64, DateTime<Utc>) {
        let started_at = Utc::now();
        let generation = {
            let mut run_state = self.shared.run_state.lock().await;
            run_state.generation += 1;
            run_state.phase = RunPhase::Running;
            self.shared.state_tx.send_modify(|state| {
                *state = NotificationState {
                    visible: true,
                    started_at: Some(started_at),
                    ..NotificationState::hidden()
                };
            });
            run_state.generation
        };

        if let Some(previous) = self.active_task.lock().await.take() {
            debug!(generation, "superseding in-flight run");
            previous.abort();
        }

        (generation, started_at)
    }

    pub(crate) async fn install_task(&self, task: JoinHandle<()>) {
        *self.active_task.lock().await = Some(task);
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }

    /// Start a fixed-step run. The first step publishes after the
    /// configured initial delay, each later step after the step
    /// interval; the final step enters the auto-close chain.
    ///
    /// Step percents are expected to be non-decreasing (a regressing
    /// gauge is a caller defect, not enforced here). An empty step list
    /// is rejected rather than silently superseding the active run.
    pub async fn start(
        &self,
        steps: Vec<ProgressStep>,
        options: RunOptions,
    ) -> Result<RunHandle, NotifierError> {
        if steps.is_empty() {
            return Err(NotifierError::EmptySteps);
        }

        let (generation, started_at) = self.begin_run().await;
        let id = Uuid::new_v4();
        info!(run_id = %id, steps = steps.len(), "starting staged progress run");

        let shared = self.shared();
        let config = self.config.clone();
        let on_complete = options.on_complete;

        let task = tokio::spawn(async move {
            run_steps(shared, config, generation, started_at, steps, on_complete).await;
        });
        self.install_task(task).await;

        Ok(RunHandle {
            id,
            started_at,
            generation,
        })
    }

    /// Cancel the run behind `handle`. A handle that no longer refers
    /// to the active run is a no-op; already-published state is never
    /// rewound.
    pub async fn cancel(&self, handle: &RunHandle) {
        {
            let mut run_state = self.shared.run_state.lock().await;
            if run_state.generation != handle.generation {
                debug!(run_id = %handle.id, "cancel on superseded run, ignoring");
                return;
            }
            run_state.generation += 1;
            run_state.phase = RunPhase::Idle;
        }
        info!(run_id = %handle.id, "cancelled staged progress run");

        if let Some(task) = self.active_task.lock().await.take() {
            task.abort();
        }
    }

    /// Hide the banner without stopping a still-running sequence.
    /// Pending timers keep firing; the close chain is idempotent, so a
    /// manual dismiss and a later auto-close converge on the same
    /// state.
    pub fn dismiss(&self) {
        self.shared.state_tx.send_modify(|state| {
            state.visible = false;
        });
        debug!("notification banner dismissed");
    }

    /// Invoke the completion action if the current state carries one.
    /// Returns whether an action ran.
    pub fn activate_completion(&self) -> bool {
        let state = self.shared.state_tx.borrow().clone();
        if !state.visible || state.percent != Some(100) {
            return false;
        }
        match state.on_complete {
            Some(action) => {
                action.invoke();
                true
            }
            None => false,
        }
    }
}

impl Default for StagedProgressNotifier {
    fn default() -> Self {
        Self::new(NotifierConfig::default())
    }
}

async fn run_steps(
    shared: Arc<Shared>,
    config: NotifierConfig,
    generation: u64,
    started_at: DateTime<Utc>,
    steps: Vec<ProgressStep>,
    on_complete: Option<RunCallback>,
) {
    sleep(config.initial_delay()).await;

    let last_index = steps.len() - 1;
    for (index, step) in steps.into_iter().enumerate() {
        if index > 0 {
            sleep(config.step_interval()).await;
        }

        let is_terminal = index == last_index;
        let completed = is_terminal && step.percent >= 100 && step.kind == StepKind::Success;
        let action = if completed { on_complete.clone() } else { None };
        let phase = if is_terminal {
            Some(RunPhase::Complete)
        } else {
            None
        };

        let percent = step.percent;
        let kind = step.kind;
        let message = step.message;
        let published = shared
            .apply(generation, phase, |state| {
                state.message = message;
                state.kind = kind;
                state.percent = Some(percent);
                state.visible = true;
                state.on_complete = action;
                state.started_at = Some(started_at);
            })
            .await;
        if !published {
            return;
        }
        debug!(generation, step = index, percent, "published step");
    }

    shared.close_after(generation, &config).await;
}
