//! Random-increment runs
//!
//! The second mode of the staged notifier: instead of a fixed step
//! list, progress advances by a random amount on each tick until it
//! reaches 100, firing caller-supplied threshold effects along the
//! way (e.g. moving a wizard-step indicator at the halfway mark).
//! Both modes share the same publish/supersede/auto-close machinery.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{sleep, Duration};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::NotifierError;
use crate::notifier::engine::{RunHandle, StagedProgressNotifier};
use crate::notifier::types::{RunCallback, RunOptions, RunPhase, StepKind};

/// A one-shot effect fired the first time progress crosses `at`
#[derive(Debug, Clone)]
pub struct Threshold {
    pub at: u8,
    pub effect: RunCallback,
}

impl Threshold {
    pub fn new(at: u8, effect: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            at: at.min(100),
            effect: RunCallback::new(effect),
        }
    }
}

/// Parameters for a random-increment run
#[derive(Debug, Clone)]
pub struct RandomRunConfig {
    /// Message shown while progress is advancing
    pub label: String,
    /// Message published with the terminal 100% state
    pub complete_message: String,
    pub min_increment: u8,
    pub max_increment: u8,
    pub interval_ms: u64,
    pub thresholds: Vec<Threshold>,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl RandomRunConfig {
    pub fn new(label: impl Into<String>, complete_message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            complete_message: complete_message.into(),
            min_increment: 5,
            max_increment: 20,
            interval_ms: 800,
            thresholds: Vec::new(),
            seed: None,
        }
    }

    pub fn with_increments(mut self, min: u8, max: u8) -> Self {
        self.min_increment = min;
        self.max_increment = max;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.thresholds.push(threshold);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), NotifierError> {
        if self.min_increment == 0 || self.min_increment > self.max_increment {
            return Err(NotifierError::InvalidIncrementRange {
                min: self.min_increment,
                max: self.max_increment,
            });
        }
        if self.interval_ms == 0 {
            return Err(NotifierError::ZeroInterval);
        }
        Ok(())
    }
}

impl StagedProgressNotifier {
    /// Start a random-increment run. Progress starts at 0 and grows by
    /// `min_increment..=max_increment` per tick; crossing a threshold
    /// fires its effect exactly once; reaching 100 publishes the
    /// terminal success state and enters the shared auto-close chain.
    pub async fn start_random(
        &self,
        config: RandomRunConfig,
        options: RunOptions,
    ) -> Result<RunHandle, NotifierError> {
        config.validate()?;

        let (generation, started_at) = self.begin_run().await;
        let id = Uuid::new_v4();
        info!(
            run_id = %id,
            min = config.min_increment,
            max = config.max_increment,
            "starting random-increment run"
        );

        let shared = self.shared();
        let timing = self.timing().clone();
        let on_complete = options.on_complete;

        let task = tokio::spawn(async move {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let interval = Duration::from_millis(config.interval_ms);
            let mut fired = vec![false; config.thresholds.len()];
            let mut percent: u8 = 0;

            loop {
                sleep(interval).await;
                let increment = rng.gen_range(config.min_increment..=config.max_increment);
                percent = percent.saturating_add(increment).min(100);
                let done = percent >= 100;

                let message = if done {
                    config.complete_message.clone()
                } else {
                    config.label.clone()
                };
                let kind = if done { StepKind::Success } else { StepKind::Info };
                let action = if done { on_complete.clone() } else { None };
                let phase = if done { Some(RunPhase::Complete) } else { None };

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

                for (threshold, fired) in config.thresholds.iter().zip(fired.iter_mut()) {
                    if !*fired && percent >= threshold.at {
                        *fired = true;
                        debug!(generation, at = threshold.at, percent, "threshold crossed");
                        threshold.effect.invoke();
                    }
                }

                if done {
                    break;
                }
            }

            shared.close_after(generation, &timing).await;
        });
        self.install_task(task).await;

        Ok(RunHandle {
            id,
            started_at,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_config() -> NotifierConfig {
        NotifierConfig {
            initial_delay_ms: 0,
            step_interval_ms: 100,
            auto_close_ms: 1000,
            exit_animation_ms: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_run_converges_within_tick_bounds() {
        let notifier = StagedProgressNotifier::new(fast_config());
        let ticks = Arc::new(AtomicUsize::new(0));
        let tick_counter = ticks.clone();

        let mut rx = notifier.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if rx.borrow_and_update().has_progress() {
                    tick_counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let config = RandomRunConfig::new("Uploading custodian file...", "Upload complete")
            .with_increments(5, 20)
            .with_interval_ms(200)
            .with_seed(42);
        notifier
            .start_random(config, RunOptions::default())
            .await
            .unwrap();

        sleep(Duration::from_secs(30)).await;

        let state = notifier.current();
        assert_eq!(state.percent, Some(100));
        assert_eq!(state.message, "Upload complete");

        // One percent-bearing publish per tick, plus the close chain's
        // hide publish which still carries percent=100.
        let ticks_taken = ticks.load(Ordering::SeqCst) - 1;
        assert!(ticks_taken >= 100usize.div_ceil(20));
        assert!(ticks_taken <= 100usize.div_ceil(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_fires_exactly_once() {
        let notifier = StagedProgressNotifier::new(fast_config());
        let crossed = Arc::new(AtomicUsize::new(0));
        let counter = crossed.clone();

        let config = RandomRunConfig::new("Working...", "Done")
            .with_increments(10, 10)
            .with_interval_ms(100)
            .with_seed(7)
            .with_threshold(Threshold::new(50, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        notifier
            .start_random(config, RunOptions::default())
            .await
            .unwrap();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(crossed.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.current().percent, Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_increment_ranges_are_rejected() {
        let notifier = StagedProgressNotifier::new(fast_config());

        let zero_min = RandomRunConfig::new("x", "y").with_increments(0, 10);
        assert!(matches!(
            notifier.start_random(zero_min, RunOptions::default()).await,
            Err(NotifierError::InvalidIncrementRange { .. })
        ));

        let inverted = RandomRunConfig::new("x", "y").with_increments(20, 5);
        assert!(matches!(
            notifier.start_random(inverted, RunOptions::default()).await,
            Err(NotifierError::InvalidIncrementRange { .. })
        ));

        let zero_interval = RandomRunConfig::new("x", "y").with_interval_ms(0);
        assert!(matches!(
            notifier
                .start_random(zero_interval, RunOptions::default())
                .await,
            Err(NotifierError::ZeroInterval)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_run_is_superseded_by_fixed_run() {
        use crate::notifier::types::ProgressStep;

        let notifier = StagedProgressNotifier::new(fast_config());
        let slow = RandomRunConfig::new("slow", "slow done")
            .with_increments(1, 2)
            .with_interval_ms(500)
            .with_seed(1);
        notifier
            .start_random(slow, RunOptions::default())
            .await
            .unwrap();
        sleep(Duration::from_millis(600)).await;

        notifier
            .start(
                vec![ProgressStep::with_kind("fast done", 100, StepKind::Success)],
                RunOptions::default(),
            )
            .await
            .unwrap();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(notifier.current().message, "fast done");
        sleep(Duration::from_secs(5)).await;
        assert_eq!(notifier.phase().await, RunPhase::Idle);
        assert!(notifier.current().message.is_empty());
    }
}
