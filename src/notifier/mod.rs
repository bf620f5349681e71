/// Staged progress notification engine
///
/// Simulates multi-step asynchronous operations (uploads, refreshes,
/// data loads) by walking an ordered list of steps on the tokio timer
/// wheel and publishing each step's state to a single rendering
/// subscriber. Two modes share the machinery:
///
/// - Fixed-step runs: an ordered list of message/percent/kind tuples
/// - Random-increment runs: percent grows by a random amount per tick,
///   with one-shot threshold effects along the way
///
/// Starting a new run supersedes any in-flight one via a generation
/// counter, so stale timers can never overwrite newer state.
pub mod engine;
pub mod random;
pub mod types;

pub use engine::{RunHandle, StagedProgressNotifier};
pub use random::{RandomRunConfig, Threshold};
pub use types::{NotificationState, ProgressStep, RunCallback, RunOptions, RunPhase, StepKind};
