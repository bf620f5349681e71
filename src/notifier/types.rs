use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Severity/tone of a published notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl StepKind {
    /// Get the banner icon for this kind
    pub fn icon(&self) -> &'static str {
        match self {
            StepKind::Info => "ℹ",
            StepKind::Success => "✓",
            StepKind::Warning => "⚠",
            StepKind::Error => "✗",
        }
    }
}

/// One discrete message/percent/kind tuple within a staged run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStep {
    /// User-facing text for this step
    pub message: String,
    /// Cumulative progress value reached when this step completes (0-100)
    pub percent: u8,
    /// Severity/tone, defaults to `Info`
    #[serde(default)]
    pub kind: StepKind,
}

impl ProgressStep {
    /// Create an info-kind step
    pub fn new(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent: percent.min(100),
            kind: StepKind::Info,
        }
    }

    /// Create a step with an explicit kind
    pub fn with_kind(message: impl Into<String>, percent: u8, kind: StepKind) -> Self {
        Self {
            message: message.into(),
            percent: percent.min(100),
            kind,
        }
    }
}

/// Cloneable zero-argument action invoked from the view layer
/// (completion affordances, threshold effects)
#[derive(Clone)]
pub struct RunCallback(Arc<dyn Fn() + Send + Sync>);

impl RunCallback {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(action))
    }

    pub fn invoke(&self) {
        (self.0)();
    }
}

impl fmt::Debug for RunCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunCallback")
    }
}

/// The single piece of mutable state exposed to the view
///
/// Exactly one writer (the active run) mutates this at a time; the view
/// observes it through a watch channel and renders whatever is here.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    pub message: String,
    pub kind: StepKind,
    /// `None` means "no progress bar shown"
    pub percent: Option<u8>,
    pub visible: bool,
    /// Present only when the run reached a successful 100% publish
    pub on_complete: Option<RunCallback>,
    /// When the active run began; cleared once the banner is fully closed
    pub started_at: Option<DateTime<Utc>>,
}

impl NotificationState {
    /// The idle state before any run has started
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Whether a progress gauge should be drawn
    pub fn has_progress(&self) -> bool {
        self.percent.is_some()
    }
}

/// Lifecycle of the active run
///
/// Transitions are timer-driven; `cancel` or supersession jumps any
/// state back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Complete,
    Closing,
}

/// Caller-supplied options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Invoked if the user acts on the completion affordance before the
    /// banner auto-closes
    pub on_complete: Option<RunCallback>,
}

impl RunOptions {
    pub fn with_on_complete(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_complete: Some(RunCallback::new(action)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_step_kind_icons() {
        assert_eq!(StepKind::Info.icon(), "ℹ");
        assert_eq!(StepKind::Success.icon(), "✓");
        assert_eq!(StepKind::Warning.icon(), "⚠");
        assert_eq!(StepKind::Error.icon(), "✗");
    }

    #[test]
    fn test_step_percent_is_clamped() {
        let step = ProgressStep::new("over", 150);
        assert_eq!(step.percent, 100);
    }

    #[test]
    fn test_step_kind_defaults_to_info_in_json() {
        let step: ProgressStep =
            serde_json::from_str(r#"{"message": "Loading", "percent": 40}"#).unwrap();
        assert_eq!(step.kind, StepKind::Info);

        let step: ProgressStep =
            serde_json::from_str(r#"{"message": "Done", "percent": 100, "kind": "success"}"#)
                .unwrap();
        assert_eq!(step.kind, StepKind::Success);
    }

    #[test]
    fn test_run_callback_invocation() {
        let counter = std::sync::Arc::new(AtomicUsize::new(0));
        let cloned = counter.clone();
        let callback = RunCallback::new(move || {
            cloned.fetch_add(1, Ordering::SeqCst);
        });

        callback.invoke();
        callback.clone().invoke();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hidden_state() {
        let state = NotificationState::hidden();
        assert!(!state.visible);
        assert!(state.message.is_empty());
        assert!(!state.has_progress());
        assert!(state.on_complete.is_none());
    }
}
