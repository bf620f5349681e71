//! End-to-end tests for the staged notifier public API, driven on the
//! paused tokio clock so no test waits on wall time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tokio_test::assert_ok;

use opsnotify::notifier::{
    NotificationState, ProgressStep, RandomRunConfig, RunOptions, RunPhase, StepKind, Threshold,
};
use opsnotify::upload::UploadController;
use opsnotify::validate::FileCandidate;
use opsnotify::{NotifierConfig, StagedProgressNotifier, ValidationPolicy};

fn fast_config() -> NotifierConfig {
    NotifierConfig {
        initial_delay_ms: 100,
        step_interval_ms: 200,
        auto_close_ms: 1000,
        exit_animation_ms: 100,
    }
}

fn collect_states(notifier: &StagedProgressNotifier) -> Arc<Mutex<Vec<NotificationState>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let mut rx = notifier.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            sink.lock().unwrap().push(state);
        }
    });
    log
}

#[tokio::test(start_paused = true)]
async fn upload_drop_runs_to_auto_close() {
    let notifier = Arc::new(StagedProgressNotifier::new(fast_config()));
    let controller = UploadController::new(notifier.clone(), ValidationPolicy::statement_uploads());
    let log = collect_states(&notifier);

    let batch = vec![
        FileCandidate::new("statement.csv", "text/csv", 1024),
        FileCandidate::new("slideshow.ppt", "application/vnd.ms-powerpoint", 1024),
    ];
    let outcome = tokio_test::assert_ok!(controller.handle_drop(&batch, RunOptions::default()).await);
    assert!(outcome.run.is_some());
    assert_eq!(outcome.rejected.len(), 1);

    sleep(Duration::from_secs(10)).await;

    let states = log.lock().unwrap();
    let steps: Vec<_> = states
        .iter()
        .filter(|s| s.has_progress() && s.visible)
        .collect();
    assert_eq!(steps.len(), 4);
    assert!(steps[0].message.contains("1 file"));
    assert_eq!(steps[3].percent, Some(100));
    assert_eq!(steps[3].kind, StepKind::Success);

    let terminal = states.last().unwrap();
    assert!(!terminal.visible);
    assert!(terminal.message.is_empty());
    assert_eq!(notifier.phase().await, RunPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn superseding_run_wins_across_modes() {
    let notifier = StagedProgressNotifier::new(fast_config());
    let log = collect_states(&notifier);

    notifier
        .start(
            vec![
                ProgressStep::new("old-1", 30),
                ProgressStep::new("old-2", 60),
                ProgressStep::with_kind("old-done", 100, StepKind::Success),
            ],
            RunOptions::default(),
        )
        .await
        .unwrap();
    sleep(Duration::from_millis(150)).await;

    let replacement = RandomRunConfig::new("replacing...", "replaced")
        .with_increments(25, 25)
        .with_interval_ms(100)
        .with_seed(3);
    notifier
        .start_random(replacement, RunOptions::default())
        .await
        .unwrap();
    sleep(Duration::from_secs(5)).await;

    let states = log.lock().unwrap();
    let replacement_start = states
        .iter()
        .position(|s| s.message == "replacing...")
        .expect("replacement run never published");
    assert!(states[replacement_start..]
        .iter()
        .all(|s| !s.message.starts_with("old-")));
    assert!(states.iter().any(|s| s.message == "replaced"));
}

#[tokio::test(start_paused = true)]
async fn completion_action_reaches_the_caller() {
    let notifier = StagedProgressNotifier::new(fast_config());
    let activated = Arc::new(AtomicUsize::new(0));
    let wizard_moves = Arc::new(AtomicUsize::new(0));

    let counter = activated.clone();
    let wizard = wizard_moves.clone();
    let config = RandomRunConfig::new("custodian upload...", "processed")
        .with_increments(10, 10)
        .with_interval_ms(100)
        .with_seed(11)
        .with_threshold(Threshold::new(50, move || {
            wizard.fetch_add(1, Ordering::SeqCst);
        }));
    notifier
        .start_random(
            config,
            RunOptions::with_on_complete(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

    // 10 ticks of 100ms to reach 100%.
    sleep(Duration::from_millis(1_050)).await;
    assert_eq!(notifier.current().percent, Some(100));
    assert_eq!(wizard_moves.load(Ordering::SeqCst), 1);

    assert!(notifier.activate_completion());
    assert_eq!(activated.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_batches_leave_the_notifier_idle() {
    let notifier = Arc::new(StagedProgressNotifier::new(fast_config()));
    let controller = UploadController::new(notifier.clone(), ValidationPolicy::statement_uploads());

    for _ in 0..3 {
        let outcome = controller
            .handle_drop(
                &[FileCandidate::new("cat.gif", "image/gif", 99)],
                RunOptions::default(),
            )
            .await
            .unwrap();
        assert!(outcome.run.is_none());
    }

    sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.runs_started(), 0);
    assert_eq!(notifier.phase().await, RunPhase::Idle);
    assert!(!notifier.current().visible);
}
