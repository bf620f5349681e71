use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use opsnotify::cli::{Cli, Commands};
use opsnotify::notifier::{
    NotificationState, ProgressStep, RandomRunConfig, RunHandle, RunOptions, Threshold,
};
use opsnotify::ui::BannerWidget;
use opsnotify::upload::{refresh_steps, UploadController};
use opsnotify::validate::{FileCandidate, RejectedFile, ValidationPolicy};
use opsnotify::{NotifierConfig, StagedProgressNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = cli.notifier_config()?;

    match cli.command {
        Some(Commands::Script {
            steps,
            random,
            seed,
        }) => run_script(config, steps, random, seed).await,
        Some(Commands::Demo) | None => run_demo(config).await,
    }
}

/// Headless mode: start one run and log every published state until
/// the banner fully closes
async fn run_script(
    config: NotifierConfig,
    steps_path: Option<PathBuf>,
    random: bool,
    seed: Option<u64>,
) -> Result<()> {
    let notifier = StagedProgressNotifier::new(config);
    let mut state_rx = notifier.subscribe();

    if random {
        let mut run_config = custodian_run_config(Arc::new(AtomicUsize::new(1)));
        if let Some(seed) = seed {
            run_config = run_config.with_seed(seed);
        }
        notifier
            .start_random(run_config, RunOptions::default())
            .await?;
    } else {
        let steps = match steps_path {
            Some(path) => load_steps(&path)?,
            None => opsnotify::upload::upload_steps(1),
        };
        notifier.start(steps, RunOptions::default()).await?;
    }

    let mut seen_complete = false;
    loop {
        state_rx.changed().await?;
        let state = state_rx.borrow_and_update().clone();
        info!(
            message = %state.message,
            percent = ?state.percent,
            kind = ?state.kind,
            visible = state.visible,
            "notification state"
        );
        if state.percent == Some(100) {
            seen_complete = true;
        }
        if seen_complete && !state.visible && state.message.is_empty() {
            break;
        }
    }

    Ok(())
}

fn load_steps(path: &PathBuf) -> Result<Vec<ProgressStep>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Everything the demo screen shows besides the banner itself
struct DemoState {
    /// 0 = Upload tab, 1 = View tab; completion actions switch this
    active_tab: Arc<AtomicUsize>,
    /// Custodian wizard step indicator, advanced by a 50% threshold
    wizard_step: Arc<AtomicUsize>,
    last_rejects: Vec<RejectedFile>,
    last_handle: Option<RunHandle>,
}

async fn run_demo(config: NotifierConfig) -> Result<()> {
    let notifier = Arc::new(StagedProgressNotifier::new(config));
    let controller = UploadController::new(notifier.clone(), ValidationPolicy::statement_uploads());
    let mut demo = DemoState {
        active_tab: Arc::new(AtomicUsize::new(0)),
        wizard_step: Arc::new(AtomicUsize::new(1)),
        last_rejects: Vec::new(),
        last_handle: None,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = demo_loop(&mut terminal, &notifier, &controller, &mut demo).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn demo_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    notifier: &Arc<StagedProgressNotifier>,
    controller: &UploadController,
    demo: &mut DemoState,
) -> Result<()> {
    // Crossterm reads block, so keys arrive through a dedicated thread.
    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        let ready = event::poll(Duration::from_millis(100)).unwrap_or(false);
        if !ready {
            continue;
        }
        match event::read() {
            Ok(ev) => {
                if key_tx.send(ev).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    let mut state_rx = notifier.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        let state = state_rx.borrow().clone();
        terminal.draw(|frame| draw_demo(frame, &state, controller, demo))?;

        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {}
            key = key_rx.recv() => {
                let Some(Event::Key(key)) = key else { continue };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                demo.last_rejects.clear();
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('u') => {
                        let tab = demo.active_tab.clone();
                        let outcome = controller
                            .handle_drop(
                                &good_batch(),
                                RunOptions::with_on_complete(move || {
                                    tab.store(1, Ordering::SeqCst);
                                }),
                            )
                            .await?;
                        demo.last_handle = outcome.run;
                    }
                    KeyCode::Char('b') => {
                        let outcome = controller
                            .handle_drop(&bad_batch(), RunOptions::default())
                            .await?;
                        demo.last_rejects = outcome.rejected;
                    }
                    KeyCode::Char('r') => {
                        let handle = notifier
                            .start(refresh_steps(), RunOptions::default())
                            .await?;
                        demo.last_handle = Some(handle);
                    }
                    KeyCode::Char('c') => {
                        demo.wizard_step.store(1, Ordering::SeqCst);
                        let tab = demo.active_tab.clone();
                        let handle = notifier
                            .start_random(
                                custodian_run_config(demo.wizard_step.clone()),
                                RunOptions::with_on_complete(move || {
                                    tab.store(1, Ordering::SeqCst);
                                }),
                            )
                            .await?;
                        demo.last_handle = Some(handle);
                    }
                    KeyCode::Char('d') => notifier.dismiss(),
                    KeyCode::Char('x') => {
                        if let Some(handle) = &demo.last_handle {
                            notifier.cancel(handle).await;
                        }
                    }
                    KeyCode::Enter => {
                        notifier.activate_completion();
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn draw_demo(
    frame: &mut Frame,
    state: &NotificationState,
    controller: &UploadController,
    demo: &DemoState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(frame.size());

    let keys = Paragraph::new(vec![
        Line::from("  u  drop a valid statement batch"),
        Line::from("  b  drop an invalid batch (modal alert path)"),
        Line::from("  r  refresh the dashboard"),
        Line::from("  c  custodian upload (random increments)"),
        Line::from("  d  dismiss banner   x  cancel last run"),
        Line::from("  Enter  completion action   q  quit"),
    ])
    .block(Block::default().title("opsnotify demo").borders(Borders::ALL));
    frame.render_widget(keys, chunks[0]);

    let tab = if demo.active_tab.load(Ordering::SeqCst) == 0 {
        "Upload"
    } else {
        "View"
    };
    let status = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Active tab: ", Style::default().fg(Color::Yellow)),
            Span::raw(tab),
        ]),
        Line::from(vec![
            Span::styled("Wizard step: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}", demo.wizard_step.load(Ordering::SeqCst))),
        ]),
        Line::from(vec![
            Span::styled("Runs started: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}", controller.runs_started())),
        ]),
    ])
    .block(Block::default().title("Dashboard").borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);

    if !demo.last_rejects.is_empty() {
        let lines: Vec<Line> = demo
            .last_rejects
            .iter()
            .map(|r| {
                Line::from(Span::styled(
                    format!("{}: {}", r.file.name, r.reason),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let alert = Paragraph::new(lines).block(
            Block::default()
                .title("Rejected files")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(alert, chunks[2]);
    }

    BannerWidget::render(frame, frame.size(), state);
}

fn custodian_run_config(wizard_step: Arc<AtomicUsize>) -> RandomRunConfig {
    RandomRunConfig::new("Uploading custodian file...", "Custodian file processed")
        .with_increments(5, 20)
        .with_interval_ms(800)
        .with_threshold(Threshold::new(50, move || {
            wizard_step.store(2, Ordering::SeqCst);
        }))
}

fn good_batch() -> Vec<FileCandidate> {
    vec![
        FileCandidate::new("statement_q3.csv", "text/csv", 420_000),
        FileCandidate::new("positions.xlsx", "application/octet-stream", 1_200_000),
    ]
}

fn bad_batch() -> Vec<FileCandidate> {
    vec![
        FileCandidate::new("holiday.mov", "video/quicktime", 900_000),
        FileCandidate::new("huge_ledger.csv", "text/csv", 64 * 1024 * 1024),
    ]
}
