/// Notification banner widget
///
/// Renders a `NotificationState` as a bordered banner in the top-right
/// corner: a kind icon, the step message, a progress gauge when a
/// percent is present, and a completion hint when the state carries an
/// action. The widget is a pure function of the state; nothing flows
/// back into the engine from here.
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use crate::notifier::{NotificationState, StepKind};

/// Maximum banner width in columns
const BANNER_WIDTH: u16 = 48;

pub struct BannerWidget;

impl BannerWidget {
    /// Render the banner into the top-right of `area`; hidden or empty
    /// states draw nothing
    pub fn render(frame: &mut Frame, area: Rect, state: &NotificationState) {
        if !state.visible || (state.message.is_empty() && !state.has_progress()) {
            return;
        }

        let banner_area = Self::banner_area(area, state);
        if banner_area.height < 3 {
            return;
        }
        frame.render_widget(Clear, banner_area);

        let accent = Self::accent_color(state.kind);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));
        let inner = block.inner(banner_area);
        frame.render_widget(block, banner_area);

        let mut constraints = vec![Constraint::Length(1)];
        if state.has_progress() {
            constraints.push(Constraint::Length(1));
        }
        if state.on_complete.is_some() {
            constraints.push(Constraint::Length(1));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let message = Line::from(vec![
            Span::styled(
                format!("{} ", state.kind.icon()),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(state.message.clone(), Style::default().fg(Color::White)),
        ]);
        frame.render_widget(Paragraph::new(message), chunks[0]);

        let mut next = 1;
        if let Some(percent) = state.percent {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(accent).bg(Color::Black))
                .percent(u16::from(percent.min(100)))
                .label(format!("{}%", percent));
            frame.render_widget(gauge, chunks[next]);
            next += 1;
        }

        if state.on_complete.is_some() {
            let hint = Paragraph::new("[Enter] View results")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Right);
            frame.render_widget(hint, chunks[next]);
        }
    }

    /// Top-right placement, sized to the lines the state needs
    fn banner_area(area: Rect, state: &NotificationState) -> Rect {
        let width = area.width.min(BANNER_WIDTH);
        let height = Self::required_height(state).min(area.height);
        Rect {
            x: area.width.saturating_sub(width).saturating_sub(1),
            y: 1.min(area.height.saturating_sub(height)),
            width,
            height,
        }
    }

    fn required_height(state: &NotificationState) -> u16 {
        let mut lines = 1; // message
        if state.has_progress() {
            lines += 1;
        }
        if state.on_complete.is_some() {
            lines += 1;
        }
        lines + 2 // borders
    }

    fn accent_color(kind: StepKind) -> Color {
        match kind {
            StepKind::Info => Color::Cyan,
            StepKind::Success => Color::Green,
            StepKind::Warning => Color::Yellow,
            StepKind::Error => Color::Red,
        }
    }
}
