// Status bar widget: catalog status, game, draft step and controller mode.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use banpick_core::draft::TOTAL_STEPS;
use banpick_core::recommend::ControllerScope;

use crate::protocol::{AppSnapshot, CatalogStatus};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [catalog dot] [game] | [step] | [fearless] | [controller]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = &state.snapshot else {
        let paragraph = Paragraph::new(" Waiting for app state...")
            .style(Style::default().fg(Color::Gray).bg(Color::Black));
        frame.render_widget(paragraph, area);
        return;
    };

    let separator = || Span::styled(" | ", Style::default().fg(Color::Gray));
    let (dot, dot_color) = catalog_indicator(&snapshot.catalog_status);
    let series = &snapshot.session.series;

    let spans = vec![
        Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)),
        Span::styled(
            catalog_label(&snapshot.catalog_status),
            Style::default().fg(Color::Gray),
        ),
        separator(),
        Span::styled(
            format!(
                "Game {}/{} ({})",
                series.current_game(),
                series.max_games(),
                series.format()
            ),
            Style::default().fg(Color::White),
        ),
        separator(),
        Span::styled(
            step_label(snapshot),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        separator(),
        Span::styled(
            if snapshot.session.fearless {
                "Fearless ON"
            } else {
                "Fearless OFF"
            },
            Style::default().fg(if snapshot.session.fearless {
                Color::Magenta
            } else {
                Color::Gray
            }),
        ),
        separator(),
        Span::styled(controller_label(snapshot), Style::default().fg(Color::Cyan)),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the catalog dot character and its color.
pub fn catalog_indicator(status: &CatalogStatus) -> (&'static str, Color) {
    match status {
        CatalogStatus::Ready { .. } => ("●", Color::Green),
        CatalogStatus::Loading => ("●", Color::Yellow),
        CatalogStatus::Offline(_) => ("●", Color::Red),
    }
}

pub fn catalog_label(status: &CatalogStatus) -> String {
    match status {
        CatalogStatus::Ready { version, count } => format!("v{version} ({count})"),
        CatalogStatus::Loading => "loading".to_string(),
        CatalogStatus::Offline(_) => "offline".to_string(),
    }
}

/// "Step 7/20 Blue Pick", or the phase once the draft is complete.
pub fn step_label(snapshot: &AppSnapshot) -> String {
    let draft = &snapshot.session.draft;
    match draft.current_step() {
        Some(step) => format!(
            "{} - Step {}/{} {}",
            snapshot.phase,
            draft.cursor() + 1,
            TOTAL_STEPS,
            step
        ),
        None => snapshot.phase.to_string(),
    }
}

pub fn controller_label(snapshot: &AppSnapshot) -> String {
    if snapshot.scope == ControllerScope::Off {
        return "AI off".to_string();
    }
    let mode = if snapshot.auto_apply { "auto" } else { "advise" };
    let thinking = if snapshot.controller_pending {
        " (thinking...)"
    } else {
        ""
    };
    format!("AI {} {}{}", snapshot.scope, mode, thinking)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
