// Analysis widget: suggestions, projected win rate, warnings and insights
// for the pending step.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use banpick_core::recommend::{Analysis, Severity};

use crate::protocol::AppSnapshot;
use crate::tui::ViewState;

/// Render the analysis panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (title, lines) = match &state.snapshot {
        Some(snapshot) => (panel_title(snapshot), analysis_lines(snapshot)),
        None => ("Analysis".to_string(), Vec::new()),
    };

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn panel_title(snapshot: &AppSnapshot) -> String {
    match (snapshot.session.draft.current_step(), &snapshot.analysis) {
        (Some(step), Some(analysis)) => format!(
            "Analysis: {} | Projected {}",
            step,
            format_win_rate(analysis.projected_win_rate)
        ),
        _ => "Analysis".to_string(),
    }
}

fn analysis_lines(snapshot: &AppSnapshot) -> Vec<Line<'static>> {
    let Some(analysis) = &snapshot.analysis else {
        let message = if snapshot.session.draft.is_complete() {
            "Draft complete. Type `next` to record the game."
        } else {
            "No analysis without a loaded catalog."
        };
        return vec![Line::from(Span::styled(
            message,
            Style::default().fg(Color::Gray),
        ))];
    };

    let mut lines = suggestion_lines(snapshot, analysis);
    for warning in &analysis.warnings {
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", warning.severity),
                Style::default()
                    .fg(severity_color(warning.severity))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(warning.message.clone()),
        ]));
    }
    for insight in &analysis.insights {
        lines.push(Line::from(Span::styled(
            format!("* {insight}"),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines
}

fn suggestion_lines(snapshot: &AppSnapshot, analysis: &Analysis) -> Vec<Line<'static>> {
    analysis
        .suggestions
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            let style = if rank == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("{}. {:<14}", rank + 1, snapshot.name_of(&s.entity_id)),
                    style,
                ),
                Span::styled(
                    format!(" {:>3} {:>6} ", s.score, format_win_rate(s.win_rate)),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(s.narrative.clone()),
            ])
        })
        .collect()
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Danger => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

pub fn format_win_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::fixtures;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn format_win_rate_one_decimal() {
        assert_eq!(format_win_rate(58.46), "58.5%");
        assert_eq!(format_win_rate(50.0), "50.0%");
    }

    #[test]
    fn severity_colors() {
        assert_eq!(severity_color(Severity::Danger), Color::Red);
        assert_eq!(severity_color(Severity::Warning), Color::Yellow);
        assert_eq!(severity_color(Severity::Info), Color::Blue);
    }

    #[test]
    fn lines_list_suggestions_then_warnings_then_insights() {
        let snapshot = fixtures::snapshot(&[]);
        let lines = text(&analysis_lines(&snapshot));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("1. Thresh"));
        assert!(lines[0].contains("100"));
        assert!(lines[0].contains("58.5%"));
        assert_eq!(lines[1], "[DANGER] No frontline");
        assert_eq!(lines[2], "* Enemy lacks magic damage");
        assert_eq!(panel_title(&snapshot), "Analysis: Blue Ban | Projected 51.0%");
    }

    #[test]
    fn placeholder_without_analysis() {
        let mut snapshot = fixtures::snapshot(&[]);
        snapshot.analysis = None;
        let lines = text(&analysis_lines(&snapshot));
        assert_eq!(lines, vec!["No analysis without a loaded catalog."]);
        assert_eq!(panel_title(&snapshot), "Analysis");
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(60, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
