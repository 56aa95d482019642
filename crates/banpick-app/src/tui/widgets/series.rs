// Series widget: format, game records and the fearless pool.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use banpick_core::draft::{EntityId, Team};

use super::team::team_color;
use crate::protocol::AppSnapshot;
use crate::tui::ViewState;

/// Render the series panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match &state.snapshot {
        Some(snapshot) => series_lines(snapshot),
        None => Vec::new(),
    };
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Series"));
    frame.render_widget(paragraph, area);
}

fn series_lines(snapshot: &AppSnapshot) -> Vec<Line<'static>> {
    let series = &snapshot.session.series;
    let pool_style = if snapshot.session.fearless {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{} game {}/{}", series.format(), series.current_game(), series.max_games()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  pool {}", series.fearless_pool().len()),
            pool_style,
        ),
    ])];

    let recorded: Vec<_> = series
        .records()
        .iter()
        .filter(|r| !r.blue_picks.is_empty() || !r.red_picks.is_empty())
        .collect();
    if recorded.is_empty() {
        lines.push(Line::from(Span::styled(
            "No games recorded",
            Style::default().fg(Color::Gray),
        )));
    }
    for record in recorded {
        lines.push(Line::from(format!("Game {}", record.game_number)));
        for team in [Team::Blue, Team::Red] {
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {:<4} ", team.display_str()),
                    Style::default().fg(team_color(team)),
                ),
                Span::raw(join_names(snapshot, record.picks(team))),
            ]));
        }
    }
    lines
}

/// Comma-separated display names, or "--" for an empty list.
pub fn join_names(snapshot: &AppSnapshot, ids: &[EntityId]) -> String {
    if ids.is_empty() {
        return "--".to_string();
    }
    ids.iter()
        .map(|id| snapshot.name_of(id))
        .collect::<Vec<_>>()
        .join(", ")
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
    fn empty_series() {
        let snapshot = fixtures::snapshot(&[]);
        let lines = text(&series_lines(&snapshot));
        assert_eq!(lines, vec!["BO3 game 1/3  pool 0", "No games recorded"]);
    }

    #[test]
    fn records_list_names_per_side() {
        let mut snapshot = fixtures::snapshot(&[]);
        let session = snapshot
            .session
            .backfill_pick(1, Team::Blue, &EntityId::from("LeeSin"))
            .backfill_pick(1, Team::Blue, &EntityId::from("Ahri"))
            .backfill_pick(2, Team::Red, &EntityId::from("Zed"));
        snapshot.session = session;

        let lines = text(&series_lines(&snapshot));
        assert_eq!(lines[0], "BO3 game 1/3  pool 3");
        assert_eq!(lines[1], "Game 1");
        assert_eq!(lines[2], " Blue Lee Sin, Ahri");
        assert_eq!(lines[3], " Red  --");
        assert_eq!(lines[4], "Game 2");
        assert_eq!(lines[6], " Red  Zed");
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(40, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
