// Team panel widget: one side's ban and pick slots.
//
// The slot the pending step will fill is highlighted.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use banpick_core::draft::{Action, EntityId, Team, SLOTS_PER_ROW};

use crate::protocol::AppSnapshot;
use crate::tui::ViewState;

/// Render the panel for `team` into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, team: Team) {
    let lines = match &state.snapshot {
        Some(snapshot) => slot_lines(snapshot, team),
        None => vec![Line::from("  --")],
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(team_color(team)))
            .title(format!("{} Side", team)),
    );
    frame.render_widget(paragraph, area);
}

pub fn team_color(team: Team) -> Color {
    match team {
        Team::Blue => Color::Blue,
        Team::Red => Color::Red,
    }
}

/// Lines for the ban row followed by the pick row.
fn slot_lines(snapshot: &AppSnapshot, team: Team) -> Vec<Line<'static>> {
    let pending = snapshot
        .session
        .draft
        .current_step()
        .filter(|step| step.team == team);

    let mut lines = Vec::with_capacity(2 * SLOTS_PER_ROW + 3);
    for action in [Action::Ban, Action::Pick] {
        if action == Action::Pick {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!("{}s", action),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let row = snapshot.session.draft.row(team, action);
        for (slot, entry) in row.iter().enumerate() {
            let is_pending =
                pending.is_some_and(|step| step.action == action && step.slot == slot);
            lines.push(slot_line(snapshot, slot, entry.as_ref(), action, is_pending));
        }
    }
    lines
}

fn slot_line(
    snapshot: &AppSnapshot,
    slot: usize,
    entry: Option<&EntityId>,
    action: Action,
    is_pending: bool,
) -> Line<'static> {
    let label = slot_label(entry.map(|id| snapshot.name_of(id)), is_pending);
    let style = if is_pending {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if entry.is_some() && action == Action::Ban {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Line::from(Span::styled(format!(" {} {}", slot + 1, label), style))
}

/// Text for one slot: the entity name, a marker for the pending slot, or a
/// placeholder.
pub fn slot_label(name: Option<&str>, is_pending: bool) -> String {
    match (name, is_pending) {
        (Some(name), _) => name.to_string(),
        (None, true) => "> selecting".to_string(),
        (None, false) => "--".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
