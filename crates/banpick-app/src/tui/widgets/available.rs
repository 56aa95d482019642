// Champion browser widget: filterable table of every catalog entity.
//
// Entities used this game or locked by the fearless pool stay listed but are
// dimmed. The title shows the active name and role filters.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use banpick_core::catalog::Role;

use crate::protocol::{AppSnapshot, CatalogStatus};
use crate::tui::ViewState;

/// Render the champion browser into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = &state.snapshot else {
        frame.render_widget(
            Table::new(Vec::<Row>::new(), [Constraint::Min(1)])
                .block(Block::default().borders(Borders::ALL).title("Champions")),
            area,
        );
        return;
    };

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Name"),
        Cell::from("Roles"),
        Cell::from(""),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = if snapshot.entities.is_empty() {
        vec![Row::new(vec![Cell::from(""), Cell::from(empty_message(snapshot))])]
    } else {
        snapshot
            .entities
            .iter()
            .enumerate()
            .skip(state.browser_scroll)
            .map(|(i, row)| {
                let style = if row.available {
                    Style::default()
                } else {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::DIM)
                };
                Row::new(vec![
                    Cell::from(format!("{}", i + 1)),
                    Cell::from(row.name.clone()),
                    Cell::from(format_roles(&row.roles)),
                    Cell::from(if row.available { "" } else { "used" }),
                ])
                .style(style)
            })
            .collect()
    };

    let widths = [
        Constraint::Length(4),
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(build_title(snapshot)));
    frame.render_widget(table, area);
}

/// Format role list as a compact string (e.g., "Top/Jungle").
pub fn format_roles(roles: &[Role]) -> String {
    if roles.is_empty() {
        return "--".to_string();
    }
    roles
        .iter()
        .map(|r| r.display_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn empty_message(snapshot: &AppSnapshot) -> String {
    match &snapshot.catalog_status {
        CatalogStatus::Loading => "Loading catalog...".to_string(),
        CatalogStatus::Offline(message) => format!("Offline ({message}); type ids directly"),
        CatalogStatus::Ready { .. } => "No champion matches the filter".to_string(),
    }
}

/// Title with filter info and the row count.
pub fn build_title(snapshot: &AppSnapshot) -> String {
    let mut title = String::from("Champions");
    if let Some(role) = snapshot.role_filter {
        title.push_str(&format!(" [{}]", role.display_str()));
    }
    if !snapshot.filter_term.is_empty() {
        title.push_str(&format!(" \"{}\"", snapshot.filter_term));
    }
    let available = snapshot.entities.iter().filter(|r| r.available).count();
    title.push_str(&format!(" ({}/{})", available, snapshot.entities.len()));
    title
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::fixtures;

    #[test]
    fn format_roles_joins() {
        assert_eq!(format_roles(&[]), "--");
        assert_eq!(format_roles(&[Role::Mid]), Role::Mid.display_str());
        assert_eq!(
            format_roles(&[Role::Top, Role::Jungle]),
            format!("{}/{}", Role::Top.display_str(), Role::Jungle.display_str())
        );
    }

    #[test]
    fn title_counts_available_rows() {
        let mut snapshot = fixtures::snapshot(&["Ahri", "Zed"]);
        assert_eq!(build_title(&snapshot), "Champions (4/6)");
        snapshot.filter_term = "ah".into();
        snapshot.role_filter = Some(Role::Mid);
        assert_eq!(
            build_title(&snapshot),
            format!("Champions [{}] \"ah\" (4/6)", Role::Mid.display_str())
        );
    }

    #[test]
    fn empty_browser_explains_why() {
        let mut snapshot = fixtures::snapshot(&[]);
        snapshot.catalog_status = CatalogStatus::Offline("timeout".into());
        assert!(empty_message(&snapshot).contains("timeout"));
        snapshot.catalog_status = CatalogStatus::Loading;
        assert_eq!(empty_message(&snapshot), "Loading catalog...");
    }

    #[test]
    fn render_respects_scroll() {
        let backend = ratatui::backend::TestBackend::new(60, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState {
            snapshot: Some(fixtures::snapshot(&[])),
            browser_scroll: 2,
            ..ViewState::default()
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text = fixtures::buffer_text(&terminal);
        assert!(!text.contains("Garen"));
        assert!(text.contains("Lee Sin"));
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(60, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
