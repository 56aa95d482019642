// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------------------+
// | Status Bar (1 row)                                           |
// +-------------+----------------------------------+-------------+
// | Blue (25%)  | Champion browser (50%)           | Red (25%)   |
// +-------------+-------------------+--------------+-------------+
// | Analysis (60%)                  | Series (40%)               |
// +---------------------------------+----------------------------+
// | Notice (1 row)                                               |
// | Command prompt (3 rows)                                      |
// | Help Bar (1 row)                                             |
// +--------------------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Catalog status, game, phase and controller mode.
    pub status_bar: Rect,
    pub blue_team: Rect,
    pub browser: Rect,
    pub red_team: Rect,
    /// Suggestions, warnings and insights for the pending step.
    pub analysis: Rect,
    /// Series format, game records and fearless pool.
    pub series: Rect,
    pub notice: Rect,
    pub prompt: Rect,
    /// Keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // status bar
            Constraint::Min(14),    // teams + browser
            Constraint::Length(10), // analysis + series
            Constraint::Length(1),  // notice
            Constraint::Length(3),  // prompt
            Constraint::Length(1),  // help bar
        ])
        .split(area);

    let board = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(vertical[2]);

    AppLayout {
        status_bar: vertical[0],
        blue_team: board[0],
        browser: board[1],
        red_team: board[2],
        analysis: lower[0],
        series: lower[1],
        notice: vertical[3],
        prompt: vertical[4],
        help_bar: vertical[5],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
