// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest snapshot pushed by the app
// orchestrator plus purely local state (the prompt buffer, scroll offset and
// the last notice). It re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tokio::sync::mpsc;

use banpick_core::draft::Team;

use crate::protocol::{AppSnapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Latest state snapshot; `None` until the app sends the first one.
    pub snapshot: Option<AppSnapshot>,
    /// Text typed at the command prompt.
    pub input: String,
    /// Last one-line message from the app or the prompt parser.
    pub notice: Option<String>,
    /// First visible row of the entity browser.
    pub browser_scroll: usize,
}

impl ViewState {
    /// Number of rows in the entity browser.
    pub fn browser_len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.entities.len())
    }

    fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        let filter_changed = self.snapshot.as_ref().map_or(true, |old| {
            old.filter_term != snapshot.filter_term || old.role_filter != snapshot.role_filter
        });
        self.snapshot = Some(snapshot);
        if filter_changed {
            self.browser_scroll = 0;
        }
        self.browser_scroll = self.browser_scroll.min(self.browser_len().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::StateSnapshot(snapshot) => state.apply_snapshot(*snapshot),
        UiUpdate::Notice(message) => state.notice = Some(message),
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::team::render(frame, layout.blue_team, state, Team::Blue);
    widgets::available::render(frame, layout.browser, state);
    widgets::team::render(frame, layout.red_team, state, Team::Red);
    widgets::analysis::render(frame, layout.analysis, state);
    widgets::series::render(frame, layout.series, state);
    render_notice(frame, &layout, state);
    render_prompt(frame, &layout, state);
    render_help_bar(frame, &layout);
}

fn render_notice(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = state.notice.as_deref().unwrap_or("");
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {text}"),
        Style::default().fg(Color::Yellow),
    )));
    frame.render_widget(paragraph, layout.notice);
}

fn render_prompt(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(state.input.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Command"));
    frame.render_widget(paragraph, layout.prompt);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " Enter:Run | Tab:Accept | Ctrl+Z:Undo | Up/Down:Scroll | Esc:Clear | help | Ctrl+C:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App is shutting down
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    // Mouse and resize events; resize is picked up by the next draw.
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
