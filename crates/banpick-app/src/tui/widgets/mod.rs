// TUI widget modules for each dashboard panel.

pub mod analysis;
pub mod available;
pub mod series;
pub mod status_bar;
pub mod team;
