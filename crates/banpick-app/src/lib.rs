// Library root: exposes the app modules so integration tests can drive the
// event loop without a terminal.

pub mod app;
pub mod catalog_client;
pub mod command;
pub mod controller;
pub mod protocol;
pub mod tui;
