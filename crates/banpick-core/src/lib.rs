// Library root: the draft engine, fearless series tracking, catalog model,
// recommendation contract, configuration and persistence.

pub mod catalog;
pub mod config;
pub mod db;
pub mod draft;
pub mod recommend;
pub mod series;
pub mod session;
