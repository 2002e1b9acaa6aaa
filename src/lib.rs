pub mod app;
pub mod classify;
pub mod config;
pub mod core;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod query;
pub mod sources;
pub mod stats;
pub mod ui;
