pub mod activity;
pub mod api;
pub mod app;
pub mod board;
pub mod cli;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod notification;
pub mod panel;
pub mod realm;
pub mod reconcile;
pub mod settings;
pub mod theme;
pub mod types;
pub mod ui;
