#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod gateway;
pub mod models;
pub mod presenter;
pub mod report;
pub mod session;
pub mod sync;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
