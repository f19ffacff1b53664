// Export our modules for use in the binary and tests
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod event;
pub mod heatmap;
pub mod location;
pub mod logging;
pub mod store;
pub mod terminal;
pub mod ui;
pub mod upload;

pub use domain::{Coordinates, NewReport, Report, ReportId};
