//! Feed ingestion into SQLite with optional AI summaries and a JSON snapshot
//! export for static site builds.

pub mod ai;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod feed;
pub mod models;
pub mod services;

pub use app::{AnnotateReport, App, RunReport};
pub use config::Config;
pub use error::{AppError, Result};
