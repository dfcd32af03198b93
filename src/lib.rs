//! # redmine-release
//!
//! An opinionated command-line assistant for creating and listing release
//! tickets in Redmine.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod redmine;
pub mod release;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use redmine::Redmine;
pub use release::ReleaseDraft;
