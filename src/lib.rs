//! GitHub520 - keeps a managed block of GitHub hosts entries current.

pub mod app;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hosts;
pub mod logger;
pub mod platform;
pub mod privilege;
pub mod shell;

pub use error::{Error, Result};
