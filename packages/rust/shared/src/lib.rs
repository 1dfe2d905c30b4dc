//! Shared types, error model, and configuration for pagetrail.
//!
//! This crate is the foundation depended on by all other pagetrail crates.
//! It provides:
//! - [`PagetrailError`]: the unified error type
//! - Domain types ([`PageResult`], [`CrawlResultMap`], [`FetchResult`], [`Link`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSection, DefaultsConfig, ReportFormat, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{PagetrailError, Result};
pub use types::{CrawlResultMap, CrawlTarget, FetchResult, Link, PageResult};
