//! Pipeline orchestration for pagetrail.
//!
//! Ties the crawler and the report writers together into the end-to-end
//! `scrape_and_save` workflow used by the CLI.

pub mod pipeline;
