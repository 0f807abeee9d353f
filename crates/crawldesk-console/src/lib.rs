#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! Client-side state sync for the crawl operations dashboard.
//!
//! Keeps the task table, IP tables, access lists, IP policy and pool-stats card
//! consistent with a periodically polled REST backend while applying
//! optimistic local edits.
//!
//! Layout:
//! - `core/`: store, poll scheduler, notification sink and display helpers
//! - `features/`: per-domain normalization, validation and list operations
//! - `services/`: HTTP transport and the typed API gateway
//! - `app/`: sync engine, command dispatcher and the wired [`Dashboard`]
//! - `view.rs`: pure view models every render layer reads
//! - `cli.rs`, `commands/`, `client.rs`, `output.rs`: the terminal front-end
//! - `main.rs`: thin entrypoint delegating to `run()`

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod services;
pub mod view;

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;

#[cfg(test)]
pub(crate) mod testing;

pub use app::Dashboard;
pub use cli::run;
pub use error::{DashboardError, DashboardResult, ValidationError};
