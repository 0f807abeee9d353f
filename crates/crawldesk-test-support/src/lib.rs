#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]

//! Shared test helpers used across the crawldesk suites.
//! Layout: fixtures.rs (JSON payload builders), scripted.rs (canned backend replies).

pub mod fixtures;
pub mod scripted;

pub use scripted::{RecordedCall, ScriptedBackend, ScriptedReply};
