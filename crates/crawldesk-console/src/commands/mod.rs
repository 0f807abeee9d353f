//! Command handlers grouped by dashboard area.

pub(crate) mod ip;
pub(crate) mod tasks;
pub(crate) mod watch;
