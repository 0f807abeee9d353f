//! Core state: store, scheduler, notifications, identity, and pure helpers.

pub mod identity;
pub mod logic;
pub mod notify;
pub mod scheduler;
pub mod store;
