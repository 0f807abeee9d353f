//! Per-domain feature surfaces: tasks and IP management.

pub mod ip;
pub mod tasks;
