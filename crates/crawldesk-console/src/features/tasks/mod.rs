//! Task feature surface: canonical model, normalization, and commands.

pub mod actions;
pub mod normalize;
pub mod state;

pub use normalize::normalize_task;
pub use state::{Task, TaskSchedule, TaskStatus, TaskType};
