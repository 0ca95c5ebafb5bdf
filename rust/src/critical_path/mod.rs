//! Critical Path Method over the validated task graph.
//!
//! A forward pass computes earliest start/finish, a backward pass computes
//! latest start/finish from the makespan, and tasks with zero total float
//! form the critical path. All four dependency types (FS, SS, FF, SF) and
//! signed lags are honored.

mod calculation;
mod types;

pub use calculation::calculate_critical_path;
pub use types::{CriticalPathResult, CriticalTask, TaskSlack, TaskTiming};
