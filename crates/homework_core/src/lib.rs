pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod schedule;
pub mod storage;
pub mod store;

pub use error::AppError;
pub use schedule::ResetSchedule;
pub use store::{ResetOutcome, TaskStore, TaskView};
