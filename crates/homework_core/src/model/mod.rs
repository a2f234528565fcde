pub mod catalog;
pub mod character;

pub use catalog::{Cadence, TaskDef, TaskKind};
pub use character::{Character, DailyState, DualField, DualState};
