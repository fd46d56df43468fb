//! The roadmap: phases, weeks, days, categories and tasks

pub mod builtin;
pub mod model;

pub use builtin::builtin;
pub use model::{Category, Curriculum, Day, DayKey, Difficulty, Phase, Task, TaskPath, Week};
