pub mod calendar;
pub mod macros;
pub mod task;
pub mod time;
pub mod work;

pub use calendar::*;
pub use macros::{BugId, CategoryId, ProjectId, ResourceId};
pub use task::*;
pub use time::*;
pub use work::*;
