mod task;

pub(crate) use task::iso_date;
pub use task::{ClockTime, Priority, Task, new_task_id};
