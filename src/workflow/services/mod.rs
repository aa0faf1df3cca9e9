//! Application services for project and task lifecycle management.

mod lifecycle;

pub use lifecycle::{
    CreateTaskRequest, ReviseTaskRequest, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, TaskStatusChange,
};
