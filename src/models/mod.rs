mod task;
mod user;

pub use task::{CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest};
pub use user::{CreateUserRequest, User};
