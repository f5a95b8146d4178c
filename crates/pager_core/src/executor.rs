use std::thread;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Task-submission seam handed to the coalescer at construction.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs every task on the submitting thread before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Spawns a detached OS thread per task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExecutor;

impl TaskExecutor for ThreadExecutor {
    fn execute(&self, task: Task) {
        thread::spawn(task);
    }
}
