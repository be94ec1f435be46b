//! Where network-bound work runs.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::error;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs client tasks off the frame thread.
pub trait Executor: Send + Sync {
    /// Run `task`. `name` identifies the operation for diagnostics.
    fn spawn(&self, name: &str, task: Task);
}

/// One named thread per task.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn spawn(&self, name: &str, task: Task) {
        // the builder consumes the task only on success, so keep a slot to
        // fall back on
        let slot = Arc::new(Mutex::new(Some(task)));
        let worker = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name(format!("cheevos-{name}"))
            .spawn(move || {
                let task = worker.lock().take();
                if let Some(task) = task {
                    task();
                }
            });
        if let Err(e) = spawned {
            error!("Failed to spawn {} thread: {}, running inline", name, e);
            let task = slot.lock().take();
            if let Some(task) = task {
                task();
            }
        }
    }
}

/// Runs tasks on the calling thread before `spawn` returns.
///
/// Operations complete before their handle is returned, so there is no
/// window for cancellation. Intended for hosts with their own threading and
/// for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn spawn(&self, _name: &str, task: Task) {
        task();
    }
}
