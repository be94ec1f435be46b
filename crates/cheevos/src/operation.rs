//! Await/cancel handles for network-bound operations.
//!
//! A handle and its completer share one phase cell. Completion runs the
//! session mutation while holding that cell, so a concurrent
//! [`AsyncHandle::cancel`] either wins before the mutation (and nothing is
//! applied) or loses after it (and the result stands). Never both.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

enum Phase<T> {
    Pending,
    Cancelled,
    Done(Option<Result<T>>),
}

struct OpState<T> {
    phase: Mutex<Phase<T>>,
    ready: Condvar,
    on_cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

/// Eventual result of an asynchronous client operation.
pub struct AsyncHandle<T> {
    state: Arc<OpState<T>>,
}

/// Producer side of an [`AsyncHandle`]. Dropping it unresolved resolves the
/// handle with [`Error::Aborted`].
pub(crate) struct Completer<T> {
    state: Arc<OpState<T>>,
}

pub(crate) fn pair<T>() -> (AsyncHandle<T>, Completer<T>) {
    let state = Arc::new(OpState {
        phase: Mutex::new(Phase::Pending),
        ready: Condvar::new(),
        on_cancel: Mutex::new(None),
    });
    (
        AsyncHandle {
            state: Arc::clone(&state),
        },
        Completer { state },
    )
}

impl<T> AsyncHandle<T> {
    /// Request cancellation. Returns `true` if the operation had not
    /// completed yet; its result is then discarded and it resolves to
    /// [`Error::Aborted`].
    pub fn cancel(&self) -> bool {
        {
            let mut phase = self.state.phase.lock();
            match *phase {
                Phase::Pending => *phase = Phase::Cancelled,
                Phase::Cancelled => return true,
                Phase::Done(_) => return false,
            }
        }
        self.state.ready.notify_all();
        if let Some(hook) = self.state.on_cancel.lock().take() {
            hook();
        }
        true
    }

    /// Whether a result (or cancellation) is available.
    pub fn is_finished(&self) -> bool {
        !matches!(*self.state.phase.lock(), Phase::Pending)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.phase.lock(), Phase::Cancelled)
    }

    /// Block until the operation resolves.
    ///
    /// Must not be called from the thread the operation runs on (an inline
    /// executor has already finished by the time the handle is returned).
    pub fn wait(self) -> Result<T> {
        let mut phase = self.state.phase.lock();
        while matches!(*phase, Phase::Pending) {
            self.state.ready.wait(&mut phase);
        }
        take(&mut phase)
    }

    /// Block for at most `timeout`. Returns `None` if still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        let mut phase = self.state.phase.lock();
        if matches!(*phase, Phase::Pending) {
            let _ = self.state.ready.wait_for(&mut phase, timeout);
        }
        match *phase {
            Phase::Pending => None,
            _ => Some(take(&mut phase)),
        }
    }

    /// Take the result if it is available.
    pub fn try_result(&self) -> Option<Result<T>> {
        self.wait_timeout(Duration::ZERO)
    }
}

fn take<T>(phase: &mut Phase<T>) -> Result<T> {
    match phase {
        Phase::Done(result) => result.take().unwrap_or(Err(Error::Aborted)),
        _ => Err(Error::Aborted),
    }
}

impl<T> fmt::Debug for AsyncHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match *self.state.phase.lock() {
            Phase::Pending => "pending",
            Phase::Cancelled => "cancelled",
            Phase::Done(_) => "done",
        };
        f.debug_struct("AsyncHandle").field("phase", &phase).finish()
    }
}

impl<T> Completer<T> {
    /// Hook run once, after a successful `cancel`, outside the phase lock.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        *self.state.on_cancel.lock() = Some(Box::new(hook));
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.phase.lock(), Phase::Cancelled)
    }

    /// Run `apply` and store its result unless the handle was cancelled.
    ///
    /// `apply` runs with the phase locked; callers hold the session lock
    /// around this call so the mutation and the resolution are one step.
    /// Returns `false` (without running `apply`) if cancellation won.
    pub fn resolve(self, apply: impl FnOnce() -> Result<T>) -> bool {
        let applied = {
            let mut phase = self.state.phase.lock();
            match *phase {
                Phase::Pending => {
                    *phase = Phase::Done(Some(apply()));
                    true
                }
                _ => false,
            }
        };
        if applied {
            self.state.on_cancel.lock().take();
        }
        self.state.ready.notify_all();
        applied
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        let mut phase = self.state.phase.lock();
        if matches!(*phase, Phase::Pending) {
            *phase = Phase::Done(Some(Err(Error::Aborted)));
            drop(phase);
            self.state.ready.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_resolve_then_wait() {
        let (handle, completer) = pair::<u32>();
        assert!(!handle.is_finished());
        assert!(completer.resolve(|| Ok(7)));
        assert!(handle.is_finished());
        assert!(!handle.cancel());
        assert_eq!(handle.wait().unwrap(), 7);
    }

    #[test]
    fn test_cancel_wins_before_completion() {
        let (handle, completer) = pair::<u32>();
        let hooked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hooked);
        completer.on_cancel(move || flag.store(true, Ordering::SeqCst));

        assert!(handle.cancel());
        assert!(handle.cancel());
        assert!(hooked.load(Ordering::SeqCst));

        let applied = Arc::new(AtomicBool::new(false));
        let ran = Arc::clone(&applied);
        assert!(!completer.resolve(move || {
            ran.store(true, Ordering::SeqCst);
            Ok(1)
        }));
        assert!(!applied.load(Ordering::SeqCst));
        assert!(matches!(handle.wait(), Err(Error::Aborted)));
    }

    #[test]
    fn test_dropped_completer_aborts() {
        let (handle, completer) = pair::<()>();
        drop(completer);
        assert!(matches!(handle.try_result(), Some(Err(Error::Aborted))));
    }

    #[test]
    fn test_wait_across_threads() {
        let (handle, completer) = pair::<String>();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.resolve(|| Ok("done".to_string()));
        });
        assert_eq!(handle.wait().unwrap(), "done");
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_pending() {
        let (handle, _completer) = pair::<u8>();
        assert!(handle.wait_timeout(Duration::from_millis(5)).is_none());
    }
}
