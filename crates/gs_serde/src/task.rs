use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use async_task::Runnable;

// -----------------------------------------------------------------------------
// Task

/// Handle of a serializer call running on a worker thread.
///
/// Await it, or block on it with [`Task::wait`], to get the call's result.
///
/// The call is abandoned if the handle is dropped before the worker picks
/// it up. Use [`Task::detach`] to let it run unobserved, or
/// [`Task::cancel`] to abandon it and learn whether it already finished.
/// Once the worker is running the call, it always runs to completion.
#[must_use = "an unstarted call is abandoned when its `Task` is dropped, use `.detach()` to keep it"]
#[repr(transparent)]
pub struct Task<T>(async_task::Task<T>);

impl<T> Task<T> {
    /// Lets the call finish without anyone observing its result.
    #[inline]
    pub fn detach(self) {
        self.0.detach();
    }

    /// Abandons the call if it has not run yet.
    ///
    /// Returns the result if the call had already completed.
    #[inline]
    pub async fn cancel(self) -> Option<T> {
        self.0.cancel().await
    }

    /// Returns `true` once the call has produced its result.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    /// Blocks the current thread until the call returns.
    #[inline]
    pub fn wait(self) -> T {
        futures_lite::future::block_on(self)
    }
}

impl<T> Future for Task<T> {
    type Output = T;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("finished", &self.0.is_finished()).finish()
    }
}

/// Runs `f` on a new worker thread.
///
/// The closure holds everything the call needs, the caller's walker stays
/// usable while the task runs.
pub(crate) fn spawn<T, F>(f: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let schedule = |runnable: Runnable| {
        std::thread::spawn(move || {
            runnable.run();
        });
    };
    let (runnable, task) = async_task::spawn(async move { f() }, schedule);
    runnable.schedule();
    Task(task)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Task, spawn};

    #[test]
    fn handle_crosses_threads() {
        fn assert_thread_safe<T: Send + Sync>() {}
        assert_thread_safe::<Task<Result<Vec<u8>, crate::SerializeError>>>();
    }

    #[test]
    fn runs_off_thread() {
        let caller = std::thread::current().id();
        let task = spawn(move || std::thread::current().id() != caller);
        assert!(task.wait());
    }

    #[test]
    fn awaitable() {
        let task = spawn(|| 21 * 2);
        assert_eq!(futures_lite::future::block_on(async { task.await }), 42);
    }
}
