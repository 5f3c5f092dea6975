//! Execution contexts that callback invocations are submitted to.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use async_channel::{Receiver, Sender};
use async_lock::Mutex;
use log::{error, warn};

use crate::config::HandlerThreadConfig;
use crate::error::ErrorKind;
use crate::util::panic_message;
use crate::Result;

/// A unit of work submitted to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that accepts a unit of work and guarantees it eventually runs.
///
/// Implementations must not wait for the job to complete unless they run it in place.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

/// Runs a job, logging instead of unwinding if it panics.
fn run_job(job: Job) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
        error!("callback job panicked: {}", panic_message(payload.as_ref()));
    }
}

/// Runs every job immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        run_job(job)
    }
}

/// A dedicated worker thread running submitted jobs one at a time, in order.
pub struct HandlerThread {
    name: String,
    sender: Sender<Job>,
    worker_id: ThreadId,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HandlerThread {
    /// Spawns the worker thread.
    pub fn new(config: HandlerThreadConfig) -> Result<Self> {
        let (sender, receiver) = async_channel::unbounded::<Job>();
        let worker = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || {
                while let Ok(job) = receiver.recv_blocking() {
                    run_job(job);
                }
            })
            .map_err(|e| {
                crate::Error::new(
                    ErrorKind::Other,
                    None,
                    format!("failed to spawn handler thread `{}`: {e}", config.name),
                )
            })?;
        Ok(Self {
            name: config.name,
            sender,
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks if the thread still accepts jobs.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Stops accepting jobs, lets the queued ones finish and joins the worker.
    ///
    /// Concurrent callers all return only after the worker has exited. When called
    /// from a job running on this thread, the worker is not joined.
    pub fn quit(&self) {
        self.sender.close();
        if thread::current().id() == self.worker_id {
            return;
        }
        // The guard stays held across `join` so later callers wait for the drain.
        let mut worker = self.worker.lock_blocking();
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                error!("handler thread `{}` terminated abnormally", self.name);
            }
        }
    }
}

impl Executor for HandlerThread {
    fn execute(&self, job: Job) {
        if self.sender.try_send(job).is_err() {
            warn!("dropped a job posted to stopped handler thread `{}`", self.name);
        }
    }
}

impl Drop for HandlerThread {
    fn drop(&mut self) {
        self.quit();
    }
}

impl std::fmt::Debug for HandlerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerThread")
            .field("name", &self.name)
            .field("pending", &self.sender.len())
            .finish()
    }
}

/// A job queue drained by whichever async task awaits [`TaskQueue::run`].
pub struct TaskQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }

    /// Number of jobs waiting to run.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Runs queued jobs as they arrive, until the queue is closed and drained.
    pub async fn run(&self) {
        while let Ok(job) = self.receiver.recv().await {
            run_job(job);
        }
    }

    /// Runs the jobs queued right now without waiting for more. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.receiver.try_recv() {
            run_job(job);
            count += 1;
        }
        count
    }

    /// Stops accepting jobs; [`TaskQueue::run`] returns once the remaining ones ran.
    pub fn close(&self) {
        self.sender.close();
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for TaskQueue {
    fn execute(&self, job: Job) {
        if self.sender.try_send(job).is_err() {
            warn!("dropped a job posted to closed task queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn inline_executor_survives_panicking_job() {
        let ran = Arc::new(AtomicUsize::new(0));
        InlineExecutor.execute(Box::new(|| panic!("boom")));
        let ran2 = ran.clone();
        InlineExecutor.execute(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_thread_runs_jobs_in_order_on_named_thread() {
        let handler =
            HandlerThread::new(HandlerThreadConfig::default().with_name("hap-callbacks")).unwrap();
        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            handler.execute(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                tx.send((i, name)).unwrap();
            }));
        }
        handler.quit();
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received.len(), 5);
        for (i, (n, name)) in received.into_iter().enumerate() {
            assert_eq!(n, i);
            assert_eq!(name.as_deref(), Some("hap-callbacks"));
        }
    }

    #[test]
    fn handler_thread_keeps_running_after_panic() {
        let handler = HandlerThread::new(HandlerThreadConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        handler.execute(Box::new(|| panic!("callback failure")));
        handler.execute(Box::new(move || tx.send(()).unwrap()));
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
        assert!(handler.is_running());
    }

    #[test]
    fn handler_thread_drops_jobs_after_quit() {
        let handler = HandlerThread::new(HandlerThreadConfig::default()).unwrap();
        handler.quit();
        assert!(!handler.is_running());
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        handler.execute(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_quit_waits_for_queued_jobs() {
        use std::sync::atomic::AtomicBool;
        use std::time::Duration;

        let handler = Arc::new(HandlerThread::new(HandlerThreadConfig::default()).unwrap());
        let done = Arc::new(AtomicBool::new(false));
        let done2 = done.clone();
        handler.execute(Box::new(move || {
            thread::sleep(Duration::from_millis(300));
            done2.store(true, Ordering::SeqCst);
        }));

        let first = {
            let handler = handler.clone();
            thread::spawn(move || handler.quit())
        };
        thread::sleep(Duration::from_millis(50));
        handler.quit();
        assert!(done.load(Ordering::SeqCst));
        first.join().unwrap();
    }

    #[test]
    fn quit_from_own_job_does_not_deadlock() {
        let handler = Arc::new(HandlerThread::new(HandlerThreadConfig::default()).unwrap());
        let (tx, rx) = mpsc::channel();
        let inner = handler.clone();
        handler.execute(Box::new(move || {
            inner.quit();
            tx.send(()).unwrap();
        }));
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
        handler.quit();
        assert!(!handler.is_running());
    }

    #[test]
    fn task_queue_runs_only_when_drained() {
        let queue = TaskQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let ran = ran.clone();
            queue.execute(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn task_queue_run_returns_after_close() {
        let queue = TaskQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        queue.execute(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        }));
        queue.close();
        futures_lite::future::block_on(queue.run());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
