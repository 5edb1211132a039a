//! Serial background worker.
//!
//! A [`SerialQueue`] owns one piece of state, typically a store, on a
//! dedicated thread and runs submitted tasks against it one at a time in
//! submission order. Reads queued after a write therefore observe that write.
//! Tasks cannot be cancelled and have no timeout.

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Errors raised by [`SerialQueue`].
#[derive(Debug, Error)]
pub enum QueueError {
    /// The worker thread could not be started.
    #[error("failed to start worker thread {name:?}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The worker has stopped, usually because a task panicked.
    #[error("worker thread has stopped")]
    WorkerStopped,
}

/// Single-threaded task queue owning state `S`.
///
/// # Examples
/// ```
/// use mapnotes_core::SerialQueue;
///
/// # fn main() -> Result<(), mapnotes_core::QueueError> {
/// let queue = SerialQueue::spawn("counter", 0_u32)?;
/// queue.run(|count| *count += 1)?;
/// let seen = queue.submit(|count| *count)?.wait()?;
/// assert_eq!(seen, 1);
/// # Ok(())
/// # }
/// ```
pub struct SerialQueue<S> {
    sender: Option<mpsc::UnboundedSender<Task<S>>>,
    worker: Option<JoinHandle<()>>,
    name: String,
}

impl<S> fmt::Debug for SerialQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl<S: Send + 'static> SerialQueue<S> {
    /// Start a worker thread named `name` that owns `state`.
    ///
    /// # Errors
    /// Returns [`QueueError::Spawn`] when the thread cannot be created.
    pub fn spawn(name: impl Into<String>, state: S) -> Result<Self, QueueError> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task<S>>();
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut state = state;
                while let Some(task) = receiver.blocking_recv() {
                    task(&mut state);
                }
            })
            .map_err(|source| QueueError::Spawn {
                name: name.clone(),
                source,
            })?;
        debug!("started worker {name}");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            name,
        })
    }

    /// Queue `task` to run after every task submitted before it.
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerStopped`] when the worker is gone.
    pub fn submit<T, F>(&self, task: F) -> Result<Pending<T>, QueueError>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(QueueError::WorkerStopped)?;
        let (reply, receiver) = oneshot::channel();
        let job: Task<S> = Box::new(move |state| {
            // The caller may have dropped its `Pending`; the result is discarded then.
            let _ = reply.send(task(state));
        });
        sender.send(job).map_err(|_| QueueError::WorkerStopped)?;
        Ok(Pending { receiver })
    }

    /// Submit `task` and block until it has run.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerStopped`] when the worker is gone or the
    /// task panicked.
    pub fn run<T, F>(&self, task: F) -> Result<T, QueueError>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        self.submit(task)?.wait()
    }
}

impl<S> SerialQueue<S> {
    /// Whether the worker is still accepting tasks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }
}

impl<S> Drop for SerialQueue<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued tasks and exit.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("worker {} stopped after a task panicked", self.name);
        }
    }
}

/// Result of a submitted task.
#[derive(Debug)]
#[must_use = "a pending result does nothing unless waited on"]
pub struct Pending<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Pending<T> {
    /// Block the current thread until the task has run.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerStopped`] when the task never completed.
    pub fn wait(self) -> Result<T, QueueError> {
        self.receiver
            .blocking_recv()
            .map_err(|_| QueueError::WorkerStopped)
    }

    /// Wait for the task from async code.
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerStopped`] when the task never completed.
    pub async fn recv(self) -> Result<T, QueueError> {
        self.receiver.await.map_err(|_| QueueError::WorkerStopped)
    }
}
