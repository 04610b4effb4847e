use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::{mpsc, oneshot};

use super::message::CoordinationMessage;
use crate::error::{LoaderError, Result};
use crate::observability::JobEvent;

/// Owns the coordination OS thread.
///
/// Dropping it asks the thread to stop after the messages already queued;
/// [`CoordinationThread::shutdown`] additionally waits for it.
pub struct CoordinationThread {
    handle: CoordinationHandle,
    join: Option<JoinHandle<()>>,
}

impl CoordinationThread {
    /// Spawn a named coordination thread.
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<CoordinationMessage>();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(rx))
            .map_err(|error| LoaderError::CoordinationSpawn(error.to_string()))?;
        let handle = CoordinationHandle {
            tx,
            thread_id: join.thread().id(),
        };
        Ok(Self {
            handle,
            join: Some(join),
        })
    }

    /// Clonable handle for posting work to this thread.
    #[must_use]
    pub fn handle(&self) -> CoordinationHandle {
        self.handle.clone()
    }

    /// Stop the thread and wait for it.
    ///
    /// Returns the panic payload if the thread died, e.g. on a fatal
    /// delivery error.
    pub fn shutdown(mut self) -> thread::Result<()> {
        let _ = self.handle.send(CoordinationMessage::Shutdown);
        match self.join.take() {
            Some(join) => join.join(),
            None => Ok(()),
        }
    }
}

impl Drop for CoordinationThread {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.handle.send(CoordinationMessage::Shutdown);
        }
    }
}

impl std::fmt::Debug for CoordinationThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationThread")
            .field("thread_id", &self.handle.thread_id)
            .finish_non_exhaustive()
    }
}

/// Posts work onto the coordination thread.
#[derive(Clone)]
pub struct CoordinationHandle {
    tx: mpsc::UnboundedSender<CoordinationMessage>,
    thread_id: ThreadId,
}

impl CoordinationHandle {
    /// Whether the caller is running on the coordination thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Whether the thread still accepts messages.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue `task` behind every message already posted.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        self.send(CoordinationMessage::Run(Box::new(task)))
    }

    /// Run `task` on the coordination thread and block until it returns.
    ///
    /// Runs inline when already on the coordination thread. Must not be
    /// called from inside an async context; use [`CoordinationHandle::run`].
    pub fn call<T: Send + 'static>(&self, task: impl FnOnce() -> T + Send + 'static) -> Result<T> {
        if self.is_current() {
            return Ok(task());
        }
        let (tx, rx) = oneshot::channel();
        self.post(move || {
            let _ = tx.send(task());
        })?;
        rx.blocking_recv()
            .map_err(|_| LoaderError::CoordinationClosed)
    }

    /// Async flavour of [`CoordinationHandle::call`].
    pub async fn run<T: Send + 'static>(
        &self,
        task: impl FnOnce() -> T + Send + 'static,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.post(move || {
            let _ = tx.send(task());
        })?;
        rx.await.map_err(|_| LoaderError::CoordinationClosed)
    }

    pub(crate) fn ensure_current(&self, operation: &'static str) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(LoaderError::NotOnCoordinationThread { operation })
        }
    }

    pub(crate) fn send(&self, message: CoordinationMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| LoaderError::CoordinationClosed)
    }
}

impl std::fmt::Debug for CoordinationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationHandle")
            .field("thread_id", &self.thread_id)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run_loop(mut rx: mpsc::UnboundedReceiver<CoordinationMessage>) {
    tracing::debug!(
        event = JobEvent::CoordinationStarted.as_str(),
        thread = thread::current().name().unwrap_or("unnamed"),
        "coordination thread started"
    );

    while let Some(message) = rx.blocking_recv() {
        let delivered = match message {
            CoordinationMessage::Complete(target) => target
                .handle_result()
                .map_err(|error| (target.key().clone(), error)),
            CoordinationMessage::Exception(target) => target
                .handle_failure()
                .map_err(|error| (target.key().clone(), error)),
            CoordinationMessage::Run(task) => {
                task();
                Ok(())
            }
            CoordinationMessage::Shutdown => break,
        };

        if let Err((key, error)) = delivered {
            tracing::error!(
                event = JobEvent::CoordinationFatal.as_str(),
                key = %key,
                error = %error,
                "coordination thread hit an internal consistency error"
            );
            panic!("{error}");
        }
    }

    tracing::debug!(
        event = JobEvent::CoordinationStopped.as_str(),
        "coordination thread stopped"
    );
}
