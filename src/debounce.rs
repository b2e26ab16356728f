//! Quiescence-window debouncing for free-text input.
//!
//! Every [`Debouncer::push`] cancels the previous pending timer and starts a
//! new one. When a timer survives the full window it sends a [`Settled`] on the
//! debouncer's channel; the owning loop hands it back to
//! [`Debouncer::accept`], which only lets the latest generation through.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A value that stayed unchanged for the whole quiescence window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    pub generation: u64,
    pub value: T,
}

pub struct Debouncer<T> {
    delay: Duration,
    generation: u64,
    pending: Option<CancellationToken>,
    settled: Option<T>,
    tx: mpsc::UnboundedSender<Settled<T>>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<Settled<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            generation: 0,
            pending: None,
            settled: None,
            tx,
        };
        (debouncer, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiescence window with a new value. Must be called from
    /// within a tokio runtime.
    pub fn push(&mut self, value: T) {
        self.cancel();
        self.generation += 1;

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let generation = self.generation;
        let delay = self.delay;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(generation, "debounce superseded");
                }
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the session was torn down
                    let _ = tx.send(Settled { generation, value });
                }
            }
        });
    }

    /// Accept a settled value if no newer push happened since it was scheduled.
    pub fn accept(&mut self, settled: Settled<T>) -> Option<T> {
        if settled.generation != self.generation {
            trace!(
                generation = settled.generation,
                current = self.generation,
                "dropping stale debounce emission"
            );
            return None;
        }
        self.pending = None;
        self.settled = Some(settled.value.clone());
        Some(settled.value)
    }

    /// Last accepted value; `None` until the first window has elapsed
    pub fn settled(&self) -> Option<&T> {
        self.settled.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending emission without scheduling a new one
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
