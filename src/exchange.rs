//! Synchronous two-party rendezvous and the generic stage run loops
//!
//! A rendezvous is a single handoff point between exactly two fixed
//! participants. Neither side proceeds until both have called
//! [`Rendezvous::exchange`]; the handoff delivers each side the other's
//! value. There is no buffering and no queue of pending values.
//!
//! On top of the channel sit the two stage runners: [`relay`] receives a
//! batch, transforms it, and forwards the result to the next stage;
//! [`sink`] receives a batch and consumes it. Both follow the one-shot
//! retirement rule described on [`relay`].

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Error produced when an exchange cannot complete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// The peer endpoint was dropped, or abandoned the exchange mid-wait.
    #[error("peer disconnected before completing the exchange")]
    Disconnected,
}

enum Slot<T> {
    /// Nobody is waiting.
    Idle,
    /// One side has arrived and parked its value.
    Offered { value: T, reply: oneshot::Sender<T> },
    /// An endpoint is gone; every future exchange fails.
    Disconnected,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One endpoint of a two-party rendezvous.
///
/// Endpoints are deliberately not cloneable: the pair returned by
/// [`rendezvous`] is the complete set of participants for the channel's
/// lifetime. Dropping an endpoint disconnects the channel and wakes a
/// parked peer with [`ExchangeError::Disconnected`].
pub struct Rendezvous<T> {
    shared: Arc<Shared<T>>,
}

impl<T> fmt::Debug for Rendezvous<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.shared.lock() {
            Slot::Idle => "idle",
            Slot::Offered { .. } => "offered",
            Slot::Disconnected => "disconnected",
        };
        f.debug_struct("Rendezvous").field("state", &state).finish()
    }
}

/// Create the two endpoints of a rendezvous channel.
pub fn rendezvous<T: Send>() -> (Rendezvous<T>, Rendezvous<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Idle),
    });
    (
        Rendezvous {
            shared: Arc::clone(&shared),
        },
        Rendezvous { shared },
    )
}

impl<T: Send> Rendezvous<T> {
    /// Swap `value` with whatever the peer offers.
    ///
    /// Blocks until the peer also calls `exchange`. Each call is a single
    /// synchronization point; calls from the same two endpoints alternate
    /// strictly. If the calling future is dropped while parked, the peer's
    /// matching exchange fails with [`ExchangeError::Disconnected`].
    pub async fn exchange(&mut self, value: T) -> Result<T, ExchangeError> {
        let waiter = {
            let mut slot = self.shared.lock();
            match mem::replace(&mut *slot, Slot::Idle) {
                Slot::Idle => {
                    let (reply, waiter) = oneshot::channel();
                    *slot = Slot::Offered { value, reply };
                    waiter
                }
                Slot::Offered {
                    value: theirs,
                    reply,
                } => {
                    if reply.send(value).is_err() {
                        // Peer parked an offer, then its future was dropped.
                        *slot = Slot::Disconnected;
                        return Err(ExchangeError::Disconnected);
                    }
                    return Ok(theirs);
                }
                Slot::Disconnected => {
                    *slot = Slot::Disconnected;
                    return Err(ExchangeError::Disconnected);
                }
            }
        };

        waiter.await.map_err(|_| ExchangeError::Disconnected)
    }
}

impl<T> Drop for Rendezvous<T> {
    fn drop(&mut self) {
        // Dropping any parked offer here drops its reply sender, which
        // wakes the waiting peer with a disconnect error.
        *self.shared.lock() = Slot::Disconnected;
    }
}

/// Run a relaying pipeline stage.
///
/// Each cycle exchanges on `inbound` to receive a batch, applies
/// `transform` when the batch is non-empty, and exchanges the held
/// outbound batch on `outbound`. When the batch is empty the previously
/// held outbound batch is forwarded unchanged.
///
/// Retirement rule: the loop repeats only while the just-received inbound
/// batch was empty. Once one non-empty batch has been received and its
/// outbound exchange completed, the stage retires and the runner returns.
/// A transform failure is logged and the held outbound batch is forwarded
/// anyway, so the downstream peer is never left stranded mid-rendezvous.
pub async fn relay<I, O, F>(
    mut inbound: Rendezvous<Vec<I>>,
    mut outbound: Rendezvous<Vec<O>>,
    mut transform: F,
    stage: &'static str,
) where
    I: Send,
    O: Send,
    F: FnMut(Vec<I>) -> Result<Vec<O>, crate::error::AgentError>,
{
    let mut held: Vec<O> = Vec::new();
    loop {
        let batch = match inbound.exchange(Vec::new()).await {
            Ok(batch) => batch,
            Err(ExchangeError::Disconnected) => {
                debug!(stage, "inbound channel disconnected, stage exiting");
                return;
            }
        };
        let had_work = !batch.is_empty();

        if had_work {
            debug!(stage, count = batch.len(), "processing batch");
            match transform(batch) {
                Ok(produced) => held = produced,
                Err(e) => warn!(stage, error = %e, "batch processing failed"),
            }
        }

        held = match outbound.exchange(held).await {
            Ok(recycled) => recycled,
            Err(ExchangeError::Disconnected) => {
                debug!(stage, "outbound channel disconnected, stage exiting");
                return;
            }
        };

        if had_work {
            debug!(stage, "run loop has completed");
            return;
        }
    }
}

/// Run a terminal pipeline stage.
///
/// Same loop as [`relay`] but with no outbound channel: a non-empty batch
/// is handed to `consume` and the stage retires.
pub async fn sink<I, F>(mut inbound: Rendezvous<Vec<I>>, mut consume: F, stage: &'static str)
where
    I: Send,
    F: FnMut(Vec<I>) -> Result<(), crate::error::AgentError>,
{
    loop {
        let batch = match inbound.exchange(Vec::new()).await {
            Ok(batch) => batch,
            Err(ExchangeError::Disconnected) => {
                debug!(stage, "inbound channel disconnected, stage exiting");
                return;
            }
        };
        if batch.is_empty() {
            continue;
        }

        debug!(stage, count = batch.len(), "consuming batch");
        if let Err(e) = consume(batch) {
            warn!(stage, error = %e, "batch consumption failed");
        }

        debug!(stage, "run loop has completed");
        return;
    }
}
