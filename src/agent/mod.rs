//! Monitor agent lifecycle and ingestion loop
//!
//! A [`MonitorAgent`] is the addressable entity other agents deliver
//! observations to. While enabled it runs an ingestion loop: drain the
//! mailbox into a batch, hand the batch to the filter stage over a
//! rendezvous, sleep one batching window, repeat. The full stage graph is
//! built before the loop starts, so the topology exists up front rather
//! than unfolding as stages spawn successors.

pub mod mailbox;

use crate::agent_span;
use crate::config::MonitorConfig;
use crate::error::{AgentError, AgentResult};
use crate::exchange::Rendezvous;
use crate::pipeline::Pipeline;
use crate::protocol::{Addressable, AgentHandle, AgentId, DeliveryStatus, Message, Position};
use mailbox::{Mailbox, MailboxSender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

/// Monotonic identifier source, owned by whichever component creates
/// agents. Not a global: create one and thread it through.
#[derive(Debug, Default)]
pub struct AgentIdAllocator {
    next: AtomicU64,
}

impl AgentIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next identifier.
    pub fn allocate(&self) -> AgentId {
        AgentId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Mailbox-backed delivery endpoint for one agent.
#[derive(Debug)]
struct MailboxAddress {
    id: AgentId,
    sender: MailboxSender,
}

impl Addressable for MailboxAddress {
    fn id(&self) -> AgentId {
        self.id
    }

    fn deliver(&self, message: Message) -> DeliveryStatus {
        self.sender.deliver(message)
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    ingest: JoinHandle<()>,
    pipeline: Pipeline,
}

/// An agent that monitors mobile entities against their assigned
/// boundaries and answers with movement directives.
///
/// The lifecycle is enable once, disable once; a disabled agent stays
/// disabled. Messages may be delivered from the moment the agent is
/// constructed; they queue in the mailbox until the ingestion loop starts.
pub struct MonitorAgent {
    id: AgentId,
    position: Position,
    config: MonitorConfig,
    handle: AgentHandle,
    mailbox: Option<Mailbox>,
    running: Option<Running>,
}

impl MonitorAgent {
    /// Create a disabled monitor at the given reported position.
    pub fn new(id: AgentId, position: Position, config: MonitorConfig) -> Self {
        let mailbox = Mailbox::new(config.mailbox_capacity);
        let handle = AgentHandle::new(Arc::new(MailboxAddress {
            id,
            sender: mailbox.sender(),
        }));
        Self {
            id,
            position,
            config,
            handle,
            mailbox: Some(mailbox),
            running: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current reported position, for drivers and renderers.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Delivery capability other agents use to message this one.
    pub fn handle(&self) -> AgentHandle {
        self.handle.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.running.is_some()
    }

    /// Build the stage graph and start the ingestion loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enable(&mut self) -> AgentResult<()> {
        if self.running.is_some() {
            return Err(AgentError::AlreadyEnabled(self.id));
        }
        let mailbox = self
            .mailbox
            .take()
            .ok_or(AgentError::AlreadyEnabled(self.id))?;

        let (head, pipeline) = Pipeline::spawn(&self.config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let interval = self.config.batch_interval();
        let id = self.id;
        let ingest = tokio::spawn(
            ingestion_loop(mailbox, head, interval, shutdown_rx, id)
                .instrument(agent_span!(agent_id = %id)),
        );

        info!(agent_id = %self.id, "monitor agent enabled");
        self.running = Some(Running {
            shutdown: shutdown_tx,
            ingest,
            pipeline,
        });
        Ok(())
    }

    /// Stop the ingestion loop, clear the mailbox, and wait for the stage
    /// graph to unwind. Any in-flight rendezvous is abandoned.
    pub async fn disable(&mut self) -> AgentResult<()> {
        let running = self.running.take().ok_or(AgentError::NotEnabled(self.id))?;

        let _ = running.shutdown.send(true);
        running.ingest.await?;
        running.pipeline.join().await?;

        info!(agent_id = %self.id, "monitor agent disabled");
        Ok(())
    }
}

/// Drain-exchange-sleep loop feeding the filter stage.
///
/// The batch handed back by the stage is only the recycled empty list and
/// is discarded. Once the pipeline retires (one-shot stages), the exchange
/// reports a disconnect and the loop exits; from then on the mailbox is
/// closed and deliveries report [`DeliveryStatus::Dropped`].
async fn ingestion_loop(
    mut mailbox: Mailbox,
    mut head: Rendezvous<Vec<Message>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    id: AgentId,
) {
    loop {
        let batch = mailbox.drain();
        if !batch.is_empty() {
            debug!(agent_id = %id, count = batch.len(), "exchanging batch with filter stage");
        }

        tokio::select! {
            result = head.exchange(batch) => {
                if result.is_err() {
                    info!(agent_id = %id, "pipeline retired, ingestion loop exiting");
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }
    mailbox.clear();
}
