//! Bounded per-agent inbound queue
//!
//! Delivery is a non-blocking enqueue; when the queue is full the newest
//! message is dropped and the sender sees [`DeliveryStatus::Dropped`].
//! The ingestion loop drains all currently queued messages at once,
//! preserving arrival order.

use crate::protocol::{DeliveryStatus, Message};
use tokio::sync::mpsc;
use tracing::debug;

/// Bounded FIFO mailbox for one agent.
pub struct Mailbox {
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
}

impl Mailbox {
    /// Create a mailbox with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx }
    }

    /// A sender half for building delivery handles.
    pub fn sender(&self) -> MailboxSender {
        MailboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Remove and return every currently queued message, oldest first.
    /// Never waits for more messages to arrive.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut batch = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            batch.push(message);
        }
        batch
    }

    /// Discard all queued messages.
    pub fn clear(&mut self) {
        let discarded = self.drain().len();
        if discarded > 0 {
            debug!(discarded, "cleared unconsumed mailbox messages");
        }
    }
}

/// Cloneable delivery half of a [`Mailbox`].
#[derive(Clone, Debug)]
pub struct MailboxSender {
    tx: mpsc::Sender<Message>,
}

impl MailboxSender {
    /// Non-blocking enqueue. A full or closed mailbox drops the message.
    pub fn deliver(&self, message: Message) -> DeliveryStatus {
        match self.tx.try_send(message) {
            Ok(()) => DeliveryStatus::Accepted,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("mailbox full, dropping newest message");
                DeliveryStatus::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("mailbox closed, dropping message");
                DeliveryStatus::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AgentId, Order, Payload, Position};
    use crate::testing::mocks::RecordingAgent;

    fn position_message(n: i32) -> Message {
        let to = RecordingAgent::new(AgentId(0));
        Message::new(
            None,
            to.handle(),
            Payload::new(Order::Position(Position::new(n, 0)), 0),
        )
    }

    #[tokio::test]
    async fn test_deliver_and_drain_preserves_order() {
        let mut mailbox = Mailbox::new(10);
        let sender = mailbox.sender();

        for n in 0..3 {
            assert_eq!(sender.deliver(position_message(n)), DeliveryStatus::Accepted);
        }

        let batch = mailbox.drain();
        let xs: Vec<i32> = batch
            .iter()
            .map(|m| match m.payload.order {
                Order::Position(p) => p.x,
                _ => panic!("unexpected order"),
            })
            .collect();
        assert_eq!(xs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_overflow_drops_newest_and_keeps_oldest_hundred() {
        let mut mailbox = Mailbox::new(100);
        let sender = mailbox.sender();

        let mut dropped = 0;
        for n in 0..101 {
            if sender.deliver(position_message(n)) == DeliveryStatus::Dropped {
                dropped += 1;
            }
        }
        assert_eq!(dropped, 1);

        let batch = mailbox.drain();
        assert_eq!(batch.len(), 100);
        // Oldest message retained, the 101st was the one dropped.
        match batch[0].payload.order {
            Order::Position(p) => assert_eq!(p.x, 0),
            _ => panic!("unexpected order"),
        }
        match batch[99].payload.order {
            Order::Position(p) => assert_eq!(p.x, 99),
            _ => panic!("unexpected order"),
        }
    }

    #[tokio::test]
    async fn test_drain_on_empty_mailbox_returns_empty_batch() {
        let mut mailbox = Mailbox::new(4);
        assert!(mailbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_clear_discards_queued_messages() {
        let mut mailbox = Mailbox::new(4);
        let sender = mailbox.sender();
        sender.deliver(position_message(1));
        sender.deliver(position_message(2));

        mailbox.clear();
        assert!(mailbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_after_mailbox_dropped_reports_dropped() {
        let mailbox = Mailbox::new(4);
        let sender = mailbox.sender();
        drop(mailbox);

        assert_eq!(sender.deliver(position_message(1)), DeliveryStatus::Dropped);
    }
}
