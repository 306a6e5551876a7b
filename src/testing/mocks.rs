//! Mock implementations for testing
//!
//! Provides [`Addressable`] doubles so pipeline and agent behavior can be
//! observed without wiring up real mobile entities.

use crate::protocol::{Addressable, AgentHandle, AgentId, DeliveryStatus, Directive, Message, Order};
use std::sync::{Arc, Mutex, PoisonError};

/// Test double that records every delivered message and always accepts.
#[derive(Debug)]
pub struct RecordingAgent {
    id: AgentId,
    delivered: Mutex<Vec<Message>>,
}

impl RecordingAgent {
    pub fn new(id: AgentId) -> Arc<Self> {
        Arc::new(Self {
            id,
            delivered: Mutex::new(Vec::new()),
        })
    }

    /// Delivery handle for wiring into messages and plans.
    pub fn handle(self: &Arc<Self>) -> AgentHandle {
        AgentHandle::new(Arc::clone(self) as Arc<dyn Addressable>)
    }

    /// Everything delivered so far, in arrival order.
    pub fn delivered(&self) -> Vec<Message> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the directive payloads, in arrival order.
    pub fn directives(&self) -> Vec<Directive> {
        self.delivered()
            .into_iter()
            .filter_map(|message| match message.payload.order {
                Order::Directive(directive) => Some(directive),
                _ => None,
            })
            .collect()
    }
}

impl Addressable for RecordingAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn deliver(&self, message: Message) -> DeliveryStatus {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        DeliveryStatus::Accepted
    }
}

/// Test double whose mailbox is permanently full: every delivery drops.
#[derive(Debug)]
pub struct RefusingAgent {
    id: AgentId,
}

impl RefusingAgent {
    pub fn new(id: AgentId) -> Arc<Self> {
        Arc::new(Self { id })
    }

    pub fn handle(self: &Arc<Self>) -> AgentHandle {
        AgentHandle::new(Arc::clone(self) as Arc<dyn Addressable>)
    }
}

impl Addressable for RefusingAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn deliver(&self, _message: Message) -> DeliveryStatus {
        DeliveryStatus::Dropped
    }
}
