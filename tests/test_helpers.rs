//! Shared helpers for integration tests

use perimeter::config::MonitorConfig;
use perimeter::protocol::{AgentHandle, Message, Order, Payload};

/// Configuration with a short batching window so real-time tests stay fast.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        mailbox_capacity: 100,
        batch_interval_ms: 5,
        default_boundary_radius: 1,
    }
}

/// Build a situation message from `from` to `to`.
pub fn situation(from: &AgentHandle, to: &AgentHandle, order: Order) -> Message {
    Message::new(Some(from.clone()), to.clone(), Payload::new(order, 0))
}
