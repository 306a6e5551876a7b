//! Data-model types exchanged between spatial agents
//!
//! Everything that crosses an agent boundary or a pipeline rendezvous is
//! defined here: the message envelope, the closed set of payload orders,
//! and the addressing types that let stages deliver results back to the
//! agent that reported them.

pub mod messages;

pub use messages::{
    Action, ActionRole, Addressable, AgentHandle, AgentId, Boundary, DeliveryStatus, Directive,
    Message, Order, Payload, Position,
};
