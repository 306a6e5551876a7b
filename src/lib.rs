//! Perimeter - rendezvous-pipelined monitoring of spatial agents
//!
//! Autonomous spatial agents report boundary assignments and positions to a
//! monitor; a chain of concurrent stages (filter, triage, analyze,
//! policy-check, resource-check, authorize, execute) turns those reports
//! into movement directives and delivers them back. Every handoff between
//! stages is a synchronous two-party rendezvous; no shared mutable buffer
//! crosses a thread boundary.
//!
//! # Overview
//!
//! This crate provides:
//! - A synchronous two-party [`exchange::Rendezvous`] channel and the
//!   generic relay/sink stage run loops
//! - Per-agent bounded mailboxes with an explicit accept/drop delivery
//!   status
//! - The seven-stage pipeline assembly, built as a complete graph before
//!   any stage runs
//! - The [`agent::MonitorAgent`] lifecycle tying the mailbox, ingestion
//!   loop, and stage graph together
//!
//! # Quick Start
//!
//! ```rust
//! use perimeter::config::MonitorConfig;
//! use perimeter::agent::{AgentIdAllocator, MonitorAgent};
//! use perimeter::protocol::{Boundary, Message, Order, Payload, Position};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let allocator = AgentIdAllocator::new();
//! let mut monitor = MonitorAgent::new(
//!     allocator.allocate(),
//!     Position::new(0, 0),
//!     MonitorConfig::default(),
//! );
//!
//! // A boundary assignment queues until the agent is enabled.
//! let payload = Payload::new(Order::Boundary(Boundary::centered_at_origin(5)), 0);
//! monitor.handle().deliver(Message::new(None, monitor.handle(), payload));
//!
//! monitor.enable().expect("enable");
//! monitor.disable().await.expect("disable");
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod exchange;
pub mod observability;
pub mod pipeline;
pub mod protocol;
pub mod testing;

pub use agent::{AgentIdAllocator, MonitorAgent};
pub use config::MonitorConfig;
pub use error::{AgentError, AgentResult};
pub use exchange::{rendezvous, ExchangeError, Rendezvous};
pub use pipeline::Pipeline;
pub use protocol::*;
