//! Message types for agent-to-agent communication
//!
//! This module defines the message envelope, its payload, the closed set of
//! order variants a payload can carry, and the addressing machinery
//! (identifier plus delivery capability) used to route results back to the
//! reporting agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique agent identifier, assigned monotonically by an
/// [`AgentIdAllocator`](crate::agent::AgentIdAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a non-blocking delivery attempt.
///
/// A full (or closed) mailbox drops the message; the sender learns about it
/// through this value instead of an always-true acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Message was enqueued in the recipient's mailbox.
    Accepted,
    /// Mailbox was full or closed; the message is gone.
    Dropped,
}

/// Delivery capability: anything that can report its identifier and accept
/// a message without blocking.
pub trait Addressable: Send + Sync + fmt::Debug {
    /// Identifier of this endpoint.
    fn id(&self) -> AgentId;

    /// Non-blocking enqueue of a message. Never waits; a full mailbox
    /// reports [`DeliveryStatus::Dropped`].
    fn deliver(&self, message: Message) -> DeliveryStatus;
}

/// Cloneable reference to an addressable agent.
///
/// This is what travels inside messages as the `from`/`to` fields and what
/// the execute stage uses to close the loop back to the reporting agent.
#[derive(Clone, Debug)]
pub struct AgentHandle(Arc<dyn Addressable>);

impl AgentHandle {
    pub fn new(inner: Arc<dyn Addressable>) -> Self {
        Self(inner)
    }

    pub fn id(&self) -> AgentId {
        self.0.id()
    }

    pub fn deliver(&self, message: Message) -> DeliveryStatus {
        self.0.deliver(message)
    }
}

impl PartialEq for AgentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for AgentHandle {}

/// Message envelope.
///
/// Immutable once constructed. `from` may be absent for system-originated
/// directives (the execute stage sends those); `to` is always present, a
/// message without a destination cannot be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Originating agent, if any.
    pub from: Option<AgentHandle>,
    /// Destination agent.
    pub to: AgentHandle,
    /// The order and its metadata.
    pub payload: Payload,
    /// When the message was constructed.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Build a message stamped with the current time.
    pub fn new(from: Option<AgentHandle>, to: AgentHandle, payload: Payload) -> Self {
        Self {
            from,
            to,
            payload,
            sent_at: Utc::now(),
        }
    }

    /// Identifier of the sender, when one is attached.
    pub fn sender_id(&self) -> Option<AgentId> {
        self.from.as_ref().map(AgentHandle::id)
    }
}

/// Payload carried by a [`Message`].
///
/// `quality` is carried through the pipeline untouched; no stage currently
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// The order variant determining which stage logic applies.
    pub order: Order,
    /// Quality-of-information marker, opaque to the pipeline.
    pub quality: i64,
    /// When the order was issued.
    pub issued_at: DateTime<Utc>,
    /// When the order was (or is expected to be) completed.
    pub completed_at: DateTime<Utc>,
}

impl Payload {
    /// Build a payload with both timestamps set to now.
    pub fn new(order: Order, quality: i64) -> Self {
        let now = Utc::now();
        Self {
            order,
            quality,
            issued_at: now,
            completed_at: now,
        }
    }
}

/// The closed set of orders a payload can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Order {
    /// Assign a confinement boundary to the sending agent.
    Boundary(Boundary),
    /// Report the sending agent's current location.
    Position(Position),
    /// Constrain the receiving agent's movement.
    Directive(Directive),
}

impl Order {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Order::Boundary(_) => "boundary",
            Order::Position(_) => "position",
            Order::Directive(_) => "directive",
        }
    }
}

/// Square confinement region an agent should remain within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    /// Half-width of the square.
    pub radius: i32,
    /// Center of the square.
    pub center: Position,
}

impl Boundary {
    pub fn new(radius: i32, center: Position) -> Self {
        Self { radius, center }
    }

    /// Boundary of the given radius centered at the origin.
    pub fn centered_at_origin(radius: i32) -> Self {
        Self::new(radius, Position::new(0, 0))
    }

    pub fn left_limit(&self) -> i32 {
        self.center.x - self.radius
    }

    pub fn right_limit(&self) -> i32 {
        self.center.x + self.radius
    }

    pub fn bottom_limit(&self) -> i32 {
        self.center.y - self.radius
    }

    pub fn top_limit(&self) -> i32 {
        self.center.y + self.radius
    }
}

/// Integer location on the walk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Four independent movement permissions.
///
/// No cross-direction invariant is enforced; all four may be false, which
/// halts the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub allow_north: bool,
    pub allow_south: bool,
    pub allow_east: bool,
    pub allow_west: bool,
}

impl Directive {
    pub fn new(allow_north: bool, allow_south: bool, allow_east: bool, allow_west: bool) -> Self {
        Self {
            allow_north,
            allow_south,
            allow_east,
            allow_west,
        }
    }

    /// All four directions permitted.
    pub fn unrestricted() -> Self {
        Self::new(true, true, true, true)
    }
}

impl Default for Directive {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Which pipeline stage produced an [`Action`].
///
/// Assessments and plans carry identical fields; the role tag is the only
/// difference, so both are one type instead of parallel single-field
/// hierarchies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRole {
    /// Output of the analyze stage.
    Assessment,
    /// Output of the policy-check stage onward.
    Plan,
}

/// A directive bound for a recipient, tagged with the stage role that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub directive: Directive,
    pub recipient: Option<AgentHandle>,
    pub role: ActionRole,
}

impl Action {
    /// Build an analyze-stage assessment.
    pub fn assessment(directive: Directive, recipient: Option<AgentHandle>) -> Self {
        Self {
            directive,
            recipient,
            role: ActionRole::Assessment,
        }
    }

    /// Promote an assessment to a plan, directive and recipient unchanged.
    pub fn into_plan(self) -> Self {
        Self {
            role: ActionRole::Plan,
            ..self
        }
    }
}
