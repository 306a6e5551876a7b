//! Per-stage transform logic
//!
//! Each function here is the pure body of one pipeline stage; the run-loop
//! mechanics live in [`crate::exchange`]. Ordering within a batch is
//! preserved by every stage except triage, which partitions boundaries
//! ahead of positions.

use crate::protocol::{Action, Boundary, Directive, Message, Order, Payload, Position};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Filter stage: keep only the order variants the pipeline understands.
///
/// Boundary and position reports pass; anything else is discarded. This is
/// a routing decision, not an error.
pub fn filter_messages(batch: Vec<Message>) -> Vec<Message> {
    let before = batch.len();
    let kept: Vec<Message> = batch
        .into_iter()
        .filter(|message| {
            matches!(
                message.payload.order,
                Order::Boundary(_) | Order::Position(_)
            )
        })
        .collect();
    debug!(kept = kept.len(), discarded = before - kept.len(), "filtered batch");
    kept
}

/// Triage stage: stable-partition so every boundary assignment precedes
/// every position report. A boundary and a position for the same agent in
/// one batch must resolve against the new boundary, not the old one.
pub fn triage_messages(batch: Vec<Message>) -> Vec<Message> {
    let mut boundaries = Vec::new();
    let mut positions = Vec::new();

    for message in batch {
        match message.payload.order {
            Order::Boundary(_) => boundaries.push(message),
            Order::Position(_) => positions.push(message),
            // Filter upstream should have removed these already.
            _ => {}
        }
    }

    debug!(
        boundaries = boundaries.len(),
        positions = positions.len(),
        "triaged batch, boundaries first"
    );
    boundaries.extend(positions);
    boundaries
}

/// Analyze stage: resolve each situation into an assessment.
///
/// Owns the boundary table, the only durable state in the pipeline. It is
/// touched by no other stage, so it needs no synchronization.
pub struct Analyzer {
    boundaries: HashMap<crate::protocol::AgentId, Boundary>,
    fallback_radius: i32,
}

impl Analyzer {
    /// `fallback_radius` is used when a position arrives for an agent with
    /// no recorded boundary.
    pub fn new(fallback_radius: i32) -> Self {
        Self {
            boundaries: HashMap::new(),
            fallback_radius,
        }
    }

    /// Produce one assessment per resolvable message, in input order.
    ///
    /// A message without a sender, or with an order no analysis applies
    /// to, is consumed silently; no assessment is emitted and no error is
    /// surfaced.
    pub fn analyze(&mut self, batch: Vec<Message>) -> Vec<Action> {
        let mut assessments = Vec::new();

        for message in batch {
            let Some(sender_id) = message.sender_id() else {
                debug!(
                    order = message.payload.order.kind(),
                    "situation has no sender, consuming without assessment"
                );
                continue;
            };

            match message.payload.order {
                Order::Boundary(boundary) => {
                    debug!(agent_id = %sender_id, radius = boundary.radius, "recording boundary");
                    self.boundaries.insert(sender_id, boundary);
                    assessments.push(Action::assessment(Directive::unrestricted(), message.from));
                }
                Order::Position(position) => {
                    let boundary = match self.boundaries.get(&sender_id) {
                        Some(boundary) => *boundary,
                        None => {
                            warn!(
                                agent_id = %sender_id,
                                fallback_radius = self.fallback_radius,
                                "no boundary recorded, using fallback"
                            );
                            Boundary::centered_at_origin(self.fallback_radius)
                        }
                    };
                    let directive = assess_position(&boundary, position);
                    assessments.push(Action::assessment(directive, message.from));
                }
                _ => {
                    debug!(
                        order = message.payload.order.kind(),
                        "unexpected order at analyze, consuming without assessment"
                    );
                }
            }
        }

        assessments
    }
}

/// Test each axis independently against the boundary limits.
///
/// A step toward a limit is forbidden once the next cell would reach or
/// pass it, and only while the agent sits on that limit's side of center.
fn assess_position(boundary: &Boundary, position: Position) -> Directive {
    let mut directive = Directive::unrestricted();

    if position.x < boundary.center.x && position.x - 1 <= boundary.left_limit() {
        directive.allow_west = false;
        debug!(x = position.x, "west movement disallowed");
    } else if position.x > boundary.center.x && position.x + 1 >= boundary.right_limit() {
        directive.allow_east = false;
        debug!(x = position.x, "east movement disallowed");
    }

    if position.y < boundary.center.y && position.y - 1 <= boundary.bottom_limit() {
        directive.allow_south = false;
        debug!(y = position.y, "south movement disallowed");
    } else if position.y > boundary.center.y && position.y + 1 >= boundary.top_limit() {
        directive.allow_north = false;
        debug!(y = position.y, "north movement disallowed");
    }

    directive
}

/// Policy-check stage: assessments become plans.
///
/// Placeholder for future policy logic; directive and recipient pass
/// through unchanged.
pub fn check_policies(assessments: Vec<Action>) -> Vec<Action> {
    debug!(count = assessments.len(), "checking courses of action against policies");
    assessments.into_iter().map(Action::into_plan).collect()
}

/// Resource-check stage: placeholder for future resource accounting.
pub fn check_resources(plans: Vec<Action>) -> Vec<Action> {
    debug!(count = plans.len(), "checking resources for plans");
    plans
}

/// Authorize stage: placeholder for future authorization logic.
pub fn authorize_plans(plans: Vec<Action>) -> Vec<Action> {
    debug!(count = plans.len(), "authorizing plans");
    plans
}

/// Execute stage: wrap each plan's directive in a fresh message and
/// deliver it to the recipient, closing the loop back to the reporting
/// agent's mailbox. Plans without a recipient are skipped.
pub fn execute_plans(plans: Vec<Action>) {
    debug!(count = plans.len(), "executing plans");

    for plan in plans {
        let Some(recipient) = plan.recipient else {
            continue;
        };

        let payload = Payload::new(Order::Directive(plan.directive), 0);
        let message = Message::new(None, recipient.clone(), payload);

        match recipient.deliver(message) {
            crate::protocol::DeliveryStatus::Accepted => {
                debug!(recipient = %recipient.id(), "directive delivered")
            }
            crate::protocol::DeliveryStatus::Dropped => {
                warn!(recipient = %recipient.id(), "directive dropped, recipient mailbox full")
            }
        }
    }
}
