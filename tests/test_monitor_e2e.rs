//! End-to-end tests for the monitor agent and its pipeline
//!
//! Covers the full loop: situations delivered to the monitor's mailbox,
//! batched through the seven stages, directives delivered back to the
//! reporting walker.

mod test_helpers;

use perimeter::agent::{AgentIdAllocator, MonitorAgent};
use perimeter::protocol::{Boundary, Directive, DeliveryStatus, Order, Position};
use perimeter::testing::mocks::RecordingAgent;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_directives(walker: &Arc<RecordingAgent>, count: usize) {
    for _ in 0..2000 {
        if walker.directives().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "timed out waiting for {count} directives, got {}",
        walker.directives().len()
    );
}

#[tokio::test(start_paused = true)]
async fn test_boundary_then_position_yields_expected_directive() {
    let allocator = AgentIdAllocator::new();
    let mut monitor = MonitorAgent::new(
        allocator.allocate(),
        Position::new(0, 0),
        test_helpers::test_config(),
    );
    let walker = RecordingAgent::new(allocator.allocate());

    // Agent reports Boundary(radius = 5, center = (0, 0)), then
    // Position(5, 0); both land in the first batch.
    let boundary = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Boundary(Boundary::centered_at_origin(5)),
    );
    let position = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Position(Position::new(5, 0)),
    );
    assert_eq!(monitor.handle().deliver(boundary), DeliveryStatus::Accepted);
    assert_eq!(monitor.handle().deliver(position), DeliveryStatus::Accepted);

    monitor.enable().expect("enable");
    wait_for_directives(&walker, 2).await;

    let directives = walker.directives();
    // Boundary acknowledgement: unrestricted.
    assert_eq!(directives[0], Directive::unrestricted());
    // At the east limit: east closed, everything else open.
    assert_eq!(directives[1], Directive::new(true, true, false, true));

    monitor.disable().await.expect("disable");
}

#[tokio::test(start_paused = true)]
async fn test_unknown_walker_gets_fallback_boundary() {
    let allocator = AgentIdAllocator::new();
    let mut monitor = MonitorAgent::new(
        allocator.allocate(),
        Position::new(0, 0),
        test_helpers::test_config(),
    );
    let walker = RecordingAgent::new(allocator.allocate());

    // No boundary reported; position one step west of origin touches the
    // default radius-1 boundary.
    let position = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Position(Position::new(-1, 0)),
    );
    monitor.handle().deliver(position);

    monitor.enable().expect("enable");
    wait_for_directives(&walker, 1).await;

    assert_eq!(
        walker.directives()[0],
        Directive::new(true, true, true, false)
    );

    monitor.disable().await.expect("disable");
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_processes_exactly_one_non_empty_batch() {
    let allocator = AgentIdAllocator::new();
    let mut monitor = MonitorAgent::new(
        allocator.allocate(),
        Position::new(0, 0),
        test_helpers::test_config(),
    );
    let walker = RecordingAgent::new(allocator.allocate());

    let first = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Position(Position::new(0, 0)),
    );
    monitor.handle().deliver(first);

    monitor.enable().expect("enable");
    wait_for_directives(&walker, 1).await;

    // The stages have retired; a second report produces no directive.
    let second = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Position(Position::new(-1, 0)),
    );
    monitor.handle().deliver(second);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(
        walker.directives().len(),
        1,
        "one-shot stages must not process a second batch"
    );

    monitor.disable().await.expect("disable");
}

#[tokio::test(start_paused = true)]
async fn test_filtered_out_orders_produce_no_directives() {
    let allocator = AgentIdAllocator::new();
    let mut monitor = MonitorAgent::new(
        allocator.allocate(),
        Position::new(0, 0),
        test_helpers::test_config(),
    );
    let walker = RecordingAgent::new(allocator.allocate());

    // A directive order is not a situation; the filter discards it.
    let noise = test_helpers::situation(
        &walker.handle(),
        &monitor.handle(),
        Order::Directive(Directive::unrestricted()),
    );
    monitor.handle().deliver(noise);

    monitor.enable().expect("enable");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(
        walker.directives().is_empty(),
        "a misrouted message manifests only as a missing update"
    );

    monitor.disable().await.expect("disable");
}
