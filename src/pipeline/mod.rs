//! Stage assembly: the seven-stage monitoring pipeline
//!
//! Observations flow filter → triage → analyze → policy-check →
//! resource-check → authorize → execute, one tokio task per stage, every
//! handoff a two-party rendezvous. The whole graph is constructed before
//! any stage runs, so the topology is fixed and inspectable rather than
//! unfolding as stages spawn their successors.
//!
//! Every stage follows the one-shot retirement rule of
//! [`relay`](crate::exchange::relay): it processes exactly one non-empty
//! batch, forwards it, and exits. An idle pipeline (empty batches) cycles
//! indefinitely.

pub mod stages;

use crate::config::MonitorConfig;
use crate::exchange::{relay, rendezvous, sink, Rendezvous};
use crate::protocol::{Action, Message};
use crate::stage_span;
use stages::{
    authorize_plans, check_policies, check_resources, execute_plans, filter_messages,
    triage_messages, Analyzer,
};
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};

/// Running stage graph for one monitor agent.
///
/// Dropping the head endpoint returned by [`Pipeline::spawn`] unwinds the
/// graph: each stage observes its inbound rendezvous disconnect and exits.
pub struct Pipeline {
    stage_tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Pipeline {
    /// Build all channels, spawn all stage tasks, and return the head
    /// endpoint the ingestion loop exchanges batches with.
    pub fn spawn(config: &MonitorConfig) -> (Rendezvous<Vec<Message>>, Pipeline) {
        let (head, filter_in) = rendezvous::<Vec<Message>>();
        let (filter_out, triage_in) = rendezvous::<Vec<Message>>();
        let (triage_out, analyze_in) = rendezvous::<Vec<Message>>();
        let (analyze_out, policy_in) = rendezvous::<Vec<Action>>();
        let (policy_out, resource_in) = rendezvous::<Vec<Action>>();
        let (resource_out, authorize_in) = rendezvous::<Vec<Action>>();
        let (authorize_out, execute_in) = rendezvous::<Vec<Action>>();

        let mut analyzer = Analyzer::new(config.default_boundary_radius);

        let stage_tasks = vec![
            (
                "filter",
                tokio::spawn(
                    relay(
                        filter_in,
                        filter_out,
                        |batch| Ok(filter_messages(batch)),
                        "filter",
                    )
                    .instrument(stage_span!(stage = "filter")),
                ),
            ),
            (
                "triage",
                tokio::spawn(
                    relay(
                        triage_in,
                        triage_out,
                        |batch| Ok(triage_messages(batch)),
                        "triage",
                    )
                    .instrument(stage_span!(stage = "triage")),
                ),
            ),
            (
                "analyze",
                tokio::spawn(
                    relay(
                        analyze_in,
                        analyze_out,
                        move |batch| Ok(analyzer.analyze(batch)),
                        "analyze",
                    )
                    .instrument(stage_span!(stage = "analyze")),
                ),
            ),
            (
                "policy",
                tokio::spawn(
                    relay(
                        policy_in,
                        policy_out,
                        |batch| Ok(check_policies(batch)),
                        "policy",
                    )
                    .instrument(stage_span!(stage = "policy")),
                ),
            ),
            (
                "resource",
                tokio::spawn(
                    relay(
                        resource_in,
                        resource_out,
                        |batch| Ok(check_resources(batch)),
                        "resource",
                    )
                    .instrument(stage_span!(stage = "resource")),
                ),
            ),
            (
                "authorize",
                tokio::spawn(
                    relay(
                        authorize_in,
                        authorize_out,
                        |batch| Ok(authorize_plans(batch)),
                        "authorize",
                    )
                    .instrument(stage_span!(stage = "authorize")),
                ),
            ),
            (
                "execute",
                tokio::spawn(
                    sink(
                        execute_in,
                        |batch| {
                            execute_plans(batch);
                            Ok(())
                        },
                        "execute",
                    )
                    .instrument(stage_span!(stage = "execute")),
                ),
            ),
        ];

        debug!(stages = stage_tasks.len(), "pipeline stage graph spawned");
        (head, Pipeline { stage_tasks })
    }

    /// Names of the spawned stages, in pipeline order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stage_tasks.iter().map(|(name, _)| *name).collect()
    }

    /// Wait for every stage task to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        for (name, task) in self.stage_tasks {
            task.await?;
            debug!(stage = name, "stage task joined");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AgentId, Boundary, Directive, Order, Payload, Position};
    use crate::testing::mocks::RecordingAgent;

    fn spawn_default() -> (Rendezvous<Vec<Message>>, Pipeline) {
        Pipeline::spawn(&MonitorConfig::default())
    }

    #[tokio::test]
    async fn test_stage_graph_has_seven_stages_in_order() {
        let (_head, pipeline) = spawn_default();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "filter",
                "triage",
                "analyze",
                "policy",
                "resource",
                "authorize",
                "execute"
            ]
        );
    }

    #[tokio::test]
    async fn test_dropping_head_unwinds_the_graph() {
        let (head, pipeline) = spawn_default();
        drop(head);
        pipeline.join().await.expect("all stages should exit");
    }

    #[tokio::test]
    async fn test_batch_flows_end_to_end_and_closes_the_loop() {
        let (mut head, pipeline) = spawn_default();
        let walker = RecordingAgent::new(AgentId(1));
        let monitor = RecordingAgent::new(AgentId(2));

        let batch = vec![
            Message::new(
                Some(walker.handle()),
                monitor.handle(),
                Payload::new(Order::Boundary(Boundary::centered_at_origin(5)), 0),
            ),
            Message::new(
                Some(walker.handle()),
                monitor.handle(),
                Payload::new(Order::Position(Position::new(5, 0)), 0),
            ),
        ];

        head.exchange(batch).await.expect("head exchange");
        pipeline.join().await.expect("pipeline retires after one batch");

        let delivered = walker.delivered();
        assert_eq!(delivered.len(), 2, "one directive per situation");

        // Boundary acknowledgement first (triage order preserved end to end).
        match delivered[0].payload.order {
            Order::Directive(d) => assert_eq!(d, Directive::unrestricted()),
            _ => panic!("expected a directive"),
        }
        // Position at the east limit closes east.
        match delivered[1].payload.order {
            Order::Directive(d) => assert_eq!(d, Directive::new(true, true, false, true)),
            _ => panic!("expected a directive"),
        }
    }

    #[tokio::test]
    async fn test_empty_batches_keep_pipeline_alive() {
        let (mut head, pipeline) = spawn_default();

        for _ in 0..3 {
            head.exchange(Vec::new())
                .await
                .expect("empty exchange should cycle");
        }

        drop(head);
        pipeline.join().await.expect("graph unwinds");
    }

    #[tokio::test]
    async fn test_second_batch_after_retirement_finds_no_pipeline() {
        let (mut head, pipeline) = spawn_default();
        let walker = RecordingAgent::new(AgentId(1));
        let monitor = RecordingAgent::new(AgentId(2));

        let first = vec![Message::new(
            Some(walker.handle()),
            monitor.handle(),
            Payload::new(Order::Boundary(Boundary::centered_at_origin(5)), 0),
        )];
        head.exchange(first).await.expect("first batch accepted");
        pipeline.join().await.expect("pipeline retires");

        let second = vec![Message::new(
            Some(walker.handle()),
            monitor.handle(),
            Payload::new(Order::Position(Position::new(1, 1)), 0),
        )];
        assert!(
            head.exchange(second).await.is_err(),
            "retired pipeline must not accept another batch"
        );
        // Only the directive from the first batch ever arrived.
        assert_eq!(walker.delivered().len(), 1);
    }
}
