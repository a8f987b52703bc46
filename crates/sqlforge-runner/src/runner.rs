//! The model execution loop

use sqlforge_adapter::{AdapterError, DatabaseAdapter};
use sqlforge_core::{ModelResult, RunReport};
use sqlforge_dag::{Graph, ModelNode, NodeId};
use sqlforge_jinja::{RenderContext, RenderError, SqlRenderer};
use std::collections::HashMap;

/// Per-node lifecycle state
///
/// Nodes move Pending -> Rendering -> Executing -> {Succeeded, Failed}.
/// There are no retries and no mid-node cancellation; the loop can only
/// stop between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Rendering,
    Executing,
    Succeeded,
    Failed,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Rendering => "rendering",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A single model's failure, distinguished by phase for diagnostics
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("model file is empty")]
    MissingContent,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("execution failed: {0}")]
    Execution(#[from] AdapterError),
}

/// Run-level failures
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] AdapterError),

    #[error("failed to close database connection: {0}")]
    Close(#[source] AdapterError),

    /// Fail-fast abort: the first failing model's error, wrapped with its id
    #[error("model '{id}' failed: {source}")]
    ModelFailed {
        id: NodeId,
        #[source]
        source: NodeError,
    },

    /// Continue-on-error summary; individual failures were surfaced as they
    /// occurred, and the full report rides along for the caller
    #[error("{failed} model(s) failed")]
    Aggregate { failed: usize, report: RunReport },
}

/// Drives rendered models through the database adapter, in order
///
/// Execution is single-threaded and strictly sequential: one model at a
/// time in the exact scheduled order, each rendered statement an
/// independent unit of work. The connection is acquired once before the
/// loop and released once after it, on every exit path.
pub struct Runner {
    renderer: SqlRenderer,
    fail_fast: bool,
}

impl Runner {
    /// Create a runner with the given failure policy
    pub fn new(fail_fast: bool) -> Self {
        Self {
            renderer: SqlRenderer::new(),
            fail_fast,
        }
    }

    /// Execute the scheduled models against the adapter
    ///
    /// `order` is the scheduler's output; `filter` optionally restricts
    /// execution to models whose logical name matches exactly, without
    /// changing relative order. Returns the run report on full success;
    /// failures follow the fail-fast/continue policy described on
    /// [`RunError`].
    pub async fn run(
        &self,
        graph: &Graph,
        order: &[NodeId],
        filter: Option<&[String]>,
        adapter: &dyn DatabaseAdapter,
        context: &RenderContext,
    ) -> Result<RunReport, RunError> {
        let selected: Vec<&ModelNode> = order
            .iter()
            .filter_map(|id| graph.get_node(id))
            .filter(|node| match filter {
                Some(names) => names.iter().any(|name| *name == node.name),
                None => true,
            })
            .collect();

        tracing::info!(
            models = selected.len(),
            adapter = adapter.name(),
            fail_fast = self.fail_fast,
            "starting run"
        );

        adapter.connect().await.map_err(RunError::Connect)?;

        let outcome = self.run_nodes(&selected, adapter, context).await;

        // The connection is released on every exit path, including a
        // fail-fast abort.
        let close_result = adapter.close().await;

        let report = outcome?;
        close_result.map_err(RunError::Close)?;

        if report.has_failures() {
            return Err(RunError::Aggregate {
                failed: report.summary.failed,
                report,
            });
        }

        Ok(report)
    }

    async fn run_nodes(
        &self,
        nodes: &[&ModelNode],
        adapter: &dyn DatabaseAdapter,
        context: &RenderContext,
    ) -> Result<RunReport, RunError> {
        let mut report = RunReport::new(&context.target);

        for node in nodes {
            tracing::debug!(model = node.id(), state = %NodeState::Pending, "picked up");

            match self.run_node(node, adapter, context).await {
                Ok(()) => {
                    tracing::info!(model = node.id(), state = %NodeState::Succeeded, "done");
                    report.add_result(ModelResult::succeeded(node.id()));
                }
                Err(err) => {
                    tracing::error!(model = node.id(), state = %NodeState::Failed, error = %err, "model failed");

                    if self.fail_fast {
                        // Unreached models are left untouched, not marked.
                        return Err(RunError::ModelFailed {
                            id: node.id().to_string(),
                            source: err,
                        });
                    }

                    report.add_result(ModelResult::failed(node.id(), err.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn run_node(
        &self,
        node: &ModelNode,
        adapter: &dyn DatabaseAdapter,
        context: &RenderContext,
    ) -> Result<(), NodeError> {
        if node.raw_sql.trim().is_empty() {
            return Err(NodeError::MissingContent);
        }

        tracing::debug!(model = node.id(), state = %NodeState::Rendering);
        let template = self.renderer.parse(&node.name, &node.raw_sql)?;

        // Fresh context per node; renders cannot observe each other.
        let node_context = context.clone().for_model(node.name.clone());
        let rendered = self
            .renderer
            .render(&template, &node_context, &HashMap::new())?;

        tracing::debug!(model = node.id(), state = %NodeState::Executing);
        adapter.execute_ddl(&rendered).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_adapter::MockAdapter;
    use sqlforge_dag::{topological_sort, ModelNode, NodeKind};

    fn graph_with_chain() -> (Graph, Vec<NodeId>) {
        // c depends on b depends on a
        let mut graph = Graph::new();
        graph
            .add_node(
                ModelNode::new(NodeKind::Model, "a").with_raw_sql("create table a as select 1"),
            )
            .unwrap();
        graph
            .add_node(
                ModelNode::new(NodeKind::Model, "b")
                    .with_raw_sql("create table b as select * from {{ ref 'a' }}"),
            )
            .unwrap();
        graph
            .add_node(
                ModelNode::new(NodeKind::Model, "c")
                    .with_raw_sql("create table c as select * from {{ ref 'b' }}"),
            )
            .unwrap();
        graph.add_edge("model.b", "model.a").unwrap();
        graph.add_edge("model.c", "model.b").unwrap();

        let order = topological_sort(&graph).unwrap();
        (graph, order)
    }

    #[tokio::test]
    async fn successful_run_executes_in_order() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new();
        let runner = Runner::new(false);

        let report = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap();

        assert_eq!(report.summary.attempted, 3);
        assert_eq!(report.summary.succeeded, 3);
        assert_eq!(report.summary.failed, 0);

        let executed = adapter.executed_statements().await;
        assert_eq!(executed.len(), 3);
        assert_eq!(executed[0], "create table a as select 1");
        assert_eq!(executed[1], "create table b as select * from a");
        assert_eq!(executed[2], "create table c as select * from b");

        assert!(!adapter.is_connected().await);
    }

    #[tokio::test]
    async fn fail_fast_halts_after_first_failure() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new();
        adapter
            .fail_statements_containing("table a", "permission denied")
            .await;

        let runner = Runner::new(true);
        let err = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap_err();

        match err {
            RunError::ModelFailed { id, source } => {
                assert_eq!(id, "model.a");
                assert!(matches!(source, NodeError::Execution(_)));
            }
            other => panic!("expected ModelFailed, got {other:?}"),
        }

        // Nothing past the failing model was attempted.
        assert_eq!(adapter.execution_count().await, 0);
        // Connection still released on the abort path.
        assert!(!adapter.is_connected().await);
    }

    #[tokio::test]
    async fn continue_on_error_attempts_everything() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new();
        adapter
            .fail_statements_containing("table a", "permission denied")
            .await;

        let runner = Runner::new(false);
        let err = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap_err();

        match err {
            RunError::Aggregate { failed, report } => {
                assert_eq!(failed, 1);
                assert_eq!(report.summary.attempted, 3);
                assert_eq!(report.summary.succeeded, 2);
            }
            other => panic!("expected Aggregate, got {other:?}"),
        }

        // b and c still ran.
        assert_eq!(adapter.execution_count().await, 2);
    }

    #[tokio::test]
    async fn filter_selects_exact_logical_names() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new();
        let runner = Runner::new(false);

        let filter = vec!["a".to_string(), "c".to_string()];
        let report = runner
            .run(
                &graph,
                &order,
                Some(&filter),
                &adapter,
                &RenderContext::new("dev"),
            )
            .await
            .unwrap();

        assert_eq!(report.summary.attempted, 2);
        let executed = adapter.executed_statements().await;
        assert!(executed[0].contains("table a"));
        assert!(executed[1].contains("table c"));
    }

    #[tokio::test]
    async fn empty_model_is_missing_content() {
        let mut graph = Graph::new();
        graph
            .add_node(ModelNode::new(NodeKind::Model, "blank").with_raw_sql("   \n  "))
            .unwrap();
        let order = topological_sort(&graph).unwrap();

        let adapter = MockAdapter::new();
        let runner = Runner::new(true);
        let err = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::ModelFailed {
                source: NodeError::MissingContent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn render_failures_are_distinguished_from_execution_failures() {
        let mut graph = Graph::new();
        graph
            .add_node(
                ModelNode::new(NodeKind::Model, "broken").with_raw_sql("{{ var('nope') }}"),
            )
            .unwrap();
        let order = topological_sort(&graph).unwrap();

        let adapter = MockAdapter::new();
        let runner = Runner::new(true);
        let err = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::ModelFailed {
                source: NodeError::Render(_),
                ..
            }
        ));
        // Render failures never reach the adapter.
        assert_eq!(adapter.execution_count().await, 0);
    }

    #[tokio::test]
    async fn connect_failure_aborts_before_any_model() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new().with_connection_failure();
        let runner = Runner::new(false);

        let err = runner
            .run(&graph, &order, None, &adapter, &RenderContext::new("dev"))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Connect(_)));
        assert_eq!(adapter.execution_count().await, 0);
    }

    #[tokio::test]
    async fn schema_qualified_rendering_flows_through() {
        let (graph, order) = graph_with_chain();
        let adapter = MockAdapter::new();
        let runner = Runner::new(false);

        let context = RenderContext::new("prod").with_schema("marts");
        runner
            .run(&graph, &order, None, &adapter, &context)
            .await
            .unwrap();

        let executed = adapter.executed_statements().await;
        assert_eq!(executed[1], "create table b as select * from marts.a");
    }
}
