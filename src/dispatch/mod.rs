//! Tool fan-out dispatcher.
//!
//! Executes a batch of planned connector calls concurrently and returns one
//! outcome per call, in the original call order. The dispatcher never fails
//! as a whole: a slow call becomes a `timeout` outcome, a connector failure
//! becomes an `error` outcome with the message preserved, and anything still
//! pending when the overall deadline elapses is converted to `timeout`.
//! Degraded batches are a first-class result, not an exception path.
//!
//! Retries are deliberately absent; retry policy is a connector concern.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::connectors::ConnectorRegistry;
use crate::types::{ToolCallRequest, ToolOutcome};

pub struct Dispatcher {
    registry: Arc<ConnectorRegistry>,
    /// Concurrency ceiling for one batch.
    max_concurrent: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectorRegistry>, max_concurrent: usize) -> Self {
        Self {
            registry,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Execute every call in the batch, bounded by `max_concurrent`.
    ///
    /// Each call is timed individually against `per_call_timeout`; the batch
    /// as a whole is bounded by `overall_deadline`. The returned vector has
    /// exactly one outcome per input call, preserving input order so the
    /// same call list always reproduces the same bundle shape.
    pub async fn dispatch(
        &self,
        calls: &[ToolCallRequest],
        per_call_timeout: Duration,
        overall_deadline: Duration,
    ) -> Vec<ToolOutcome> {
        if calls.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            batch_size = calls.len(),
            max_concurrent = self.max_concurrent,
            "dispatching tool call batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut set: JoinSet<(usize, ToolOutcome)> = JoinSet::new();

        for (idx, call) in calls.iter().enumerate() {
            let connector = self.registry.get(&call.tool_name);
            let semaphore = semaphore.clone();
            let call = call.clone();

            set.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            ToolOutcome::error(&call.tool_name, "dispatcher closed", 0),
                        );
                    }
                };

                let started = Instant::now();
                let outcome = match connector {
                    None => ToolOutcome::error(
                        &call.tool_name,
                        format!("Unknown tool: {}", call.tool_name),
                        0,
                    ),
                    Some(connector) => {
                        match timeout(per_call_timeout, connector.invoke(&call.arguments)).await {
                            Ok(Ok(payload)) => ToolOutcome::ok(
                                &call.tool_name,
                                payload,
                                started.elapsed().as_millis() as u64,
                            ),
                            Ok(Err(e)) => {
                                tracing::warn!(tool = %call.tool_name, error = %e, "tool call failed");
                                ToolOutcome::error(
                                    &call.tool_name,
                                    e.to_string(),
                                    started.elapsed().as_millis() as u64,
                                )
                            }
                            Err(_) => {
                                tracing::warn!(tool = %call.tool_name, "tool call timed out");
                                ToolOutcome::timeout(
                                    &call.tool_name,
                                    started.elapsed().as_millis() as u64,
                                )
                            }
                        }
                    }
                };
                drop(permit);
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<ToolOutcome>> = vec![None; calls.len()];

        let collect = async {
            while let Some(joined) = set.join_next().await {
                if let Ok((idx, outcome)) = joined {
                    slots[idx] = Some(outcome);
                }
            }
        };

        if timeout(overall_deadline, collect).await.is_err() {
            tracing::warn!(
                deadline_ms = overall_deadline.as_millis() as u64,
                "batch deadline elapsed, abandoning pending calls"
            );
            set.abort_all();
        }

        // Anything the deadline cut off is surfaced as a timeout outcome.
        calls
            .iter()
            .zip(slots)
            .map(|(call, slot)| {
                slot.unwrap_or_else(|| {
                    ToolOutcome::timeout(&call.tool_name, overall_deadline.as_millis() as u64)
                })
            })
            .collect()
    }
}
