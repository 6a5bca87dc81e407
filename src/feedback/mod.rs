//! Feedback loop controller.
//!
//! Mediates the single optional refinement round between the Research and
//! Analysis stages. Round-1 state is parked in the task cache when the first
//! verdict is unsatisfied, and consumed exactly once when the supplemental
//! tool results arrive. The single-entry invariant here backs up the engine's
//! own stage guard: both must be broken before a task can loop twice.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::cache::{CacheEntry, TaskCache};
use crate::papers;
use crate::stages::Researcher;
use crate::types::{
    AnalysisVerdict, AppError, ResearchBundle, Result, Toggles, ToolCallRequest, ToolOutcome,
};

pub struct FeedbackController {
    cache: Arc<TaskCache>,
    /// Added on top of the task deadline when computing the cache TTL, so an
    /// abandoned task's entry outlives any legitimate read but not much more.
    grace: Duration,
}

impl FeedbackController {
    pub fn new(cache: Arc<TaskCache>, grace: Duration) -> Self {
        Self { cache, grace }
    }

    /// Open the refinement round for a task.
    ///
    /// Parks the round-1 bundle and verdict in the cache (TTL = remaining
    /// task deadline + grace) and asks the Research collaborator for
    /// supplemental calls targeting the declared gap. Fails with
    /// `RefinementAlreadyInProgress` if an entry is already pending.
    pub async fn begin_round_two(
        &self,
        task_id: Uuid,
        query: &str,
        toggles: &Toggles,
        deadline_remaining: Duration,
        prior_bundle: &ResearchBundle,
        prior_verdict: &AnalysisVerdict,
        researcher: &dyn Researcher,
    ) -> Result<Vec<ToolCallRequest>> {
        let gap = prior_verdict.gap_description.as_deref().ok_or_else(|| {
            AppError::Internal("refinement round opened without a gap description".to_string())
        })?;

        let entry = CacheEntry::new(
            task_id,
            query,
            prior_bundle.clone(),
            prior_verdict.clone(),
            deadline_remaining + self.grace,
        );
        if !self.cache.put(entry) {
            return Err(AppError::RefinementAlreadyInProgress(task_id));
        }

        tracing::info!(%task_id, gap, "beginning refinement round");

        let supplemental = researcher
            .plan(query, toggles, Some(gap), &prior_bundle.papers)
            .await;

        match supplemental {
            Ok(calls) => Ok(calls),
            Err(e) => {
                // A failed plan must not leave a pending entry behind.
                self.cache.discard(task_id);
                Err(e)
            }
        }
    }

    /// Close the refinement round: consume the cached round-1 state, fold in
    /// the supplemental tool results, and return the combined bundle.
    ///
    /// A missing entry means the caller never opened the round (or it
    /// expired); that is a protocol-ordering bug surfaced as
    /// `NoPendingRefinement`, fatal for this task only.
    pub fn complete_round_two(
        &self,
        task_id: Uuid,
        new_tool_results: Vec<ToolOutcome>,
    ) -> Result<ResearchBundle> {
        let entry = self
            .cache
            .take(task_id)
            .ok_or(AppError::NoPendingRefinement(task_id))?;

        let mut new_papers = Vec::new();
        for outcome in &new_tool_results {
            if let Some(payload) = &outcome.raw_payload {
                new_papers.extend(papers::extract_papers(&outcome.tool_name, payload));
            }
        }

        let prior = entry.prior_bundle;
        let merged = papers::merge(prior.papers, new_papers);

        let mut tool_results = prior.tool_results;
        tool_results.extend(new_tool_results);

        tracing::info!(
            %task_id,
            papers = merged.len(),
            "refinement round complete"
        );

        Ok(ResearchBundle {
            query: entry.query,
            tool_results,
            papers: merged,
        })
    }

    /// Drop any pending entry for a task that terminated mid-loop.
    pub fn abandon(&self, task_id: Uuid) {
        self.cache.discard(task_id);
    }
}
