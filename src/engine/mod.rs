//! Task state machine and pipeline driver.
//!
//! The engine owns every task's lifecycle. `advance` is the single mutator
//! and enforces the legal transition set; `execute` is the driver that walks
//! one task through Research → Analysis, the optional refinement round, and
//! composition, emitting ordered progress events along the way.
//!
//! Termination is guaranteed twice over: `advance` refuses a third entry
//! into `Analyzing`, and the second verdict is forced satisfied regardless
//! of what the Analysis collaborator returned (with a note in the report).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::config::OrchestratorConfig;
use crate::connectors::ConnectorRegistry;
use crate::dispatch::Dispatcher;
use crate::feedback::FeedbackController;
use crate::papers;
use crate::progress::ProgressEmitter;
use crate::stages::{Analyser, Researcher};
use crate::types::{
    AnalysisVerdict, AppError, ResearchBundle, Result, TaskReport, TaskStage, Toggles,
    ToolCallRequest, ToolOutcome,
};

const REFINEMENT_SUPPRESSED_NOTE: &str =
    "Further refinement was suppressed after the second analysis round";

/// Inputs accepted by [`ResearchEngine::advance`]. Each input is legal from
/// exactly one stage.
#[derive(Debug, Clone)]
pub enum TaskInput {
    /// Queued → Researching.
    Start,
    /// Researching → Analyzing, carrying the bundle for this pass.
    ResearchComplete(ResearchBundle),
    /// Analyzing → Composing.
    VerdictSatisfied(AnalysisVerdict),
    /// Analyzing → Refining (first round only).
    VerdictNeedsMore(AnalysisVerdict),
    /// Refining → Researching.
    RefinementPlanned,
    /// Composing → Done, carrying the final report text.
    ReportComposed(String),
}

impl TaskInput {
    fn name(&self) -> &'static str {
        match self {
            TaskInput::Start => "start",
            TaskInput::ResearchComplete(_) => "research_complete",
            TaskInput::VerdictSatisfied(_) => "verdict_satisfied",
            TaskInput::VerdictNeedsMore(_) => "verdict_needs_more",
            TaskInput::RefinementPlanned => "refinement_planned",
            TaskInput::ReportComposed(_) => "report_composed",
        }
    }
}

/// One research task. Mutated only through the engine.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub query: String,
    pub toggles: Toggles,
    pub stage: TaskStage,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// Entries into `Analyzing`; capped at two.
    analysis_rounds: u8,
    /// Most recent bundle, preserved so a failed task still surfaces data.
    partial: ResearchBundle,
    report_text: Option<String>,
    note: Option<String>,
    error: Option<&'static str>,
    finished_at: Option<Instant>,
}

impl Task {
    fn new(query: String, toggles: Toggles, deadline: DateTime<Utc>) -> Self {
        let partial = ResearchBundle::new(query.clone());
        Self {
            id: Uuid::new_v4(),
            query,
            toggles,
            stage: TaskStage::Queued,
            created_at: Utc::now(),
            deadline,
            analysis_rounds: 0,
            partial,
            report_text: None,
            note: None,
            error: None,
            finished_at: None,
        }
    }

    fn report(&self) -> TaskReport {
        TaskReport {
            task_id: self.id,
            query: self.query.clone(),
            stage: self.stage,
            report: self.report_text.clone(),
            papers: self.partial.papers.clone(),
            tool_results: self.partial.tool_results.clone(),
            note: self.note.clone(),
            error: self.error.map(String::from),
        }
    }
}

/// The research orchestration engine.
pub struct ResearchEngine {
    config: OrchestratorConfig,
    registry: Arc<ConnectorRegistry>,
    dispatcher: Dispatcher,
    feedback: FeedbackController,
    cache: Arc<TaskCache>,
    progress: Arc<ProgressEmitter>,
    researcher: Arc<dyn Researcher>,
    analyser: Arc<dyn Analyser>,
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl ResearchEngine {
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<ConnectorRegistry>,
        researcher: Arc<dyn Researcher>,
        analyser: Arc<dyn Analyser>,
    ) -> Self {
        let cache = Arc::new(TaskCache::new());
        let dispatcher = Dispatcher::new(registry.clone(), config.max_concurrent_calls);
        let feedback = FeedbackController::new(cache.clone(), config.cache_grace());
        let progress = Arc::new(ProgressEmitter::new(config.progress_channel_capacity));
        Self {
            config,
            registry,
            dispatcher,
            feedback,
            cache,
            progress,
            researcher,
            analyser,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Progress subscription point for the transport boundary.
    pub fn progress(&self) -> Arc<ProgressEmitter> {
        self.progress.clone()
    }

    // ============= Submission / Inspection =============

    /// Register a new task. Rejected before a task exists when the query is
    /// empty or the toggles disable every connector category.
    pub fn submit(&self, query: impl Into<String>, toggles: Toggles) -> Result<Uuid> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(AppError::InvalidRequest("Query must not be empty".to_string()));
        }
        if !toggles.any_enabled() {
            return Err(AppError::InvalidRequest(
                "All capability toggles are disabled".to_string(),
            ));
        }

        let deadline = Utc::now()
            + ChronoDuration::from_std(self.config.task_deadline())
                .unwrap_or_else(|_| ChronoDuration::seconds(600));
        let task = Task::new(query, toggles, deadline);
        let id = task.id;

        tracing::info!(task_id = %id, query = %task.query, "task submitted");
        self.tasks.lock().insert(id, task);
        Ok(id)
    }

    pub fn stage_of(&self, task_id: Uuid) -> Result<TaskStage> {
        self.tasks
            .lock()
            .get(&task_id)
            .map(|t| t.stage)
            .ok_or(AppError::TaskNotFound(task_id))
    }

    /// The terminal (or in-flight) payload for a task.
    pub fn report_of(&self, task_id: Uuid) -> Result<TaskReport> {
        self.tasks
            .lock()
            .get(&task_id)
            .map(Task::report)
            .ok_or(AppError::TaskNotFound(task_id))
    }

    // ============= State Machine =============

    /// Apply one input to a task. The sole mutator: an input that does not
    /// match the task's current stage fails with `IllegalTransition` and
    /// leaves the task untouched.
    pub fn advance(&self, task_id: Uuid, input: TaskInput) -> Result<TaskStage> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(&task_id)
            .ok_or(AppError::TaskNotFound(task_id))?;

        if task.stage.is_terminal() {
            return Err(AppError::IllegalTransition(format!(
                "task {} is already terminal ({})",
                task_id, task.stage
            )));
        }

        let illegal = |task: &Task, input: &TaskInput| {
            AppError::IllegalTransition(format!(
                "input '{}' is not valid in stage '{}' for task {}",
                input.name(),
                task.stage,
                task.id
            ))
        };

        let next = match (&task.stage, &input) {
            (TaskStage::Queued, TaskInput::Start) => TaskStage::Researching,
            (TaskStage::Researching, TaskInput::ResearchComplete(_)) => {
                if task.analysis_rounds >= 2 {
                    return Err(AppError::IllegalTransition(format!(
                        "task {} has exhausted its two analysis rounds",
                        task_id
                    )));
                }
                TaskStage::Analyzing
            }
            (TaskStage::Analyzing, TaskInput::VerdictSatisfied(_)) => TaskStage::Composing,
            (TaskStage::Analyzing, TaskInput::VerdictNeedsMore(_)) => {
                if task.analysis_rounds >= 2 {
                    return Err(AppError::IllegalTransition(format!(
                        "task {} may not refine after its second analysis round",
                        task_id
                    )));
                }
                TaskStage::Refining
            }
            (TaskStage::Refining, TaskInput::RefinementPlanned) => TaskStage::Researching,
            (TaskStage::Composing, TaskInput::ReportComposed(_)) => TaskStage::Done,
            _ => return Err(illegal(task, &input)),
        };

        // Transition is legal; apply side effects.
        match input {
            TaskInput::ResearchComplete(bundle) => {
                task.analysis_rounds += 1;
                task.partial = bundle;
            }
            TaskInput::VerdictSatisfied(verdict) => {
                if let Some(report) = verdict.final_report {
                    task.report_text = Some(report);
                }
            }
            TaskInput::ReportComposed(text) => {
                task.report_text = Some(text);
                task.finished_at = Some(Instant::now());
            }
            _ => {}
        }

        tracing::debug!(%task_id, from = %task.stage, to = %next, "task transition");
        task.stage = next;
        Ok(next)
    }

    /// Cancel a task. Immediate: the stage flips to `Cancelled`, any pending
    /// refinement cache entry is discarded, and in-flight tool results are
    /// dropped on arrival instead of merged.
    pub fn cancel(&self, task_id: Uuid) -> Result<()> {
        {
            let mut tasks = self.tasks.lock();
            let task = tasks
                .get_mut(&task_id)
                .ok_or(AppError::TaskNotFound(task_id))?;
            if task.stage.is_terminal() {
                return Ok(());
            }
            task.stage = TaskStage::Cancelled;
            task.finished_at = Some(Instant::now());
        }

        tracing::info!(%task_id, "task cancelled");
        self.feedback.abandon(task_id);
        self.progress
            .emit(task_id, TaskStage::Cancelled, 100, "Task cancelled");
        self.progress.unsubscribe(task_id);
        Ok(())
    }

    /// Force a task into `Failed`, preserving whatever bundle data was
    /// gathered so the caller is never left with nothing.
    fn fail(&self, task_id: Uuid, error: &AppError) -> TaskReport {
        let report = {
            let mut tasks = self.tasks.lock();
            match tasks.get_mut(&task_id) {
                Some(task) => {
                    if !task.stage.is_terminal() {
                        task.stage = TaskStage::Failed;
                        task.error = Some(error.kind());
                        task.finished_at = Some(Instant::now());
                    }
                    task.report()
                }
                None => TaskReport {
                    task_id,
                    query: String::new(),
                    stage: TaskStage::Failed,
                    report: None,
                    papers: vec![],
                    tool_results: vec![],
                    note: None,
                    error: Some(error.kind().to_string()),
                },
            }
        };

        tracing::warn!(%task_id, error = %error, "task failed");
        self.feedback.abandon(task_id);
        self.progress
            .emit(task_id, TaskStage::Failed, 100, error.to_string());
        self.progress.unsubscribe(task_id);
        report
    }

    // ============= Pipeline Driver =============

    /// Run a queued task to a terminal stage and return its final payload.
    ///
    /// Collaborator failures, deadline expiry, and protocol violations all
    /// land in a `Failed` report rather than an `Err`; only an unknown task
    /// id is an outright error.
    pub async fn execute(&self, task_id: Uuid) -> Result<TaskReport> {
        let (query, toggles) = {
            let tasks = self.tasks.lock();
            let task = tasks.get(&task_id).ok_or(AppError::TaskNotFound(task_id))?;
            (task.query.clone(), task.toggles.clone())
        };

        match self.run_pipeline(task_id, &query, &toggles).await {
            Ok(report) => Ok(report),
            Err(PipelineExit::Cancelled) => self.report_of(task_id),
            Err(PipelineExit::Failed(e)) => Ok(self.fail(task_id, &e)),
        }
    }

    async fn run_pipeline(
        &self,
        task_id: Uuid,
        query: &str,
        toggles: &Toggles,
    ) -> std::result::Result<TaskReport, PipelineExit> {
        self.advance(task_id, TaskInput::Start)?;
        self.progress
            .emit(task_id, TaskStage::Researching, 10, "Initializing search");

        // ----- Round 1: research -----
        let calls = self
            .researcher
            .plan(query, toggles, None, &[])
            .await
            .map_err(PipelineExit::Failed)?;
        let calls = self.filter_calls(calls, toggles);

        self.progress.emit(
            task_id,
            TaskStage::Researching,
            20,
            "Starting research phase",
        );
        self.check_deadline(task_id)?;

        let outcomes = self
            .dispatcher
            .dispatch(&calls, self.config.per_call_timeout(), self.config.batch_deadline())
            .await;
        self.ensure_live(task_id)?;

        let bundle = Self::bundle_from(query, outcomes);
        self.progress.emit(
            task_id,
            TaskStage::Researching,
            60,
            format!("Found {} papers, analyzing results", bundle.papers.len()),
        );

        // ----- Round 1: analysis -----
        self.advance(task_id, TaskInput::ResearchComplete(bundle.clone()))?;
        let verdict = self
            .analyser
            .assess(query, &bundle, None)
            .await
            .map_err(PipelineExit::Failed)?;
        self.ensure_live(task_id)?;

        let (final_bundle, final_verdict, note) = if verdict.satisfied {
            (bundle, verdict, None)
        } else {
            self.refinement_round(task_id, query, toggles, bundle, verdict)
                .await?
        };

        // ----- Compose -----
        self.advance(task_id, TaskInput::VerdictSatisfied(final_verdict.clone()))?;
        if let Some(ref note) = note {
            if let Some(task) = self.tasks.lock().get_mut(&task_id) {
                task.note = Some(note.clone());
            }
        }
        self.progress.emit(
            task_id,
            TaskStage::Composing,
            95,
            "Composing final report",
        );

        let report_text = final_verdict.final_report.unwrap_or_else(|| {
            format!(
                "Gathered {} papers for: {}",
                final_bundle.papers.len(),
                query
            )
        });
        self.advance(task_id, TaskInput::ReportComposed(report_text))?;
        self.progress
            .emit(task_id, TaskStage::Done, 100, "Search complete");
        self.progress.unsubscribe(task_id);

        self.report_of(task_id).map_err(PipelineExit::Failed)
    }

    /// Run the single permitted refinement round. Returns the combined
    /// bundle, the final verdict (forced satisfied), and the suppression
    /// note when the second verdict was still unsatisfied.
    async fn refinement_round(
        &self,
        task_id: Uuid,
        query: &str,
        toggles: &Toggles,
        prior_bundle: ResearchBundle,
        prior_verdict: AnalysisVerdict,
    ) -> std::result::Result<(ResearchBundle, AnalysisVerdict, Option<String>), PipelineExit> {
        self.advance(task_id, TaskInput::VerdictNeedsMore(prior_verdict.clone()))?;
        self.progress.emit(
            task_id,
            TaskStage::Refining,
            75,
            "Searching for missing information",
        );
        self.check_deadline(task_id)?;

        let remaining = self.deadline_remaining(task_id);
        let supplemental = self
            .feedback
            .begin_round_two(
                task_id,
                query,
                toggles,
                remaining,
                &prior_bundle,
                &prior_verdict,
                self.researcher.as_ref(),
            )
            .await
            .map_err(PipelineExit::Failed)?;
        let supplemental = self.filter_calls(supplemental, toggles);

        self.advance(task_id, TaskInput::RefinementPlanned)?;
        let outcomes = self
            .dispatcher
            .dispatch(
                &supplemental,
                self.config.per_call_timeout(),
                self.config.batch_deadline(),
            )
            .await;
        self.ensure_live(task_id)?;

        let combined = self
            .feedback
            .complete_round_two(task_id, outcomes)
            .map_err(PipelineExit::Failed)?;

        self.advance(task_id, TaskInput::ResearchComplete(combined.clone()))?;
        self.progress.emit(
            task_id,
            TaskStage::Analyzing,
            90,
            "Finalizing comprehensive analysis",
        );

        let mut verdict = self
            .analyser
            .assess(query, &combined, Some(&prior_verdict))
            .await
            .map_err(PipelineExit::Failed)?;
        self.ensure_live(task_id)?;

        // The loop runs at most once: a second unsatisfied verdict is
        // overridden so the task terminates, with the override noted.
        let note = if verdict.satisfied {
            None
        } else {
            tracing::info!(%task_id, "second verdict unsatisfied, forcing termination");
            verdict.satisfied = true;
            verdict.gap_description = None;
            Some(REFINEMENT_SUPPRESSED_NOTE.to_string())
        };

        Ok((combined, verdict, note))
    }

    // ============= Helpers =============

    /// Drop planned calls whose connector category the task's toggles
    /// disable. The planner already receives the toggles; this is the
    /// engine-side guarantee that a disabled category never reaches a batch.
    fn filter_calls(&self, calls: Vec<ToolCallRequest>, toggles: &Toggles) -> Vec<ToolCallRequest> {
        calls
            .into_iter()
            .filter(|call| match self.registry.resolve(&call.tool_name, toggles) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(tool = %call.tool_name, reason = %e, "dropping planned call");
                    false
                }
            })
            .collect()
    }

    fn bundle_from(query: &str, outcomes: Vec<ToolOutcome>) -> ResearchBundle {
        let mut extracted = Vec::new();
        for outcome in &outcomes {
            if let Some(payload) = &outcome.raw_payload {
                extracted.extend(papers::extract_papers(&outcome.tool_name, payload));
            }
        }
        ResearchBundle {
            query: query.to_string(),
            tool_results: outcomes,
            papers: papers::merge(Vec::new(), extracted),
        }
    }

    /// Bail out of the pipeline when the task was cancelled underneath it;
    /// results computed since the cancellation are discarded by unwinding.
    fn ensure_live(&self, task_id: Uuid) -> std::result::Result<(), PipelineExit> {
        match self.stage_of(task_id) {
            Ok(TaskStage::Cancelled) => Err(PipelineExit::Cancelled),
            Ok(_) => Ok(()),
            Err(e) => Err(PipelineExit::Failed(e)),
        }
    }

    fn check_deadline(&self, task_id: Uuid) -> std::result::Result<(), PipelineExit> {
        self.ensure_live(task_id)?;
        let expired = {
            let tasks = self.tasks.lock();
            tasks
                .get(&task_id)
                .map(|t| Utc::now() > t.deadline)
                .unwrap_or(true)
        };
        if expired {
            Err(PipelineExit::Failed(AppError::Timeout(format!(
                "task {} exceeded its deadline",
                task_id
            ))))
        } else {
            Ok(())
        }
    }

    fn deadline_remaining(&self, task_id: Uuid) -> std::time::Duration {
        let tasks = self.tasks.lock();
        tasks
            .get(&task_id)
            .and_then(|t| (t.deadline - Utc::now()).to_std().ok())
            .unwrap_or_default()
    }

    /// Evict terminal tasks past the retention window and sweep the
    /// refinement cache. Call periodically or after task completion.
    pub fn evict_finished(&self) {
        let retention = self.config.retention();
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|_, task| match task.finished_at {
            Some(finished) => finished.elapsed() < retention,
            None => true,
        });
        let evicted = before - tasks.len();
        drop(tasks);
        if evicted > 0 {
            tracing::debug!(evicted, "evicted finished tasks");
        }
        self.cache.evict_expired();
    }
}

enum PipelineExit {
    Cancelled,
    Failed(AppError),
}

impl From<AppError> for PipelineExit {
    fn from(e: AppError) -> Self {
        PipelineExit::Failed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolStatus;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedPlanner;

    #[async_trait]
    impl Researcher for FixedPlanner {
        async fn plan(
            &self,
            query: &str,
            _toggles: &Toggles,
            _gap: Option<&str>,
            _prior: &[crate::types::PaperRecord],
        ) -> Result<Vec<ToolCallRequest>> {
            Ok(vec![ToolCallRequest::new(
                "search_pubmed",
                json!({"query": query}),
            )])
        }
    }

    struct AlwaysSatisfied;

    #[async_trait]
    impl Analyser for AlwaysSatisfied {
        async fn assess(
            &self,
            _query: &str,
            bundle: &ResearchBundle,
            _prior: Option<&AnalysisVerdict>,
        ) -> Result<AnalysisVerdict> {
            Ok(AnalysisVerdict::satisfied(format!(
                "{} papers reviewed",
                bundle.papers.len()
            )))
        }
    }

    fn engine() -> ResearchEngine {
        ResearchEngine::new(
            OrchestratorConfig::default(),
            Arc::new(ConnectorRegistry::new()),
            Arc::new(FixedPlanner),
            Arc::new(AlwaysSatisfied),
        )
    }

    #[test]
    fn test_submit_rejects_empty_query() {
        let engine = engine();
        let err = engine.submit("   ", Toggles::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_submit_rejects_all_disabled_toggles() {
        let engine = engine();
        let toggles = Toggles {
            literature: false,
            clinical_trials: false,
            preprints: false,
            variants: false,
            web: false,
            deep_research: false,
        };
        let err = engine.submit("BRCA1 variants", toggles).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_advance_enforces_legal_transitions() {
        let engine = engine();
        let id = engine.submit("q", Toggles::default()).unwrap();

        // cannot finish analysis before starting
        let err = engine
            .advance(id, TaskInput::VerdictSatisfied(AnalysisVerdict::satisfied("r")))
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition(_)));
        // the failed advance left the task untouched
        assert_eq!(engine.stage_of(id).unwrap(), TaskStage::Queued);

        assert_eq!(
            engine.advance(id, TaskInput::Start).unwrap(),
            TaskStage::Researching
        );
    }

    #[test]
    fn test_third_analysis_entry_is_illegal() {
        let engine = engine();
        let id = engine.submit("q", Toggles::default()).unwrap();
        let bundle = ResearchBundle::new("q");

        engine.advance(id, TaskInput::Start).unwrap();
        engine
            .advance(id, TaskInput::ResearchComplete(bundle.clone()))
            .unwrap();
        engine
            .advance(id, TaskInput::VerdictNeedsMore(AnalysisVerdict::needs_more("gap")))
            .unwrap();
        engine.advance(id, TaskInput::RefinementPlanned).unwrap();
        engine
            .advance(id, TaskInput::ResearchComplete(bundle.clone()))
            .unwrap();

        // a second needs-more cannot reopen the loop
        let err = engine
            .advance(id, TaskInput::VerdictNeedsMore(AnalysisVerdict::needs_more("gap")))
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition(_)));

        // close out, then prove a third research pass is rejected too
        engine
            .advance(id, TaskInput::VerdictSatisfied(AnalysisVerdict::satisfied("r")))
            .unwrap();
        let err = engine
            .advance(id, TaskInput::ResearchComplete(bundle))
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition(_)));
    }

    #[test]
    fn test_terminal_tasks_reject_all_inputs() {
        let engine = engine();
        let id = engine.submit("q", Toggles::default()).unwrap();
        engine.cancel(id).unwrap();

        let err = engine.advance(id, TaskInput::Start).unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition(_)));
        assert_eq!(engine.stage_of(id).unwrap(), TaskStage::Cancelled);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let engine = engine();
        let id = engine.submit("q", Toggles::default()).unwrap();
        engine.cancel(id).unwrap();
        engine.cancel(id).unwrap();
        assert_eq!(engine.stage_of(id).unwrap(), TaskStage::Cancelled);
    }

    #[test]
    fn test_failed_report_preserves_partial_bundle() {
        let engine = engine();
        let id = engine.submit("q", Toggles::default()).unwrap();
        let mut bundle = ResearchBundle::new("q");
        bundle
            .tool_results
            .push(ToolOutcome::ok("search_pubmed", json!({"results": []}), 5));

        engine.advance(id, TaskInput::Start).unwrap();
        engine.advance(id, TaskInput::ResearchComplete(bundle)).unwrap();

        let report = engine.fail(id, &AppError::Timeout("deadline".to_string()));
        assert_eq!(report.stage, TaskStage::Failed);
        assert_eq!(report.error.as_deref(), Some("timeout"));
        assert_eq!(report.tool_results.len(), 1);
        assert_eq!(report.tool_results[0].status, ToolStatus::Ok);
    }

    #[test]
    fn test_evict_finished_keeps_live_tasks() {
        let engine = engine();
        let live = engine.submit("live", Toggles::default()).unwrap();
        let done = engine.submit("done", Toggles::default()).unwrap();
        engine.cancel(done).unwrap();

        engine.evict_finished();
        // retention has not elapsed, both still present
        assert!(engine.stage_of(live).is_ok());
        assert!(engine.stage_of(done).is_ok());
    }
}
