use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= Task Types =============

/// Lifecycle stage of a research task.
///
/// The happy path is `Queued → Researching → Analyzing → Composing → Done`,
/// with an optional single detour through `Refining → Researching → Analyzing`
/// when the first analysis verdict is unsatisfied. `Failed` and `Cancelled`
/// are terminal and reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStage {
    Queued,
    Researching,
    Analyzing,
    Refining,
    Composing,
    Done,
    Failed,
    Cancelled,
}

impl TaskStage {
    /// Terminal stages accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStage::Done | TaskStage::Failed | TaskStage::Cancelled)
    }
}

impl std::fmt::Display for TaskStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskStage::Queued => "queued",
            TaskStage::Researching => "researching",
            TaskStage::Analyzing => "analyzing",
            TaskStage::Refining => "refining",
            TaskStage::Composing => "composing",
            TaskStage::Done => "done",
            TaskStage::Failed => "failed",
            TaskStage::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Connector capability categories. Each category maps to one family of
/// search connectors and is gated by the matching toggle at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Literature,
    ClinicalTrials,
    Preprints,
    Variants,
    Web,
}

/// Capability flags selected by the caller at submission time.
///
/// Each flag gates whether the corresponding connector category may ever be
/// included in a tool call batch for the task. `deep_research` does not gate
/// a connector; it widens per-call result limits for connectors that honor it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toggles {
    #[serde(default = "default_true")]
    pub literature: bool,
    #[serde(default)]
    pub clinical_trials: bool,
    #[serde(default)]
    pub preprints: bool,
    #[serde(default)]
    pub variants: bool,
    #[serde(default)]
    pub web: bool,
    #[serde(default)]
    pub deep_research: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            literature: true,
            clinical_trials: false,
            preprints: false,
            variants: false,
            web: false,
            deep_research: false,
        }
    }
}

impl Toggles {
    /// Enable every connector category.
    pub fn all() -> Self {
        Self {
            literature: true,
            clinical_trials: true,
            preprints: true,
            variants: true,
            web: true,
            deep_research: false,
        }
    }

    /// The connector categories this task is allowed to use.
    pub fn enabled_capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if self.literature {
            caps.push(Capability::Literature);
        }
        if self.clinical_trials {
            caps.push(Capability::ClinicalTrials);
        }
        if self.preprints {
            caps.push(Capability::Preprints);
        }
        if self.variants {
            caps.push(Capability::Variants);
        }
        if self.web {
            caps.push(Capability::Web);
        }
        caps
    }

    /// True when at least one connector category is enabled. A submission
    /// with everything disabled is rejected before a task is created.
    pub fn any_enabled(&self) -> bool {
        !self.enabled_capabilities().is_empty()
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Literature => self.literature,
            Capability::ClinicalTrials => self.clinical_trials,
            Capability::Preprints => self.preprints,
            Capability::Variants => self.variants,
            Capability::Web => self.web,
        }
    }
}

// ============= Tool Call Types =============

/// One planned connector invocation, produced by the Research collaborator
/// and consumed by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub issued_at: DateTime<Utc>,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            issued_at: Utc::now(),
        }
    }
}

/// Outcome status of a single connector call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Ok,
    Timeout,
    Error,
}

/// The outcome of one connector call. Immutable once produced; failures are
/// recorded here as data rather than escalated past the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool_name: String,
    pub status: ToolStatus,
    /// Raw connector payload, present only for `ToolStatus::Ok`.
    pub raw_payload: Option<serde_json::Value>,
    /// Error message, present only for `ToolStatus::Error`.
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl ToolOutcome {
    pub fn ok(tool_name: impl Into<String>, payload: serde_json::Value, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Ok,
            raw_payload: Some(payload),
            error: None,
            latency_ms,
        }
    }

    pub fn timeout(tool_name: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Timeout,
            raw_payload: None,
            error: None,
            latency_ms,
        }
    }

    pub fn error(tool_name: impl Into<String>, message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Error,
            raw_payload: None,
            error: Some(message.into()),
            latency_ms,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }
}

// ============= Paper Types =============

/// Canonical, deduplicated paper record extracted from raw connector hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u32>,
    pub source_url: String,
    /// Name of the connector that produced this record.
    pub source_tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

/// Aggregated view of one research pass, handed to the Analysis collaborator.
///
/// `papers` preserves first-seen order and contains no duplicate identity
/// keys (see [`crate::papers::merge`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub query: String,
    pub tool_results: Vec<ToolOutcome>,
    pub papers: Vec<PaperRecord>,
}

impl ResearchBundle {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tool_results: Vec::new(),
            papers: Vec::new(),
        }
    }

    /// Number of connector calls that returned a payload.
    pub fn successful_calls(&self) -> usize {
        self.tool_results.iter().filter(|r| r.is_ok()).count()
    }
}

// ============= Analysis Types =============

/// Structured verdict from the Analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    pub satisfied: bool,
    /// Present iff not satisfied: what the researcher should look for next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_description: Option<String>,
    /// Present iff satisfied or the refinement budget is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
}

impl AnalysisVerdict {
    pub fn satisfied(report: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            gap_description: None,
            final_report: Some(report.into()),
        }
    }

    pub fn needs_more(gap: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            gap_description: Some(gap.into()),
            final_report: None,
        }
    }
}

// ============= Progress Types =============

/// One ordered progress update for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub task_id: Uuid,
    pub stage: TaskStage,
    pub percent: u8,
    pub message: String,
}

/// Final payload for a terminal task. Every terminal stage yields exactly
/// one report; `Done` always carries whatever papers were gathered even if
/// some connectors failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: Uuid,
    pub query: String,
    pub stage: TaskStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    pub papers: Vec<PaperRecord>,
    pub tool_results: Vec<ToolOutcome>,
    /// Attached when a second unsatisfied verdict was overridden to
    /// guarantee termination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Error kind for `Failed` tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed submission, rejected before a task exists.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Protocol misuse: an `advance` that does not match the task's stage.
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    /// A second refinement round was begun while one is pending.
    #[error("Refinement already in progress for task {0}")]
    RefinementAlreadyInProgress(Uuid),

    /// Round two completed without a matching cache entry; an upstream
    /// ordering bug, fatal for that task only.
    #[error("No pending refinement for task {0}")]
    NoPendingRefinement(Uuid),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    /// Connector transport/protocol failure. Absorbed by the dispatcher
    /// into a `ToolOutcome`; only surfaces as `Err` when a connector is
    /// invoked directly.
    #[error("Connector error: {0}")]
    Connector(String),

    /// Failure inside a Research/Analysis collaborator.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Task-level deadline expired.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// User-initiated cancellation. Terminal, not a defect.
    #[error("Task cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error kind carried in a failed task's terminal report.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::IllegalTransition(_) => "illegal_transition",
            AppError::RefinementAlreadyInProgress(_) => "refinement_already_in_progress",
            AppError::NoPendingRefinement(_) => "no_pending_refinement",
            AppError::TaskNotFound(_) => "task_not_found",
            AppError::Connector(_) => "connector",
            AppError::Collaborator(_) => "collaborator",
            AppError::Timeout(_) => "timeout",
            AppError::Cancelled => "cancelled",
            AppError::Configuration(_) => "configuration",
            AppError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_default_enables_literature_only() {
        let toggles = Toggles::default();
        assert_eq!(toggles.enabled_capabilities(), vec![Capability::Literature]);
        assert!(toggles.any_enabled());
    }

    #[test]
    fn test_toggles_nothing_enabled() {
        let toggles = Toggles {
            literature: false,
            clinical_trials: false,
            preprints: false,
            variants: false,
            web: false,
            deep_research: true,
        };
        // deep_research alone gates no connector category
        assert!(!toggles.any_enabled());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(TaskStage::Done.is_terminal());
        assert!(TaskStage::Failed.is_terminal());
        assert!(TaskStage::Cancelled.is_terminal());
        assert!(!TaskStage::Queued.is_terminal());
        assert!(!TaskStage::Refining.is_terminal());
    }

    #[test]
    fn test_tool_outcome_constructors() {
        let ok = ToolOutcome::ok("search_pubmed", serde_json::json!({"results": []}), 120);
        assert!(ok.is_ok());
        assert!(ok.raw_payload.is_some());
        assert!(ok.error.is_none());

        let timeout = ToolOutcome::timeout("search_pubmed", 5000);
        assert_eq!(timeout.status, ToolStatus::Timeout);
        assert!(timeout.raw_payload.is_none());

        let err = ToolOutcome::error("search_pubmed", "connection refused", 30);
        assert_eq!(err.status, ToolStatus::Error);
        assert_eq!(err.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_verdict_constructors() {
        let good = AnalysisVerdict::satisfied("final report");
        assert!(good.satisfied);
        assert!(good.gap_description.is_none());

        let gap = AnalysisVerdict::needs_more("missing clinical trial data");
        assert!(!gap.satisfied);
        assert_eq!(
            gap.gap_description.as_deref(),
            Some("missing clinical trial data")
        );
        assert!(gap.final_report.is_none());
    }

    #[test]
    fn test_bundle_serialization_round_trip() {
        let bundle = ResearchBundle {
            query: "BRCA1 variants".to_string(),
            tool_results: vec![ToolOutcome::timeout("search_variants", 5000)],
            papers: vec![],
        };
        let json = serde_json::to_string(&bundle).unwrap();
        let back: ResearchBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.query, "BRCA1 variants");
        assert_eq!(back.tool_results.len(), 1);
        assert_eq!(back.successful_calls(), 0);
    }
}
