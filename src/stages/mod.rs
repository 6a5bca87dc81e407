//! External collaborator boundaries.
//!
//! The two reasoning stages are opaque to the orchestration core: it hands
//! them structured inputs and receives structured outputs, never inspecting
//! how they decide. Any rule-based, statistical, or model-backed
//! implementation can sit behind these traits without changing the engine.

use async_trait::async_trait;

use crate::types::{
    AnalysisVerdict, PaperRecord, ResearchBundle, Result, Toggles, ToolCallRequest,
};

/// The Research collaborator: decides which connector calls to make.
///
/// On the refinement round it receives the gap description from the first
/// verdict plus the papers already gathered, so it can plan supplemental
/// calls instead of repeating round one.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn plan(
        &self,
        query: &str,
        toggles: &Toggles,
        gap_description: Option<&str>,
        prior_papers: &[PaperRecord],
    ) -> Result<Vec<ToolCallRequest>>;
}

/// The Analysis collaborator: judges whether a bundle answers the query.
///
/// Returns exactly one verdict per invocation. The prior verdict is supplied
/// on the second round so the collaborator can compose a final report that
/// accounts for what was previously missing.
#[async_trait]
pub trait Analyser: Send + Sync {
    async fn assess(
        &self,
        query: &str,
        bundle: &ResearchBundle,
        prior_verdict: Option<&AnalysisVerdict>,
    ) -> Result<AnalysisVerdict>;
}
