//! # BioScout - Biomedical Research Orchestration Engine
//!
//! An async orchestration core for biomedical literature research: it drives
//! each query through a bounded research → analysis → refinement loop,
//! fanning tool calls out to biomedical search connectors in parallel and
//! folding the hits into a deduplicated paper set.
//!
//! ## Overview
//!
//! The engine is transport-agnostic: it exposes a task lifecycle (`submit`,
//! `execute`, `cancel`, `report_of`) and a per-task progress stream, and
//! leaves HTTP/WebSocket surfaces to the embedding application. The two
//! reasoning stages (which calls to make, whether the results suffice) sit
//! behind the [`Researcher`] and [`Analyser`] traits so any rule-based or
//! model-backed implementation can plug in.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bioscout::{
//!     ConnectorRegistry, OrchestratorConfig, ResearchEngine, Toggles,
//! };
//!
//! #[tokio::main]
//! async fn main() -> bioscout::Result<()> {
//!     let registry = Arc::new(ConnectorRegistry::with_default_connectors());
//!     let engine = ResearchEngine::new(
//!         OrchestratorConfig::default(),
//!         registry,
//!         my_researcher,  // Arc<dyn Researcher>
//!         my_analyser,    // Arc<dyn Analyser>
//!     );
//!
//!     let task_id = engine.submit("BRCA1 pathogenic variants", Toggles::all())?;
//!     let mut progress = engine.progress().subscribe(task_id);
//!     let report = engine.execute(task_id).await?;
//!     println!("{} papers gathered", report.papers.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`engine`] — task state machine and pipeline driver
//! - [`dispatch`] — parallel tool call fan-out with timeouts
//! - [`connectors`] — biomedical search backends behind the [`Connector`] trait
//! - [`feedback`] — the single bounded refinement round
//! - [`cache`] — task-scoped storage backing the feedback loop
//! - [`papers`] — canonical paper extraction, identity, and merging
//! - [`progress`] — ordered per-task progress events
//! - [`stages`] — the Research/Analysis collaborator boundaries

pub mod cache;
pub mod config;
pub mod connectors;
pub mod dispatch;
pub mod engine;
pub mod feedback;
pub mod papers;
pub mod progress;
pub mod stages;
pub mod types;

pub use cache::{CacheEntry, TaskCache};
pub use config::OrchestratorConfig;
pub use connectors::{Connector, ConnectorRegistry};
pub use dispatch::Dispatcher;
pub use engine::{ResearchEngine, TaskInput};
pub use feedback::FeedbackController;
pub use progress::ProgressEmitter;
pub use stages::{Analyser, Researcher};
pub use types::{
    AnalysisVerdict, AppError, Capability, PaperRecord, ProgressEvent, ResearchBundle, Result,
    TaskReport, TaskStage, Toggles, ToolCallRequest, ToolOutcome, ToolStatus,
};
