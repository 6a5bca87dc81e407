//! Mock implementations for testing.
//!
//! Scripted Research/Analysis collaborators and stub connectors shared
//! across test files without duplication.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use bioscout::{
    AnalysisVerdict, Analyser, AppError, Capability, Connector, PaperRecord, ResearchBundle,
    Researcher, Result, Toggles, ToolCallRequest,
};

/// Research collaborator that replays a scripted sequence of plans.
///
/// The first `plan` call pops the first script entry, the second call the
/// next, and so on; once the script is exhausted it returns an empty plan.
/// Gap descriptions received on each call are recorded for assertions.
pub struct MockResearcher {
    plans: Mutex<VecDeque<Vec<ToolCallRequest>>>,
    pub seen_gaps: Mutex<Vec<Option<String>>>,
    should_fail: bool,
}

impl MockResearcher {
    pub fn new(plans: Vec<Vec<ToolCallRequest>>) -> Self {
        Self {
            plans: Mutex::new(plans.into_iter().collect()),
            seen_gaps: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    /// A researcher whose every plan call fails.
    pub fn failing() -> Self {
        Self {
            plans: Mutex::new(VecDeque::new()),
            seen_gaps: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }
}

#[async_trait]
impl Researcher for MockResearcher {
    async fn plan(
        &self,
        _query: &str,
        _toggles: &Toggles,
        gap_description: Option<&str>,
        _prior_papers: &[PaperRecord],
    ) -> Result<Vec<ToolCallRequest>> {
        self.seen_gaps
            .lock()
            .push(gap_description.map(String::from));
        if self.should_fail {
            return Err(AppError::Collaborator("mock planner failure".to_string()));
        }
        Ok(self.plans.lock().pop_front().unwrap_or_default())
    }
}

/// Analysis collaborator that replays a scripted sequence of verdicts.
pub struct MockAnalyser {
    verdicts: Mutex<VecDeque<AnalysisVerdict>>,
    should_fail: bool,
}

impl MockAnalyser {
    pub fn new(verdicts: Vec<AnalysisVerdict>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            should_fail: true,
        }
    }
}

#[async_trait]
impl Analyser for MockAnalyser {
    async fn assess(
        &self,
        _query: &str,
        _bundle: &ResearchBundle,
        _prior_verdict: Option<&AnalysisVerdict>,
    ) -> Result<AnalysisVerdict> {
        if self.should_fail {
            return Err(AppError::Collaborator("mock analyser failure".to_string()));
        }
        Ok(self
            .verdicts
            .lock()
            .pop_front()
            .unwrap_or_else(|| AnalysisVerdict::satisfied("no further verdicts scripted")))
    }
}

/// In-memory connector with a fixed payload, optional delay, and optional
/// failure, for exercising the dispatcher and engine without HTTP.
pub struct StubConnector {
    name: String,
    capability: Capability,
    payload: Value,
    delay: Duration,
    fail: bool,
}

impl StubConnector {
    pub fn ok(name: &str, capability: Capability, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            capability,
            payload,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn slow(name: &str, capability: Capability, payload: Value, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok(name, capability, payload)
        }
    }

    pub fn failing(name: &str, capability: Capability) -> Self {
        Self {
            fail: true,
            ..Self::ok(name, capability, Value::Null)
        }
    }
}

#[async_trait]
impl Connector for StubConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn invoke(&self, _arguments: &Value) -> Result<Value> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(AppError::Connector("stub connector down".to_string()));
        }
        Ok(self.payload.clone())
    }
}

/// A `{"results": [...]}` payload with one titled hit per entry, in the
/// shape connectors hand to the paper normalizer.
pub fn results_payload(titles: &[&str]) -> Value {
    let results: Vec<Value> = titles
        .iter()
        .map(|t| {
            json!({
                "title": t,
                "abstract": format!("Abstract of {}", t),
                "url": format!("https://example.org/{}", t.replace(' ', "-")),
                "source": "stub"
            })
        })
        .collect();
    json!({"results": results, "total": results.len()})
}
