//! ClinicalTrials.gov v2 connector.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Connector, limit_arg};
use crate::types::{AppError, Capability, Result};

const CLINICALTRIALS_API: &str = "https://clinicaltrials.gov/api/v2";

/// Searches registered clinical trials by condition, intervention, phase,
/// and recruitment status.
///
/// Arguments: `{"condition": string?, "intervention": string?, "phase":
/// string?, "status": string?, "limit": int?}` — at least one of condition
/// or intervention is required.
pub struct ClinicalTrialsConnector {
    client: reqwest::Client,
    base_url: String,
}

impl ClinicalTrialsConnector {
    pub fn new() -> Self {
        Self::with_base_url(CLINICALTRIALS_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn build_expression(args: &Value) -> Option<String> {
        let mut parts = Vec::new();
        for (key, area) in [
            ("condition", "Condition"),
            ("intervention", "Intervention"),
            ("phase", "Phase"),
            ("status", "OverallStatus"),
        ] {
            if let Some(value) = args.get(key).and_then(Value::as_str) {
                parts.push(format!("AREA[{}]({})", area, value));
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" AND "))
        }
    }

    fn flatten_study(study: &Value) -> Value {
        let protocol = study.get("protocolSection").cloned().unwrap_or_default();
        let id_module = protocol.get("identificationModule");
        let status_module = protocol.get("statusModule");

        let interventions: Vec<Value> = protocol
            .pointer("/armsInterventionsModule/interventions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.get("name").cloned())
                    .collect()
            })
            .unwrap_or_default();

        let nct_id = id_module.and_then(|m| m.get("nctId")).cloned();
        let url = nct_id
            .as_ref()
            .and_then(Value::as_str)
            .map(|id| format!("https://clinicaltrials.gov/study/{}", id));

        json!({
            "nctId": nct_id,
            "briefTitle": id_module.and_then(|m| m.get("briefTitle")),
            "status": status_module.and_then(|m| m.get("overallStatus")),
            "phase": status_module.and_then(|m| m.get("phases")),
            "conditions": protocol.pointer("/conditionsModule/conditions"),
            "interventions": interventions,
            "summary": protocol.pointer("/descriptionModule/briefSummary"),
            "date": status_module.and_then(|m| m.pointer("/startDateStruct/date")),
            "url": url,
            "source": "ClinicalTrials.gov"
        })
    }
}

impl Default for ClinicalTrialsConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for ClinicalTrialsConnector {
    fn name(&self) -> &str {
        "search_clinical_trials"
    }

    fn capability(&self) -> Capability {
        Capability::ClinicalTrials
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let expression = Self::build_expression(arguments).ok_or_else(|| {
            AppError::InvalidRequest(
                "search_clinical_trials needs a condition or intervention".to_string(),
            )
        })?;
        let limit = limit_arg(arguments, 20, 100);

        let response = self
            .client
            .get(format!("{}/studies", self.base_url))
            .query(&[
                ("format", "json"),
                ("pageSize", &limit.to_string()),
                ("query.cond", expression.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Clinical trials search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let results: Vec<Value> = data
            .get("studies")
            .and_then(Value::as_array)
            .map(|studies| studies.iter().map(Self::flatten_study).collect())
            .unwrap_or_default();

        Ok(json!({"results": results, "total": results.len()}))
    }
}
