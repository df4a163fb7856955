use crate::runner::state::{RunSummary, ScenarioResult};
use serde::{Deserialize, Serialize};

/// Scenario results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub run_id: String,
    pub scenarios: Vec<ScenarioResult>,
    pub summary: RunSummary,
    pub generated_at: String,
}
