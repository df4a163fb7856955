use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Scenario execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped { reason: String },
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScenarioStatus::Passed | ScenarioStatus::Failed | ScenarioStatus::Skipped { .. }
        )
    }
}

/// Live state for one scenario
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub name: String,
    pub status: ScenarioStatus,
    pub started_at: Option<Instant>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    pub artifacts: Vec<PathBuf>,
}

impl ScenarioState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Pending,
            started_at: None,
            duration_ms: None,
            error: None,
            artifacts: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(ScenarioStatus::Passed);
    }

    pub fn fail(&mut self, error: String) {
        self.error = Some(error);
        self.finish(ScenarioStatus::Failed);
    }

    pub fn skip(&mut self, reason: String) {
        self.finish(ScenarioStatus::Skipped { reason });
    }

    fn finish(&mut self, status: ScenarioStatus) {
        self.status = status;
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> ScenarioResult {
        ScenarioResult {
            name: self.name.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms.unwrap_or(0),
            error: self.error.clone(),
            artifacts: self
                .artifacts
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub artifacts: Vec<String>,
}

/// State for a whole run
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub scenarios: Vec<ScenarioState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl RunState {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            scenarios: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add(&mut self, scenario: ScenarioState) {
        self.scenarios.push(scenario);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> RunSummary {
        let (mut passed, mut failed, mut skipped) = (0, 0, 0);
        for scenario in &self.scenarios {
            match scenario.status {
                ScenarioStatus::Passed => passed += 1,
                ScenarioStatus::Failed => failed += 1,
                ScenarioStatus::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        RunSummary {
            run_id: self.run_id.clone(),
            total: self.scenarios.len() as u32,
            passed,
            failed,
            skipped,
            total_duration_ms,
        }
    }

    pub fn to_report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            scenarios: self.scenarios.iter().map(|s| s.to_report()).collect(),
            summary: self.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub scenarios: Vec<ScenarioResult>,
    pub summary: RunSummary,
}
