pub mod artifacts;
pub mod scenarios;
pub mod state;

use crate::driver::traits::SessionFactory;
use crate::engine::Engine;
use crate::utils::config::Config;
use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

pub use scenarios::{Scenario, ScenarioOutcome};
pub use state::*;

/// Runs scenarios one session at a time
pub struct Runner<'a> {
    factory: &'a dyn SessionFactory,
    config: Config,
    output_dir: PathBuf,
    report_enabled: bool,
}

impl<'a> Runner<'a> {
    pub fn new(factory: &'a dyn SessionFactory, config: Config, output_dir: &Path) -> Self {
        Self {
            factory,
            config,
            output_dir: output_dir.to_path_buf(),
            report_enabled: false,
        }
    }

    pub fn with_reports(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }

    fn artifacts_dir(&self) -> PathBuf {
        self.output_dir.join("artifacts")
    }

    /// Run `scenarios` in order and return the finished run
    pub async fn run(&self, scenarios: &[Scenario]) -> Result<RunState> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut run = RunState::new(&run_id);
        run.start();
        log::info!("run {} with {} scenario(s)", &run_id[..8], scenarios.len());

        let mut halted = false;
        for scenario in scenarios {
            let mut state = ScenarioState::new(scenario.name());
            if halted {
                state.skip("previous scenario failed".to_string());
                run.add(state);
                continue;
            }

            println!("\n{} {}", "▶".green().bold(), scenario.name().bold());
            state.start();
            self.run_one(*scenario, &mut state).await;
            print_result(&state);

            if matches!(state.status, ScenarioStatus::Failed) && !self.config.continue_on_failure {
                halted = true;
            }
            run.add(state);
        }

        run.finish();
        self.finish(&run)?;
        Ok(run)
    }

    async fn run_one(&self, scenario: Scenario, state: &mut ScenarioState) {
        let session = match self.factory.open(scenario.name()).await {
            Ok(session) => session,
            Err(e) => {
                state.fail(format!("session could not be opened: {:#}", e));
                return;
            }
        };
        log::info!("scenario {} on session {}", scenario, session.session_id());

        let engine = Engine::new(session.clone(), self.config.clone());
        match scenario.run(&engine).await {
            Ok(ScenarioOutcome::Passed) => state.pass(),
            Ok(ScenarioOutcome::Skipped(reason)) => state.skip(reason),
            Err(e) => {
                state.fail(format!("{:#}", e));
                println!("  {} {}", "❌".red(), e);
                state.artifacts = artifacts::save_failure_artifacts(
                    session.as_ref(),
                    &self.artifacts_dir(),
                    scenario.name(),
                )
                .await;
            }
        }
    }

    fn finish(&self, run: &RunState) -> Result<()> {
        let summary = run.summary();
        println!(
            "\n{} {} passed, {} failed, {} skipped ({} total)",
            if summary.all_passed() {
                "✅".green()
            } else {
                "❌".red()
            },
            summary.passed.to_string().green(),
            summary.failed.to_string().red(),
            summary.skipped.to_string().yellow(),
            summary.total
        );

        if !self.report_enabled {
            return Ok(());
        }

        let report = run.to_report();
        let results = crate::report::types::TestResults {
            run_id: report.run_id,
            scenarios: report.scenarios,
            summary: report.summary,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        crate::report::write_reports(&results, &self.output_dir)
    }
}

fn print_result(state: &ScenarioState) {
    let duration = state.duration_ms.unwrap_or(0);
    match &state.status {
        ScenarioStatus::Passed => {
            println!("  {} passed in {}ms", "✓".green(), duration)
        }
        ScenarioStatus::Failed => println!(
            "  {} failed in {}ms: {}",
            "✗".red(),
            duration,
            state.error.as_deref().unwrap_or("unknown error")
        ),
        ScenarioStatus::Skipped { reason } => {
            println!("  {} skipped: {}", "⊘".yellow(), reason)
        }
        _ => {}
    }
}
