use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use swag_tester::driver::query;
use swag_tester::driver::source::{PageSource, UiNode};
use swag_tester::driver::{ReplayFactory, ReplayScript, Strategy};
use swag_tester::runner::{Runner, Scenario};
use swag_tester::engine::extract;
use swag_tester::{report, utils};

#[derive(Parser)]
#[command(name = "swag-tester")]
#[command(version = "0.1.0")]
#[command(about = "Resilient UI scenario runner for the Swag Labs mobile app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against a replay script
    Run {
        /// Replay script (YAML) describing the captured screens
        #[arg(long)]
        replay: PathBuf,

        /// Configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Scenario to run; can be given multiple times (default: all)
        #[arg(short, long)]
        scenario: Vec<String>,

        /// Generate reports (JSON, JUnit)
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// List locator candidates found in a captured page source
    Locators {
        /// Page source XML file
        source: PathBuf,
    },

    /// Evaluate one locator against a captured page source
    Check {
        /// Page source XML file
        source: PathBuf,

        /// Locator strategy (accessibility id, id, name, class name, predicate, xpath, uiautomator)
        #[arg(short, long)]
        strategy: Strategy,

        /// Locator expression
        expression: String,
    },

    /// Regenerate a report from saved results
    Report {
        /// Path to test-results.json
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "junit")]
        format: String,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            replay,
            config,
            output,
            scenario,
            report,
        } => {
            let config = match config {
                Some(path) => utils::config::Config::load(&path)?,
                None => utils::config::Config::default(),
            }
            .with_env()?;
            let scenarios = Scenario::select(&scenario)?;
            let script = ReplayScript::load(&replay)?;

            println!(
                "{} Running {} scenario(s) from: {}",
                "▶".green().bold(),
                scenarios.len(),
                replay.display()
            );
            println!("  Platform: {}", config.platform.cyan());
            println!("  Output: {}", output.display().to_string().cyan());
            if report {
                println!("  Reports: {}", "Enabled".green());
            }

            let factory = ReplayFactory::new(script);
            let run = Runner::new(&factory, config, &output)
                .with_reports(report)
                .run(&scenarios)
                .await?;

            if !run.summary().all_passed() {
                std::process::exit(1);
            }
        }

        Commands::Locators { source } => {
            let src = load_source(&source)?;
            let hints = src.locator_hints();
            println!(
                "{} {} locator candidate(s) in {}",
                "🔍".to_string().blue(),
                hints.len(),
                source.display()
            );
            for hint in hints {
                println!(
                    "  {:<32} id={} label={} value={}",
                    hint.element_type.dimmed(),
                    hint.accessibility_id.as_deref().unwrap_or("-").cyan(),
                    hint.label.as_deref().unwrap_or("-"),
                    hint.value.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Check {
            source,
            strategy,
            expression,
        } => {
            let src = load_source(&source)?;
            let hits = query::select(&src, strategy, &expression, None)?;
            if hits.is_empty() {
                println!("{} No match for {}={}", "✗".red(), strategy, expression);
                std::process::exit(1);
            }
            println!("{} {} match(es)", "✓".green(), hits.len());
            for idx in hits {
                let Some(node) = src.node(idx) else { continue };
                println!(
                    "  #{:<4} {} id={} text={} {}",
                    idx,
                    node.element_type().cyan(),
                    node.accessibility_id().unwrap_or("-"),
                    extract::normalize(&node.node_text()),
                    rect_label(node).dimmed()
                );
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, &output)?;
        }
    }

    Ok(())
}

fn rect_label(node: &UiNode) -> String {
    node.rect()
        .map(|r| format!("[{},{} {}x{}]", r.x, r.y, r.width, r.height))
        .unwrap_or_default()
}

fn load_source(path: &Path) -> anyhow::Result<PageSource> {
    use anyhow::Context;
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page source: {}", path.display()))?;
    PageSource::parse(&xml).with_context(|| format!("Invalid page source: {}", path.display()))
}
