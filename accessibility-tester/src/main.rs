mod browser;
mod common;
mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use browser::{BrowserConfig, BrowserKind, TestBridge, new_session};
use common::scenario::{
    BrowserScenario, NamedScenario, ScenarioCtx, all_scenario_names, list_scenarios,
    resolve_scenarios,
};
use common::{artifacts_dir, capture_artifacts, split_csv};
use logic::{LogicTester, ScenarioResult, SeedInfo, resolve_seed_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Headless engine sessions (fast, no browser)
    Logic,
    /// Browser automation against a page hosting the widget
    Browser,
    /// Run both logic and browser tests
    Both,
}

impl TestMode {
    const fn runs_logic(self) -> bool {
        matches!(self, Self::Logic | Self::Both)
    }

    const fn runs_browser(self) -> bool {
        matches!(self, Self::Browser | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "accessibility-tester", version)]
#[command(about = "Automated QA for the accessibility widget - headless sessions and browser automation")]
struct Args {
    /// Test mode: logic (fast), browser (real page), or both
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x-hex or `regression`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Sessions per scenario and seed (logic mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    #[arg(short, long)]
    verbose: bool,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Browsers to drive, comma-separated (browser mode only)
    #[arg(long, value_enum, value_delimiter = ',', default_value = "chrome")]
    browsers: Vec<BrowserKind>,

    /// URL of a page hosting the widget (include ?test=1 to expose the bridge)
    #[arg(long, default_value = "http://localhost:8080/?test=1")]
    base_url: String,

    /// Where failing browser runs leave screenshots and state dumps
    #[arg(long, default_value = "target/test-artifacts")]
    artifacts_dir: String,

    /// Remote WebDriver hub used instead of the local driver ports
    #[arg(long)]
    hub: Option<String>,

    /// Show browser windows
    #[arg(long)]
    windowed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        let mut out = open_output(args.output.as_deref())?;
        write_scenario_list(&mut out)?;
        return Ok(out.flush()?);
    }

    println!("{}", "♿ Accessibility Widget Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());

    let start_time = Instant::now();
    let scenarios = resolve_scenarios(&expand_scenarios(&args.scenarios))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let results = run_logic_scenarios(&args, &scenarios, &seeds);
    let browser_failures = run_browser_scenarios(&args, &scenarios, &seeds).await;

    let mut out = open_output(args.output.as_deref())?;
    write_report(&mut out, args.report, &results, start_time.elapsed())?;
    out.flush()?;

    if results.iter().any(|r| !r.passed) || browser_failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(stdout())),
    })
}

fn write_scenario_list(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    Ok(())
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for name in all_scenario_names() {
            if !scenarios.contains(&name) {
                scenarios.push(name);
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[NamedScenario],
    seeds: &[SeedInfo],
) -> Vec<ScenarioResult> {
    if !args.mode.runs_logic() {
        return Vec::new();
    }
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());

    let tester = LogicTester::new(args.verbose);
    let seeds: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
    scenarios
        .iter()
        .filter_map(|(_, scenario)| scenario.as_logic_scenario())
        .flat_map(|scenario| tester.run_scenario(&scenario, &seeds, args.iterations))
        .collect()
}

/// Returns how many browser runs failed, counting a driver that never
/// started as one failure.
async fn run_browser_scenarios(
    args: &Args,
    scenarios: &[NamedScenario],
    seeds: &[SeedInfo],
) -> usize {
    if !args.mode.runs_browser() {
        return 0;
    }
    println!("{}", "🌐 Running Browser Tests".bright_blue().bold());

    let cfg = BrowserConfig {
        headless: !args.windowed,
        remote_hub: args.hub.clone(),
        ..BrowserConfig::default()
    };
    let mut failures = 0;
    for &kind in &args.browsers {
        let driver = match new_session(kind, &cfg).await {
            Ok(driver) => driver,
            Err(err) => {
                eprintln!("❌ Could not start {}: {err}", kind.label());
                failures += 1;
                continue;
            }
        };
        for (name, scenario) in scenarios {
            for seed in seeds {
                let ctx = ScenarioCtx {
                    base_url: args.base_url.clone(),
                    seed: seed.seed,
                    bridge: TestBridge::new(&driver),
                    verbose: args.verbose,
                };
                let started = Instant::now();
                let tag = format!("[{} seed {}] {name}", kind.label(), seed.display());
                match scenario.run_browser(&driver, &ctx).await {
                    Ok(()) => println!("✅ {tag} - {:?}", started.elapsed()),
                    Err(err) => {
                        failures += 1;
                        eprintln!("❌ {tag} - {:?}: {err:#}", started.elapsed());
                        let dir =
                            artifacts_dir(&args.artifacts_dir, kind.label(), name, seed.seed);
                        if let Err(capture_err) = capture_artifacts(&driver, &dir, &err).await {
                            log::warn!("could not capture artifacts in {dir}: {capture_err:#}");
                        }
                    }
                }
            }
        }
        let _ = driver.quit().await;
    }
    failures
}

fn write_report(
    out: &mut dyn Write,
    format: ReportFormat,
    results: &[ScenarioResult],
    elapsed: Duration,
) -> Result<()> {
    match format {
        ReportFormat::Json => logic::reports::generate_json_report(out, results),
        ReportFormat::Markdown => logic::reports::generate_markdown_report(out, results),
        ReportFormat::Console => {
            logic::reports::generate_console_report(out, results, elapsed)?;
            writeln!(out, "\n🏁 Total time: {elapsed:?}")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("accessibility-tester").chain(extra.iter().copied()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "font-scale-bounds".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["font level reached 4".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    fn report(format: ReportFormat, results: &[ScenarioResult]) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_report(&mut buf, format, results, Duration::from_millis(5)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("reset-all,all");
        assert_eq!(expanded[0], "reset-all");
        assert!(expanded.contains(&"unsupported-speech".to_string()));
        assert_eq!(expanded.iter().filter(|s| *s == "reset-all").count(), 1);
    }

    #[test]
    fn parses_browser_list_and_report_format() {
        let parsed = args(&["--browsers", "firefox,edge", "--report", "markdown", "--windowed"]);
        assert_eq!(parsed.browsers, [BrowserKind::Firefox, BrowserKind::Edge]);
        assert_eq!(parsed.report, ReportFormat::Markdown);
        assert!(parsed.windowed);
        assert!(Args::try_parse_from(["accessibility-tester", "--browsers", "lynx"]).is_err());
    }

    #[test]
    fn logic_run_covers_every_scenario_and_seed() {
        let parsed = args(&["--iterations", "1"]);
        let scenarios =
            resolve_scenarios(&expand_scenarios("font-scale-bounds,reset-all")).unwrap();
        let seeds = resolve_seed_inputs(&["1".to_string(), "2".to_string()]).unwrap();
        let results = run_logic_scenarios(&parsed, &scenarios, &seeds);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn logic_run_is_skipped_in_browser_mode() {
        let parsed = args(&["--mode", "browser"]);
        let scenarios = resolve_scenarios(&["smoke".to_string()]).unwrap();
        let seeds = [SeedInfo::from_numeric(42)];
        assert!(run_logic_scenarios(&parsed, &scenarios, &seeds).is_empty());
        let failures = tokio_test::block_on(run_browser_scenarios(
            &args(&[]),
            &scenarios,
            &seeds,
        ));
        assert_eq!(failures, 0);
    }

    #[test]
    fn unknown_scenario_stops_the_run() {
        let err = resolve_scenarios(&expand_scenarios("smoke,reading-guide"))
            .err()
            .expect("unknown scenario");
        assert!(err.to_string().contains("Unknown scenario"));
    }

    #[test]
    fn reports_render_in_each_format() {
        let json = report(ReportFormat::Json, &[sample_result(false)]);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["failures"][0], "font level reached 4");

        let markdown = report(ReportFormat::Markdown, &[sample_result(true)]);
        assert!(markdown.starts_with("# Accessibility Widget Logic Test Results"));

        let console = report(ReportFormat::Console, &[sample_result(true)]);
        assert!(console.contains("Logic Test Results Summary"));
        assert!(console.contains("Total time"));

        assert_eq!(report(ReportFormat::Json, &[]).trim(), "[]");
    }

    #[test]
    fn scenario_list_names_every_catalog_entry() {
        let mut buf = Vec::new();
        write_scenario_list(&mut buf).unwrap();
        let listed = String::from_utf8(buf).unwrap();
        for name in all_scenario_names() {
            assert!(listed.contains(&name), "{name}");
        }
    }
}
