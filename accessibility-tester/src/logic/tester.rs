use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::simulation::{SessionSimulator, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    simulator: SessionSimulator,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            simulator: SessionSimulator::new(verbose),
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (mix: {:?} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.mix,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = self.simulator.run_plan(plan, iteration_seed);

            if let Some(err) = evaluate_expectations(plan, &summary) {
                failures.push(format!(
                    "Iteration {} (seed {}, steps {}, boots {}): {} | last steps: {}",
                    i + 1,
                    summary.seed,
                    summary.steps.len(),
                    summary.boots,
                    err,
                    summarize_recent_steps(&summary)
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} reloads:{}",
                        i + 1,
                        iterations,
                        summary.steps.len(),
                        summary.reloads()
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

/// Invariant violations fail every scenario; scenario expectations follow.
fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if let Some(first) = summary.violations.first() {
        let more = summary.violations.len() - 1;
        return Some(if more == 0 {
            first.clone()
        } else {
            format!("{first} (+{more} more)")
        });
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_recent_steps(summary: &SimulationSummary) -> String {
    if summary.steps.is_empty() {
        return "no steps recorded".to_string();
    }

    let skip = summary.steps.len().saturating_sub(3);
    summary.steps[skip..].join(" -> ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::simulation::ActionMix;

    fn scenario(plan: SimulationPlan) -> TestScenario {
        TestScenario::simulation("Probe", plan)
    }

    #[test]
    fn passing_plan_counts_every_iteration() {
        let tester = LogicTester::new(false);
        let results = tester.run_scenario(
            &scenario(SimulationPlan::new(ActionMix::Everything).with_steps(20)),
            &[11, 12],
            3,
        );
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 3);
            assert_eq!(result.performance_data.len(), 3);
        }
    }

    #[test]
    fn failed_expectation_is_reported_with_context() {
        let plan = SimulationPlan::new(ActionMix::FontOnly)
            .with_steps(4)
            .with_expectation(|_| anyhow::bail!("never satisfied"));
        let results = LogicTester::new(false).run_scenario(&scenario(plan), &[5], 2);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("never satisfied"));
        assert!(result.failures[0].contains("seed 5"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn violations_fail_before_expectations_run() {
        let summary = SimulationSummary {
            violations: vec!["step 2 (reload): a".into(), "step 3 (reload): b".into()],
            ..SimulationSummary::default()
        };
        let plan = SimulationPlan::new(ActionMix::Everything);
        let err = evaluate_expectations(&plan, &summary).unwrap_or_default();
        assert_eq!(err, "step 2 (reload): a (+1 more)");
    }

    #[test]
    fn recent_steps_keep_the_last_three() {
        let summary = SimulationSummary {
            steps: ["a", "b", "c", "d"].map(String::from).to_vec(),
            ..SimulationSummary::default()
        };
        assert_eq!(summarize_recent_steps(&summary), "b -> c -> d");
    }

    #[test]
    fn durations_serialize_as_milliseconds() {
        let result = ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
    }
}
