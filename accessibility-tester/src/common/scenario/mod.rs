use anyhow::Result;
use thirtyfour::prelude::*;

use crate::browser::TestBridge;
use crate::logic::SimulationPlan;

pub mod catalog;
pub mod persistence;
pub mod smoke;

use catalog::{CATALOG, find_catalog_scenario};
use persistence::{PersistenceScenario, ResetScenario};
use smoke::SmokeScenario;

#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a> {
    pub base_url: String,
    pub seed: u64,
    pub bridge: TestBridge<'a>,
    pub verbose: bool,
}

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

// Browser test scenario
#[async_trait::async_trait]
pub trait BrowserScenario {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()>;
}

// Combined scenario that can run both logic and browser tests
pub trait CombinedScenario: BrowserScenario + Send + Sync {
    fn as_logic_scenario(&self) -> Option<TestScenario>;
}

/// A logic-only scenario; the browser side reports that it has no flow.
#[derive(Debug, Clone)]
pub struct SimulationScenario {
    name: &'static str,
    plan: SimulationPlan,
}

impl SimulationScenario {
    pub fn new(name: &'static str, plan: SimulationPlan) -> Self {
        Self { name, plan }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

#[async_trait::async_trait]
impl BrowserScenario for SimulationScenario {
    async fn run_browser(&self, _driver: &WebDriver, _ctx: &ScenarioCtx<'_>) -> Result<()> {
        anyhow::bail!("no browser flow for scenario '{}'", self.name)
    }
}

impl CombinedScenario for SimulationScenario {
    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario::simulation(self.name, self.plan.clone()))
    }
}

/// Navigate to the page and wait for the widget and its test bridge.
pub async fn open_widget(driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
    driver.goto(&ctx.base_url).await?;
    driver.find(By::Id("accessibilityMenu")).await?;
    ctx.bridge.ensure_available().await
}

/// Whether an element currently carries a class.
pub async fn has_class(driver: &WebDriver, id: &str, class: &str) -> Result<bool> {
    let element = driver.find(By::Id(id)).await?;
    let classes = element.class_name().await?.unwrap_or_default();
    Ok(classes.split_whitespace().any(|c| c == class))
}

pub fn get_scenario(name: &str) -> Option<Box<dyn CombinedScenario>> {
    match name {
        "smoke" => Some(Box::new(SmokeScenario)),
        "persistence-reload" => Some(Box::new(PersistenceScenario)),
        "reset-all" => Some(Box::new(ResetScenario)),
        other => find_catalog_scenario(other)
            .map(|scenario| Box::new(scenario) as Box<dyn CombinedScenario>),
    }
}

pub type NamedScenario = (String, Box<dyn CombinedScenario>);

/// Look up every requested name, failing on the first one nobody knows.
pub fn resolve_scenarios(names: &[String]) -> Result<Vec<NamedScenario>> {
    names
        .iter()
        .map(|name| match get_scenario(name) {
            Some(scenario) => Ok((name.clone(), scenario)),
            None => anyhow::bail!(
                "Unknown scenario: {name} (see --list-scenarios)"
            ),
        })
        .collect()
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|entry| (entry.name, entry.description))
        .collect()
}

/// Every scenario name, in catalogue order.
pub fn all_scenario_names() -> Vec<String> {
    CATALOG.iter().map(|entry| entry.name.to_string()).collect()
}
