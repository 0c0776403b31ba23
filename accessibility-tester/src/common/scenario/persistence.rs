use accessibility_core::{ACCESSIBILITY_KEY, AccessibilityPreferences, Feature, SPEECH_KEY};
use anyhow::{Context, Result, ensure};
use thirtyfour::prelude::*;

use super::catalog::{persistence_plan, reset_all_plan};
use super::{BrowserScenario, CombinedScenario, ScenarioCtx, TestScenario, open_widget};

const MOVE_SLIDERS: &str = "\
    const rate = document.getElementById('speechRate');\
    rate.value = arguments[0];\
    rate.dispatchEvent(new Event('input'));\
    const volume = document.getElementById('speechVolume');\
    volume.value = arguments[1];\
    volume.dispatchEvent(new Event('input'));";

pub struct PersistenceScenario;

pub struct ResetScenario;

fn parse_record(raw: Option<String>) -> Result<Option<AccessibilityPreferences>> {
    raw.map(|raw| serde_json::from_str(&raw).context("stored settings are not valid JSON"))
        .transpose()
}

/// Start from empty storage so earlier scenarios cannot leak in.
async fn fresh_page(driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
    open_widget(driver, ctx).await?;
    ctx.bridge.clear_storage().await?;
    driver.refresh().await?;
    ctx.bridge.ensure_available().await
}

#[async_trait::async_trait]
impl BrowserScenario for PersistenceScenario {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        fresh_page(driver, ctx).await?;

        ctx.bridge.toggle(Feature::HighContrast.marker()).await?;
        ctx.bridge.toggle(Feature::TextSpacing.marker()).await?;
        ctx.bridge.key("Equal", true).await?;
        ctx.bridge.key("Equal", true).await?;
        ctx.bridge.key("KeyR", true).await?;

        let before = ctx.bridge.state().await?;
        let stored = parse_record(ctx.bridge.stored(ACCESSIBILITY_KEY).await?)?;
        ensure!(
            stored == Some(before.preferences),
            "stored {stored:?} differs from live {:?}",
            before.preferences
        );

        driver.refresh().await?;
        ctx.bridge.ensure_available().await?;
        let after = ctx.bridge.state().await?;

        if ctx.verbose {
            println!("  🔁 Reloaded with {:?}", after.preferences);
        }

        ensure!(
            after.preferences == before.preferences,
            "reload changed settings from {:?} to {:?}",
            before.preferences,
            after.preferences
        );
        ensure!(
            after.preferences.font_increase_level == 2 && after.preferences.screen_reader,
            "font level or reader lost on reload: {:?}",
            after.preferences
        );
        ensure!(
            after.spoken.is_empty(),
            "restoring the reader spoke {:?}",
            after.spoken
        );
        Ok(())
    }
}

impl CombinedScenario for PersistenceScenario {
    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario::simulation(
            "persistence-reload",
            persistence_plan(),
        ))
    }
}

#[async_trait::async_trait]
impl BrowserScenario for ResetScenario {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        fresh_page(driver, ctx).await?;

        ctx.bridge.toggle(Feature::HideImages.marker()).await?;
        ctx.bridge.toggle(Feature::InvertColors.marker()).await?;
        ctx.bridge.key("Minus", true).await?;
        driver
            .execute(MOVE_SLIDERS, vec![1.5.into(), 0.5.into()])
            .await?;

        ctx.bridge.reset().await?;

        let state = ctx.bridge.state().await?;
        ensure!(
            state.preferences.is_default(),
            "reset left {:?}",
            state.preferences
        );
        ensure!(
            ctx.bridge.stored(ACCESSIBILITY_KEY).await?.is_none(),
            "display settings still stored after reset"
        );
        ensure!(
            ctx.bridge.stored(SPEECH_KEY).await?.is_some(),
            "speech settings were removed by reset"
        );
        ensure!(
            (state.speech.rate - 1.5).abs() < f64::EPSILON,
            "speech rate changed to {}",
            state.speech.rate
        );
        Ok(())
    }
}

impl CombinedScenario for ResetScenario {
    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario::simulation("reset-all", reset_all_plan()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record_handles_absent_and_present_values() {
        assert_eq!(parse_record(None).unwrap(), None);
        let parsed = parse_record(Some(r#"{"hideImages":true}"#.to_string()))
            .unwrap()
            .expect("record");
        assert!(parsed.hide_images);
        assert!(parse_record(Some("{".to_string())).is_err());
    }
}
