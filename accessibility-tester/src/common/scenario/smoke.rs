use accessibility_core::Feature;
use anyhow::{Result, ensure};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use thirtyfour::prelude::*;

use super::catalog::smoke_plan;
use super::{BrowserScenario, CombinedScenario, ScenarioCtx, TestScenario, has_class, open_widget};
use crate::browser::WidgetState;

/// Alt shortcuts the seeded walk draws from.
const WALK_KEYS: [&str; 9] = [
    "KeyC", "KeyI", "KeyS", "KeyL", "KeyT", "KeyH", "KeyG", "Equal", "Minus",
];
const WALK_LENGTH: usize = 8;

pub struct SmokeScenario;

/// Each feature's entry in the live list must agree with the record.
fn check_consistency(state: &WidgetState) -> Result<()> {
    for feature in Feature::ALL {
        let listed = state.feature(feature.marker()).map(|f| f.active);
        let recorded = state.preferences.is_enabled(feature);
        ensure!(
            listed == Some(recorded),
            "{} listed as {listed:?} but recorded as {recorded}",
            feature.marker()
        );
    }
    let font = &state.preferences;
    ensure!(
        font.font_increase_level == 0 || font.font_decrease_level == 0,
        "both font levels set: +{} / -{}",
        font.font_increase_level,
        font.font_decrease_level
    );
    let listed_level = state.feature("font-increase").map_or(0, |f| f.level);
    ensure!(
        listed_level == font.font_increase_level,
        "font-increase listed at {listed_level} but recorded at {}",
        font.font_increase_level
    );
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for SmokeScenario {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        open_widget(driver, ctx).await?;
        ctx.bridge.clear_storage().await?;
        driver.refresh().await?;
        ctx.bridge.ensure_available().await?;

        if ctx.verbose {
            println!("  🌐 Widget loaded, bridge connected, seed: {}", ctx.seed);
        }

        driver.find(By::Id("accessibilityMenu")).await?.click().await?;
        ensure!(
            ctx.bridge.state().await?.menu_open,
            "menu did not open on click"
        );
        ctx.bridge.key("KeyA", true).await?;
        ensure!(
            !ctx.bridge.state().await?.menu_open,
            "Alt+A did not close the menu"
        );

        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);
        for _ in 0..WALK_LENGTH {
            let Some(code) = WALK_KEYS.choose(&mut rng) else {
                break;
            };
            ctx.bridge.key(code, true).await?;
            if ctx.verbose {
                println!("  ⌨️  Alt+{code}");
            }
            check_consistency(&ctx.bridge.state().await?)?;
        }

        let state = ctx.bridge.state().await?;
        for feature in Feature::ALL {
            let shown = has_class(driver, feature.indicator_id(), "active").await?;
            ensure!(
                shown == state.preferences.is_enabled(feature),
                "{} indicator shows {shown}",
                feature.indicator_id()
            );
        }

        if ctx.verbose {
            println!("  ✅ Indicators match after {WALK_LENGTH} shortcuts");
        }
        Ok(())
    }
}

impl CombinedScenario for SmokeScenario {
    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario::simulation("smoke", smoke_plan()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::bridge::FeatureSnapshot;
    use accessibility_core::AccessibilityPreferences;

    fn state_with(prefs: AccessibilityPreferences, listed_contrast: bool) -> WidgetState {
        let mut features: Vec<FeatureSnapshot> = Feature::ALL
            .into_iter()
            .map(|f| FeatureSnapshot {
                id: f.marker().to_string(),
                active: if f == Feature::HighContrast {
                    listed_contrast
                } else {
                    prefs.is_enabled(f)
                },
                level: 0,
            })
            .collect();
        features.push(FeatureSnapshot {
            id: "font-increase".to_string(),
            active: prefs.font_increase_level > 0,
            level: prefs.font_increase_level,
        });
        WidgetState {
            preferences: prefs,
            features,
            ..WidgetState::default()
        }
    }

    #[test]
    fn consistency_check_accepts_matching_state() {
        let prefs = AccessibilityPreferences {
            high_contrast: true,
            font_increase_level: 2,
            ..AccessibilityPreferences::default()
        };
        assert!(check_consistency(&state_with(prefs, true)).is_ok());
    }

    #[test]
    fn consistency_check_flags_a_stale_feature() {
        let prefs = AccessibilityPreferences::default();
        let err = check_consistency(&state_with(prefs, true)).unwrap_err();
        assert!(err.to_string().contains("high-contrast"));
    }

    #[test]
    fn walk_keys_are_all_bound() {
        for code in WALK_KEYS {
            assert!(
                accessibility_core::key_from_code(code).is_some(),
                "{code}"
            );
        }
    }
}
