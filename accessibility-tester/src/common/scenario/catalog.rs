use accessibility_core::{
    ACCESSIBILITY_KEY, AccessibilityPreferences, Action, ContrastPolicy, Feature, SPEECH_KEY,
    WidgetConfig,
};
use anyhow::{Result, ensure};

use crate::common::scenario::SimulationScenario;
use crate::logic::{ActionMix, SimStep, SimulationPlan, SimulationSummary};

const GARBLED_SPEECH: &str = "{rate: fast";
const RESET_RATE: f64 = 1.5;
const RESET_VOLUME: f64 = 0.5;

pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub plan: fn() -> SimulationPlan,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "smoke",
        description: "Random shortcuts, clicks and reloads on a fresh page",
        plan: smoke_plan,
    },
    CatalogEntry {
        name: "persistence-reload",
        description: "Reload-heavy sessions; every load must reproduce the stored settings",
        plan: persistence_plan,
    },
    CatalogEntry {
        name: "font-scale-bounds",
        description: "Font level walk that must stay in range and saturate at the maximum",
        plan: font_scale_plan,
    },
    CatalogEntry {
        name: "screen-reader-exclusions",
        description: "Reader clicks on page content, widget controls and excluded blocks",
        plan: reader_exclusions_plan,
    },
    CatalogEntry {
        name: "exclusive-contrast",
        description: "High contrast clears the colour filters under the exclusive policy",
        plan: exclusive_contrast_plan,
    },
    CatalogEntry {
        name: "corrupted-store-recovery",
        description: "Unreadable stored speech settings wipe storage and boot from defaults",
        plan: corrupted_store_plan,
    },
    CatalogEntry {
        name: "unsupported-speech",
        description: "No speech backend: nothing is spoken and the user is told once per page",
        plan: unsupported_speech_plan,
    },
    CatalogEntry {
        name: "reset-all",
        description: "Reset clears display settings and keeps speech settings",
        plan: reset_all_plan,
    },
];

pub fn catalog_scenarios() -> Vec<SimulationScenario> {
    CATALOG
        .iter()
        .map(|entry| SimulationScenario::new(entry.name, (entry.plan)()))
        .collect()
}

pub fn find_catalog_scenario(name: &str) -> Option<SimulationScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name() == name)
}

pub fn smoke_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::Everything)
        .then(SimStep::Shortcut(Action::Toggle(Feature::HighlightLinks)))
        .then(SimStep::Reload)
        .with_expectation(stored_record_matches_final_state)
}

pub fn persistence_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::ReloadHeavy)
        .with_steps(60)
        .then(SimStep::Reload)
        .with_expectation(at_least_one_reload)
        .with_expectation(stored_record_matches_final_state)
}

pub fn font_scale_plan() -> SimulationPlan {
    let mut plan = SimulationPlan::new(ActionMix::FontOnly).with_steps(30);
    for _ in 0..5 {
        plan = plan.then(SimStep::Shortcut(Action::IncreaseFont));
    }
    plan.with_expectation(font_saturates_at_maximum)
}

pub fn reader_exclusions_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::ReaderClicks)
        .with_steps(50)
        .with_expectation(excluded_text_never_spoken)
}

pub fn exclusive_contrast_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::Everything)
        .with_config(WidgetConfig {
            contrast_policy: ContrastPolicy::ExclusiveHighContrast,
            ..WidgetConfig::default()
        })
        .then(SimStep::Shortcut(Action::Toggle(Feature::HighContrast)))
        .with_expectation(colour_filters_cleared_by_contrast)
}

pub fn corrupted_store_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::Everything)
        .with_steps(20)
        .with_record(ACCESSIBILITY_KEY, r#"{"highContrast":true}"#)
        .with_record(SPEECH_KEY, GARBLED_SPEECH)
        .with_expectation(first_boot_recovered)
}

pub fn unsupported_speech_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::ReaderClicks)
        .without_speech()
        .then(SimStep::TestSpeech)
        .then(SimStep::TestSpeech)
        .with_expectation(speech_degrades_to_notices)
}

pub fn reset_all_plan() -> SimulationPlan {
    SimulationPlan::new(ActionMix::Everything)
        .with_steps(30)
        .then(SimStep::Speech {
            rate: RESET_RATE,
            volume: RESET_VOLUME,
        })
        .then(SimStep::Shortcut(Action::ResetAll))
        .with_expectation(reset_keeps_only_speech)
}

fn stored_record_matches_final_state(summary: &SimulationSummary) -> Result<()> {
    let stored = summary
        .stored_preferences
        .as_deref()
        .map(serde_json::from_str::<AccessibilityPreferences>)
        .transpose()?;
    match stored {
        Some(saved) => ensure!(
            saved == summary.final_preferences,
            "stored {saved:?} but the page shows {:?}",
            summary.final_preferences
        ),
        None => ensure!(
            summary.final_preferences.is_default(),
            "settings {:?} were never stored",
            summary.final_preferences
        ),
    }
    Ok(())
}

fn at_least_one_reload(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.reloads() >= 1, "session never reloaded");
    Ok(())
}

fn font_saturates_at_maximum(summary: &SimulationSummary) -> Result<()> {
    let max = WidgetConfig::default().max_font_level;
    let prefs = &summary.final_preferences;
    ensure!(
        summary.peak_font_level <= max,
        "font level reached {}",
        summary.peak_font_level
    );
    ensure!(
        prefs.font_increase_level == max && prefs.font_decrease_level == 0,
        "five increases ended at +{} / -{}",
        prefs.font_increase_level,
        prefs.font_decrease_level
    );
    Ok(())
}

fn excluded_text_never_spoken(summary: &SimulationSummary) -> Result<()> {
    for text in &summary.utterances {
        ensure!(
            !text.contains("Sponsored content") && text != "High Contrast",
            "reader spoke '{text}'"
        );
    }
    Ok(())
}

fn colour_filters_cleared_by_contrast(summary: &SimulationSummary) -> Result<()> {
    let prefs = &summary.final_preferences;
    ensure!(
        !prefs.invert_colors && !prefs.saturate_colors,
        "contrast toggle left filters on: {prefs:?}"
    );
    Ok(())
}

fn first_boot_recovered(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.recovered_boots >= 1,
        "garbled speech settings were accepted"
    );
    ensure!(
        summary.stored_speech.as_deref() != Some(GARBLED_SPEECH),
        "garbled speech settings are still stored"
    );
    Ok(())
}

fn speech_degrades_to_notices(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.utterances.is_empty(),
        "{} utterances reached a missing backend",
        summary.utterances.len()
    );
    ensure!(summary.notices >= 1, "the user was never told");
    ensure!(
        summary.notices <= summary.boots,
        "{} notices over {} page loads",
        summary.notices,
        summary.boots
    );
    Ok(())
}

fn reset_keeps_only_speech(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_preferences.is_default(),
        "reset left {:?}",
        summary.final_preferences
    );
    ensure!(
        summary.stored_preferences.is_none(),
        "display record survived reset"
    );
    ensure!(
        summary.stored_speech.is_some(),
        "speech record was removed by reset"
    );
    ensure!(
        (summary.final_speech.rate - RESET_RATE).abs() < f64::EPSILON
            && (summary.final_speech.volume - RESET_VOLUME).abs() < f64::EPSILON,
        "speech settings changed to {:?}",
        summary.final_speech
    );
    Ok(())
}
