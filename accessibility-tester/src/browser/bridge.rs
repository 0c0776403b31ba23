use accessibility_core::{AccessibilityPreferences, SpeechPreferences};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use thirtyfour::prelude::*;

/// One entry of the widget's live feature list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureSnapshot {
    pub id: String,
    pub active: bool,
    pub level: u8,
}

/// What `window.__accessibilityTest.state()` returns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetState {
    pub preferences: AccessibilityPreferences,
    pub speech: SpeechPreferences,
    pub features: Vec<FeatureSnapshot>,
    pub menu_open: bool,
    pub spoken: Vec<String>,
}

impl WidgetState {
    #[must_use]
    pub fn feature(&self, id: &str) -> Option<&FeatureSnapshot> {
        self.features.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct TestBridge<'a> {
    driver: &'a WebDriver,
}

impl<'a> TestBridge<'a> {
    pub const fn new(driver: &'a WebDriver) -> Self {
        Self { driver }
    }

    pub async fn ensure_available(&self) -> Result<()> {
        let result = self
            .driver
            .execute("return !!window.__accessibilityTest", vec![])
            .await?;
        let ok = result.json().as_bool().unwrap_or(false);
        if !ok {
            bail!(
                "__accessibilityTest is not available. Did you pass ?test=1 and load the widget?"
            );
        }
        Ok(())
    }

    /// Toggle a boolean feature by its marker, e.g. `high-contrast`.
    pub async fn toggle(&self, marker: &str) -> Result<()> {
        let result = self
            .driver
            .execute(
                "return window.__accessibilityTest.toggle(arguments[0])",
                vec![marker.into()],
            )
            .await?;
        if !result.json().as_bool().unwrap_or(false) {
            bail!("bridge refused to toggle '{marker}'");
        }
        Ok(())
    }

    /// Press a shortcut by `KeyboardEvent.code`, with or without Alt.
    pub async fn key(&self, code: &str, alt: bool) -> Result<()> {
        let result = self
            .driver
            .execute(
                "return window.__accessibilityTest.key(arguments[0], arguments[1])",
                vec![code.into(), alt.into()],
            )
            .await?;
        if !result.json().as_bool().unwrap_or(false) {
            bail!("no shortcut bound to {code} (alt: {alt})");
        }
        Ok(())
    }

    pub async fn reset(&self) -> Result<()> {
        self.driver
            .execute("window.__accessibilityTest.reset()", vec![])
            .await?;
        Ok(())
    }

    pub async fn state(&self) -> Result<WidgetState> {
        let result = self
            .driver
            .execute("return window.__accessibilityTest.state()", vec![])
            .await?;
        let v = result.json().clone();
        let s: WidgetState = serde_json::from_value(v).context("parsing WidgetState")?;
        Ok(s)
    }

    /// Raw `localStorage` value for a key.
    pub async fn stored(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .driver
            .execute(
                "return window.localStorage.getItem(arguments[0])",
                vec![key.into()],
            )
            .await?;
        Ok(result.json().as_str().map(ToString::to_string))
    }

    pub async fn clear_storage(&self) -> Result<()> {
        self.driver
            .execute("window.localStorage.clear()", vec![])
            .await?;
        Ok(())
    }
}
