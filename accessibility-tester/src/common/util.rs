use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::Path};
use thirtyfour::prelude::*;

const STATE_SCRIPT: &str = "return window.__accessibilityTest && window.__accessibilityTest.state && window.__accessibilityTest.state()";
const STORAGE_SCRIPT: &str = "return { accessibilitySettings: window.localStorage.getItem('accessibilitySettings'), speechSettings: window.localStorage.getItem('speechSettings') }";

pub fn artifacts_dir(base: &str, browser: &str, scenario: &str, seed: u64) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    format!("{base}/{browser}/{scenario}/seed-{seed}/{ts}")
}

/// Everything captured from a failed browser scenario.
#[derive(Debug, Default)]
struct Artifacts<'a> {
    screenshot: Option<&'a [u8]>,
    source: Option<&'a str>,
    state: Option<&'a serde_json::Value>,
    storage: Option<&'a serde_json::Value>,
}

pub async fn capture_artifacts(driver: &WebDriver, dir: &str, err: &anyhow::Error) -> Result<()> {
    let screenshot = driver.screenshot_as_png().await.ok();
    let source = driver.source().await.ok();
    let state = driver
        .execute(STATE_SCRIPT, vec![])
        .await
        .ok()
        .map(|ret| ret.json().clone());
    let storage = driver
        .execute(STORAGE_SCRIPT, vec![])
        .await
        .ok()
        .map(|ret| ret.json().clone());
    let chain = format!("{err:#}");

    write_artifact_files(
        Path::new(dir),
        &Artifacts {
            screenshot: screenshot.as_deref(),
            source: source.as_deref(),
            state: state.as_ref(),
            storage: storage.as_ref(),
        },
        &chain,
    )
}

fn write_artifact_files(dir: &Path, artifacts: &Artifacts<'_>, error_chain: &str) -> Result<()> {
    fs::create_dir_all(dir).context("creating artifacts dir")?;

    if let Some(png) = artifacts.screenshot {
        let _ = fs::write(dir.join("screenshot.png"), png);
    }

    if let Some(src) = artifacts.source {
        let _ = fs::write(dir.join("dom.html"), src);
    }

    for (name, value) in [
        ("state.json", artifacts.state),
        ("storage.json", artifacts.storage),
    ] {
        if let Some(value) = value {
            let payload = serde_json::to_vec_pretty(value).unwrap_or_default();
            let _ = fs::write(dir.join(name), payload);
        }
    }

    let _ = fs::write(dir.join("error.txt"), error_chain);

    Ok(())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}
