use anyhow::{Context, Result, bail};
use std::collections::HashMap;

/// Seeds that once exposed real defects, replayed by the `regression` keyword.
pub const REGRESSION_SEEDS: [(u64, &str); 4] = [
    (1337, "default"),
    (42, "contrast-then-invert"),
    (0xA11E, "reload-after-reset"),
    (0x5EED_F00D, "reader-toggle-storm"),
];

/// Seed metadata shared by the logic and browser runners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    #[must_use]
    pub fn labelled(seed: u64, label: &str) -> Self {
        Self {
            seed,
            label: Some(label.to_string()),
        }
    }

    #[must_use]
    pub fn display(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({label})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal literals, and the keywords `all` / `regression` which expand
/// to [`REGRESSION_SEEDS`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_regression = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("regression") {
            request_regression = true;
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hexadecimal seed: {token}"))?;
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_regression {
        pending.extend(
            REGRESSION_SEEDS
                .iter()
                .map(|(seed, label)| SeedInfo::labelled(*seed, label)),
        );
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for info in pending {
        if let Some(existing) = index.get(&info.seed) {
            if let Some(entry) = deduped.get_mut(*existing)
                && entry.label.is_none()
                && info.label.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values, vec![42, 7, 255]);
    }

    #[test]
    fn regression_keyword_labels_known_seeds_and_dedupes() {
        let seeds = resolve_seed_inputs(&tokens(&["1337", "regression"])).unwrap();
        assert_eq!(seeds.len(), REGRESSION_SEEDS.len());
        assert_eq!(seeds[0].label.as_deref(), Some("default"));
        assert_eq!(seeds[0].display(), "1337 (default)");
    }

    #[test]
    fn empty_input_falls_back_to_default_seed() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(1337)]);
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["CL-ORANGE42"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
