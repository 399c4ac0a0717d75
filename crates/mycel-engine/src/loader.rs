//! Reference calibration loading.
//!
//! The store starts from the published baseline table; a TOML or JSON
//! overlay file replaces only the entries it names. Loaded once at
//! startup and shared read-only afterwards.

use anyhow::{bail, Context, Result};
use mycel_core::{Biome, ParameterKind, ReferenceDistribution, ReferenceStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// One calibration entry as written in overlay files. Moments are
/// optional; absent ones are derived from the range the same way the
/// baseline table derives them.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReferenceEntry {
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub std_dev: Option<f64>,
    #[serde(default)]
    pub optimal_band: Option<(f64, f64)>,
}

impl RawReferenceEntry {
    fn into_distribution(self) -> ReferenceDistribution {
        let mut dist = ReferenceDistribution::from_range(self.lower, self.upper);
        if let Some(mean) = self.mean {
            dist.mean = mean;
        }
        if let Some(std_dev) = self.std_dev {
            dist.std_dev = std_dev;
        }
        dist.optimal_band = self.optimal_band;
        dist
    }
}

type RawOverlay = BTreeMap<Biome, BTreeMap<ParameterKind, RawReferenceEntry>>;

/// Baseline table with an overlay file applied on top.
pub fn load_reference_store(path: impl AsRef<Path>) -> Result<ReferenceStore> {
    let mut store = ReferenceStore::baseline();
    let applied = apply_overlay_file(&mut store, path.as_ref())?;
    info!(
        entries = store.len(),
        overridden = applied,
        "reference store loaded"
    );
    Ok(store)
}

/// Apply one overlay file; returns how many entries it replaced or added.
pub fn apply_overlay_file(store: &mut ReferenceStore, path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading reference overlay {}", path.display()))?;

    let overlay: RawOverlay = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("parsing TOML overlay {}", path.display()))?,
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON overlay {}", path.display()))?,
        other => bail!(
            "unsupported reference overlay format {:?} for {}",
            other,
            path.display()
        ),
    };

    let mut applied = 0;
    for (biome, kinds) in overlay {
        for (kind, entry) in kinds {
            if entry.lower >= entry.upper {
                bail!("overlay entry {biome}/{kind} has inverted range");
            }
            store.insert(biome, kind, entry.into_distribution());
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toml_overlay_replaces_named_entries_only() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
            [temperate_broadleaf.rho_e]
            lower = 0.25
            upper = 0.70
            "#
        )
        .unwrap();

        let store = load_reference_store(file.path()).unwrap();
        let overridden = store
            .get(Biome::TemperateBroadleaf, ParameterKind::RhoE)
            .unwrap();
        assert_eq!(overridden.lower, 0.25);
        assert_eq!(overridden.upper, 0.70);
        // Everything else keeps the baseline.
        let untouched = store
            .get(Biome::TemperateBroadleaf, ParameterKind::EtaNw)
            .unwrap();
        assert_eq!(untouched.lower, 0.32);
        assert_eq!(store.len(), 40);
    }

    #[test]
    fn test_json_overlay_with_band_and_moments() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
              "subarctic_birch": {{
                "ser": {{
                  "lower": 0.38, "upper": 1.72,
                  "mean": 1.0, "std_dev": 0.2,
                  "optimal_band": [0.86, 1.14]
                }}
              }}
            }}"#
        )
        .unwrap();

        let store = load_reference_store(file.path()).unwrap();
        let entry = store.get(Biome::SubarcticBirch, ParameterKind::Ser).unwrap();
        assert_eq!(entry.mean, 1.0);
        assert_eq!(entry.optimal_band, Some((0.86, 1.14)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
            [boreal_conifer.bfs]
            lower = 0.9
            upper = 0.3
            "#
        )
        .unwrap();
        assert!(load_reference_store(file.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "x: 1").unwrap();
        assert!(load_reference_store(file.path()).is_err());
    }
}
