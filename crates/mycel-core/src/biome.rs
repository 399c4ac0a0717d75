//! Biome categories used to select reference calibrations.
//!
//! A sampled unit belongs to exactly one biome; the biome picks which
//! reference distribution normalizes its raw measurements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse ecological category for reference selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    TemperateBroadleaf,
    BorealConifer,
    TropicalMontane,
    MediterraneanWoodland,
    SubarcticBirch,
}

impl Biome {
    /// All biomes in a stable order.
    pub const ALL: [Biome; 5] = [
        Biome::TemperateBroadleaf,
        Biome::BorealConifer,
        Biome::TropicalMontane,
        Biome::MediterraneanWoodland,
        Biome::SubarcticBirch,
    ];

    /// Stable snake_case key, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            Biome::TemperateBroadleaf => "temperate_broadleaf",
            Biome::BorealConifer => "boreal_conifer",
            Biome::TropicalMontane => "tropical_montane",
            Biome::MediterraneanWoodland => "mediterranean_woodland",
            Biome::SubarcticBirch => "subarctic_birch",
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_biomes_distinct() {
        for (i, a) in Biome::ALL.iter().enumerate() {
            for b in Biome::ALL.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_key_roundtrip() {
        for biome in Biome::ALL {
            let json = serde_json::to_string(&biome).unwrap();
            assert_eq!(json, format!("\"{}\"", biome.key()));
        }
    }
}
