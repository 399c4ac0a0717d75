//! The eight MNIS indicator kinds and their fixed properties.
//!
//! Each kind carries a symbol, a physical unit, a composite weight
//! (the weight table sums to 1.0), a physically plausible domain, and a
//! normalization shape. All of these are fixed at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a raw value maps onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationShape {
    /// Higher raw value is healthier; linear min-max against the reference range.
    Positive,
    /// Optimum sits inside the range; both under- and over-shoot are penalized.
    TwoSided,
}

/// One of the eight bio-physical indicators feeding the composite index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Natural weathering efficiency (η_NW).
    EtaNw,
    /// Bioelectrical pulse density (ρ_e).
    RhoE,
    /// Chemotropic navigation accuracy (∇C).
    GradC,
    /// Symbiotic exchange ratio (SER); optimum-in-the-middle.
    Ser,
    /// Topological expansion rate (K_topo), a box fractal dimension.
    KTopo,
    /// Biodiversity amplification index (ABI).
    Abi,
    /// Biological field stability (BFS).
    Bfs,
    /// Adaptive resilience capacity (ARC, E_a in the field literature).
    Arc,
}

impl ParameterKind {
    /// All kinds in weight-table order.
    pub const ALL: [ParameterKind; 8] = [
        ParameterKind::EtaNw,
        ParameterKind::RhoE,
        ParameterKind::GradC,
        ParameterKind::Ser,
        ParameterKind::KTopo,
        ParameterKind::Abi,
        ParameterKind::Bfs,
        ParameterKind::Arc,
    ];

    /// Display symbol used in reports and warnings.
    pub fn symbol(&self) -> &'static str {
        match self {
            ParameterKind::EtaNw => "η_NW",
            ParameterKind::RhoE => "ρ_e",
            ParameterKind::GradC => "∇C",
            ParameterKind::Ser => "SER",
            ParameterKind::KTopo => "K_topo",
            ParameterKind::Abi => "ABI",
            ParameterKind::Bfs => "BFS",
            ParameterKind::Arc => "ARC",
        }
    }

    /// Physical unit of the raw measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            ParameterKind::EtaNw => "μg·μL⁻¹·cm⁻²·day⁻¹",
            ParameterKind::RhoE => "normalized",
            ParameterKind::GradC => "normalized",
            ParameterKind::Ser => "dimensionless",
            ParameterKind::KTopo => "D_f",
            ParameterKind::Abi => "ratio",
            ParameterKind::Bfs => "1/CV",
            ParameterKind::Arc => "dimensionless",
        }
    }

    /// Fixed composite weight. The table sums to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            ParameterKind::EtaNw => 0.20,
            ParameterKind::RhoE => 0.20,
            ParameterKind::GradC => 0.15,
            ParameterKind::Ser => 0.15,
            ParameterKind::KTopo => 0.12,
            ParameterKind::Abi => 0.08,
            ParameterKind::Bfs => 0.05,
            ParameterKind::Arc => 0.05,
        }
    }

    /// Physically plausible domain for raw values. Measurements outside this
    /// range indicate a sensor or extraction fault and are rejected, never
    /// clamped.
    pub fn plausible_domain(&self) -> (f64, f64) {
        match self {
            ParameterKind::EtaNw => (0.0, 3.0),
            ParameterKind::RhoE => (0.0, 1.0),
            ParameterKind::GradC => (0.0, 1.0),
            ParameterKind::Ser => (0.0, 3.0),
            // Box fractal dimension of a planar-to-volumetric network.
            ParameterKind::KTopo => (1.0, 3.0),
            ParameterKind::Abi => (0.0, 10.0),
            ParameterKind::Bfs => (0.0, 2.0),
            ParameterKind::Arc => (0.0, 1.0),
        }
    }

    /// Normalization shape; fixed per kind at configuration time.
    pub fn shape(&self) -> NormalizationShape {
        match self {
            ParameterKind::Ser => NormalizationShape::TwoSided,
            _ => NormalizationShape::Positive,
        }
    }

    /// Stable snake_case key, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            ParameterKind::EtaNw => "eta_nw",
            ParameterKind::RhoE => "rho_e",
            ParameterKind::GradC => "grad_c",
            ParameterKind::Ser => "ser",
            ParameterKind::KTopo => "k_topo",
            ParameterKind::Abi => "abi",
            ParameterKind::Bfs => "bfs",
            ParameterKind::Arc => "arc",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
