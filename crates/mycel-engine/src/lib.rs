//! Orchestration layer over the scoring core.
//!
//! Loads reference calibrations and configuration, runs the async
//! prediction ensemble, and drives batch site evaluation with per-unit
//! failure capture and cancellation. All algorithmic semantics live in
//! `mycel-core`; this crate only schedules and wires them.

pub mod config;
pub mod ensemble;
pub mod evaluate;
pub mod loader;

pub use config::{EngineConfig, EnsembleConfig};
pub use ensemble::EnsemblePredictor;
pub use evaluate::{Engine, SiteReport, UnitCycle, UnitFailure};
pub use loader::load_reference_store;
