//! Lifecycle carbon comparison of two hardware generations.
//!
//! Embodied (CAPEX) emissions come from die area and memory/storage
//! capacity; operational (OPEX) emissions come either from a power-draw
//! model or from measured values. [`compare_systems`] projects both systems
//! over a horizon and [`find_break_even`] extends that horizon until the new
//! system's accumulated emissions fall to parity with the old one.

#![forbid(unsafe_code)]

pub mod breakeven;
pub mod comparison;
pub mod config;
pub mod constants;
pub mod emissions;
pub mod error;
pub mod fit;
pub mod logging;
pub mod projection;
pub mod types;

pub use breakeven::find_break_even;
pub use comparison::{compare_systems, ComparisonResult, ParityPoint};
pub use config::{CpuPowerModel, EmissionsConfig};
pub use emissions::{capex_breakdown, compute_emissions, opex_breakdown};
pub use error::{LifecycleError, Result};
pub use projection::project_accumulated;
pub use types::{
    CapexBreakdown, EmissionsResult, HardwareProfile, OpexBreakdown, OpexSource, Scenario,
    SystemRole,
};
