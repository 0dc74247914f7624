use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, Result};

/// Static physical and performance attributes of one hardware system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    #[serde(default)]
    pub name: String,
    pub die_area_cm2: f64,
    /// Benchmark score; only ever used as a ratio against the counterpart system.
    pub performance_indicator: f64,
    pub lifetime_years: u32,
    pub dram_capacity_gb: u32,
    pub ssd_capacity_gb: u32,
    pub hdd_capacity_gb: u32,
    pub cpu_tdp_watts: f64,
}

impl HardwareProfile {
    pub fn validate(&self) -> Result<()> {
        if !self.die_area_cm2.is_finite() || self.die_area_cm2 < 0.0 {
            return Err(LifecycleError::Validation(format!(
                "die_area_cm2 must be finite and >= 0, got {}",
                self.die_area_cm2
            )));
        }
        if !self.performance_indicator.is_finite() || self.performance_indicator <= 0.0 {
            return Err(LifecycleError::Validation(format!(
                "performance_indicator must be finite and > 0, got {}",
                self.performance_indicator
            )));
        }
        if !self.cpu_tdp_watts.is_finite() || self.cpu_tdp_watts < 0.0 {
            return Err(LifecycleError::Validation(format!(
                "cpu_tdp_watts must be finite and >= 0, got {}",
                self.cpu_tdp_watts
            )));
        }
        Ok(())
    }
}

/// Which side of a comparison a system sits on; keys the measured OPEX table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    Old,
    New,
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemRole::Old => f.write_str("old_system"),
            SystemRole::New => f.write_str("new_system"),
        }
    }
}

/// Where the per-year OPEX value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpexSource {
    /// Power-draw formula times grid carbon intensity.
    Model,
    /// Precomputed measurements keyed by country, utilization bucket and role.
    Lookup,
}

/// Environment shared by both systems of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub country: String,
    pub utilization_percent: f64,
    pub opex_source: OpexSource,
}

impl Scenario {
    pub fn new(country: impl Into<String>, utilization_percent: f64, opex_source: OpexSource) -> Self {
        Self {
            country: country.into(),
            utilization_percent,
            opex_source,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_utilization(self.utilization_percent)
    }
}

pub(crate) fn validate_utilization(utilization_percent: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&utilization_percent) {
        return Err(LifecycleError::Validation(format!(
            "utilization must be between 0 and 100, got {utilization_percent}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionsResult {
    pub capex_kg_co2: f64,
    pub opex_kg_co2_per_year: f64,
}

/// Embodied carbon per component, kg CO2e.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapexBreakdown {
    pub cpu: f64,
    pub dram: f64,
    pub ssd: f64,
    pub hdd: f64,
}

impl CapexBreakdown {
    pub fn total(&self) -> f64 {
        self.cpu + self.dram + self.ssd + self.hdd
    }
}

/// Operational carbon per component, kg CO2e per year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpexBreakdown {
    pub cpu: f64,
    pub dram: f64,
    pub ssd: f64,
    pub hdd: f64,
}

impl OpexBreakdown {
    pub fn total(&self) -> f64 {
        self.cpu + self.dram + self.ssd + self.hdd
    }
}
