//! Immutable model configuration.
//!
//! Every constant the emissions model consumes lives here and is passed by
//! reference into the model functions. `EmissionsConfig::default()` carries
//! the reference values; callers with their own measurements load a JSON
//! document through [`EmissionsConfig::from_json_str`], where any omitted
//! section falls back to its default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{LifecycleError, Result};
use crate::types::SystemRole;

/// Fab-side constants for the die's embodied carbon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabConstants {
    pub mpa_kg_per_cm2: f64,
    pub epa_kwh_per_cm2: f64,
    pub ci_fab_kg_per_kwh: f64,
    pub gpa_kg_per_cm2: f64,
    pub fab_yield: f64,
}

impl Default for FabConstants {
    fn default() -> Self {
        Self {
            mpa_kg_per_cm2: MPA_KG_PER_CM2,
            epa_kwh_per_cm2: EPA_KWH_PER_CM2,
            ci_fab_kg_per_kwh: CI_FAB_KG_PER_KWH,
            gpa_kg_per_cm2: GPA_KG_PER_CM2,
            fab_yield: FAB_YIELD,
        }
    }
}

impl FabConstants {
    /// kg CO2e per cm^2 of good die.
    pub fn kg_per_cm2(&self) -> f64 {
        (self.ci_fab_kg_per_kwh * self.epa_kwh_per_cm2 + self.gpa_kg_per_cm2 + self.mpa_kg_per_cm2)
            / self.fab_yield
    }
}

/// Embodied carbon per gigabyte of storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageFactors {
    pub dram_kg_per_gb: f64,
    pub ssd_kg_per_gb: f64,
    pub hdd_kg_per_gb: f64,
}

impl Default for StorageFactors {
    fn default() -> Self {
        Self {
            dram_kg_per_gb: E_DRAM_KG_PER_GB,
            ssd_kg_per_gb: E_SSD_KG_PER_GB,
            hdd_kg_per_gb: E_HDD_KG_PER_GB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConstants {
    pub dram_watts_per_256gb: f64,
    pub ssd_watts: f64,
    pub hdd_watts: f64,
    pub hours_per_year: f64,
}

impl Default for PowerConstants {
    fn default() -> Self {
        Self {
            dram_watts_per_256gb: DRAM_WATTS_PER_256GB,
            ssd_watts: SSD_WATTS,
            hdd_watts: HDD_WATTS,
            hours_per_year: HOURS_PER_YEAR,
        }
    }
}

/// Maps CPU utilization to the fraction of TDP drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CpuPowerModel {
    /// TDP scales linearly from 0 at idle to 100% at full load.
    #[default]
    Proportional,
    /// Linear from `idle_percent` of TDP at 0% load to 100% at full load.
    IdleFloor { idle_percent: f64 },
}

impl CpuPowerModel {
    pub fn load_fraction(&self, utilization_percent: f64) -> f64 {
        match *self {
            CpuPowerModel::Proportional => utilization_percent / 100.0,
            CpuPowerModel::IdleFloor { idle_percent } => {
                let slope = (100.0 - idle_percent) / 100.0;
                (idle_percent + utilization_percent * slope) / 100.0
            }
        }
    }
}

/// Measured annual OPEX for both roles at one utilization bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleOpex {
    pub old_system: f64,
    pub new_system: f64,
}

impl RoleOpex {
    pub fn get(&self, role: SystemRole) -> f64 {
        match role {
            SystemRole::Old => self.old_system,
            SystemRole::New => self.new_system,
        }
    }
}

/// country -> utilization bucket -> per-role annual kg CO2e
pub type OpexTable = BTreeMap<String, BTreeMap<u32, RoleOpex>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsConfig {
    pub fab: FabConstants,
    pub storage: StorageFactors,
    pub power: PowerConstants,
    pub cpu_power_model: CpuPowerModel,
    pub grid_intensity_kg_per_kwh: BTreeMap<String, f64>,
    pub opex_lookup: OpexTable,
    /// Upper bound for the break-even search.
    pub max_horizon_years: u32,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        let grid_intensity_kg_per_kwh = [(SWEDEN, GCI_SWEDEN), (GERMANY, GCI_GERMANY), (POLAND, GCI_POLAND)]
            .into_iter()
            .map(|(country, gci)| (country.to_string(), gci))
            .collect();

        let mut opex_lookup = OpexTable::new();
        for (country, rows) in [
            (GERMANY, &MEASURED_OPEX_DE_PL),
            (POLAND, &MEASURED_OPEX_DE_PL),
            (SWEDEN, &MEASURED_OPEX_SE),
        ] {
            let buckets = rows
                .iter()
                .map(|&(utilization, old, new)| {
                    let opex = RoleOpex {
                        old_system: old / MEASURED_OPEX_YEARS,
                        new_system: new / MEASURED_OPEX_YEARS,
                    };
                    (utilization, opex)
                })
                .collect();
            opex_lookup.insert(country.to_string(), buckets);
        }

        Self {
            fab: FabConstants::default(),
            storage: StorageFactors::default(),
            power: PowerConstants::default(),
            cpu_power_model: CpuPowerModel::default(),
            grid_intensity_kg_per_kwh,
            opex_lookup,
            max_horizon_years: DEFAULT_MAX_HORIZON_YEARS,
        }
    }
}

impl EmissionsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EmissionsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fab = &self.fab;
        if !(fab.fab_yield > 0.0 && fab.fab_yield <= 1.0) {
            return invalid(format!("fab_yield must be in (0, 1], got {}", fab.fab_yield));
        }
        let factors = [
            ("mpa_kg_per_cm2", fab.mpa_kg_per_cm2),
            ("epa_kwh_per_cm2", fab.epa_kwh_per_cm2),
            ("ci_fab_kg_per_kwh", fab.ci_fab_kg_per_kwh),
            ("gpa_kg_per_cm2", fab.gpa_kg_per_cm2),
            ("dram_kg_per_gb", self.storage.dram_kg_per_gb),
            ("ssd_kg_per_gb", self.storage.ssd_kg_per_gb),
            ("hdd_kg_per_gb", self.storage.hdd_kg_per_gb),
            ("dram_watts_per_256gb", self.power.dram_watts_per_256gb),
            ("ssd_watts", self.power.ssd_watts),
            ("hdd_watts", self.power.hdd_watts),
            ("hours_per_year", self.power.hours_per_year),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        if let CpuPowerModel::IdleFloor { idle_percent } = self.cpu_power_model {
            if !(0.0..100.0).contains(&idle_percent) {
                return invalid(format!("idle_percent must be in [0, 100), got {idle_percent}"));
            }
        }
        for (country, gci) in &self.grid_intensity_kg_per_kwh {
            if !gci.is_finite() || *gci < 0.0 {
                return invalid(format!("grid intensity for {country} must be >= 0, got {gci}"));
            }
        }
        for (country, buckets) in &self.opex_lookup {
            for (utilization, opex) in buckets {
                if *utilization > 100 {
                    return invalid(format!("{country}: utilization bucket {utilization} exceeds 100"));
                }
                if !(opex.old_system.is_finite() && opex.new_system.is_finite())
                    || opex.old_system < 0.0
                    || opex.new_system < 0.0
                {
                    return invalid(format!("{country}/{utilization}: OPEX values must be >= 0"));
                }
            }
        }
        if self.max_horizon_years == 0 {
            return invalid("max_horizon_years must be > 0".to_string());
        }
        Ok(())
    }

    pub fn grid_intensity(&self, country: &str) -> Result<f64> {
        self.grid_intensity_kg_per_kwh
            .get(country)
            .copied()
            .ok_or_else(|| LifecycleError::UnknownCountry(country.to_string()))
    }

    /// Measured annual OPEX. The utilization must name an exact bucket.
    pub fn lookup_opex(&self, country: &str, utilization_percent: f64, role: SystemRole) -> Result<f64> {
        let missing = || LifecycleError::Lookup {
            country: country.to_string(),
            utilization: utilization_percent,
            role,
        };
        if utilization_percent.fract() != 0.0 || utilization_percent < 0.0 {
            return Err(missing());
        }
        let bucket = utilization_percent as u32;
        self.opex_lookup
            .get(country)
            .and_then(|buckets| buckets.get(&bucket))
            .map(|opex| opex.get(role))
            .ok_or_else(missing)
    }
}

fn invalid(msg: String) -> Result<()> {
    Err(LifecycleError::Validation(msg))
}
