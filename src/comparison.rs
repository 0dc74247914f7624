//! Old-versus-new comparison of accumulated emissions.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EmissionsConfig;
use crate::emissions::{capex_kg_co2, opex_kg_co2_per_year};
use crate::error::{LifecycleError, Result};
use crate::projection::project_accumulated;
use crate::types::{HardwareProfile, Scenario, SystemRole};

/// Aligned per-year series; index 0 is year 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub horizon_years: u32,
    /// Performance-scaled OPEX of the new system plus its CAPEX.
    pub new_total: Vec<f64>,
    /// OPEX of the old system; its CAPEX is sunk and not counted.
    pub old_total: Vec<f64>,
    pub abs_savings: Vec<f64>,
    pub relative_savings: Vec<f64>,
    pub ratio: Vec<f64>,
    pub new_capex_kg_co2: f64,
    pub performance_factor: f64,
    pub new_opex_per_year_scaled: f64,
    pub old_opex_per_year: f64,
}

impl ComparisonResult {
    /// First year (1-based) whose ratio is at or below parity.
    pub fn break_even_year(&self) -> Option<u32> {
        self.ratio
            .iter()
            .position(|r| *r <= 1.0)
            .map(|idx| idx as u32 + 1)
    }

    /// Exact crossing of the two accumulation lines.
    ///
    /// new(x) = capex + s * x, old(x) = o * x, so x = capex / (o - s) when the
    /// new system accumulates more slowly. `None` if it never catches up.
    pub fn parity_point(&self) -> Option<ParityPoint> {
        let gap = self.old_opex_per_year - self.new_opex_per_year_scaled;
        if gap <= 0.0 {
            return None;
        }
        let years = self.new_capex_kg_co2 / gap;
        Some(ParityPoint {
            years,
            accumulated_kg_co2: self.old_opex_per_year * years,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParityPoint {
    pub years: f64,
    pub accumulated_kg_co2: f64,
}

impl ParityPoint {
    /// Whole years and remaining rounded months.
    pub fn years_and_months(&self) -> (u32, u32) {
        let whole = self.years.floor();
        let months = ((self.years - whole) * 12.0).round() as u32;
        if months == 12 {
            (whole as u32 + 1, 0)
        } else {
            (whole as u32, months)
        }
    }
}

impl fmt::Display for ParityPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (years, months) = self.years_and_months();
        let year_label = if years == 1 { "year" } else { "years" };
        let month_label = if months == 1 { "month" } else { "months" };
        match (years, months) {
            (0, m) => write!(f, "{m} {month_label}"),
            (y, 0) => write!(f, "{y} {year_label}"),
            (y, m) => write!(f, "{y} {year_label}, {m} {month_label}"),
        }
    }
}

/// Compare a new system against an already-owned old one over `horizon_years`.
#[instrument(
    level = "debug",
    skip_all,
    fields(new = %new.name, old = %old.name, horizon_years = horizon_years, country = %scenario.country)
)]
pub fn compare_systems(
    config: &EmissionsConfig,
    new: &HardwareProfile,
    old: &HardwareProfile,
    horizon_years: u32,
    scenario: &Scenario,
) -> Result<ComparisonResult> {
    new.validate()?;
    old.validate()?;
    scenario.validate()?;
    if horizon_years > config.max_horizon_years {
        return Err(LifecycleError::Validation(format!(
            "time horizon of {horizon_years} years exceeds max_horizon_years ({})",
            config.max_horizon_years
        )));
    }

    let new_opex = opex_kg_co2_per_year(new, SystemRole::New, scenario, config)?;
    let old_opex = opex_kg_co2_per_year(old, SystemRole::Old, scenario, config)?;
    let new_projection = project_accumulated(new_opex, horizon_years)?;
    let old_total = project_accumulated(old_opex, horizon_years)?;

    let new_capex_kg_co2 = capex_kg_co2(new, config);
    // A faster system finishes the same work sooner, so its draw is scaled down.
    let performance_factor = old.performance_indicator / new.performance_indicator;

    // CAPEX is added to every year's accumulated value rather than charged
    // once at year 0. Kept for compatibility with published results even
    // though it may not be the intended model.
    let new_total: Vec<f64> = new_projection
        .iter()
        .map(|opex| opex * performance_factor + new_capex_kg_co2)
        .collect();

    ensure_positive("old system", &old_total)?;
    ensure_positive("new system", &new_total)?;

    let abs_savings = new_total.iter().zip(&old_total).map(|(n, o)| n - o).collect();
    let relative_savings = new_total.iter().zip(&old_total).map(|(n, o)| 1.0 - o / n).collect();
    let ratio: Vec<f64> = new_total.iter().zip(&old_total).map(|(n, o)| n / o).collect();

    debug!(
        new_capex_kg_co2,
        performance_factor,
        first_ratio = ratio[0],
        last_ratio = ratio[ratio.len() - 1],
        "systems compared"
    );

    Ok(ComparisonResult {
        horizon_years,
        new_total,
        old_total,
        abs_savings,
        relative_savings,
        ratio,
        new_capex_kg_co2,
        performance_factor,
        new_opex_per_year_scaled: new_opex * performance_factor,
        old_opex_per_year: old_opex,
    })
}

fn ensure_positive(label: &str, series: &[f64]) -> Result<()> {
    match series.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
        Some(idx) => Err(LifecycleError::Domain(format!(
            "{label} accumulated emissions at year {} is {}, cannot divide by it",
            idx + 1,
            series[idx]
        ))),
        None => Ok(()),
    }
}
