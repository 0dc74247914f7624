//! Linear accumulation of a constant yearly rate.

use crate::error::{LifecycleError, Result};

/// Accumulated OPEX at a constant annual rate: year i (1-based) holds i years' worth.
pub fn project_accumulated(opex_per_year: f64, horizon_years: u32) -> Result<Vec<f64>> {
    if horizon_years == 0 {
        return Err(LifecycleError::Validation(
            "time horizon must be at least one year".to_string(),
        ));
    }
    Ok((1..=horizon_years)
        .map(|year| opex_per_year * f64::from(year))
        .collect())
}
