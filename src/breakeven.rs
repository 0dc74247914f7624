//! Break-even search beyond the requested horizon.
//!
//! When the new system has not paid back its CAPEX within the requested
//! horizon, the observed ratio series is fitted with `A * exp(-k x)` over
//! year numbers 1..=N. The fitted curve gives a first guess for the year the
//! ratio reaches 1, and the full comparison is then re-run one year at a time
//! until a rounded ratio reaches parity or `max_horizon_years` is exceeded.

use tracing::{debug, info, instrument, warn};

use crate::comparison::{compare_systems, ComparisonResult};
use crate::config::EmissionsConfig;
use crate::constants::FIT_INITIAL_K;
use crate::error::{LifecycleError, Result};
use crate::fit::{fit_exp_decay, ExpDecayFit};
use crate::types::{HardwareProfile, Scenario};

#[instrument(
    skip_all,
    fields(new = %new.name, old = %old.name, initial_horizon = initial_horizon, country = %scenario.country)
)]
pub fn find_break_even(
    config: &EmissionsConfig,
    new: &HardwareProfile,
    old: &HardwareProfile,
    initial_horizon: u32,
    scenario: &Scenario,
) -> Result<ComparisonResult> {
    let initial = compare_systems(config, new, old, initial_horizon, scenario)?;
    if initial.ratio.iter().any(|r| *r <= 1.0) {
        debug!(break_even_year = ?initial.break_even_year(), "parity within requested horizon");
        return Ok(initial);
    }

    let years: Vec<f64> = (1..=initial_horizon).map(f64::from).collect();
    let fit = fit_exp_decay(&years, &initial.ratio, initial.ratio[0], FIT_INITIAL_K)?;
    let mut horizon = extrapolated_horizon(&fit, initial_horizon)?;
    info!(
        amplitude = fit.amplitude,
        rate = fit.rate,
        fit_iterations = fit.iterations,
        horizon,
        "no parity within requested horizon, extrapolating"
    );

    loop {
        if horizon > config.max_horizon_years {
            warn!(max_horizon_years = config.max_horizon_years, "break-even search exhausted");
            return Err(LifecycleError::Solver(format!(
                "no break-even found within {} years",
                config.max_horizon_years
            )));
        }
        let candidate = compare_systems(config, new, old, horizon, scenario)?;
        if reaches_parity(&candidate.ratio) {
            info!(horizon, "break-even horizon resolved");
            return Ok(candidate);
        }
        horizon += 1;
    }
}

/// First horizon worth testing according to the fitted curve.
fn extrapolated_horizon(fit: &ExpDecayFit, current: u32) -> Result<u32> {
    if !(fit.amplitude.is_finite() && fit.rate.is_finite()) || fit.amplitude <= 0.0 || fit.rate <= 0.0 {
        return Err(LifecycleError::Solver(format!(
            "fitted curve does not decay towards parity (A={}, k={})",
            fit.amplitude, fit.rate
        )));
    }
    let x = fit
        .solve_for(1.0)
        .ok_or_else(|| LifecycleError::Solver("fitted curve never reaches a ratio of 1".to_string()))?
        .ceil();
    let target = if x <= 0.0 {
        0
    } else {
        x.min(f64::from(u32::MAX - 1)) as u32
    };
    // Never re-test a horizon that is already known to fall short.
    Ok(target.max(current + 1))
}

fn reaches_parity(ratio: &[f64]) -> bool {
    ratio.iter().any(|r| round_to_tenth(*r) <= 1.0)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
