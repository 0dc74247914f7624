//! CAPEX (embodied) and OPEX (operational) emissions of a single system.

use tracing::{debug, instrument};

use crate::config::EmissionsConfig;
use crate::error::Result;
use crate::types::{
    validate_utilization, CapexBreakdown, EmissionsResult, HardwareProfile, OpexBreakdown,
    OpexSource, Scenario, SystemRole,
};

fn component_capex(profile: &HardwareProfile, config: &EmissionsConfig) -> CapexBreakdown {
    let storage = &config.storage;
    CapexBreakdown {
        cpu: config.fab.kg_per_cm2() * profile.die_area_cm2,
        dram: f64::from(profile.dram_capacity_gb) * storage.dram_kg_per_gb,
        ssd: f64::from(profile.ssd_capacity_gb) * storage.ssd_kg_per_gb,
        hdd: f64::from(profile.hdd_capacity_gb) * storage.hdd_kg_per_gb,
    }
}

/// Embodied carbon per component.
///
/// CPU: ((CI_fab * EPA + GPA + MPA) * A_die) / yield, package size taken as die size.
/// Memory and storage: capacity_gb * E_x.
pub fn capex_breakdown(profile: &HardwareProfile, config: &EmissionsConfig) -> Result<CapexBreakdown> {
    profile.validate()?;
    Ok(component_capex(profile, config))
}

/// One-time embodied emissions, kg CO2e. Callers validate the profile.
pub(crate) fn capex_kg_co2(profile: &HardwareProfile, config: &EmissionsConfig) -> f64 {
    component_capex(profile, config).total()
}

/// Average power draw per component in kW.
fn component_kw(profile: &HardwareProfile, utilization_percent: f64, config: &EmissionsConfig) -> OpexBreakdown {
    let power = &config.power;
    let load = config.cpu_power_model.load_fraction(utilization_percent);
    OpexBreakdown {
        cpu: profile.cpu_tdp_watts * load / 1000.0,
        dram: (f64::from(profile.dram_capacity_gb) / 256.0) * power.dram_watts_per_256gb / 1000.0,
        ssd: if profile.ssd_capacity_gb > 0 { power.ssd_watts / 1000.0 } else { 0.0 },
        hdd: if profile.hdd_capacity_gb > 0 { power.hdd_watts / 1000.0 } else { 0.0 },
    }
}

/// Per-component operational emissions, kg CO2e per year.
pub fn opex_breakdown(
    profile: &HardwareProfile,
    utilization_percent: f64,
    country: &str,
    config: &EmissionsConfig,
) -> Result<OpexBreakdown> {
    profile.validate()?;
    validate_utilization(utilization_percent)?;
    let gci = config.grid_intensity(country)?;
    let kw = component_kw(profile, utilization_percent, config);
    let to_kg = |kw: f64| kw * config.power.hours_per_year * gci;
    Ok(OpexBreakdown {
        cpu: to_kg(kw.cpu),
        dram: to_kg(kw.dram),
        ssd: to_kg(kw.ssd),
        hdd: to_kg(kw.hdd),
    })
}

/// Modelled annual OPEX: (24 * 7 * 52 * total_kW) * GCI.
pub(crate) fn model_opex_kg_co2_per_year(
    profile: &HardwareProfile,
    utilization_percent: f64,
    country: &str,
    config: &EmissionsConfig,
) -> Result<f64> {
    let gci = config.grid_intensity(country)?;
    let annual_kwh = config.power.hours_per_year * component_kw(profile, utilization_percent, config).total();
    Ok(annual_kwh * gci)
}

/// Annual OPEX from whichever source the scenario selects.
pub(crate) fn opex_kg_co2_per_year(
    profile: &HardwareProfile,
    role: SystemRole,
    scenario: &Scenario,
    config: &EmissionsConfig,
) -> Result<f64> {
    match scenario.opex_source {
        OpexSource::Model => {
            model_opex_kg_co2_per_year(profile, scenario.utilization_percent, &scenario.country, config)
        }
        OpexSource::Lookup => {
            config.lookup_opex(&scenario.country, scenario.utilization_percent, role)
        }
    }
}

/// CAPEX and per-year OPEX of one system under a scenario.
#[instrument(level = "debug", skip_all, fields(system = %profile.name, role = %role, country = %scenario.country))]
pub fn compute_emissions(
    config: &EmissionsConfig,
    profile: &HardwareProfile,
    role: SystemRole,
    scenario: &Scenario,
) -> Result<EmissionsResult> {
    profile.validate()?;
    scenario.validate()?;

    let capex_kg_co2 = capex_kg_co2(profile, config);
    let opex_kg_co2_per_year = opex_kg_co2_per_year(profile, role, scenario, config)?;
    debug!(capex_kg_co2, opex_kg_co2_per_year, source = ?scenario.opex_source, "emissions computed");

    Ok(EmissionsResult {
        capex_kg_co2,
        opex_kg_co2_per_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpuPowerModel;
    use crate::error::LifecycleError;
    use proptest::prelude::*;

    fn xeon_old() -> HardwareProfile {
        HardwareProfile {
            name: "E7-4880 v2".into(),
            die_area_cm2: 541.0,
            performance_indicator: 1.0,
            lifetime_years: 10,
            dram_capacity_gb: 512,
            ssd_capacity_gb: 3200,
            hdd_capacity_gb: 0,
            cpu_tdp_watts: 130.0,
        }
    }

    fn xeon_new() -> HardwareProfile {
        HardwareProfile {
            name: "Platinum 8480+".into(),
            die_area_cm2: 1908.0,
            performance_indicator: 3.55,
            cpu_tdp_watts: 350.0,
            ..xeon_old()
        }
    }

    #[test]
    fn capex_matches_reference_formula() {
        let cfg = EmissionsConfig::default();
        let expected = ((0.365 * 2.15 + 0.3 + 0.5) * 1908.0) / 0.875 + 512.0 * 0.3 + 3200.0 * 0.015 + 0.0 * 0.06;
        let capex = capex_kg_co2(&xeon_new(), &cfg);
        assert!((capex - expected).abs() < 1e-9, "capex {capex} != {expected}");
    }

    #[test]
    fn capex_breakdown_components() {
        let cfg = EmissionsConfig::default();
        let mut p = xeon_old();
        p.hdd_capacity_gb = 1000;
        let b = capex_breakdown(&p, &cfg).unwrap();
        assert!((b.dram - 153.6).abs() < 1e-9);
        assert!((b.ssd - 48.0).abs() < 1e-9);
        assert!((b.hdd - 60.0).abs() < 1e-9);
        assert!((b.total() - capex_kg_co2(&p, &cfg)).abs() < 1e-9);
    }

    #[test]
    fn model_opex_matches_reference_formula() {
        let cfg = EmissionsConfig::default();
        let p = xeon_old();
        let kw = 130.0 * 0.6 / 1000.0 + (512.0 / 256.0) * 25.9 / 1000.0 + 0.003;
        let expected = 24.0 * 7.0 * 52.0 * kw * 0.344;
        let opex = model_opex_kg_co2_per_year(&p, 60.0, "germany", &cfg).unwrap();
        assert!((opex - expected).abs() < 1e-9);

        let breakdown = opex_breakdown(&p, 60.0, "germany", &cfg).unwrap();
        assert!((breakdown.total() - expected).abs() < 1e-6);
        assert_eq!(breakdown.hdd, 0.0);
    }

    #[test]
    fn hdd_draws_flat_power() {
        let cfg = EmissionsConfig::default();
        let mut p = xeon_old();
        let without = model_opex_kg_co2_per_year(&p, 30.0, "sweden", &cfg).unwrap();
        p.hdd_capacity_gb = 1;
        let with_one = model_opex_kg_co2_per_year(&p, 30.0, "sweden", &cfg).unwrap();
        p.hdd_capacity_gb = 16_000;
        let with_many = model_opex_kg_co2_per_year(&p, 30.0, "sweden", &cfg).unwrap();
        assert!((with_one - without - 24.0 * 7.0 * 52.0 * 0.007 * 0.025).abs() < 1e-9);
        assert!((with_many - with_one).abs() < 1e-12);
    }

    #[test]
    fn idle_floor_raises_low_load_opex() {
        let mut cfg = EmissionsConfig::default();
        let proportional = model_opex_kg_co2_per_year(&xeon_old(), 0.0, "germany", &cfg).unwrap();
        cfg.cpu_power_model = CpuPowerModel::IdleFloor { idle_percent: 50.0 };
        let floored = model_opex_kg_co2_per_year(&xeon_old(), 0.0, "germany", &cfg).unwrap();
        let cpu_half_tdp = 24.0 * 7.0 * 52.0 * 0.065 * 0.344;
        assert!((floored - proportional - cpu_half_tdp).abs() < 1e-9);
    }

    #[test]
    fn compute_emissions_lookup_mode() {
        let cfg = EmissionsConfig::default();
        let scenario = Scenario::new("germany", 60.0, OpexSource::Lookup);
        let r = compute_emissions(&cfg, &xeon_new(), SystemRole::New, &scenario).unwrap();
        assert!((r.opex_kg_co2_per_year - 811.5).abs() < 1e-9);
        assert!((r.capex_kg_co2 - capex_kg_co2(&xeon_new(), &cfg)).abs() < 1e-12);
    }

    #[test]
    fn compute_emissions_errors() {
        let cfg = EmissionsConfig::default();

        let scenario = Scenario::new("germany", 45.0, OpexSource::Lookup);
        assert!(matches!(
            compute_emissions(&cfg, &xeon_old(), SystemRole::Old, &scenario),
            Err(LifecycleError::Lookup { .. })
        ));

        let scenario = Scenario::new("atlantis", 45.0, OpexSource::Model);
        assert!(matches!(
            compute_emissions(&cfg, &xeon_old(), SystemRole::Old, &scenario),
            Err(LifecycleError::UnknownCountry(_))
        ));

        let mut bad = xeon_old();
        bad.die_area_cm2 = -3.0;
        let scenario = Scenario::new("germany", 60.0, OpexSource::Model);
        assert!(matches!(
            compute_emissions(&cfg, &bad, SystemRole::Old, &scenario),
            Err(LifecycleError::Validation(_))
        ));
    }

    #[test]
    fn breakdowns_validate_inputs() {
        let cfg = EmissionsConfig::default();
        let mut bad = xeon_old();
        bad.die_area_cm2 = -3.0;
        assert!(matches!(
            capex_breakdown(&bad, &cfg),
            Err(LifecycleError::Validation(_))
        ));
        assert!(matches!(
            opex_breakdown(&bad, 60.0, "germany", &cfg),
            Err(LifecycleError::Validation(_))
        ));
        assert!(matches!(
            opex_breakdown(&xeon_old(), 120.0, "germany", &cfg),
            Err(LifecycleError::Validation(_))
        ));
        assert!(matches!(
            opex_breakdown(&xeon_old(), 60.0, "atlantis", &cfg),
            Err(LifecycleError::UnknownCountry(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_capex_strictly_increases_with_capacity_or_area(
            area in 0.0f64..5000.0,
            dram in 0u32..4096,
            ssd in 0u32..64_000,
            hdd in 0u32..64_000,
            extra_area in 0.5f64..500.0,
            extra_gb in 1u32..1024,
        ) {
            let cfg = EmissionsConfig::default();
            let base = HardwareProfile {
                die_area_cm2: area,
                dram_capacity_gb: dram,
                ssd_capacity_gb: ssd,
                hdd_capacity_gb: hdd,
                ..xeon_old()
            };
            let c0 = capex_kg_co2(&base, &cfg);

            let bigger_die = HardwareProfile { die_area_cm2: area + extra_area, ..base.clone() };
            let more_dram = HardwareProfile { dram_capacity_gb: dram + extra_gb, ..base.clone() };
            let more_ssd = HardwareProfile { ssd_capacity_gb: ssd + extra_gb, ..base.clone() };
            let more_hdd = HardwareProfile { hdd_capacity_gb: hdd + extra_gb, ..base.clone() };

            prop_assert!(capex_kg_co2(&bigger_die, &cfg) > c0);
            prop_assert!(capex_kg_co2(&more_dram, &cfg) > c0);
            prop_assert!(capex_kg_co2(&more_ssd, &cfg) > c0);
            prop_assert!(capex_kg_co2(&more_hdd, &cfg) > c0);
        }

        #[test]
        fn prop_opex_strictly_increases_with_tdp_and_utilization(
            tdp in 1.0f64..500.0,
            extra_tdp in 1.0f64..100.0,
            utilization in 1.0f64..90.0,
            extra_util in 1.0f64..10.0,
        ) {
            let cfg = EmissionsConfig::default();
            let base = HardwareProfile { cpu_tdp_watts: tdp, ..xeon_old() };
            let hotter = HardwareProfile { cpu_tdp_watts: tdp + extra_tdp, ..xeon_old() };

            let o0 = model_opex_kg_co2_per_year(&base, utilization, "germany", &cfg).unwrap();
            let o_tdp = model_opex_kg_co2_per_year(&hotter, utilization, "germany", &cfg).unwrap();
            let o_util = model_opex_kg_co2_per_year(&base, utilization + extra_util, "germany", &cfg).unwrap();

            prop_assert!(o_tdp > o0);
            prop_assert!(o_util > o0);
        }
    }
}
