use std::error::Error;

use hw_lifecycle_carbon::logging::init_logging;
use hw_lifecycle_carbon::{
    capex_breakdown, compute_emissions, find_break_even, EmissionsConfig, HardwareProfile,
    OpexSource, Scenario, SystemRole,
};

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = EmissionsConfig::default();

    // Four-socket Ivy Bridge server already in the rack.
    let old = HardwareProfile {
        name: "Xeon E7-4880 v2".to_string(),
        die_area_cm2: 541.0,
        performance_indicator: 1.0,
        lifetime_years: 10,
        dram_capacity_gb: 512,
        ssd_capacity_gb: 3200,
        hdd_capacity_gb: 0,
        cpu_tdp_watts: 130.0,
    };

    // Sapphire Rapids replacement with the same memory and storage.
    let new = HardwareProfile {
        name: "Xeon Platinum 8480+".to_string(),
        die_area_cm2: 1908.0,
        performance_indicator: 3.55,
        lifetime_years: 10,
        dram_capacity_gb: 512,
        ssd_capacity_gb: 3200,
        hdd_capacity_gb: 0,
        cpu_tdp_watts: 350.0,
    };

    let capex = capex_breakdown(&new, &config)?;
    println!(
        "new system CAPEX kg CO2e: cpu={:.1} dram={:.1} ssd={:.1} hdd={:.1} total={:.1}",
        capex.cpu,
        capex.dram,
        capex.ssd,
        capex.hdd,
        capex.total()
    );

    println!("country,utilization,source,old_opex_per_year,new_opex_per_year,horizon_years,break_even_year,parity");
    for country in ["sweden", "germany", "poland"] {
        for utilization in [30.0, 60.0, 90.0] {
            for source in [OpexSource::Lookup, OpexSource::Model] {
                let scenario = Scenario::new(country, utilization, source);
                let old_em = compute_emissions(&config, &old, SystemRole::Old, &scenario)?;
                let new_em = compute_emissions(&config, &new, SystemRole::New, &scenario)?;

                let (horizon, break_even, parity) =
                    match find_break_even(&config, &new, &old, old.lifetime_years, &scenario) {
                        Ok(result) => (
                            result.horizon_years.to_string(),
                            result
                                .break_even_year()
                                .map_or_else(|| "-".to_string(), |y| y.to_string()),
                            result
                                .parity_point()
                                .map_or_else(|| "never".to_string(), |p| p.to_string()),
                        ),
                        Err(err) => ("-".to_string(), "-".to_string(), err.to_string()),
                    };

                println!(
                    "{},{},{:?},{:.1},{:.1},{},{},{}",
                    country,
                    utilization,
                    source,
                    old_em.opex_kg_co2_per_year,
                    new_em.opex_kg_co2_per_year,
                    horizon,
                    break_even,
                    parity
                );
            }
        }
    }

    Ok(())
}
