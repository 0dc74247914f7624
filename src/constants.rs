//! Reference constants for the emissions model. `EmissionsConfig::default()` is built from these.

// Embodied-carbon constants (ACT model, Gupta et al., ISCA 2022)
pub const MPA_KG_PER_CM2: f64 = 0.5; // procure materials
pub const EPA_KWH_PER_CM2: f64 = 2.15; // fab energy, 0.8-3.5
pub const CI_FAB_KG_PER_KWH: f64 = 0.365; // fab grid intensity, 30-700 g converted to kg
pub const GPA_KG_PER_CM2: f64 = 0.3; // gas/process emissions, 0.1-0.5
pub const FAB_YIELD: f64 = 0.875;

pub const E_DRAM_KG_PER_GB: f64 = 0.3; // 0-0.6
pub const E_SSD_KG_PER_GB: f64 = 0.015; // 0-0.03
pub const E_HDD_KG_PER_GB: f64 = 0.06; // 0-0.12

// Operational power draw
pub const DRAM_WATTS_PER_256GB: f64 = 25.9;
pub const SSD_WATTS: f64 = 3.0; // flat, any non-zero capacity
pub const HDD_WATTS: f64 = 7.0;
pub const HOURS_PER_YEAR: f64 = 24.0 * 7.0 * 52.0;

// Grid carbon intensity, kg CO2e per kWh (Electricity Maps, 2023 averages)
pub const GCI_SWEDEN: f64 = 25.0 / 1000.0;
pub const GCI_GERMANY: f64 = 344.0 / 1000.0;
pub const GCI_POLAND: f64 = 652.0 / 1000.0;

pub const SWEDEN: &str = "sweden";
pub const GERMANY: &str = "germany";
pub const POLAND: &str = "poland";

// Measured OPEX (HPE power advisor), kg CO2e over four years of operation
pub const MEASURED_OPEX_YEARS: f64 = 4.0;
pub const MEASURED_OPEX_DE_PL: [(u32, f64, f64); 3] = [
    // (utilization %, old system, new system)
    (30, 2312.0, 2047.0),
    (60, 3276.0, 3246.0),
    (90, 4249.0, 4459.0),
];
pub const MEASURED_OPEX_SE: [(u32, f64, f64); 3] = [
    (30, 158.0, 149.0),
    (60, 227.0, 236.0),
    (90, 296.0, 324.0),
];

// Break-even search
pub const DEFAULT_MAX_HORIZON_YEARS: u32 = 500;
pub const FIT_INITIAL_K: f64 = 0.1;
