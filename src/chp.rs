//! Catalogue of existing combined heat and power (CHP) systems.
//!
//! Figures are from the US EPA *Catalog of CHP Technologies* (2015). Electric efficiencies are on
//! an LHV basis.
use crate::parameter::Parameter;
use crate::units::{Dimensionless, MoneyPerEnergy, MoneyPerPower};
use strum::IntoEnumIterator;

/// A family of CHP technology
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Technology {
    #[strum(serialize = "SI Engine")]
    SiEngine,
    #[strum(serialize = "Gas Turbine")]
    GasTurbine,
    #[strum(serialize = "Microturbine")]
    Microturbine,
    #[strum(serialize = "Fuel Cell")]
    FuelCell,
}

/// Specifications of one catalogued CHP system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChpSystem {
    /// Rated electric output (kW)
    pub power_kw: f64,
    /// Electric efficiency (LHV)
    pub electric_efficiency: Dimensionless,
    /// Installed price ($/W)
    pub installed_price: MoneyPerPower,
    /// Operation and maintenance cost ($/kWh)
    pub maintenance_cost: MoneyPerEnergy,
}

const fn system(power_kw: f64, efficiency: f64, price_per_kw: f64, maintenance: f64) -> ChpSystem {
    ChpSystem {
        power_kw,
        electric_efficiency: Dimensionless(efficiency),
        installed_price: MoneyPerPower(price_per_kw / 1000.0),
        maintenance_cost: MoneyPerEnergy(maintenance),
    }
}

const SI_ENGINES: [ChpSystem; 5] = [
    system(100.0, 0.30, 2900.0, 0.024),
    system(633.0, 0.38, 2837.0, 0.021),
    system(1121.0, 0.41, 2366.0, 0.019),
    system(3326.0, 0.45, 1801.0, 0.016),
    system(9341.0, 0.46, 1433.0, 0.009),
];

const GAS_TURBINES: [ChpSystem; 5] = [
    system(3304.0, 0.27, 3281.0, 0.013),
    system(7038.0, 0.32, 2080.0, 0.012),
    system(9950.0, 0.30, 1976.0, 0.012),
    system(20336.0, 0.37, 1518.0, 0.009),
    system(44488.0, 0.40, 1248.0, 0.009),
];

const MICROTURBINES: [ChpSystem; 6] = [
    system(28.0, 0.24, 4300.0, 0.013),
    system(61.0, 0.26, 3220.0, 0.013),
    system(90.0, 0.30, 3150.0, 0.016),
    system(240.0, 0.29, 2720.0, 0.011),
    system(320.0, 0.31, 2580.0, 0.009),
    system(950.0, 0.30, 2500.0, 0.012),
];

const FUEL_CELLS: [ChpSystem; 5] = [
    system(1.0, 0.39, 22000.0, 0.060),
    system(2.0, 0.60, 23000.0, 0.055),
    system(300.0, 0.52, 10000.0, 0.045),
    system(400.0, 0.38, 7000.0, 0.036),
    system(1400.0, 0.47, 4600.0, 0.040),
];

impl Technology {
    /// The catalogued systems of this technology, in order of increasing size
    pub fn systems(self) -> &'static [ChpSystem] {
        match self {
            Self::SiEngine => &SI_ENGINES,
            Self::GasTurbine => &GAS_TURBINES,
            Self::Microturbine => &MICROTURBINES,
            Self::FuelCell => &FUEL_CELLS,
        }
    }
}

impl ChpSystem {
    /// The value of a model parameter for this system, if the catalogue records it
    pub fn parameter_value(&self, param: Parameter) -> Option<f64> {
        match param {
            Parameter::ElectricEfficiency => Some(self.electric_efficiency.0),
            Parameter::InstalledPrice => Some(self.installed_price.value()),
            Parameter::MaintenanceCost => Some(self.maintenance_cost.value()),
            _ => None,
        }
    }
}

/// Whether the catalogue records values for a parameter
pub fn is_catalogue_parameter(param: Parameter) -> bool {
    SI_ENGINES[0].parameter_value(param).is_some()
}

/// Catalogued systems as points in the plane of two parameters, grouped by technology.
///
/// Returns `None` unless the catalogue records both parameters.
pub fn catalogue_points(x: Parameter, y: Parameter) -> Option<Vec<(Technology, Vec<(f64, f64)>)>> {
    if !is_catalogue_parameter(x) || !is_catalogue_parameter(y) {
        return None;
    }

    Some(
        Technology::iter()
            .map(|tech| {
                let points = tech
                    .systems()
                    .iter()
                    .filter_map(|system| {
                        Some((system.parameter_value(x)?, system.parameter_value(y)?))
                    })
                    .collect();
                (tech, points)
            })
            .collect(),
    )
}
