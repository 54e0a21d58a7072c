//! Fixtures for tests

use crate::inflation::InflationIndex;
use crate::market::{DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY, MarketStudy};
use crate::parameter::{Parameter, ParameterSet};
use crate::rates::{MarketRates, RateTable};
use crate::region::{MarketContext, Sector};
use crate::sensitivity::{Sweep, VariedParameter};
use crate::units::{Dimensionless, Energy, MoneyPerEnergy};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that a [`ModelError`](crate::economics::ModelError) of the given kind and with the given
/// message occurs
macro_rules! assert_model_error {
    ($result:expr, $kind:ident, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err(),
            $crate::economics::ModelError::$kind($msg.to_string())
        );
    };
}
pub(crate) use assert_model_error;

/// Rates for commercial customers in Connecticut in 2015
#[fixture]
pub fn rate_table() -> RateTable {
    let mut table = RateTable::default();
    table.insert(
        "CT".into(),
        Sector::Commercial,
        2015,
        MarketRates {
            elec_rate: MoneyPerEnergy(0.15),
            gas_rate: MoneyPerEnergy(0.03),
            consumption: Some(Energy(2.0e10)),
        },
    );

    table
}

#[fixture]
pub fn context() -> MarketContext {
    MarketContext::new("CT".into(), Sector::Commercial, 2015)
}

/// A price index which rises by half between 2015 and 2018 and doubles by 2020
#[fixture]
pub fn cpi_index() -> InflationIndex {
    [(2015, 1.0), (2018, 1.5), (2020, 2.0)].into_iter().collect()
}

/// A complete parameter set with round numbers: capital of $0.10 and an operating margin of
/// $0.05 per kWh of annual output
#[fixture]
pub fn simple_parameters() -> ParameterSet {
    [
        (Parameter::ElectricEfficiency, 0.5),
        (Parameter::ThermalEfficiency, 0.0),
        (Parameter::InstalledPrice, 0.876),
        (Parameter::MaintenanceCost, 0.01),
        (Parameter::Lifetime, 10.0),
        (Parameter::ElecCapacityUtilization, 1.0),
        (Parameter::ThermCapacityUtilization, 0.25),
        (Parameter::BaselineThermalEfficiency, 0.9),
        (Parameter::InflationRate, 0.0),
        (Parameter::DiscountRate, 0.05),
        (Parameter::ElecRate, 0.1),
        (Parameter::GasRate, 0.02),
    ]
    .into_iter()
    .collect()
}

/// A market study over CT, which has rate data, and NY, which does not
#[fixture]
pub fn market_study() -> MarketStudy {
    MarketStudy {
        regions: vec!["CT".into(), "NY".into()],
        years: vec![2015],
        sectors: vec![Sector::Commercial],
        baseline: ParameterSet::nominal().with_value(Parameter::ThermalEfficiency, 0.15),
        sweep: Sweep::Two(
            VariedParameter::new(Parameter::InstalledPrice, vec![0.5, 1.0, 2.0]),
            VariedParameter::new(Parameter::ElectricEfficiency, vec![0.3, 0.5]),
        ),
        grid_baseline_elec_efficiency: Dimensionless(DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY),
    }
}
