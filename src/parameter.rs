//! Named technical and financial input parameters for the economic model.
use crate::economics::ModelError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// An input parameter of the economic model.
///
/// Parameter names are the snake_case variant names (e.g. `installed_price`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    /// Electric efficiency of the DG unit (LHV basis)
    ElectricEfficiency,
    /// Recoverable thermal efficiency of the DG unit
    ThermalEfficiency,
    /// Installed price ($/W)
    InstalledPrice,
    /// Operation and maintenance cost ($/kWh)
    MaintenanceCost,
    /// Equipment lifetime (years)
    Lifetime,
    /// Electric capacity utilisation (capacity factor)
    ElecCapacityUtilization,
    /// Proportion of thermal capacity put to use
    ThermCapacityUtilization,
    /// Efficiency of the boiler whose fuel is displaced by recovered heat
    BaselineThermalEfficiency,
    /// Annual escalation rate applied to operating cash flows
    InflationRate,
    /// Discount rate
    DiscountRate,
    /// Price of grid electricity ($/kWh)
    ElecRate,
    /// Price of natural gas ($/kWh, LHV basis)
    GasRate,
}

impl Parameter {
    /// The nominal value of the parameter, if it has one.
    ///
    /// Energy prices have no nominal value; they come from market data.
    pub fn nominal_value(self) -> Option<f64> {
        match self {
            Self::ElectricEfficiency => Some(0.7),
            Self::ThermalEfficiency => Some(0.0),
            Self::InstalledPrice => Some(3.0),
            Self::MaintenanceCost => Some(0.02),
            Self::Lifetime => Some(20.0),
            Self::ElecCapacityUtilization => Some(0.85),
            Self::ThermCapacityUtilization => Some(0.25),
            Self::BaselineThermalEfficiency => Some(0.9),
            Self::InflationRate => Some(0.02),
            Self::DiscountRate => Some(0.15),
            Self::ElecRate | Self::GasRate => None,
        }
    }

    /// A human-readable label for axes and titles
    pub fn pretty_label(self) -> &'static str {
        match self {
            Self::ElectricEfficiency => "Electric Efficiency",
            Self::ThermalEfficiency => "Thermal Efficiency",
            Self::InstalledPrice => "Installed Cost ($/W)",
            Self::MaintenanceCost => "Maintenance Cost ($/kWh)",
            Self::Lifetime => "Lifetime (years)",
            Self::ElecCapacityUtilization => "Electric Capacity Utilization",
            Self::ThermCapacityUtilization => "Thermal Capacity Utilization",
            Self::BaselineThermalEfficiency => "Baseline Thermal Efficiency",
            Self::InflationRate => "Inflation Rate",
            Self::DiscountRate => "Discount Rate",
            Self::ElecRate => "Electricity Rate ($/kWh)",
            Self::GasRate => "Natural Gas Rate ($/kWh)",
        }
    }
}

/// A set of values for model input parameters.
///
/// Sets are not modified once built: a variant of a set is obtained with
/// [`ParameterSet::with_value`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet(IndexMap<Parameter, f64>);

impl ParameterSet {
    /// A set containing the nominal value of every parameter which has one
    pub fn nominal() -> Self {
        Parameter::iter()
            .filter_map(|param| Some((param, param.nominal_value()?)))
            .collect()
    }

    /// Get the value of a parameter, failing if it is absent
    pub fn get(&self, param: Parameter) -> Result<f64, ModelError> {
        self.0.get(&param).copied().ok_or_else(|| {
            ModelError::Configuration(format!("Missing required input parameter: {param}"))
        })
    }

    /// Whether the set contains a value for the parameter
    pub fn contains(&self, param: Parameter) -> bool {
        self.0.contains_key(&param)
    }

    /// A copy of this set with one parameter set to the given value
    pub fn with_value(&self, param: Parameter, value: f64) -> Self {
        let mut set = self.clone();
        set.0.insert(param, value);
        set
    }

    /// A copy of this set with every value from `overrides` applied on top
    pub fn merged_with(&self, overrides: &ParameterSet) -> Self {
        let mut set = self.clone();
        set.0.extend(overrides.iter());
        set
    }

    /// A copy of this set with a value for `param` added only if it has none
    pub fn with_default(&self, param: Parameter, value: f64) -> Self {
        if self.contains(param) {
            self.clone()
        } else {
            self.with_value(param, value)
        }
    }

    /// Iterate over parameters and values
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.0.iter().map(|(param, value)| (*param, *value))
    }
}

impl FromIterator<(Parameter, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (Parameter, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_model_error;
    use std::str::FromStr;

    #[test]
    fn test_parameter_names() {
        assert_eq!(
            Parameter::from_str("installed_price").unwrap(),
            Parameter::InstalledPrice
        );
        assert_eq!(
            Parameter::ElecCapacityUtilization.to_string(),
            "elec_capacity_utilization"
        );
        assert!(Parameter::from_str("InstalledPrice").is_err());
    }

    #[test]
    fn test_nominal_set() {
        let set = ParameterSet::nominal();
        assert_eq!(set.get(Parameter::Lifetime).unwrap(), 20.0);
        assert_eq!(set.get(Parameter::DiscountRate).unwrap(), 0.15);
        assert!(!set.contains(Parameter::ElecRate));
        assert!(!set.contains(Parameter::GasRate));
    }

    #[test]
    fn test_get_missing() {
        assert_model_error!(
            ParameterSet::default().get(Parameter::GasRate),
            Configuration,
            "Missing required input parameter: gas_rate"
        );
    }

    #[test]
    fn test_with_value_leaves_original_unchanged() {
        let base = ParameterSet::nominal();
        let varied = base.with_value(Parameter::InstalledPrice, 1.5);
        assert_eq!(varied.get(Parameter::InstalledPrice).unwrap(), 1.5);
        assert_eq!(base.get(Parameter::InstalledPrice).unwrap(), 3.0);
    }

    #[test]
    fn test_merged_with_and_with_default() {
        let overrides: ParameterSet = [(Parameter::ElecRate, 0.12), (Parameter::Lifetime, 10.0)]
            .into_iter()
            .collect();
        let set = ParameterSet::nominal().merged_with(&overrides);
        assert_eq!(set.get(Parameter::Lifetime).unwrap(), 10.0);
        assert_eq!(set.get(Parameter::ElecRate).unwrap(), 0.12);

        // Explicit values win over defaults
        let set = set
            .with_default(Parameter::ElecRate, 0.2)
            .with_default(Parameter::GasRate, 0.03);
        assert_eq!(set.get(Parameter::ElecRate).unwrap(), 0.12);
        assert_eq!(set.get(Parameter::GasRate).unwrap(), 0.03);
    }

    #[test]
    fn test_deserialise_parameter_set() {
        let set: ParameterSet = toml::from_str("installed_price = 1.8\nlifetime = 15").unwrap();
        assert_eq!(set.get(Parameter::InstalledPrice).unwrap(), 1.8);
        assert_eq!(set.get(Parameter::Lifetime).unwrap(), 15.0);

        assert!(toml::from_str::<ParameterSet>("bogus = 1.0").is_err());
    }
}
