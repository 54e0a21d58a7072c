//! The economic model for assessing the value proposition of distributed generation (DG).
//!
//! All money values are normalised per kWh of annual DG electricity output, so results do not
//! depend on the size of the installation.
use crate::finance::{capital_recovery_factor, irr, npv, simple_payback};
use crate::parameter::{Parameter, ParameterSet};
use crate::rates::{MarketRates, RateLookup};
use crate::region::MarketContext;
use crate::units::{Dimensionless, MoneyPerEnergy, MoneyPerPower};
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter;

/// Scale constant of the maximum market penetration model
const MARKET_PENETRATION_SCALE: f64 = 0.3193;

/// Width of the maximum market penetration model, as a fraction of equipment lifetime
const MARKET_PENETRATION_WIDTH: f64 = 0.1274;

/// An error which prevents a value proposition being assessed
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ModelError {
    /// A required input parameter is missing or invalid
    #[display("Configuration error: {_0}")]
    Configuration(String),
    /// Rate or inflation data is not available for the requested context
    #[display("Data unavailable: {_0}")]
    DataUnavailable(String),
}

impl std::error::Error for ModelError {}

/// A metric describing the value proposition
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Net present value
    Npv,
    /// Internal rate of return
    Irr,
    /// Simple payback period
    Payback,
    /// Levelised cost of electricity
    Lcoe,
    /// Maximum market penetration estimate
    MaxMarketPenetration,
    /// Effective electric efficiency
    EffectiveElectricEfficiency,
}

impl Metric {
    /// A human-readable label for axes and titles
    pub fn pretty_label(self) -> &'static str {
        match self {
            Self::Npv => "NPV ($/kWh)",
            Self::Irr => "IRR",
            Self::Payback => "Payback Period (years)",
            Self::Lcoe => "LCOE ($/kWh)",
            Self::MaxMarketPenetration => "Maximum Market Penetration",
            Self::EffectiveElectricEfficiency => "Effective Electric Efficiency",
        }
    }

    /// Whether smaller values of the metric are better
    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::Payback | Self::Lcoe)
    }

    /// The natural range of the metric, if it is bounded
    pub fn fixed_range(self) -> Option<(f64, f64)> {
        match self {
            Self::MaxMarketPenetration | Self::EffectiveElectricEfficiency => Some((0.0, 1.0)),
            _ => None,
        }
    }
}

/// Validated inputs for the assessment of a DG value proposition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct DgInputs {
    pub electric_efficiency: Dimensionless,
    pub thermal_efficiency: Dimensionless,
    /// Installed price ($/W)
    pub installed_price: MoneyPerPower,
    /// Operation and maintenance cost ($/kWh)
    pub maintenance_cost: MoneyPerEnergy,
    /// Lifetime in whole years
    pub lifetime: u32,
    pub elec_capacity_utilization: Dimensionless,
    pub therm_capacity_utilization: Dimensionless,
    pub baseline_thermal_efficiency: Dimensionless,
    pub inflation_rate: Dimensionless,
    pub discount_rate: Dimensionless,
    pub elec_rate: MoneyPerEnergy,
    pub gas_rate: MoneyPerEnergy,
}

/// Get a parameter value, checking that it is finite
fn get_finite(params: &ParameterSet, param: Parameter) -> Result<f64, ModelError> {
    let value = params.get(param)?;
    if !value.is_finite() {
        return Err(ModelError::Configuration(format!(
            "{param} must be a finite number"
        )));
    }

    Ok(value)
}

/// Get a parameter value, checking that it lies in (0, 1], or [0, 1] if `allow_zero` is set
fn get_proportion(
    params: &ParameterSet,
    param: Parameter,
    allow_zero: bool,
) -> Result<Dimensionless, ModelError> {
    let value = get_finite(params, param)?;
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !lower_ok || value > 1.0 {
        let bounds = if allow_zero { "[0, 1]" } else { "(0, 1]" };
        return Err(ModelError::Configuration(format!(
            "{param} must be in {bounds}, got {value}"
        )));
    }

    Ok(Dimensionless(value))
}

/// Get a rate parameter, checking that it is greater than -100%
fn get_rate(params: &ParameterSet, param: Parameter) -> Result<Dimensionless, ModelError> {
    let value = get_finite(params, param)?;
    if value <= -1.0 {
        return Err(ModelError::Configuration(format!(
            "{param} must be greater than -1, got {value}"
        )));
    }

    Ok(Dimensionless(value))
}

/// Longest supported equipment lifetime in years
const MAX_LIFETIME: u16 = u16::MAX;

/// Get the lifetime parameter, checking that it is a whole number of years
fn get_lifetime(params: &ParameterSet) -> Result<u32, ModelError> {
    let value = get_finite(params, Parameter::Lifetime)?;
    if value < 1.0 || value.fract() != 0.0 {
        return Err(ModelError::Configuration(format!(
            "lifetime must be a whole number of years of at least 1, got {value}"
        )));
    }
    if value > f64::from(MAX_LIFETIME) {
        return Err(ModelError::Configuration(format!(
            "lifetime cannot be more than {MAX_LIFETIME} years, got {value}"
        )));
    }

    Ok(value as u32)
}

impl DgInputs {
    /// Build inputs from a parameter set, validating every value
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError> {
        let installed_price = get_finite(params, Parameter::InstalledPrice)?;
        if installed_price < 0.0 {
            return Err(ModelError::Configuration(format!(
                "installed_price cannot be negative, got {installed_price}"
            )));
        }

        let inputs = Self {
            electric_efficiency: get_proportion(params, Parameter::ElectricEfficiency, false)?,
            thermal_efficiency: get_proportion(params, Parameter::ThermalEfficiency, true)?,
            installed_price: MoneyPerPower(installed_price),
            maintenance_cost: MoneyPerEnergy(get_finite(params, Parameter::MaintenanceCost)?),
            lifetime: get_lifetime(params)?,
            elec_capacity_utilization: get_proportion(
                params,
                Parameter::ElecCapacityUtilization,
                false,
            )?,
            therm_capacity_utilization: get_proportion(
                params,
                Parameter::ThermCapacityUtilization,
                true,
            )?,
            baseline_thermal_efficiency: get_proportion(
                params,
                Parameter::BaselineThermalEfficiency,
                false,
            )?,
            inflation_rate: get_rate(params, Parameter::InflationRate)?,
            discount_rate: get_rate(params, Parameter::DiscountRate)?,
            elec_rate: MoneyPerEnergy(get_finite(params, Parameter::ElecRate)?),
            gas_rate: MoneyPerEnergy(get_finite(params, Parameter::GasRate)?),
        };

        if inputs.heat_to_power_share() >= Dimensionless(1.0) {
            return Err(ModelError::Configuration(
                "Recovered heat cannot exceed the fuel it displaces: \
                thermal_efficiency / baseline_thermal_efficiency * therm_capacity_utilization / \
                elec_capacity_utilization must be less than 1"
                    .into(),
            ));
        }

        Ok(inputs)
    }

    /// Capital outlay per kWh of annual output
    pub fn capital_cost(&self) -> MoneyPerEnergy {
        self.installed_price
            .per_annual_energy(self.elec_capacity_utilization)
    }

    /// Boiler fuel displaced by recovered heat, per unit of fuel burned by the DG unit's output
    fn heat_credit_factor(&self) -> Dimensionless {
        self.thermal_efficiency / self.electric_efficiency / self.baseline_thermal_efficiency
            * self.therm_capacity_utilization
    }

    /// Displaced boiler fuel relative to electric output, as used by the effective efficiency
    fn heat_to_power_share(&self) -> Dimensionless {
        self.thermal_efficiency / self.baseline_thermal_efficiency
            * self.therm_capacity_utilization
            / self.elec_capacity_utilization
    }

    /// Net operating cash flow per kWh in year one, before escalation.
    ///
    /// Savings on grid electricity, less fuel and maintenance, plus the credit for boiler fuel
    /// displaced by recovered heat.
    pub fn operating_margin(&self) -> MoneyPerEnergy {
        self.elec_rate - self.gas_rate / self.electric_efficiency - self.maintenance_cost
            + self.gas_rate * self.heat_credit_factor()
    }

    /// Annual cash flows over the equipment lifetime, starting with the capital outlay in year 0
    pub fn cash_flows(&self) -> Vec<MoneyPerEnergy> {
        let margin = self.operating_margin();
        let escalation = Dimensionless(1.0) + self.inflation_rate;
        iter::once(MoneyPerEnergy(0.0) - self.capital_cost())
            .chain((1..=self.lifetime).map(|year| margin * escalation.powi(year as i32)))
            .collect()
    }

    /// Levelised cost of electricity
    pub fn lcoe(&self) -> MoneyPerEnergy {
        self.capital_cost() * capital_recovery_factor(self.lifetime, self.discount_rate)
            + self.gas_rate / self.electric_efficiency
            + self.maintenance_cost
            - self.gas_rate * self.heat_credit_factor()
    }

    /// Electric efficiency after crediting recovered heat
    pub fn effective_electric_efficiency(&self) -> Dimensionless {
        self.electric_efficiency / (Dimensionless(1.0) - self.heat_to_power_share())
    }
}

/// Estimated maximum market penetration for a given payback period.
///
/// Falls off as a half-Gaussian in payback as a fraction of lifetime; zero if the equipment never
/// pays back.
pub fn max_market_penetration(payback_years: Option<u32>, lifetime: u32) -> Dimensionless {
    let Some(payback) = payback_years else {
        return Dimensionless(0.0);
    };

    let x = f64::from(payback) / f64::from(lifetime) / MARKET_PENETRATION_WIDTH;
    Dimensionless(
        MARKET_PENETRATION_SCALE / (2.0 * PI).sqrt() / MARKET_PENETRATION_WIDTH
            * (-x * x / 2.0).exp(),
    )
}

/// Economic value proposition metrics for one set of inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicResult {
    /// Net present value per kWh of annual output
    pub npv: MoneyPerEnergy,
    /// Internal rate of return, if one could be found
    pub irr: Option<Dimensionless>,
    /// Simple payback period in whole years, if the equipment pays back within its lifetime
    pub payback_years: Option<u32>,
    /// Levelised cost of electricity
    pub lcoe: MoneyPerEnergy,
    /// Estimated maximum market penetration
    pub max_market_penetration: Dimensionless,
    /// Effective electric efficiency
    pub effective_electric_efficiency: Dimensionless,
}

impl EconomicResult {
    /// Get the value of a metric, with undefined values represented as NaN
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Npv => self.npv.value(),
            Metric::Irr => self.irr.map_or(f64::NAN, f64::from),
            Metric::Payback => self.payback_years.map_or(f64::NAN, f64::from),
            Metric::Lcoe => self.lcoe.value(),
            Metric::MaxMarketPenetration => self.max_market_penetration.0,
            Metric::EffectiveElectricEfficiency => self.effective_electric_efficiency.0,
        }
    }
}

/// The inputs and outputs of one assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueProposition {
    /// The inputs actually evaluated
    pub inputs: DgInputs,
    /// The resulting metrics
    pub outputs: EconomicResult,
}

impl ValueProposition {
    /// Assess the value proposition for validated inputs
    pub fn assess(inputs: DgInputs) -> Self {
        let cash_flows = inputs
            .cash_flows()
            .into_iter()
            .map(MoneyPerEnergy::value)
            .collect::<Vec<_>>();

        let irr = irr(&cash_flows).map(Dimensionless);
        if irr.is_none() {
            debug!("IRR did not converge for cash flows {cash_flows:?}");
        }
        let payback_years = simple_payback(&cash_flows);

        let outputs = EconomicResult {
            npv: MoneyPerEnergy(npv(inputs.discount_rate, &cash_flows)),
            irr,
            payback_years,
            lcoe: inputs.lcoe(),
            max_market_penetration: max_market_penetration(payback_years, inputs.lifetime),
            effective_electric_efficiency: inputs.effective_electric_efficiency(),
        };

        Self { inputs, outputs }
    }
}

/// Assess the value proposition for a complete parameter set.
///
/// This does no data lookup, so the energy prices must already be in `params`.
pub fn evaluate_parameters(params: &ParameterSet) -> Result<ValueProposition, ModelError> {
    Ok(ValueProposition::assess(DgInputs::from_parameters(params)?))
}

/// Fill in any energy prices missing from `params` with market rates
pub fn apply_rates(params: &ParameterSet, rates: &MarketRates) -> ParameterSet {
    params
        .with_default(Parameter::ElecRate, rates.elec_rate.value())
        .with_default(Parameter::GasRate, rates.gas_rate.value())
}

/// The economic model, with access to market rate data
pub struct EconomicModel<'a> {
    rates: &'a dyn RateLookup,
}

impl<'a> EconomicModel<'a> {
    /// Create a model which takes energy prices from `rates`
    pub fn new(rates: &'a dyn RateLookup) -> Self {
        Self { rates }
    }

    /// Look up rates for a market context
    pub fn market_rates(&self, context: &MarketContext) -> Result<MarketRates, ModelError> {
        self.rates.lookup(context)
    }

    /// Complete a parameter set with the energy prices for a market context.
    ///
    /// Prices already present in `params` are kept.
    pub fn resolve(
        &self,
        params: &ParameterSet,
        context: &MarketContext,
    ) -> Result<ParameterSet, ModelError> {
        Ok(apply_rates(params, &self.market_rates(context)?))
    }

    /// Assess the value proposition of `inputs` in a market context
    pub fn evaluate(
        &self,
        inputs: &ParameterSet,
        context: &MarketContext,
    ) -> Result<ValueProposition, ModelError> {
        evaluate_parameters(&self.resolve(inputs, context)?)
    }
}
