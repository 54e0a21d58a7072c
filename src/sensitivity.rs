//! Sensitivity studies: sweeping one or two parameters over ranges of values.
use crate::economics::{
    EconomicModel, Metric, ModelError, ValueProposition, apply_rates, evaluate_parameters,
};
use crate::parameter::{Parameter, ParameterSet};
use crate::rates::MarketRates;
use crate::region::MarketContext;
use itertools::Itertools;
use log::warn;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Deserialize;

/// A range of values for a varied parameter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueRange {
    /// An explicit list of values
    Values {
        /// The values, in sweep order
        values: Vec<f64>,
    },
    /// `num` evenly spaced values from `start` to `stop` inclusive
    Linspace {
        /// First value
        start: f64,
        /// Last value
        stop: f64,
        /// Number of values
        num: usize,
    },
}

impl ValueRange {
    /// The values in the range, in order
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Values { values } => values.clone(),
            Self::Linspace { start, stop, num } => linspace(*start, *stop, *num),
        }
    }
}

/// `num` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    // Avoid accumulating error on the final value
                    if i == num - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// A parameter and the values it takes in a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct VariedParameter {
    /// The parameter to vary
    pub parameter: Parameter,
    /// Values taken by the parameter, in sweep order
    pub values: Vec<f64>,
}

impl VariedParameter {
    /// Create a new varied parameter
    pub fn new(parameter: Parameter, values: Vec<f64>) -> Self {
        Self { parameter, values }
    }
}

/// The parameters varied in a sensitivity study
#[derive(Debug, Clone, PartialEq)]
pub enum Sweep {
    /// A single varied parameter
    One(VariedParameter),
    /// Two varied parameters; the first is the outer loop
    Two(VariedParameter, VariedParameter),
}

impl Sweep {
    /// Build a sweep from a list of one or two varied parameters
    pub fn from_varied(mut varied: Vec<VariedParameter>) -> Result<Self, ModelError> {
        let sweep = match varied.len() {
            1 => Self::One(varied.remove(0)),
            2 => {
                let second = varied.remove(1);
                Self::Two(varied.remove(0), second)
            }
            n => {
                return Err(ModelError::Configuration(format!(
                    "A sensitivity study varies one or two parameters, but {n} were given"
                )));
            }
        };
        sweep.validate()?;

        Ok(sweep)
    }

    /// Check that every parameter has values and no parameter is varied twice
    pub fn validate(&self) -> Result<(), ModelError> {
        for varied in self.varied() {
            if varied.values.is_empty() {
                return Err(ModelError::Configuration(format!(
                    "No values given for varied parameter {}",
                    varied.parameter
                )));
            }
            if let Some(value) = varied.values.iter().find(|value| !value.is_finite()) {
                return Err(ModelError::Configuration(format!(
                    "Invalid value {value} for varied parameter {}",
                    varied.parameter
                )));
            }
        }
        match self {
            Self::Two(first, second) if first.parameter == second.parameter => Err(
                ModelError::Configuration(format!(
                    "Cannot vary {} twice in one study",
                    first.parameter
                )),
            ),
            _ => Ok(()),
        }
    }

    /// The varied parameters, in order
    pub fn varied(&self) -> impl Iterator<Item = &VariedParameter> {
        match self {
            Self::One(first) => [Some(first), None],
            Self::Two(first, second) => [Some(first), Some(second)],
        }
        .into_iter()
        .flatten()
    }

    /// The first (or only) varied parameter
    pub fn first(&self) -> &VariedParameter {
        match self {
            Self::One(first) | Self::Two(first, _) => first,
        }
    }

    /// The second varied parameter, if there is one
    pub fn second(&self) -> Option<&VariedParameter> {
        match self {
            Self::One(_) => None,
            Self::Two(_, second) => Some(second),
        }
    }

    /// The total number of grid points
    pub fn len(&self) -> usize {
        self.varied().map(|varied| varied.values.len()).product()
    }

    /// Whether the sweep has no grid points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values of the varied parameters at each grid point.
    ///
    /// For two parameters, point `(i, j)` is at index `i * n + j`, where `n` is the number of
    /// values of the second parameter.
    pub fn points(&self) -> Vec<Vec<f64>> {
        match self {
            Self::One(first) => first.values.iter().map(|value| vec![*value]).collect(),
            Self::Two(first, second) => first
                .values
                .iter()
                .cartesian_product(&second.values)
                .map(|(x, y)| vec![*x, *y])
                .collect(),
        }
    }
}

/// One evaluated point of a sensitivity study
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    /// Values of the varied parameters, in sweep order
    pub values: Vec<f64>,
    /// The evaluated value proposition at this point
    pub value_proposition: ValueProposition,
}

/// The results of a sensitivity study in one market context
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityGrid {
    /// The market context the study was run in
    pub context: MarketContext,
    /// The market rates looked up for the context
    pub rates: MarketRates,
    /// The varied parameters
    pub sweep: Sweep,
    /// Evaluated points, in the order given by [`Sweep::points`]
    pub points: Vec<GridPoint>,
}

impl SensitivityGrid {
    /// Get the point at index `i` of the first parameter and `j` of the second
    pub fn point(&self, i: usize, j: usize) -> Option<&GridPoint> {
        let n = self.sweep.second().map_or(1, |second| second.values.len());
        if j >= n {
            return None;
        }
        self.points.get(i * n + j)
    }

    /// Values of a metric arranged for contour plotting.
    ///
    /// Rows correspond to values of the second parameter and columns to values of the first. A
    /// one-parameter grid has a single row.
    pub fn surface(&self, metric: Metric) -> Vec<Vec<f64>> {
        let m = self.sweep.first().values.len();
        let n = self.sweep.second().map_or(1, |second| second.values.len());
        (0..n)
            .map(|j| {
                (0..m)
                    .map(|i| {
                        self.points[i * n + j]
                            .value_proposition
                            .outputs
                            .metric(metric)
                    })
                    .collect()
            })
            .collect()
    }

    /// The number of points at which the IRR is undefined
    pub fn undefined_irr_count(&self) -> usize {
        self.points
            .iter()
            .filter(|point| point.value_proposition.outputs.irr.is_none())
            .count()
    }
}

/// Evaluate the varied values at one grid point
fn evaluate_point(
    resolved: &ParameterSet,
    sweep: &Sweep,
    values: &[f64],
) -> Result<GridPoint, ModelError> {
    let params = sweep
        .varied()
        .zip(values)
        .fold(resolved.clone(), |set, (varied, value)| {
            set.with_value(varied.parameter, *value)
        });

    Ok(GridPoint {
        values: values.to_vec(),
        value_proposition: evaluate_parameters(&params)?,
    })
}

/// Run a sensitivity study in a market context.
///
/// Market rates are looked up once; every other parameter is taken from `baseline`. An invalid
/// combination of values at any point aborts the study.
pub fn run(
    model: &EconomicModel,
    baseline: &ParameterSet,
    context: &MarketContext,
    sweep: &Sweep,
) -> Result<SensitivityGrid, ModelError> {
    sweep.validate()?;
    let rates = model.market_rates(context)?;
    let resolved = apply_rates(baseline, &rates);
    let point_values = sweep.points();

    #[cfg(feature = "parallel")]
    let points = point_values
        .par_iter()
        .map(|values| evaluate_point(&resolved, sweep, values))
        .collect::<Result<Vec<_>, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let points = point_values
        .iter()
        .map(|values| evaluate_point(&resolved, sweep, values))
        .collect::<Result<Vec<_>, _>>()?;

    let grid = SensitivityGrid {
        context: context.clone(),
        rates,
        sweep: sweep.clone(),
        points,
    };

    let undefined = grid.undefined_irr_count();
    if undefined > 0 {
        warn!(
            "{context}: IRR is undefined at {undefined} of {} grid points",
            grid.points.len()
        );
    }

    Ok(grid)
}
