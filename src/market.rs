//! Market studies: sensitivity studies repeated over regions, years and sectors.
use crate::economics::{EconomicModel, Metric, ModelError};
use crate::parameter::ParameterSet;
use crate::region::{MarketContext, RegionID, Sector};
use crate::sensitivity::{self, SensitivityGrid, Sweep};
use crate::units::{Dimensionless, TWH_PER_QUAD};
use indexmap::IndexMap;
use itertools::iproduct;
use log::{info, warn};

/// Default efficiency of grid electricity generation, used for primary energy savings
pub const DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY: f64 = 0.34;

/// A sensitivity study to repeat for every combination of region, year and sector
#[derive(Debug, Clone, PartialEq)]
pub struct MarketStudy {
    /// Regions to assess
    pub regions: Vec<RegionID>,
    /// Years to assess
    pub years: Vec<u32>,
    /// Sectors to assess
    pub sectors: Vec<Sector>,
    /// Parameter values other than the varied ones and market rates
    pub baseline: ParameterSet,
    /// The parameters varied in each market context
    pub sweep: Sweep,
    /// Efficiency of the grid generation displaced by DG
    pub grid_baseline_elec_efficiency: Dimensionless,
}

impl MarketStudy {
    /// The market contexts covered by the study, ordered by sector, then year, then region
    pub fn contexts(&self) -> impl Iterator<Item = MarketContext> + '_ {
        iproduct!(&self.sectors, &self.years, &self.regions)
            .map(|(sector, year, region_id)| MarketContext::new(region_id.clone(), *sector, *year))
    }

    /// Run the sensitivity study in every market context.
    ///
    /// A failure in one context does not stop the others; it is recorded in the portfolio.
    pub fn run(&self, model: &EconomicModel) -> Portfolio {
        let mut portfolio = Portfolio::default();
        for context in self.contexts() {
            info!("Running sensitivity study for {context}");
            let result = sensitivity::run(model, &self.baseline, &context, &self.sweep);
            if let Err(err) = &result {
                warn!("Skipping {context}: {err}");
            }
            portfolio.0.insert(context, result);
        }

        portfolio
    }
}

/// The outcome of a market study for every market context
#[derive(Debug, Default, PartialEq)]
pub struct Portfolio(IndexMap<MarketContext, Result<SensitivityGrid, ModelError>>);

impl Portfolio {
    /// Get the outcome for a market context
    pub fn get(&self, context: &MarketContext) -> Option<&Result<SensitivityGrid, ModelError>> {
        self.0.get(context)
    }

    /// Iterate over market contexts and their outcomes, in study order
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&MarketContext, &Result<SensitivityGrid, ModelError>)> {
        self.0.iter()
    }

    /// Iterate over the grids of successful market contexts
    pub fn grids(&self) -> impl Iterator<Item = &SensitivityGrid> {
        self.0.values().filter_map(|result| result.as_ref().ok())
    }

    /// Iterate over failed market contexts and their errors
    pub fn failures(&self) -> impl Iterator<Item = (&MarketContext, &ModelError)> {
        self.0
            .iter()
            .filter_map(|(context, result)| Some((context, result.as_ref().err()?)))
    }

    /// The number of market contexts in the portfolio
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the portfolio is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Market-level results for one sector and year, over the sweep grid.
///
/// Surfaces are laid out as in [`SensitivityGrid::surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarketAggregate {
    /// Regions which contributed to the aggregate
    pub regions: Vec<RegionID>,
    /// Total electricity consumption of the contributing regions (TWh)
    pub total_market_twh: f64,
    /// Consumption which DG could address at maximum penetration (TWh)
    pub addressed_market_twh: Vec<Vec<f64>>,
    /// Addressed market as a proportion of the total
    pub total_market_penetration: Vec<Vec<f64>>,
    /// Primary energy saved by serving the addressed market with DG (TWh)
    pub primary_energy_savings_twh: Vec<Vec<f64>>,
    /// Primary energy savings in quads
    pub primary_energy_savings_quads: Vec<Vec<f64>>,
}

/// Apply `f` elementwise to two surfaces of the same shape
fn zip_surfaces(a: &[Vec<f64>], b: &[Vec<f64>], f: impl Fn(f64, f64) -> f64) -> Vec<Vec<f64>> {
    a.iter()
        .zip(b)
        .map(|(row_a, row_b)| row_a.iter().zip(row_b).map(|(x, y)| f(*x, *y)).collect())
        .collect()
}

/// Apply `f` to every value of a surface
fn map_surface(a: &[Vec<f64>], f: impl Fn(f64) -> f64) -> Vec<Vec<f64>> {
    a.iter()
        .map(|row| row.iter().map(|x| f(*x)).collect())
        .collect()
}

/// Market aggregates for each sector and year of a market study
#[derive(Debug, Default, PartialEq)]
pub struct MarketSummary(IndexMap<(Sector, u32), MarketAggregate>);

impl MarketSummary {
    /// Aggregate the grids of a portfolio over regions.
    ///
    /// Only regions with a successful study and known electricity consumption contribute. Sector
    /// and year combinations with no contributing regions are omitted.
    pub fn from_portfolio(
        portfolio: &Portfolio,
        grid_baseline_elec_efficiency: Dimensionless,
    ) -> Self {
        let eta_grid = grid_baseline_elec_efficiency.0;
        let mut summary = Self::default();
        let mut seen = Vec::new();

        for context in portfolio.0.keys() {
            let key = (context.sector, context.year);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let mut aggregate: Option<MarketAggregate> = None;
            for grid in portfolio.grids().filter(|grid| {
                grid.context.sector == context.sector && grid.context.year == context.year
            }) {
                let Some(consumption) = grid.rates.consumption else {
                    warn!(
                        "No consumption data for {}: excluded from market totals",
                        grid.context
                    );
                    continue;
                };

                let region_twh = consumption.in_twh();
                let addressed = map_surface(&grid.surface(Metric::MaxMarketPenetration), |mmp| {
                    region_twh * mmp
                });
                let savings = zip_surfaces(
                    &addressed,
                    &grid.surface(Metric::EffectiveElectricEfficiency),
                    |addressed, eee| addressed / eta_grid * (1.0 - eta_grid / eee),
                );

                match &mut aggregate {
                    None => {
                        aggregate = Some(MarketAggregate {
                            regions: vec![grid.context.region_id.clone()],
                            total_market_twh: region_twh,
                            addressed_market_twh: addressed,
                            total_market_penetration: Vec::new(),
                            primary_energy_savings_twh: savings,
                            primary_energy_savings_quads: Vec::new(),
                        });
                    }
                    Some(aggregate) => {
                        aggregate.regions.push(grid.context.region_id.clone());
                        aggregate.total_market_twh += region_twh;
                        aggregate.addressed_market_twh =
                            zip_surfaces(&aggregate.addressed_market_twh, &addressed, |x, y| {
                                x + y
                            });
                        aggregate.primary_energy_savings_twh =
                            zip_surfaces(&aggregate.primary_energy_savings_twh, &savings, |x, y| {
                                x + y
                            });
                    }
                }
            }

            let Some(mut aggregate) = aggregate else {
                warn!(
                    "No regions with results for {} {}: no market totals",
                    context.sector, context.year
                );
                continue;
            };

            let total = aggregate.total_market_twh;
            aggregate.total_market_penetration =
                map_surface(&aggregate.addressed_market_twh, |addressed| {
                    addressed / total
                });
            aggregate.primary_energy_savings_quads =
                map_surface(&aggregate.primary_energy_savings_twh, |twh| {
                    twh / TWH_PER_QUAD
                });
            summary.0.insert(key, aggregate);
        }

        summary
    }

    /// Get the aggregate for a sector and year
    pub fn get(&self, sector: Sector, year: u32) -> Option<&MarketAggregate> {
        self.0.get(&(sector, year))
    }

    /// Iterate over sectors, years and aggregates
    pub fn iter(&self) -> impl Iterator<Item = (Sector, u32, &MarketAggregate)> {
        self.0
            .iter()
            .map(|((sector, year), aggregate)| (*sector, *year, aggregate))
    }

    /// Whether there are no aggregates
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{market_study, rate_table};
    use crate::rates::{MarketRates, RateTable};
    use crate::units::{Energy, MoneyPerEnergy};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_contexts_order(market_study: MarketStudy) {
        let market_study = MarketStudy {
            years: vec![2015, 2016],
            ..market_study
        };
        let contexts = market_study
            .contexts()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            contexts,
            ["CT COM 2015", "NY COM 2015", "CT COM 2016", "NY COM 2016"]
        );
    }

    #[rstest]
    fn test_missing_region_is_recorded(market_study: MarketStudy, rate_table: RateTable) {
        let model = EconomicModel::new(&rate_table);
        let portfolio = market_study.run(&model);
        assert_eq!(portfolio.len(), 2);

        let ct = MarketContext::new("CT".into(), Sector::Commercial, 2015);
        let grid = portfolio.get(&ct).unwrap().as_ref().unwrap();
        assert_eq!(grid.points.len(), 6);

        let ny = MarketContext::new("NY".into(), Sector::Commercial, 2015);
        assert_eq!(
            portfolio.get(&ny).unwrap().as_ref().unwrap_err(),
            &ModelError::DataUnavailable("No rate data for NY COM 2015".into())
        );
        assert_eq!(portfolio.failures().count(), 1);
        assert_eq!(portfolio.grids().count(), 1);
    }

    #[rstest]
    fn test_summary_single_region(market_study: MarketStudy, rate_table: RateTable) {
        let model = EconomicModel::new(&rate_table);
        let portfolio = market_study.run(&model);
        let summary =
            MarketSummary::from_portfolio(&portfolio, market_study.grid_baseline_elec_efficiency);
        let aggregate = summary.get(Sector::Commercial, 2015).unwrap();

        // Only CT has data: 2e10 kWh = 20 TWh
        assert_eq!(aggregate.regions, vec![RegionID::from("CT")]);
        assert_approx_eq!(f64, aggregate.total_market_twh, 20.0);

        let ct = MarketContext::new("CT".into(), Sector::Commercial, 2015);
        let grid = portfolio.get(&ct).unwrap().as_ref().unwrap();
        let mmp = grid.surface(Metric::MaxMarketPenetration);
        let eee = grid.surface(Metric::EffectiveElectricEfficiency);
        for (j, row) in aggregate.total_market_penetration.iter().enumerate() {
            assert_eq!(row.len(), 3);
            for (i, penetration) in row.iter().enumerate() {
                assert_approx_eq!(f64, *penetration, mmp[j][i], epsilon = 1e-12);
                let twh = 20.0 * mmp[j][i] / 0.34 * (1.0 - 0.34 / eee[j][i]);
                assert_approx_eq!(
                    f64,
                    aggregate.primary_energy_savings_twh[j][i],
                    twh,
                    epsilon = 1e-9
                );
                assert_approx_eq!(
                    f64,
                    aggregate.primary_energy_savings_quads[j][i],
                    twh / 293.1,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[rstest]
    fn test_summary_sums_regions(market_study: MarketStudy, mut rate_table: RateTable) {
        let rates = MarketRates {
            elec_rate: MoneyPerEnergy(0.15),
            gas_rate: MoneyPerEnergy(0.03),
            consumption: Some(Energy(6.0e10)),
        };
        rate_table.insert("NY".into(), Sector::Commercial, 2015, rates);
        let model = EconomicModel::new(&rate_table);
        let portfolio = market_study.run(&model);
        let summary =
            MarketSummary::from_portfolio(&portfolio, market_study.grid_baseline_elec_efficiency);
        let aggregate = summary.get(Sector::Commercial, 2015).unwrap();
        assert_eq!(aggregate.regions.len(), 2);
        assert_approx_eq!(f64, aggregate.total_market_twh, 80.0);

        // Identical prices, so penetration is the same as in either region alone
        let ct = MarketContext::new("CT".into(), Sector::Commercial, 2015);
        let mmp = portfolio
            .get(&ct)
            .unwrap()
            .as_ref()
            .unwrap()
            .surface(Metric::MaxMarketPenetration);
        assert_approx_eq!(
            f64,
            aggregate.total_market_penetration[1][0],
            mmp[1][0],
            epsilon = 1e-12
        );
        assert_approx_eq!(
            f64,
            aggregate.addressed_market_twh[1][0],
            80.0 * mmp[1][0],
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_summary_no_regions(market_study: MarketStudy) {
        let rate_table = RateTable::default();
        let model = EconomicModel::new(&rate_table);
        let portfolio = market_study.run(&model);
        assert_eq!(portfolio.failures().count(), 2);
        let summary =
            MarketSummary::from_portfolio(&portfolio, market_study.grid_baseline_elec_efficiency);
        assert!(summary.is_empty());
    }
}
