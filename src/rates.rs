//! Energy prices and consumption for each region, sector and year.
use crate::economics::ModelError;
use crate::inflation::InflationIndex;
use crate::region::{MarketContext, RegionID, Sector};
use crate::units::{Energy, MoneyPerEnergy};
use indexmap::IndexMap;

/// Prices and consumption for a single market context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketRates {
    /// Average price of electricity ($/kWh)
    pub elec_rate: MoneyPerEnergy,
    /// Average price of natural gas ($/kWh, LHV basis)
    pub gas_rate: MoneyPerEnergy,
    /// Total electricity consumption, if known (kWh)
    pub consumption: Option<Energy>,
}

/// Something which can resolve a market context to energy prices
pub trait RateLookup {
    /// Look up rates for the given context.
    ///
    /// Fails with [`ModelError::DataUnavailable`] if there is no data for the context.
    fn lookup(&self, context: &MarketContext) -> Result<MarketRates, ModelError>;
}

/// A table of rates keyed by region, sector and year
#[derive(Debug, Default, PartialEq)]
pub struct RateTable(IndexMap<(RegionID, Sector, u32), MarketRates>);

impl RateTable {
    /// Add rates for a region, sector and year, returning the previous entry, if any
    pub fn insert(
        &mut self,
        region_id: RegionID,
        sector: Sector,
        year: u32,
        rates: MarketRates,
    ) -> Option<MarketRates> {
        self.0.insert((region_id, sector, year), rates)
    }

    /// The number of entries in the table
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries in the table
    pub fn iter(&self) -> impl Iterator<Item = (&RegionID, Sector, u32, &MarketRates)> {
        self.0
            .iter()
            .map(|((region_id, sector, year), rates)| (region_id, *sector, *year, rates))
    }
}

impl RateLookup for RateTable {
    fn lookup(&self, context: &MarketContext) -> Result<MarketRates, ModelError> {
        self.0
            .get(&(context.region_id.clone(), context.sector, context.year))
            .copied()
            .ok_or_else(|| ModelError::DataUnavailable(format!("No rate data for {context}")))
    }
}

/// Rates converted from nominal dollars into real dollars of a reference year
pub struct RealRates<'a, R: RateLookup + ?Sized> {
    rates: &'a R,
    index: &'a InflationIndex,
    reference_year: u32,
}

impl<'a, R: RateLookup + ?Sized> RealRates<'a, R> {
    /// Wrap `rates` so that prices are expressed in dollars of `reference_year`
    pub fn new(rates: &'a R, index: &'a InflationIndex, reference_year: u32) -> Self {
        Self {
            rates,
            index,
            reference_year,
        }
    }
}

impl<R: RateLookup + ?Sized> RateLookup for RealRates<'_, R> {
    fn lookup(&self, context: &MarketContext) -> Result<MarketRates, ModelError> {
        let nominal = self.rates.lookup(context)?;
        let factor = self.index.factor(context.year, self.reference_year)?;

        Ok(MarketRates {
            elec_rate: nominal.elec_rate * factor,
            gas_rate: nominal.gas_rate * factor,
            consumption: nominal.consumption,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_model_error, context, cpi_index, rate_table};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_lookup(rate_table: RateTable, context: MarketContext) {
        let rates = rate_table.lookup(&context).unwrap();
        assert_eq!(rates.elec_rate, MoneyPerEnergy(0.15));
        assert_eq!(rates.gas_rate, MoneyPerEnergy(0.03));
    }

    #[rstest]
    fn test_lookup_missing(rate_table: RateTable) {
        let context = MarketContext::new("NY".into(), Sector::Commercial, 2015);
        assert_model_error!(
            rate_table.lookup(&context),
            DataUnavailable,
            "No rate data for NY COM 2015"
        );
    }

    #[rstest]
    fn test_insert_duplicate(mut rate_table: RateTable) {
        let rates = MarketRates {
            elec_rate: MoneyPerEnergy(1.0),
            gas_rate: MoneyPerEnergy(1.0),
            consumption: None,
        };
        assert!(
            rate_table
                .insert("CT".into(), Sector::Commercial, 2015, rates)
                .is_some()
        );
        assert!(
            rate_table
                .insert("CT".into(), Sector::Residential, 2015, rates)
                .is_none()
        );
    }

    #[rstest]
    fn test_real_rates(rate_table: RateTable, cpi_index: InflationIndex, context: MarketContext) {
        // Index doubles between 2015 and 2020
        let real = RealRates::new(&rate_table, &cpi_index, 2020);
        let rates = real.lookup(&context).unwrap();
        assert_approx_eq!(f64, rates.elec_rate.value(), 0.30);
        assert_approx_eq!(f64, rates.gas_rate.value(), 0.06);
        assert_eq!(rates.consumption, Some(Energy(2.0e10)));
    }

    #[rstest]
    fn test_real_rates_missing_year(
        rate_table: RateTable,
        cpi_index: InflationIndex,
        context: MarketContext,
    ) {
        let real = RealRates::new(&rate_table, &cpi_index, 1990);
        assert_model_error!(
            real.lookup(&context),
            DataUnavailable,
            "No inflation index for year 1990"
        );
    }
}
