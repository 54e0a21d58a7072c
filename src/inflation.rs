//! Conversion between nominal and real dollars using a price index.
use crate::economics::ModelError;
use crate::units::Dimensionless;
use indexmap::IndexMap;

/// An annual price index (e.g. the consumer price index), keyed by year
#[derive(Debug, Default, PartialEq)]
pub struct InflationIndex(IndexMap<u32, f64>);

impl InflationIndex {
    /// Get the index value for a year
    pub fn get(&self, year: u32) -> Result<f64, ModelError> {
        self.0.get(&year).copied().ok_or_else(|| {
            ModelError::DataUnavailable(format!("No inflation index for year {year}"))
        })
    }

    /// The factor converting dollars of `from_year` into dollars of `to_year`
    pub fn factor(&self, from_year: u32, to_year: u32) -> Result<Dimensionless, ModelError> {
        Ok(Dimensionless(self.get(to_year)? / self.get(from_year)?))
    }

    /// Express a value in dollars of `from_year` in dollars of `to_year`
    pub fn adjust(&self, value: f64, from_year: u32, to_year: u32) -> Result<f64, ModelError> {
        Ok(value * self.factor(from_year, to_year)?.0)
    }

    /// Iterate over years and index values
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().map(|(year, value)| (*year, *value))
    }
}

impl FromIterator<(u32, f64)> for InflationIndex {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
