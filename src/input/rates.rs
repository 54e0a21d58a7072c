//! Code for reading energy rate data from CSV files.
use super::{input_err_msg, read_csv};
use crate::rates::{MarketRates, RateTable};
use crate::region::{RegionID, Sector, check_region_code};
use crate::units::{Energy, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

/// The name of the rate data file in a study directory
pub const RATES_FILE_NAME: &str = "rates.csv";

/// A row of the rates CSV file
#[derive(Debug, PartialEq, Deserialize)]
struct RateRow {
    region_id: RegionID,
    sector: Sector,
    year: u32,
    elec_rate: f64,
    gas_rate: f64,
    consumption: Option<f64>,
}

/// Check that a price is a non-negative number
fn check_price(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite, non-negative number, got {value}"
    );

    Ok(())
}

/// Read rate data from the rates CSV file in a study directory.
///
/// # Arguments
///
/// * `study_dir` - Folder containing study files
///
/// # Returns
///
/// A [`RateTable`] with an entry for every row of the file
pub fn read_rates(study_dir: &Path) -> Result<RateTable> {
    let file_path = study_dir.join(RATES_FILE_NAME);
    let iter = read_csv::<RateRow>(&file_path)?;
    read_rates_from_iter(iter).with_context(|| input_err_msg(&file_path))
}

fn read_rates_from_iter<I>(iter: I) -> Result<RateTable>
where
    I: Iterator<Item = RateRow>,
{
    let mut table = RateTable::default();
    for row in iter {
        check_region_code(&row.region_id.0)?;
        check_price("elec_rate", row.elec_rate)?;
        check_price("gas_rate", row.gas_rate)?;
        if let Some(consumption) = row.consumption {
            ensure!(
                consumption.is_finite() && consumption >= 0.0,
                "consumption must be a finite, non-negative number, got {consumption}"
            );
        }

        let rates = MarketRates {
            elec_rate: MoneyPerEnergy(row.elec_rate),
            gas_rate: MoneyPerEnergy(row.gas_rate),
            consumption: row.consumption.map(Energy),
        };
        ensure!(
            table
                .insert(row.region_id.clone(), row.sector, row.year, rates)
                .is_none(),
            "Duplicate entry for region {}, sector {}, year {}",
            row.region_id,
            row.sector,
            row.year
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::rates::RateLookup;
    use crate::region::MarketContext;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn row(region_id: &str, elec_rate: f64, consumption: Option<f64>) -> RateRow {
        RateRow {
            region_id: region_id.into(),
            sector: Sector::Commercial,
            year: 2015,
            elec_rate,
            gas_rate: 0.03,
            consumption,
        }
    }

    #[test]
    fn test_read_rates() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(RATES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "region_id,sector,year,elec_rate,gas_rate,consumption
CT,COM,2015,0.15,0.03,2.0e10
CT,RES,2015,0.19,0.04,"
            )
            .unwrap();
        }

        let table = read_rates(dir.path()).unwrap();
        assert_eq!(table.len(), 2);
        let rates = table
            .lookup(&MarketContext::new("CT".into(), Sector::Residential, 2015))
            .unwrap();
        assert_eq!(rates.elec_rate, MoneyPerEnergy(0.19));
        assert_eq!(rates.consumption, None);
    }

    #[test]
    fn test_read_rates_from_iter_duplicate() {
        let rows = [row("CT", 0.15, None), row("CT", 0.16, None)];
        assert_error!(
            read_rates_from_iter(rows.into_iter()),
            "Duplicate entry for region CT, sector COM, year 2015"
        );
    }

    #[test]
    fn test_read_rates_from_iter_bad_region() {
        let rows = [row("Connecticut", 0.15, None)];
        assert_error!(
            read_rates_from_iter(rows.into_iter()),
            "Invalid region code 'Connecticut': must be two uppercase letters"
        );
    }

    #[test]
    fn test_read_rates_from_iter_bad_values() {
        assert_error!(
            read_rates_from_iter([row("CT", -0.1, None)].into_iter()),
            "elec_rate must be a finite, non-negative number, got -0.1"
        );
        assert_error!(
            read_rates_from_iter([row("CT", 0.1, Some(f64::NAN))].into_iter()),
            "consumption must be a finite, non-negative number, got NaN"
        );
    }
}
