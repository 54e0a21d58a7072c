//! The module responsible for writing output data to disk.
use crate::economics::{ModelError, ValueProposition};
use crate::market::{MarketSummary, Portfolio};
use crate::parameter::Parameter;
use crate::region::{MarketContext, RegionID, Sector};
use crate::sensitivity::{SensitivityGrid, Sweep};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which study-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "dg_valprop_results";

/// The output file name for sensitivity grid results
const GRID_RESULTS_FILE_NAME: &str = "grid_results.csv";

/// The output file name for market contexts which could not be assessed
const MISSING_ENTRIES_FILE_NAME: &str = "missing_entries.csv";

/// The output file name for market aggregates
const MARKET_SUMMARY_FILE_NAME: &str = "market_summary.csv";

/// Get the output folder for the study in the specified directory
pub fn get_output_dir(study_dir: &Path) -> Result<PathBuf> {
    // canonicalise in case the user has specified "."
    let study_dir = study_dir
        .canonicalize()
        .context("Could not resolve path to study")?;

    let study_name = study_dir
        .file_name()
        .context("Study cannot be in root folder")?
        .to_str()
        .context("Invalid chars in study dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, study_name].iter().collect())
}

/// Create a new output directory, returning whether an existing one was overwritten.
///
/// An existing directory which is not empty is only replaced if `allow_overwrite` is set.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwritten = match fs::read_dir(output_dir) {
        Ok(mut entries) => {
            if entries.next().is_none() {
                return Ok(false);
            }

            ensure!(
                allow_overwrite,
                "Output folder {} already exists and is not empty. Delete the folder or pass the \
                --overwrite option.",
                output_dir.display()
            );
            fs::remove_dir_all(output_dir)?;
            true
        }
        Err(_) => false,
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwritten)
}

/// A row of the grid results CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GridRow {
    region_id: RegionID,
    sector: Sector,
    year: u32,
    first_parameter: Parameter,
    first_value: f64,
    second_parameter: Option<Parameter>,
    second_value: Option<f64>,
    elec_rate: f64,
    gas_rate: f64,
    npv: f64,
    irr: Option<f64>,
    payback_years: Option<u32>,
    lcoe: f64,
    max_market_penetration: f64,
    effective_electric_efficiency: f64,
}

impl GridRow {
    fn new(context: &MarketContext, sweep: &Sweep, values: &[f64], vp: &ValueProposition) -> Self {
        let outputs = &vp.outputs;
        Self {
            region_id: context.region_id.clone(),
            sector: context.sector,
            year: context.year,
            first_parameter: sweep.first().parameter,
            first_value: values[0],
            second_parameter: sweep.second().map(|second| second.parameter),
            second_value: values.get(1).copied(),
            elec_rate: vp.inputs.elec_rate.value(),
            gas_rate: vp.inputs.gas_rate.value(),
            npv: outputs.npv.value(),
            irr: outputs.irr.map(f64::from),
            payback_years: outputs.payback_years,
            lcoe: outputs.lcoe.value(),
            max_market_penetration: outputs.max_market_penetration.0,
            effective_electric_efficiency: outputs.effective_electric_efficiency.0,
        }
    }
}

/// A row of the missing entries CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MissingEntryRow {
    region_id: RegionID,
    sector: Sector,
    year: u32,
    reason: String,
}

/// A row of the market summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MarketSummaryRow {
    sector: Sector,
    year: u32,
    num_regions: usize,
    first_value: f64,
    second_value: Option<f64>,
    total_market_twh: f64,
    addressed_market_twh: f64,
    total_market_penetration: f64,
    primary_energy_savings_twh: f64,
    primary_energy_savings_quads: f64,
}

/// An object for writing study results to CSV files
pub struct DataWriter {
    grid_writer: csv::Writer<File>,
    missing_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            grid_writer: new_writer(GRID_RESULTS_FILE_NAME)?,
            missing_writer: new_writer(MISSING_ENTRIES_FILE_NAME)?,
            summary_writer: new_writer(MARKET_SUMMARY_FILE_NAME)?,
        })
    }

    /// Write every point of a sensitivity grid
    pub fn write_grid(&mut self, grid: &SensitivityGrid) -> Result<()> {
        for point in &grid.points {
            let row = GridRow::new(
                &grid.context,
                &grid.sweep,
                &point.values,
                &point.value_proposition,
            );
            self.grid_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Record a market context which could not be assessed
    pub fn write_missing(&mut self, context: &MarketContext, error: &ModelError) -> Result<()> {
        let row = MissingEntryRow {
            region_id: context.region_id.clone(),
            sector: context.sector,
            year: context.year,
            reason: error.to_string(),
        };
        self.missing_writer.serialize(row)?;

        Ok(())
    }

    /// Write the outcome for every market context of a portfolio
    pub fn write_portfolio(&mut self, portfolio: &Portfolio) -> Result<()> {
        for (context, result) in portfolio.iter() {
            match result {
                Ok(grid) => self.write_grid(grid)?,
                Err(err) => self.write_missing(context, err)?,
            }
        }

        Ok(())
    }

    /// Write market aggregates, one row per grid point
    pub fn write_summary(&mut self, summary: &MarketSummary, sweep: &Sweep) -> Result<()> {
        let first = &sweep.first().values;
        let second = sweep.second().map(|second| &second.values);
        for (sector, year, aggregate) in summary.iter() {
            for (i, first_value) in first.iter().enumerate() {
                let rows = second.map_or(1, Vec::len);
                for j in 0..rows {
                    let row = MarketSummaryRow {
                        sector,
                        year,
                        num_regions: aggregate.regions.len(),
                        first_value: *first_value,
                        second_value: second.map(|values| values[j]),
                        total_market_twh: aggregate.total_market_twh,
                        addressed_market_twh: aggregate.addressed_market_twh[j][i],
                        total_market_penetration: aggregate.total_market_penetration[j][i],
                        primary_energy_savings_twh: aggregate.primary_energy_savings_twh[j][i],
                        primary_energy_savings_quads: aggregate.primary_energy_savings_quads[j]
                            [i],
                    };
                    self.summary_writer.serialize(row)?;
                }
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.grid_writer.flush()?;
        self.missing_writer.flush()?;
        self.summary_writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::EconomicModel;
    use crate::fixture::{market_study, rate_table};
    use crate::market::MarketStudy;
    use crate::rates::RateTable;
    use itertools::Itertools;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::tempdir;

    fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Vec<T> {
        csv::Reader::from_path(path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[rstest]
    fn test_write_portfolio(market_study: MarketStudy, rate_table: RateTable) {
        let portfolio = market_study.run(&EconomicModel::new(&rate_table));
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_portfolio(&portfolio).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<GridRow> = read_rows(&dir.path().join(GRID_RESULTS_FILE_NAME));
        assert_eq!(rows.len(), market_study.sweep.len());
        assert!(rows.iter().all(|row| row.region_id == "CT".into()));
        assert_eq!(rows[0].first_parameter, Parameter::InstalledPrice);
        assert_eq!(rows[0].first_value, 0.5);
        assert_eq!(rows[0].second_value, Some(0.3));
        assert_eq!(rows[1].second_value, Some(0.5));
        assert_eq!(rows[0].elec_rate, 0.15);

        let missing: Vec<MissingEntryRow> = read_rows(&dir.path().join(MISSING_ENTRIES_FILE_NAME));
        assert_eq!(
            missing,
            [MissingEntryRow {
                region_id: "NY".into(),
                sector: Sector::Commercial,
                year: 2015,
                reason: "Data unavailable: No rate data for NY COM 2015".into(),
            }]
        );
    }

    #[rstest]
    fn test_write_summary(market_study: MarketStudy, rate_table: RateTable) {
        let portfolio = market_study.run(&EconomicModel::new(&rate_table));
        let summary =
            MarketSummary::from_portfolio(&portfolio, market_study.grid_baseline_elec_efficiency);
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_summary(&summary, &market_study.sweep).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<MarketSummaryRow> = read_rows(&dir.path().join(MARKET_SUMMARY_FILE_NAME));
        assert_eq!(rows.len(), market_study.sweep.len());
        let aggregate = summary.get(Sector::Commercial, 2015).unwrap();
        for row in &rows {
            assert_eq!(row.num_regions, 1);
            assert_eq!(row.total_market_twh, 20.0);
        }
        assert_eq!(
            rows[1].total_market_penetration,
            aggregate.total_market_penetration[1][0]
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New directory
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Empty directory
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Directory with contents
        {
            let mut file = File::create(output_dir.join("file.txt")).unwrap();
            writeln!(file, "contents").unwrap();
        }
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(output_dir.is_dir());
        assert!(!output_dir.join("file.txt").exists());
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let study_dir = dir.path().join("my_study");
        fs::create_dir(&study_dir).unwrap();
        assert_eq!(
            get_output_dir(&study_dir).unwrap(),
            PathBuf::from(OUTPUT_DIRECTORY_ROOT).join("my_study")
        );
    }
}
