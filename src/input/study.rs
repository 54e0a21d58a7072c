//! Code for loading a study from a directory of input files.
use super::eia::{EIA_DIR_NAME, read_eia_rates};
use super::inflation::{CPI_FILE_NAME, read_inflation_index};
use super::rates::{RATES_FILE_NAME, read_rates};
use super::{deserialise_proportion_nonzero, input_err_msg, is_sorted_and_unique, read_toml};
use crate::economics::{EconomicModel, Metric};
use crate::inflation::InflationIndex;
use crate::market::{DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY, MarketStudy, Portfolio};
use crate::parameter::{Parameter, ParameterSet};
use crate::rates::{RateTable, RealRates};
use crate::region::{RegionID, Sector, check_region_code};
use crate::sensitivity::{Sweep, ValueRange, VariedParameter};
use crate::units::Dimensionless;
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use log::info;
use serde::Deserialize;
use std::path::Path;

/// The name of the study definition file
pub const STUDY_FILE_NAME: &str = "study.toml";

fn default_grid_baseline_elec_efficiency() -> f64 {
    DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY
}

fn default_plot_metrics() -> Vec<Metric> {
    vec![Metric::Npv]
}

/// A varied parameter as written in the study file
#[derive(Debug, PartialEq, Deserialize)]
struct VariedParameterRaw {
    parameter: Parameter,
    #[serde(flatten)]
    range: ValueRange,
}

/// The contents of a study file
#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct StudyFile {
    regions: Vec<RegionID>,
    years: Vec<u32>,
    sectors: Vec<Sector>,
    real_dollar_year: Option<u32>,
    #[serde(
        default = "default_grid_baseline_elec_efficiency",
        deserialize_with = "deserialise_proportion_nonzero"
    )]
    grid_baseline_elec_efficiency: f64,
    heat_recovery_fraction: Option<f64>,
    #[serde(default = "default_plot_metrics")]
    plot_metrics: Vec<Metric>,
    /// Overrides of nominal parameter values
    #[serde(default)]
    baseline: ParameterSet,
    varied: Vec<VariedParameterRaw>,
}

impl StudyFile {
    /// Check the regions, years and sectors of the study
    fn validate(&self) -> Result<()> {
        ensure!(!self.regions.is_empty(), "At least one region must be given");
        for region_id in &self.regions {
            check_region_code(&region_id.0)?;
        }
        ensure!(
            self.regions.iter().all_unique(),
            "Regions must not be repeated"
        );

        ensure!(!self.years.is_empty(), "At least one year must be given");
        ensure!(
            is_sorted_and_unique(&self.years),
            "Years must be unique and in order"
        );

        ensure!(!self.sectors.is_empty(), "At least one sector must be given");
        ensure!(
            self.sectors.iter().all_unique(),
            "Sectors must not be repeated"
        );

        Ok(())
    }

    /// Validate the study, returning its baseline parameters and sweep
    fn check(&self) -> Result<(ParameterSet, Sweep)> {
        self.validate()?;
        Ok((self.baseline()?, self.sweep()?))
    }

    /// The nominal parameter values with the study's overrides applied
    fn baseline(&self) -> Result<ParameterSet> {
        let baseline = ParameterSet::nominal().merged_with(&self.baseline);
        let Some(fraction) = self.heat_recovery_fraction else {
            return Ok(baseline);
        };

        ensure!(
            (0.0..=1.0).contains(&fraction),
            "heat_recovery_fraction must be between 0 and 1, got {fraction}"
        );
        ensure!(
            !self.baseline.contains(Parameter::ThermalEfficiency),
            "heat_recovery_fraction cannot be used with a baseline thermal_efficiency"
        );

        // Recover a share of the heat not converted to electricity
        let elec_efficiency = baseline.get(Parameter::ElectricEfficiency)?;
        Ok(baseline.with_value(
            Parameter::ThermalEfficiency,
            (1.0 - elec_efficiency) * fraction,
        ))
    }

    /// The parameters varied by the study
    fn sweep(&self) -> Result<Sweep> {
        let varied = self
            .varied
            .iter()
            .map(|raw| VariedParameter::new(raw.parameter, raw.range.values()))
            .collect();

        Ok(Sweep::from_varied(varied)?)
    }
}

/// A study ready to run
#[derive(Debug, PartialEq)]
pub struct Study {
    /// Regions, years, sectors and the sensitivity study to run in each
    pub market: MarketStudy,
    /// Energy prices and consumption in nominal dollars
    pub rates: RateTable,
    /// Price index, if the study has one
    pub inflation: Option<InflationIndex>,
    /// If set, prices are converted to dollars of this year
    pub real_dollar_year: Option<u32>,
    /// Metrics to plot for each market context
    pub plot_metrics: Vec<Metric>,
}

impl Study {
    /// Run the market study
    pub fn run(&self) -> Portfolio {
        match (&self.inflation, self.real_dollar_year) {
            (Some(index), Some(year)) => {
                info!("Converting prices to {year} dollars");
                let real = RealRates::new(&self.rates, index, year);
                self.market.run(&EconomicModel::new(&real))
            }
            _ => self.market.run(&EconomicModel::new(&self.rates)),
        }
    }
}

/// Read rate data from a study directory, from either a CSV file or cached EIA series
fn read_study_rates(study_dir: &Path, study_file: &StudyFile) -> Result<RateTable> {
    if study_dir.join(RATES_FILE_NAME).is_file() {
        return read_rates(study_dir);
    }

    let eia_dir = study_dir.join(EIA_DIR_NAME);
    if eia_dir.is_dir() {
        return read_eia_rates(
            &eia_dir,
            &study_file.regions,
            &study_file.sectors,
            &study_file.years,
        );
    }

    bail!(
        "No rate data found in {}: expected a {RATES_FILE_NAME} file or an {EIA_DIR_NAME} \
        directory",
        study_dir.display()
    )
}

/// Load a study from a directory.
///
/// # Arguments
///
/// * `study_dir` - Folder containing the study file and input data
///
/// # Returns
///
/// The validated [`Study`] or an error.
pub fn load_study<P: AsRef<Path>>(study_dir: P) -> Result<Study> {
    let study_dir = study_dir.as_ref();
    let file_path = study_dir.join(STUDY_FILE_NAME);
    let study_file: StudyFile = read_toml(&file_path)?;
    let (baseline, sweep) = study_file
        .check()
        .with_context(|| input_err_msg(&file_path))?;

    let rates = read_study_rates(study_dir, &study_file)?;
    let inflation = read_inflation_index(study_dir)?;
    ensure!(
        study_file.real_dollar_year.is_none() || inflation.is_some(),
        "real_dollar_year is set, but there is no {CPI_FILE_NAME} file in {}",
        study_dir.display()
    );

    let StudyFile {
        regions,
        years,
        sectors,
        real_dollar_year,
        grid_baseline_elec_efficiency,
        plot_metrics,
        ..
    } = study_file;

    Ok(Study {
        market: MarketStudy {
            regions,
            years,
            sectors,
            baseline,
            sweep,
            grid_baseline_elec_efficiency: Dimensionless(grid_baseline_elec_efficiency),
        },
        rates,
        inflation,
        real_dollar_year,
        plot_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::region::MarketContext;
    use float_cmp::assert_approx_eq;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const RATES: &str = "region_id,sector,year,elec_rate,gas_rate,consumption
CT,COM,2015,0.15,0.03,2.0e10";

    const STUDY: &str = r#"regions = ["CT"]
years = [2015]
sectors = ["COM"]

[baseline]
installed_price = 1.5

[[varied]]
parameter = "electric_efficiency"
values = [0.3, 0.4]

[[varied]]
parameter = "installed_price"
start = 0.5
stop = 2.0
num = 4
"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_load_study() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), STUDY_FILE_NAME, STUDY);
        write_file(dir.path(), RATES_FILE_NAME, RATES);

        let study = load_study(dir.path()).unwrap();
        assert_eq!(study.market.regions, vec![RegionID::from("CT")]);
        assert_eq!(study.plot_metrics, vec![Metric::Npv]);
        assert_eq!(study.real_dollar_year, None);
        assert!(study.inflation.is_none());
        assert_eq!(
            study.market.baseline.get(Parameter::InstalledPrice),
            Ok(1.5)
        );
        assert_eq!(
            study.market.grid_baseline_elec_efficiency,
            Dimensionless(0.34)
        );

        let Sweep::Two(first, second) = &study.market.sweep else {
            panic!("Expected two varied parameters");
        };
        assert_eq!(first.parameter, Parameter::ElectricEfficiency);
        assert_eq!(second.values, vec![0.5, 1.0, 1.5, 2.0]);

        let portfolio = study.run();
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio.grids().next().unwrap().points.len(), 8);
    }

    #[test]
    fn test_load_study_real_dollars() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            STUDY_FILE_NAME,
            &format!("real_dollar_year = 2020\n{STUDY}"),
        );
        write_file(dir.path(), RATES_FILE_NAME, RATES);

        // Price index is required
        assert!(load_study(dir.path()).is_err());

        write_file(dir.path(), CPI_FILE_NAME, "year,index\n2015,1.0\n2020,2.0");
        let study = load_study(dir.path()).unwrap();
        let portfolio = study.run();
        let context = MarketContext::new("CT".into(), Sector::Commercial, 2015);
        let grid = portfolio.get(&context).unwrap().as_ref().unwrap();
        assert_approx_eq!(f64, grid.rates.elec_rate.value(), 0.30);
    }

    #[test]
    fn test_load_study_no_rates() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), STUDY_FILE_NAME, STUDY);
        assert!(load_study(dir.path()).is_err());
    }

    #[test]
    fn test_load_study_unknown_field() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), STUDY_FILE_NAME, &format!("colour = \"red\"\n{STUDY}"));
        write_file(dir.path(), RATES_FILE_NAME, RATES);
        assert!(load_study(dir.path()).is_err());
    }

    fn study_file() -> StudyFile {
        StudyFile {
            regions: vec!["CT".into()],
            years: vec![2015],
            sectors: vec![Sector::Commercial],
            real_dollar_year: None,
            grid_baseline_elec_efficiency: DEFAULT_GRID_BASELINE_ELEC_EFFICIENCY,
            heat_recovery_fraction: None,
            plot_metrics: default_plot_metrics(),
            baseline: ParameterSet::default(),
            varied: vec![VariedParameterRaw {
                parameter: Parameter::InstalledPrice,
                range: ValueRange::Values {
                    values: vec![1.0, 2.0],
                },
            }],
        }
    }

    #[test]
    fn test_validate() {
        assert!(study_file().validate().is_ok());

        let file = StudyFile {
            regions: vec![],
            ..study_file()
        };
        assert_error!(file.validate(), "At least one region must be given");

        let file = StudyFile {
            regions: vec!["CT".into(), "CT".into()],
            ..study_file()
        };
        assert_error!(file.validate(), "Regions must not be repeated");

        let file = StudyFile {
            years: vec![2016, 2015],
            ..study_file()
        };
        assert_error!(file.validate(), "Years must be unique and in order");

        let file = StudyFile {
            sectors: vec![Sector::Commercial, Sector::Commercial],
            ..study_file()
        };
        assert_error!(file.validate(), "Sectors must not be repeated");

        let file = StudyFile {
            regions: vec!["ct".into()],
            ..study_file()
        };
        assert_error!(
            file.validate(),
            "Invalid region code 'ct': must be two uppercase letters"
        );
    }

    #[test]
    fn test_baseline_heat_recovery() {
        let file = StudyFile {
            heat_recovery_fraction: Some(0.5),
            baseline: [(Parameter::ElectricEfficiency, 0.3)].into_iter().collect(),
            ..study_file()
        };
        let baseline = file.baseline().unwrap();
        assert_approx_eq!(
            f64,
            baseline.get(Parameter::ThermalEfficiency).unwrap(),
            0.35
        );

        let file = StudyFile {
            heat_recovery_fraction: Some(0.5),
            baseline: [(Parameter::ThermalEfficiency, 0.3)].into_iter().collect(),
            ..study_file()
        };
        assert_error!(
            file.baseline(),
            "heat_recovery_fraction cannot be used with a baseline thermal_efficiency"
        );

        let file = StudyFile {
            heat_recovery_fraction: Some(1.5),
            ..study_file()
        };
        assert_error!(
            file.baseline(),
            "heat_recovery_fraction must be between 0 and 1, got 1.5"
        );
    }

    #[test]
    fn test_sweep_too_many_parameters() {
        let raw = || VariedParameterRaw {
            parameter: Parameter::Lifetime,
            range: ValueRange::Values { values: vec![10.0] },
        };
        let file = StudyFile {
            varied: vec![raw(), raw(), raw()],
            ..study_file()
        };
        assert_error!(
            file.sweep(),
            "Configuration error: A sensitivity study varies one or two parameters, but 3 \
            were given"
        );
    }
}
