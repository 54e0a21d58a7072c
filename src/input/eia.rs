//! Code for reading rate data from cached series of the EIA State Energy Data System (SEDS).
//!
//! Each series is stored as the JSON response of the EIA series API in a file named after the
//! series ID (e.g. `SEDS.ESCCD.CT.A.json`).
use super::input_err_msg;
use crate::rates::{MarketRates, RateTable};
use crate::region::{RegionID, Sector};
use crate::units::{Energy, KWH_PER_MMBTU, MoneyPerEnergy};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The name of the directory holding cached EIA series in a study directory
pub const EIA_DIR_NAME: &str = "eia";

/// The kinds of series read for each region and sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesKind {
    /// Average electricity price
    ElecRate,
    /// Average natural gas price
    GasRate,
    /// Total electricity consumption
    ElecConsumption,
}

impl SeriesKind {
    /// The ID of the series for a region and sector
    fn series_id(self, region_id: &RegionID, sector: Sector) -> String {
        let (source, measure) = match self {
            Self::ElecRate => ("ES", "CD"),
            Self::GasRate => ("NG", "CD"),
            Self::ElecConsumption => ("ES", "CP"),
        };
        format!("SEDS.{source}{}{measure}.{region_id}.A", sector.letter())
    }
}

/// A response from the series API
#[derive(Debug, Deserialize)]
struct SeriesResponse {
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    series_id: String,
    units: String,
    /// Pairs of year and value. Missing values are null.
    data: Vec<(String, Option<f64>)>,
}

/// Annual values of a series in standard units ($/kWh or kWh), keyed by year
type AnnualData = IndexMap<u32, f64>;

/// The factor converting values in the given units to $/kWh or kWh
fn unit_factor(units: &str) -> Result<f64> {
    let factor = match units.to_ascii_lowercase().as_str() {
        "dollars per million btu" => 1.0 / KWH_PER_MMBTU,
        "million kilowatthours" | "thousand megawatthours" => 1e6,
        "kwh" | "dollar per kilowatthour" | "$/kwh" => 1.0,
        _ => bail!("Unsupported units: {units}"),
    };

    Ok(factor)
}

/// Parse a series response, converting values to standard units and skipping missing values
fn parse_series(json: &str, series_id: &str) -> Result<AnnualData> {
    let response: SeriesResponse = serde_json::from_str(json)?;
    let Some(series) = response.series.into_iter().next() else {
        bail!("No data for series {series_id}");
    };
    ensure!(
        series.series_id == series_id,
        "Expected series {series_id}, but found {}",
        series.series_id
    );

    let factor = unit_factor(&series.units)?;
    let mut data = AnnualData::new();
    for (year, value) in series.data {
        let year: u32 = year
            .parse()
            .with_context(|| format!("Invalid year '{year}' in series {series_id}"))?;
        if let Some(value) = value {
            data.insert(year, value * factor);
        }
    }

    Ok(data)
}

/// Read a cached series, returning `None` if there is no file for it
fn read_series(eia_dir: &Path, series_id: &str) -> Result<Option<AnnualData>> {
    let file_path = eia_dir.join(format!("{series_id}.json"));
    if !file_path.is_file() {
        return Ok(None);
    }

    let json = fs::read_to_string(&file_path).with_context(|| input_err_msg(&file_path))?;
    let data = parse_series(&json, series_id).with_context(|| input_err_msg(&file_path))?;

    Ok(Some(data))
}

/// Read rate data for the given regions, sectors and years from cached EIA series.
///
/// Regions and sectors for which a price series file is missing are left out of the table, as
/// are years for which either price is unavailable. Consumption is optional: without a
/// consumption series, rates are recorded with no consumption.
pub fn read_eia_rates(
    eia_dir: &Path,
    regions: &[RegionID],
    sectors: &[Sector],
    years: &[u32],
) -> Result<RateTable> {
    let mut table = RateTable::default();
    for region_id in regions {
        for sector in sectors {
            let mut prices = Vec::new();
            for kind in [SeriesKind::ElecRate, SeriesKind::GasRate] {
                let series_id = kind.series_id(region_id, *sector);
                match read_series(eia_dir, &series_id)? {
                    Some(data) => prices.push(data),
                    None => {
                        warn!(
                            "No cached data for series {series_id}: skipping {region_id} {sector}"
                        );
                        break;
                    }
                }
            }
            let [elec_rates, gas_rates] = prices.as_slice() else {
                continue;
            };

            let consumption_id = SeriesKind::ElecConsumption.series_id(region_id, *sector);
            let consumption = read_series(eia_dir, &consumption_id)?;
            if consumption.is_none() {
                debug!("No cached data for series {consumption_id}: consumption unknown");
            }

            for year in years {
                let (Some(elec_rate), Some(gas_rate)) = (elec_rates.get(year), gas_rates.get(year))
                else {
                    debug!("No price data for {region_id} {sector} {year}");
                    continue;
                };
                let rates = MarketRates {
                    elec_rate: MoneyPerEnergy(*elec_rate),
                    gas_rate: MoneyPerEnergy(*gas_rate),
                    consumption: consumption
                        .as_ref()
                        .and_then(|data| data.get(year))
                        .copied()
                        .map(Energy),
                };
                table.insert(region_id.clone(), *sector, *year, rates);
            }
        }
    }

    Ok(table)
}
