//! Running a loaded study and writing its results.
use crate::input::study::Study;
use crate::market::{MarketSummary, Portfolio};
use crate::output::DataWriter;
use crate::plot::{market_contour_plot, plot_grid};
use crate::sensitivity::Sweep;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// The name of the folder for plots within the output folder
const PLOTS_DIR_NAME: &str = "plots";

/// Run a study, saving results to `output_path`.
///
/// # Arguments
///
/// * `study` - The study to run
/// * `output_path` - Folder in which to save results
/// * `draw_plots` - Whether to draw plots of the results
pub fn run(study: &Study, output_path: &Path, draw_plots: bool) -> Result<()> {
    let portfolio = study.run();
    let num_failed = portfolio.failures().count();
    info!(
        "Assessed {} of {} market contexts",
        portfolio.len() - num_failed,
        portfolio.len()
    );

    let summary =
        MarketSummary::from_portfolio(&portfolio, study.market.grid_baseline_elec_efficiency);

    let mut writer = DataWriter::create(output_path)?;
    writer.write_portfolio(&portfolio)?;
    writer.write_summary(&summary, &study.market.sweep)?;
    writer.flush()?;

    if draw_plots {
        plot_results(study, &portfolio, &summary, &output_path.join(PLOTS_DIR_NAME))?;
    }

    Ok(())
}

/// Draw plots for every assessed market context and every market aggregate.
///
/// A plot which cannot be drawn (e.g. because a metric is undefined everywhere) is skipped with a
/// warning.
fn plot_results(
    study: &Study,
    portfolio: &Portfolio,
    summary: &MarketSummary,
    plots_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(plots_dir)
        .with_context(|| format!("Failed to create directory: {}", plots_dir.display()))?;

    for grid in portfolio.grids() {
        for metric in &study.plot_metrics {
            if let Err(err) = plot_grid(grid, *metric, plots_dir) {
                warn!("{err:#}");
            }
        }
    }

    if let Sweep::Two(..) = study.market.sweep {
        for (sector, year, aggregate) in summary.iter() {
            let path = plots_dir.join(format!("market_penetration_{sector}_{year}.svg"));
            if let Err(err) =
                market_contour_plot(aggregate, &study.market.sweep, sector, year, &path)
            {
                warn!("{err:#}");
            }
        }
    }
    info!("Plots saved to {}", plots_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::Metric;
    use crate::fixture::{market_study, rate_table};
    use crate::market::MarketStudy;
    use crate::rates::RateTable;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_run(market_study: MarketStudy, rate_table: RateTable) {
        let study = Study {
            market: market_study,
            rates: rate_table,
            inflation: None,
            real_dollar_year: None,
            plot_metrics: vec![Metric::Npv, Metric::Payback],
        };
        let dir = tempdir().unwrap();
        run(&study, dir.path(), true).unwrap();

        for file_name in ["grid_results.csv", "missing_entries.csv", "market_summary.csv"] {
            assert!(dir.path().join(file_name).is_file());
        }
        let plots_dir = dir.path().join(PLOTS_DIR_NAME);
        assert!(plots_dir.join("npv_CT_COM_2015.svg").is_file());
        assert!(plots_dir.join("market_penetration_COM_2015.svg").is_file());

        // No plots for the context without data
        assert!(!plots_dir.join("npv_NY_COM_2015.svg").exists());
    }

    #[rstest]
    fn test_run_without_plots(market_study: MarketStudy, rate_table: RateTable) {
        let study = Study {
            market: market_study,
            rates: rate_table,
            inflation: None,
            real_dollar_year: None,
            plot_metrics: vec![Metric::Npv],
        };
        let dir = tempdir().unwrap();
        run(&study, dir.path(), false).unwrap();
        assert!(!dir.path().join(PLOTS_DIR_NAME).exists());
    }
}
