//! Line and contour plots of sensitivity and market studies, rendered as SVG.
use crate::chp::catalogue_points;
use crate::economics::Metric;
use crate::market::MarketAggregate;
use crate::parameter::Parameter;
use crate::region::Sector;
use crate::sensitivity::{SensitivityGrid, Sweep};
use anyhow::{Context, Result, bail};
use colour::Colormap;
use contour::{check_axis, filled_cells, finite_range, isolines, levels};
use plotters::prelude::*;
use std::mem;
use std::path::{Path, PathBuf};

pub mod colour;
pub mod contour;

/// Size of rendered plots in pixels
const PLOT_SIZE: (u32, u32) = (900, 640);

/// Width of the plotting area of contour plots; the remainder holds the colour bar
const CONTOUR_AREA_WIDTH: u32 = 760;

/// Number of rectangles per grid cell edge when filling contours
const FILL_SUBDIVISIONS: usize = 8;

/// Highlighted market penetration isoline
const MARKET_PENETRATION_CONTOUR: f64 = 0.5;

/// Highlighted primary energy savings isoline (quads)
const PRIMARY_SAVINGS_CONTOUR: f64 = 1.0;

/// An isoline drawn on top of a contour plot
struct Highlight<'a> {
    z: &'a [Vec<f64>],
    level: f64,
    colour: RGBColor,
    label: String,
}

/// The colour map for a metric and whether it is reversed
fn colormap_for(metric: Metric) -> (Colormap, bool) {
    match metric {
        Metric::MaxMarketPenetration | Metric::EffectiveElectricEfficiency => {
            (Colormap::Jet, false)
        }
        _ => (Colormap::Parula, metric.lower_is_better()),
    }
}

/// Split a series into runs of finite values
fn finite_runs(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();
    for (x, y) in points {
        if y.is_finite() {
            run.push((x, y));
        } else if !run.is_empty() {
            runs.push(mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }

    runs
}

/// Widen a range slightly so that points on its edges are visible
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// File name for a plot of a metric for a sensitivity grid
pub fn plot_file_name(grid: &SensitivityGrid, metric: Metric) -> String {
    let context = &grid.context;
    format!(
        "{metric}_{}_{}_{}.svg",
        context.region_id, context.sector, context.year
    )
}

/// Plot a metric of a sensitivity grid in `output_dir`, returning the path of the new file.
///
/// Two-parameter grids are drawn as contour plots, one-parameter grids as line plots.
pub fn plot_grid(grid: &SensitivityGrid, metric: Metric, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(plot_file_name(grid, metric));
    match grid.sweep {
        Sweep::One(_) => line_plot(grid, metric, &path),
        Sweep::Two(..) => contour_plot(grid, metric, &path),
    }
    .with_context(|| format!("Could not plot {metric} for {}", grid.context))?;

    Ok(path)
}

/// Draw a line plot of a metric against the first varied parameter.
///
/// For a two-parameter grid there is one line per value of the second parameter.
pub fn line_plot(grid: &SensitivityGrid, metric: Metric, path: &Path) -> Result<()> {
    let first = grid.sweep.first();
    let surface = grid.surface(metric);
    let Some((y_lo, y_hi)) = finite_range(&surface) else {
        bail!("No finite values of {metric} to plot");
    };
    let (x_lo, x_hi) = first
        .values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(*x), hi.max(*x))
        });
    let (x_lo, x_hi) = padded(x_lo, x_hi);
    let (y_lo, y_hi) = padded(y_lo, y_hi);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(grid.context.to_string(), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc(first.parameter.pretty_label())
        .y_desc(metric.pretty_label())
        .draw()?;

    for (j, row) in surface.iter().enumerate() {
        let colour = Palette99::pick(j).to_rgba();
        let points = first.values.iter().copied().zip(row.iter().copied());
        for (k, run) in finite_runs(points).into_iter().enumerate() {
            let series = chart.draw_series(LineSeries::new(run, colour.stroke_width(2)))?;
            if k > 0 {
                continue;
            }
            if let Some(second) = grid.sweep.second() {
                series
                    .label(format!("{} = {}", second.parameter, second.values[j]))
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(2))
                    });
            }
        }
    }

    if grid.sweep.second().is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;

    Ok(())
}

/// Draw a filled contour plot of a metric over a two-parameter grid
pub fn contour_plot(grid: &SensitivityGrid, metric: Metric, path: &Path) -> Result<()> {
    let Sweep::Two(first, second) = &grid.sweep else {
        bail!("Contour plots need two varied parameters");
    };

    let z = grid.surface(metric);
    let lifetime = grid.points[0].value_proposition.inputs.lifetime;
    let levels = levels(metric, &z, lifetime)?;
    let (colormap, reversed) = colormap_for(metric);
    let title = format!("{}: {}", metric.pretty_label(), grid.context);

    draw_contour(
        path,
        &title,
        (first.parameter, first.values.as_slice()),
        (second.parameter, second.values.as_slice()),
        &z,
        &levels,
        colormap,
        reversed,
        &[],
    )
}

/// Draw the total market penetration of a market aggregate as a contour plot.
///
/// The 1-quad primary energy savings and 50% penetration isolines are highlighted.
pub fn market_contour_plot(
    aggregate: &MarketAggregate,
    sweep: &Sweep,
    sector: Sector,
    year: u32,
    path: &Path,
) -> Result<()> {
    let Sweep::Two(first, second) = sweep else {
        bail!("Contour plots need two varied parameters");
    };

    let metric = Metric::MaxMarketPenetration;
    let levels = levels(metric, &aggregate.total_market_penetration, 0)?;
    let title = format!("Total Market Penetration: {sector} {year}");
    let highlights = [
        Highlight {
            z: &aggregate.primary_energy_savings_quads,
            level: PRIMARY_SAVINGS_CONTOUR,
            colour: WHITE,
            label: "1 quad/yr primary energy savings".into(),
        },
        Highlight {
            z: &aggregate.total_market_penetration,
            level: MARKET_PENETRATION_CONTOUR,
            colour: RED,
            label: "50% market penetration".into(),
        },
    ];

    draw_contour(
        path,
        &title,
        (first.parameter, first.values.as_slice()),
        (second.parameter, second.values.as_slice()),
        &aggregate.total_market_penetration,
        &levels,
        Colormap::Jet,
        false,
        &highlights,
    )
    .with_context(|| format!("Could not plot market penetration for {sector} {year}"))
}

/// Draw a filled contour plot with isolines at every level, a colour bar, any highlighted
/// isolines and, where the axes allow, the catalogued CHP systems
#[allow(clippy::too_many_arguments)]
fn draw_contour(
    path: &Path,
    title: &str,
    (x_param, x): (Parameter, &[f64]),
    (y_param, y): (Parameter, &[f64]),
    z: &[Vec<f64>],
    levels: &[f64],
    colormap: Colormap,
    reversed: bool,
    highlights: &[Highlight],
) -> Result<()> {
    check_axis(&x_param.to_string(), x)?;
    check_axis(&y_param.to_string(), y)?;
    let num_bands = levels.len() - 1;

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (main, bar) = root.split_horizontally(CONTOUR_AREA_WIDTH);

    let mut chart = ChartBuilder::on(&main)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x[0]..x[x.len() - 1], y[0]..y[y.len() - 1])?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(x_param.pretty_label())
        .y_desc(y_param.pretty_label())
        .draw()?;

    chart.draw_series(
        filled_cells(x, y, z, levels, FILL_SUBDIVISIONS)
            .into_iter()
            .map(|cell| {
                let colour = colormap.band_colour(cell.band, num_bands, reversed);
                Rectangle::new([(cell.x.0, cell.y.0), (cell.x.1, cell.y.1)], colour.filled())
            }),
    )?;
    for level in levels {
        let style = BLACK.stroke_width(1);
        chart.draw_series(
            isolines(x, y, z, *level)
                .into_iter()
                .map(move |[p, q]| PathElement::new(vec![p, q], style)),
        )?;
    }

    let mut has_legend = false;
    for highlight in highlights {
        let style = highlight.colour.stroke_width(3);
        let segments = isolines(x, y, highlight.z, highlight.level);
        chart
            .draw_series(
                segments
                    .into_iter()
                    .map(move |[p, q]| PathElement::new(vec![p, q], style)),
            )?
            .label(highlight.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        has_legend = true;
    }

    if let Some(technologies) = catalogue_points(x_param, y_param) {
        for (idx, (technology, points)) in technologies.into_iter().enumerate() {
            let colour = Palette99::pick(idx + 1).to_rgba();
            chart
                .draw_series(
                    points
                        .into_iter()
                        .map(move |point| Circle::new(point, 5, colour.filled())),
                )?
                .label(technology.to_string())
                .legend(move |(x, y)| Circle::new((x + 10, y), 5, colour.filled()));
        }
        has_legend = true;
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    // Colour bar
    let mut bar_chart = ChartBuilder::on(&bar)
        .margin_top(50)
        .margin_bottom(60)
        .margin_right(10)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, levels[0]..levels[num_bands])?;
    bar_chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(11)
        .y_label_formatter(&|value| format!("{value:.2}"))
        .draw()?;
    bar_chart.draw_series(levels.windows(2).enumerate().map(|(band, pair)| {
        let colour = colormap.band_colour(band, num_bands, reversed);
        Rectangle::new([(0.0, pair[0]), (1.0, pair[1])], colour.filled())
    }))?;
    root.present()?;

    Ok(())
}
