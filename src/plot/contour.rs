//! Geometry for contour plots: contour levels, filled bands and isolines.
//!
//! Surfaces are indexed `z[j][i]`, where `i` indexes the x axis and `j` the y axis. Undefined
//! values are NaN; cells touching them are left out.
use crate::economics::Metric;
use crate::sensitivity::linspace;
use anyhow::{Result, bail, ensure};

/// Number of levels for metrics without a natural scale
const NUM_LEVELS: usize = 21;

/// A line segment between two points in data coordinates
pub type Segment = [(f64, f64); 2];

/// A rectangle in data coordinates filled with the colour of one contour band
#[derive(Debug, Clone, PartialEq)]
pub struct FilledCell {
    /// Left and right edges
    pub x: (f64, f64),
    /// Bottom and top edges
    pub y: (f64, f64),
    /// Index of the contour band, counted from the lowest level
    pub band: usize,
}

/// Check that axis values are strictly increasing
pub fn check_axis(name: &str, values: &[f64]) -> Result<()> {
    ensure!(
        values.len() >= 2,
        "Contour plots need at least two values of {name}"
    );
    ensure!(
        values.windows(2).all(|pair| pair[0] < pair[1]),
        "Values of {name} must be strictly increasing for a contour plot"
    );

    Ok(())
}

/// The smallest and largest finite values of a surface, if there are any
pub fn finite_range(z: &[Vec<f64>]) -> Option<(f64, f64)> {
    z.iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
        })
}

/// Contour levels for a metric.
///
/// Payback uses whole years up to the smaller of the largest payback and `lifetime`. Bounded
/// metrics use their natural range. Otherwise levels span the values of the surface.
pub fn levels(metric: Metric, z: &[Vec<f64>], lifetime: u32) -> Result<Vec<f64>> {
    if let Some((lo, hi)) = metric.fixed_range() {
        return Ok(linspace(lo, hi, NUM_LEVELS));
    }

    let Some((lo, hi)) = finite_range(z) else {
        bail!("No finite values of {metric} to plot");
    };

    if metric == Metric::Payback {
        let top = hi.min(f64::from(lifetime)).ceil().max(1.0) as u32;
        return Ok((0..=top).map(f64::from).collect());
    }

    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return Ok(linspace(lo - pad, hi + pad, NUM_LEVELS));
    }

    Ok(linspace(lo, hi, NUM_LEVELS))
}

/// The band into which a value falls, clamping values outside the levels
pub fn band_index(value: f64, levels: &[f64]) -> Option<usize> {
    if value.is_nan() || levels.len() < 2 {
        return None;
    }

    let num_bands = levels.len() - 1;
    let band = levels[1..num_bands]
        .iter()
        .take_while(|level| value >= **level)
        .count();
    Some(band)
}

/// The four corner values of cell `(i, j)`: bottom left, bottom right, top right, top left
fn corners(z: &[Vec<f64>], i: usize, j: usize) -> Option<[f64; 4]> {
    let values = [z[j][i], z[j][i + 1], z[j + 1][i + 1], z[j + 1][i]];
    values.iter().all(|value| value.is_finite()).then_some(values)
}

/// Fill each grid cell with `subdivisions` × `subdivisions` rectangles coloured by the band of
/// the bilinearly interpolated surface at their centre
pub fn filled_cells(
    x: &[f64],
    y: &[f64],
    z: &[Vec<f64>],
    levels: &[f64],
    subdivisions: usize,
) -> Vec<FilledCell> {
    let mut cells = Vec::new();
    let step = 1.0 / subdivisions as f64;
    for j in 0..y.len().saturating_sub(1) {
        for i in 0..x.len().saturating_sub(1) {
            let Some([bl, br, tr, tl]) = corners(z, i, j) else {
                continue;
            };

            for sj in 0..subdivisions {
                for si in 0..subdivisions {
                    let u = (si as f64 + 0.5) * step;
                    let v = (sj as f64 + 0.5) * step;
                    let value = bl * (1.0 - u) * (1.0 - v)
                        + br * u * (1.0 - v)
                        + tr * u * v
                        + tl * (1.0 - u) * v;
                    let Some(band) = band_index(value, levels) else {
                        continue;
                    };

                    let dx = x[i + 1] - x[i];
                    let dy = y[j + 1] - y[j];
                    cells.push(FilledCell {
                        x: (
                            x[i] + dx * si as f64 * step,
                            x[i] + dx * (si + 1) as f64 * step,
                        ),
                        y: (
                            y[j] + dy * sj as f64 * step,
                            y[j] + dy * (sj + 1) as f64 * step,
                        ),
                        band,
                    });
                }
            }
        }
    }

    cells
}

/// Isoline segments at `level`, by marching squares
pub fn isolines(x: &[f64], y: &[f64], z: &[Vec<f64>], level: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    for j in 0..y.len().saturating_sub(1) {
        for i in 0..x.len().saturating_sub(1) {
            let Some(values) = corners(z, i, j) else {
                continue;
            };
            let positions = [
                (x[i], y[j]),
                (x[i + 1], y[j]),
                (x[i + 1], y[j + 1]),
                (x[i], y[j + 1]),
            ];
            let above = values.map(|value| value >= level);

            // Crossing points on the bottom, right, top and left edges
            let crossings: [Option<(f64, f64)>; 4] = std::array::from_fn(|edge| {
                let (a, b) = (edge, (edge + 1) % 4);
                if above[a] == above[b] {
                    return None;
                }
                let t = (level - values[a]) / (values[b] - values[a]);
                let (xa, ya) = positions[a];
                let (xb, yb) = positions[b];
                Some((xa + t * (xb - xa), ya + t * (yb - ya)))
            });

            match crossings {
                [Some(p), Some(q), None, None]
                | [Some(p), None, Some(q), None]
                | [Some(p), None, None, Some(q)]
                | [None, Some(p), Some(q), None]
                | [None, Some(p), None, Some(q)]
                | [None, None, Some(p), Some(q)] => segments.push([p, q]),
                [Some(bottom), Some(right), Some(top), Some(left)] => {
                    // Saddle: resolve using the value at the centre of the cell
                    let centre_above = values.iter().sum::<f64>() / 4.0 >= level;
                    if centre_above == above[0] {
                        segments.push([bottom, right]);
                        segments.push([top, left]);
                    } else {
                        segments.push([left, bottom]);
                        segments.push([right, top]);
                    }
                }
                _ => {}
            }
        }
    }

    segments
}
