//! Colour maps for contour plots.
use plotters::style::RGBColor;

/// Control points of a perceptually uniform blue-to-yellow map
const PARULA: [(f64, (u8, u8, u8)); 11] = [
    (0.0, (53, 42, 135)),
    (0.1, (15, 92, 221)),
    (0.2, (18, 125, 216)),
    (0.3, (7, 156, 207)),
    (0.4, (21, 177, 180)),
    (0.5, (89, 189, 140)),
    (0.6, (165, 190, 107)),
    (0.7, (225, 185, 82)),
    (0.8, (252, 206, 46)),
    (0.9, (245, 227, 28)),
    (1.0, (249, 251, 14)),
];

/// Control points of the classic rainbow map
const JET: [(f64, (u8, u8, u8)); 6] = [
    (0.0, (0, 0, 128)),
    (0.125, (0, 0, 255)),
    (0.375, (0, 255, 255)),
    (0.625, (255, 255, 0)),
    (0.875, (255, 0, 0)),
    (1.0, (128, 0, 0)),
];

/// A colour map for filled contours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Parula,
    Jet,
}

impl Colormap {
    fn control_points(self) -> &'static [(f64, (u8, u8, u8))] {
        match self {
            Self::Parula => &PARULA,
            Self::Jet => &JET,
        }
    }

    /// The colour at position `t` in [0, 1], reversing the map if requested.
    ///
    /// Positions outside the range are clamped.
    pub fn colour_at(self, t: f64, reversed: bool) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        let t = if reversed { 1.0 - t } else { t };
        let points = self.control_points();

        let upper = points
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(points.len() - 1)
            .max(1);
        let (pos0, (r0, g0, b0)) = points[upper - 1];
        let (pos1, (r1, g1, b1)) = points[upper];
        let frac = (t - pos0) / (pos1 - pos0);
        let lerp =
            |a: u8, b: u8| (f64::from(a) + frac * (f64::from(b) - f64::from(a))).round() as u8;

        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// The colour of band `band` out of `num_bands` equal bands
    pub fn band_colour(self, band: usize, num_bands: usize, reversed: bool) -> RGBColor {
        let t = (band as f64 + 0.5) / num_bands.max(1) as f64;
        self.colour_at(t, reversed)
    }
}
