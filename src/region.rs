//! Regions, market sectors and the market context in which a value proposition is assessed.
use crate::id::define_id_type;
use anyhow::{Result, ensure};
use serde_string_enum::{DeserializeStringEnum, SerializeStringEnum};
use std::fmt;
use std::str::FromStr;

define_id_type! {RegionID}

/// A market sector.
///
/// Only the first letter of the label is significant when building data series identifiers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    DeserializeStringEnum,
    SerializeStringEnum,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Sector {
    /// Commercial buildings
    #[strum(serialize = "COM")]
    Commercial,
    /// Residential buildings
    #[strum(serialize = "RES")]
    Residential,
    /// Industrial sites
    #[strum(serialize = "IND")]
    Industrial,
}

impl Sector {
    /// The single-letter code used in data series identifiers
    pub fn letter(self) -> char {
        match self {
            Self::Commercial => 'C',
            Self::Residential => 'R',
            Self::Industrial => 'I',
        }
    }
}

/// Check that a region code is two uppercase ASCII letters (e.g. "CT", or "US" for the whole
/// country)
pub fn check_region_code(code: &str) -> Result<()> {
    ensure!(
        code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase()),
        "Invalid region code '{code}': must be two uppercase letters"
    );

    Ok(())
}

/// The region, sector and year for which a value proposition is assessed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketContext {
    /// Two-letter region code
    pub region_id: RegionID,
    /// Market sector
    pub sector: Sector,
    /// Four-digit year
    pub year: u32,
}

impl MarketContext {
    /// Create a new [`MarketContext`]
    pub fn new(region_id: RegionID, sector: Sector, year: u32) -> Self {
        Self {
            region_id,
            sector,
            year,
        }
    }
}

impl fmt::Display for MarketContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.region_id, self.sector, self.year)
    }
}
