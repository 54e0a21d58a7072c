//! This module defines the unit types used by the economic model and their conversions.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity (efficiencies, utilisations, rates).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

// Prices
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerPower);

// Quantities
unit_struct!(Energy);

/// Hours in a (non-leap) year
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Watts in a kilowatt
pub const WATTS_PER_KILOWATT: f64 = 1000.0;

/// Kilowatt-hours in a million Btu
pub const KWH_PER_MMBTU: f64 = 293.3;

/// Terawatt-hours in a quad (10^15 Btu)
pub const TWH_PER_QUAD: f64 = 293.1;

/// Kilowatt-hours in a terawatt-hour
pub const KWH_PER_TWH: f64 = 1e9;

impl MoneyPerPower {
    /// Spread an installed price over one year's output at the given capacity utilisation.
    ///
    /// The result is the capital outlay per kWh of annual generation.
    pub fn per_annual_energy(self, utilisation: Dimensionless) -> MoneyPerEnergy {
        MoneyPerEnergy(self.0 * WATTS_PER_KILOWATT / HOURS_PER_YEAR / utilisation.0)
    }
}

impl Energy {
    /// The quantity in TWh
    pub fn in_twh(self) -> f64 {
        self.0 / KWH_PER_TWH
    }
}
