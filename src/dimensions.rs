//! Dimensional analysis types
//!
//! Each physical quantity has dimensions represented as a 10-element
//! exponent vector over the configured base dimensions:
//! [mass, length, time, temperature, temperature difference, angle,
//! chemical amount, light, current, solid angle].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of base dimensions.
pub const DIMENSION_COUNT: usize = 10;

/// The base dimensions, in configuration order.
///
/// Temperature and temperature difference are distinct axes: an absolute
/// temperature carries an offset relative to SI while a difference only
/// carries a scale. Angle and solid angle are supplementary axes whose
/// contribution can be switched off at table construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseDimension {
    Mass,
    Length,
    Time,
    Temperature,
    TemperatureDifference,
    Angle,
    ChemicalAmount,
    Light,
    Current,
    SolidAngle,
}

impl BaseDimension {
    /// All base dimensions, in vector order.
    pub const ALL: [BaseDimension; DIMENSION_COUNT] = [
        BaseDimension::Mass,
        BaseDimension::Length,
        BaseDimension::Time,
        BaseDimension::Temperature,
        BaseDimension::TemperatureDifference,
        BaseDimension::Angle,
        BaseDimension::ChemicalAmount,
        BaseDimension::Light,
        BaseDimension::Current,
        BaseDimension::SolidAngle,
    ];

    /// Index of this dimension within the exponent vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration name, as used by `unit_systems` entries.
    pub fn name(self) -> &'static str {
        match self {
            BaseDimension::Mass => "MASS",
            BaseDimension::Length => "LENGTH",
            BaseDimension::Time => "TIME",
            BaseDimension::Temperature => "TEMPERATURE",
            BaseDimension::TemperatureDifference => "TEMPERATURE_DIFFERENCE",
            BaseDimension::Angle => "ANGLE",
            BaseDimension::ChemicalAmount => "CHEMICAL_AMOUNT",
            BaseDimension::Light => "LIGHT",
            BaseDimension::Current => "CURRENT",
            BaseDimension::SolidAngle => "SOLID_ANGLE",
        }
    }
}

impl fmt::Display for BaseDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exponent vector over the base dimensions.
///
/// Exponents are `f64` because fractional powers are legal unit algebra
/// (`"m^-1.5"`). Two units are dimensionally compatible iff their vectors
/// are equal; see [`Dimensions::convertible_to`] for the one sanctioned
/// relaxation of that rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    exponents: [f64; DIMENSION_COUNT],
}

impl Dimensions {
    /// Dimensionless: all exponents zero.
    pub const NONE: Dimensions = Dimensions {
        exponents: [0.0; DIMENSION_COUNT],
    };

    /// Create a dimension vector from raw exponents.
    pub fn new(exponents: [f64; DIMENSION_COUNT]) -> Self {
        Dimensions { exponents }
    }

    /// A single base dimension raised to `exponent`.
    pub fn base(dimension: BaseDimension, exponent: f64) -> Self {
        let mut exponents = [0.0; DIMENSION_COUNT];
        exponents[dimension.index()] = exponent;
        Dimensions { exponents }
    }

    /// Exponent of one base dimension.
    pub fn exponent(&self, dimension: BaseDimension) -> f64 {
        self.exponents[dimension.index()]
    }

    /// Iterate over (dimension, exponent) pairs with nonzero exponents.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (BaseDimension, f64)> + '_ {
        BaseDimension::ALL
            .iter()
            .map(|&d| (d, self.exponents[d.index()]))
            .filter(|&(_, e)| e != 0.0)
    }

    /// True when every exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|&e| e == 0.0)
    }

    /// Multiply dimensions (add exponents).
    pub fn mul(&self, other: &Dimensions) -> Dimensions {
        let mut exponents = self.exponents;
        for i in 0..DIMENSION_COUNT {
            exponents[i] += other.exponents[i];
        }
        Dimensions { exponents }
    }

    /// Divide dimensions (subtract exponents).
    pub fn div(&self, other: &Dimensions) -> Dimensions {
        let mut exponents = self.exponents;
        for i in 0..DIMENSION_COUNT {
            exponents[i] -= other.exponents[i];
        }
        Dimensions { exponents }
    }

    /// Raise to a power (scale exponents).
    pub fn pow(&self, exponent: f64) -> Dimensions {
        let mut exponents = self.exponents;
        for e in &mut exponents {
            *e *= exponent;
        }
        Dimensions { exponents }
    }

    /// Lenient compatibility used by the conversion engine.
    ///
    /// A temperature exponent may cancel against an equal
    /// temperature-difference exponent, so `K` converts to `delta_C`
    /// while remaining unequal to it under strict comparison.
    pub fn convertible_to(&self, other: &Dimensions) -> bool {
        let mut diff = self.div(other);
        let t = diff.exponents[BaseDimension::Temperature.index()];
        let dt = diff.exponents[BaseDimension::TemperatureDifference.index()];
        if t != 0.0 && t == -dt {
            diff.exponents[BaseDimension::Temperature.index()] = 0.0;
            diff.exponents[BaseDimension::TemperatureDifference.index()] = 0.0;
        }
        diff.is_dimensionless()
    }

    /// Bit-level view of the exponents, for hashing consistently with
    /// equality.
    pub(crate) fn to_bits(&self) -> [u64; DIMENSION_COUNT] {
        let mut bits = [0u64; DIMENSION_COUNT];
        for (b, e) in bits.iter_mut().zip(self.exponents.iter()) {
            *b = e.to_bits();
        }
        bits
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (dimension, exponent) in self.iter_nonzero() {
            if exponent == 1.0 {
                parts.push(dimension.name().to_string());
            } else {
                parts.push(format!("{}^{}", dimension.name(), exponent));
            }
        }
        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensionless() {
        assert!(Dimensions::NONE.is_dimensionless());
        assert!(!Dimensions::base(BaseDimension::Length, 1.0).is_dimensionless());
    }

    #[test]
    fn velocity_from_length_and_time() {
        let length = Dimensions::base(BaseDimension::Length, 1.0);
        let time = Dimensions::base(BaseDimension::Time, 1.0);
        let velocity = length.div(&time);
        assert_eq!(velocity.exponent(BaseDimension::Length), 1.0);
        assert_eq!(velocity.exponent(BaseDimension::Time), -1.0);
    }

    #[test]
    fn power_scales_exponents() {
        let area = Dimensions::base(BaseDimension::Length, 1.0).pow(2.0);
        assert_eq!(area, Dimensions::base(BaseDimension::Length, 2.0));
        assert_eq!(area.pow(0.0), Dimensions::NONE);
    }

    #[test]
    fn fractional_exponents() {
        let d = Dimensions::base(BaseDimension::Length, 1.0).pow(2.5);
        assert_eq!(d.exponent(BaseDimension::Length), 2.5);
    }

    #[test]
    fn temperature_cancels_against_difference() {
        let temp = Dimensions::base(BaseDimension::Temperature, 1.0);
        let delta = Dimensions::base(BaseDimension::TemperatureDifference, 1.0);
        assert_ne!(temp, delta);
        assert!(temp.convertible_to(&delta));
        assert!(delta.convertible_to(&temp));

        let mass = Dimensions::base(BaseDimension::Mass, 1.0);
        assert!(!temp.convertible_to(&mass));
        assert!(temp.mul(&mass).convertible_to(&delta.mul(&mass)));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Dimensions::NONE), "1");
        let velocity = Dimensions::base(BaseDimension::Length, 1.0)
            .div(&Dimensions::base(BaseDimension::Time, 1.0));
        assert_eq!(format!("{velocity}"), "LENGTH TIME^-1");
    }
}
