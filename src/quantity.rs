//! Quantities: a numeric value bound to a unit.
//!
//! Arithmetic is unit-aware. Addition and subtraction convert the right
//! operand into the left operand's scale, with dedicated rules at the
//! absolute/interval temperature boundary; multiplication and division
//! compose units; comparison goes through SI values.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};

use serde::{Deserialize, Serialize};

use crate::dimensions::{BaseDimension, Dimensions};
use crate::error::UnitsError;
use crate::systems::UnitSystem;
use crate::tables::default_table;
use crate::unit::{TempOp, TemperatureKind, Unit};

/// A scalar or an elementwise array value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Numeric {
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Numeric::Scalar(v) => Some(*v),
            Numeric::Array(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Numeric::Scalar(_) => 1,
            Numeric::Array(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn map(&self, f: impl Fn(f64) -> f64) -> Numeric {
        match self {
            Numeric::Scalar(v) => Numeric::Scalar(f(*v)),
            Numeric::Array(values) => Numeric::Array(values.iter().copied().map(f).collect()),
        }
    }

    /// Combine two values elementwise. Scalars broadcast over arrays;
    /// arrays must agree in length.
    pub(crate) fn zip(
        &self,
        other: &Numeric,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Numeric, UnitsError> {
        match (self, other) {
            (Numeric::Scalar(a), Numeric::Scalar(b)) => Ok(Numeric::Scalar(f(*a, *b))),
            (Numeric::Scalar(a), Numeric::Array(bs)) => {
                Ok(Numeric::Array(bs.iter().map(|b| f(*a, *b)).collect()))
            }
            (Numeric::Array(as_), Numeric::Scalar(b)) => {
                Ok(Numeric::Array(as_.iter().map(|a| f(*a, *b)).collect()))
            }
            (Numeric::Array(as_), Numeric::Array(bs)) => {
                if as_.len() != bs.len() {
                    return Err(UnitsError::LengthMismatch {
                        left: as_.len(),
                        right: bs.len(),
                    });
                }
                Ok(Numeric::Array(
                    as_.iter().zip(bs).map(|(a, b)| f(*a, *b)).collect(),
                ))
            }
        }
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Scalar(value)
    }
}

impl From<Vec<f64>> for Numeric {
    fn from(values: Vec<f64>) -> Self {
        Numeric::Array(values)
    }
}

impl From<&[f64]> for Numeric {
    fn from(values: &[f64]) -> Self {
        Numeric::Array(values.to_vec())
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Scalar(v) => write!(f, "{v}"),
            Numeric::Array(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A numeric value with a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    value: Numeric,
    unit: Unit,
}

impl Quantity {
    /// Build a quantity from a value and a unit string.
    ///
    /// A scalar absolute temperature below absolute zero is
    /// reinterpreted as a temperature interval: `-2 K` means a drop of
    /// two kelvin, not a temperature.
    pub fn new(value: impl Into<Numeric>, units: &str) -> Result<Quantity, UnitsError> {
        Self::from_unit(value, Unit::new(units)?)
    }

    /// Build a quantity from a value and an already-constructed unit.
    pub fn from_unit(value: impl Into<Numeric>, unit: Unit) -> Result<Quantity, UnitsError> {
        let value = value.into();
        let unit = match (value.scalar(), unit.temperature_kind()) {
            (Some(v), Some(TemperatureKind::Absolute)) if v + unit.si_offset() < 0.0 => {
                unit.delta_counterpart()?
            }
            _ => unit,
        };
        Ok(Quantity { value, unit })
    }

    /// Build a quantity from a dimension vector, in SI base units.
    pub fn from_dimensions(
        value: impl Into<Numeric>,
        dimensions: &Dimensions,
    ) -> Result<Quantity, UnitsError> {
        Self::from_dimensions_in(value, dimensions, &UnitSystem::new("SI")?)
    }

    /// Build a quantity from a dimension vector, in a unit system's
    /// base units.
    pub fn from_dimensions_in(
        value: impl Into<Numeric>,
        dimensions: &Dimensions,
        system: &UnitSystem,
    ) -> Result<Quantity, UnitsError> {
        Self::from_unit(value, Unit::from_dimensions(dimensions, system))
    }

    /// Build a quantity from a named physical quantity in one system's
    /// quantity table, e.g. `("Torque", "SI")` for newton-metres.
    pub fn from_table_entry(
        value: impl Into<Numeric>,
        entry: &str,
        system: &str,
    ) -> Result<Quantity, UnitsError> {
        let units = default_table().quantity_entry(system, entry)?;
        Self::new(value, units)
    }

    pub fn value(&self) -> &Numeric {
        &self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// The value expressed in SI base units.
    pub fn si_value(&self) -> Numeric {
        self.value.map(|v| self.unit.to_si(v))
    }

    /// Extract a bare float. Permitted only for scalar quantities that
    /// are dimensionless, a plain angle, or a plain solid angle; the SI
    /// value is returned, so degrees come back as radians.
    pub fn as_f64(&self) -> Result<f64, UnitsError> {
        let dimensions = self.unit.dimensions();
        let permitted = dimensions.is_dimensionless()
            || *dimensions == Dimensions::base(BaseDimension::Angle, 1.0)
            || *dimensions == Dimensions::base(BaseDimension::SolidAngle, 1.0);
        if !permitted {
            return Err(UnitsError::InvalidFloatUsage);
        }
        match self.si_value() {
            Numeric::Scalar(v) => Ok(v),
            Numeric::Array(_) => Err(UnitsError::InvalidFloatUsage),
        }
    }

    /// Convert to another unit, given as a unit string.
    pub fn to(&self, units: &str) -> Result<Quantity, UnitsError> {
        self.to_unit(&Unit::new(units)?)
    }

    /// Convert to another unit.
    ///
    /// Conversion requires convertible dimensions; that allows the
    /// absolute/interval temperature pairing (`K` to `delta_C`) that
    /// strict equality rejects.
    pub fn to_unit(&self, target: &Unit) -> Result<Quantity, UnitsError> {
        if !self.unit.convertible_to(target) {
            return Err(UnitsError::IncompatibleDimensions {
                from: self.unit.name().to_string(),
                to: target.name().to_string(),
            });
        }
        Ok(Quantity {
            value: self.value.map(|v| target.from_si(self.unit.to_si(v))),
            unit: target.clone(),
        })
    }

    /// Convert to a unit system's base units, by dimension vector.
    pub fn convert(&self, system: &UnitSystem) -> Result<Quantity, UnitsError> {
        self.to_unit(&self.unit.convert(system))
    }

    pub fn add(&self, other: &Quantity) -> Result<Quantity, UnitsError> {
        self.add_sub(other, TempOp::Add)
    }

    pub fn sub(&self, other: &Quantity) -> Result<Quantity, UnitsError> {
        self.add_sub(other, TempOp::Sub)
    }

    /// Addition and subtraction resolve in the left operand's scale.
    /// Temperature operands first go through the absolute/interval
    /// rules; everything else is a plain conversion of the right
    /// operand.
    fn add_sub(&self, other: &Quantity, op: TempOp) -> Result<Quantity, UnitsError> {
        let combine = |a: f64, b: f64| match op {
            TempOp::Add => a + b,
            TempOp::Sub => a - b,
        };
        if let Some(rule) = self.unit.temperature_rule(&other.unit, op)? {
            let rhs = other.to_unit(&rule.operand)?;
            return Ok(Quantity {
                value: self.value.zip(&rhs.value, combine)?,
                unit: rule.result,
            });
        }
        let rhs = other.to_unit(&self.unit)?;
        Ok(Quantity {
            value: self.value.zip(&rhs.value, combine)?,
            unit: self.unit.clone(),
        })
    }

    /// Multiply two quantities. Fallible, so it lives beside the
    /// `Mul<f64>` operator under a distinct name: array values can
    /// disagree in length.
    pub fn try_mul(&self, other: &Quantity) -> Result<Quantity, UnitsError> {
        Ok(Quantity {
            value: self.value.zip(&other.value, |a, b| a * b)?,
            unit: self.unit.mul(&other.unit),
        })
    }

    /// Divide two quantities; see [`Quantity::try_mul`].
    pub fn try_div(&self, other: &Quantity) -> Result<Quantity, UnitsError> {
        Ok(Quantity {
            value: self.value.zip(&other.value, |a, b| a / b)?,
            unit: self.unit.div(&other.unit),
        })
    }

    /// Raise to a real power. Exponent zero yields a dimensionless
    /// quantity of value one.
    pub fn powf(&self, exponent: f64) -> Quantity {
        Quantity {
            value: self.value.map(|v| v.powf(exponent)),
            unit: self.unit.powf(exponent),
        }
    }
}

impl PartialEq for Quantity {
    /// Equality through SI values; quantities of different dimensions
    /// are simply unequal.
    fn eq(&self, other: &Self) -> bool {
        self.unit.dimensions() == other.unit.dimensions() && self.si_value() == other.si_value()
    }
}

impl PartialOrd for Quantity {
    /// Ordering through SI values, scalars only.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.unit.dimensions() != other.unit.dimensions() {
            return None;
        }
        let a = self.si_value().scalar()?;
        let b = other.si_value().scalar()?;
        a.partial_cmp(&b)
    }
}

impl Mul<f64> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value.map(|v| v * rhs),
            unit: self.unit.clone(),
        }
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        &self * rhs
    }
}

impl Div<f64> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value.map(|v| v / rhs),
            unit: self.unit.clone(),
        }
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        &self / rhs
    }
}

impl Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity {
            value: self.value.map(|v| -v),
            unit: self.unit.clone(),
        }
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        -&self
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.name().is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}
