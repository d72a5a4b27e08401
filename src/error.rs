//! Crate-wide error type.
//!
//! Every failure is surfaced synchronously to the caller; there is no
//! retry or partial-failure mode anywhere in the engine.

use thiserror::Error;

/// Errors produced by parsing, unit algebra, conversion, and registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitsError {
    /// A token resolves to neither a configured unit nor a prefixed one.
    #[error("`{0}` is an unknown or unconfigured unit")]
    UnknownSymbol(String),

    /// The segment after `^` is not a number.
    #[error("`{term}` has a malformed exponent `{exponent}`")]
    MalformedExponent { term: String, exponent: String },

    /// The configuration document is structurally invalid.
    #[error("invalid unit configuration: {0}")]
    Config(String),

    /// A derived unit's composition references itself, directly or not.
    #[error("derived unit `{0}` has a cyclic composition")]
    CyclicComposition(String),

    /// The symbol already exists in the target registry scope.
    #[error("unable to override `{0}`: it has already been registered")]
    UnitAlreadyRegistered(String),

    /// The named unit system is not configured.
    #[error("`{0}` is not a supported unit system")]
    InvalidUnitSystem(String),

    /// A unit-system slot was given a unit that is not a configured base unit.
    #[error("`{0}` is not a base unit; only configured base units can be used in a unit system")]
    NotBaseUnit(String),

    /// A unit-system slot was given a base unit of the wrong type.
    #[error("the unit `{unit}` is incompatible with unit system slot `{slot}`")]
    IncorrectUnitType { unit: String, slot: String },

    /// The named entry is absent from the quantity table.
    #[error("`{0}` is not a valid quantity table entry")]
    UnknownTableEntry(String),

    /// Operation requires equal dimension vectors.
    #[error("`{from}` and `{to}` have incompatible dimensions")]
    IncompatibleDimensions { from: String, to: String },

    /// Two absolute temperatures cannot be added.
    #[error("cannot add two absolute temperatures; at least one operand must be a temperature difference")]
    ProhibitedTemperatureOperation,

    /// Elementwise arithmetic between arrays of different lengths.
    #[error("array values have mismatched lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    /// Only dimensionless and angle quantities collapse to a bare float.
    #[error("only dimensionless quantities and angles can be used as a float")]
    InvalidFloatUsage,
}
