//! Quantities - Physical Quantity and Unit Conversion
//!
//! Provides unit-aware quantities with dimensional analysis.
//! Supports SI, CGS, British Technical, and derived units with
//! automatic conversion, all driven by a structured configuration
//! document rather than hard-coded tables.
//!
//! Core pieces:
//! - [`Unit`]: parsed unit strings ("kg m s^-2"), unit algebra, SI
//!   scaling factor and offset
//! - [`Quantity`]: scalar or array values bound to a unit, with
//!   unit-aware arithmetic and comparison
//! - [`Dimensions`]: vectors over the ten base dimensions, fractional
//!   exponents included
//! - [`UnitSystem`]: one base unit per dimension; SI, CGS, BT, or
//!   custom
//! - [`UnitRegistry`]: instance-scoped runtime unit registration
//! - [`UnitTable`]: immutable configuration snapshots
//!
//! Temperature gets dedicated treatment: absolute units (K, C, F, R)
//! carry conversion offsets, interval units (delta_K, ...) do not, and
//! addition or subtraction across that boundary follows the rules
//! documented on [`Quantity`].
//!
//! ```
//! use quantities::Quantity;
//!
//! # fn main() -> Result<(), quantities::UnitsError> {
//! let viscosity = Quantity::new(1.0, "lb ft^-1 s^-1")?;
//! let si = viscosity.to("Pa s")?;
//! assert_eq!(si.unit().name(), "Pa s");
//! # Ok(())
//! # }
//! ```

mod dimensions;
mod error;
mod parse;
mod quantity;
mod registry;
mod systems;
mod tables;
mod unit;

pub use dimensions::{BaseDimension, Dimensions, DIMENSION_COUNT};
pub use error::UnitsError;
pub use quantity::{Numeric, Quantity};
pub use registry::UnitRegistry;
pub use systems::UnitSystem;
pub use tables::{default_table, UnitTable, ANGLE_AS_DIMENSION_ENV};
pub use unit::Unit;
