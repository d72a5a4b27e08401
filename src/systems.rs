//! Unit systems: one base unit per dimension.
//!
//! A [`UnitSystem`] is immutable after construction. Predefined systems
//! (SI, CGS, BT) come from the configuration; custom systems start from
//! SI and override individual axes.

use std::collections::HashMap;

use crate::dimensions::BaseDimension;
use crate::error::UnitsError;
use crate::tables::{default_table, UnitTable};
use crate::unit::Unit;

/// A complete assignment of base units to dimensions.
#[derive(Debug, Clone)]
pub struct UnitSystem {
    name: String,
    units: Vec<Unit>,
}

impl UnitSystem {
    /// Look up a predefined system by name.
    pub fn new(system: &str) -> Result<UnitSystem, UnitsError> {
        let table = default_table();
        let entries = table.system(system)?;
        let mut units = Vec::with_capacity(BaseDimension::ALL.len());
        for axis in BaseDimension::ALL {
            let symbol = entries
                .get(&axis)
                .ok_or_else(|| UnitsError::InvalidUnitSystem(system.to_string()))?;
            units.push(axis_unit(table, axis, symbol)?);
        }
        Ok(UnitSystem {
            name: system.to_string(),
            units,
        })
    }

    /// Build a custom system: SI for every axis not named in
    /// `base_units`.
    ///
    /// Every override must be a configured base unit of the matching
    /// dimension; `N` for mass fails with [`UnitsError::NotBaseUnit`],
    /// `s` for mass with [`UnitsError::IncorrectUnitType`].
    pub fn custom(base_units: &HashMap<BaseDimension, String>) -> Result<UnitSystem, UnitsError> {
        let table = default_table();
        let defaults = table.system("SI")?;
        let mut units = Vec::with_capacity(BaseDimension::ALL.len());
        for axis in BaseDimension::ALL {
            let symbol = base_units
                .get(&axis)
                .or_else(|| defaults.get(&axis))
                .ok_or_else(|| UnitsError::InvalidUnitSystem("SI".to_string()))?;
            units.push(axis_unit(table, axis, symbol)?);
        }
        Ok(UnitSystem {
            name: "custom".to_string(),
            units,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base unit assigned to one dimension.
    pub fn unit_for(&self, axis: BaseDimension) -> &Unit {
        &self.units[axis.index()]
    }
}

impl PartialEq for UnitSystem {
    /// Two systems are equal when they assign the same units, whatever
    /// their names.
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
    }
}

fn axis_unit(table: &UnitTable, axis: BaseDimension, symbol: &str) -> Result<Unit, UnitsError> {
    let def = table
        .base_unit(symbol)
        .ok_or_else(|| UnitsError::NotBaseUnit(symbol.to_string()))?;
    if def.kind != axis {
        return Err(UnitsError::IncorrectUnitType {
            unit: symbol.to_string(),
            slot: axis.name().to_string(),
        });
    }
    Unit::with_table(table, symbol)
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.name)?;
        for unit in &self.units {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}
