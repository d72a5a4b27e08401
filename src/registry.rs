//! Runtime unit registration.
//!
//! A [`UnitRegistry`] scopes user-registered symbols to itself: two
//! registries never see each other's registrations, and the configured
//! table is never mutated. Registration is first-come, first-served;
//! neither built-ins nor earlier registrations can be overridden.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::UnitsError;
use crate::tables::default_table;
use crate::unit::Unit;

/// An instance-scoped view over the configured units plus runtime
/// registrations.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    extras: Mutex<HashMap<String, Unit>>,
}

impl UnitRegistry {
    pub fn new() -> UnitRegistry {
        UnitRegistry::default()
    }

    /// Resolve a unit string. Registered symbols take effect only when
    /// the whole string is one registered symbol; everything else goes
    /// through the parser.
    pub fn get(&self, units: &str) -> Result<Unit, UnitsError> {
        if let Some(unit) = self.extras_lock().get(units) {
            return Ok(unit.clone());
        }
        Unit::new(units)
    }

    /// Register `symbol` as `factor` times the composition unit string.
    ///
    /// The check and the insert happen under one lock, so concurrent
    /// registrations of the same symbol cannot both succeed.
    pub fn register(
        &self,
        symbol: &str,
        composition: &str,
        factor: f64,
    ) -> Result<(), UnitsError> {
        if symbol.is_empty() || symbol.contains(char::is_whitespace) || symbol.contains('^') {
            return Err(UnitsError::Config(format!(
                "`{symbol}` is not a registrable unit symbol"
            )));
        }
        if default_table().is_known(symbol) {
            return Err(UnitsError::UnitAlreadyRegistered(symbol.to_string()));
        }
        let unit = Unit::registered(symbol, &Unit::new(composition)?, factor);
        let mut extras = self.extras_lock();
        if extras.contains_key(symbol) {
            return Err(UnitsError::UnitAlreadyRegistered(symbol.to_string()));
        }
        extras.insert(symbol.to_string(), unit);
        tracing::debug!(symbol, composition, factor, "unit registered");
        Ok(())
    }

    /// All resolvable symbols: configured plus registered, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = default_table()
            .symbols()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.extend(self.extras_lock().keys().cloned());
        names.sort_unstable();
        names
    }

    fn extras_lock(&self) -> MutexGuard<'_, HashMap<String, Unit>> {
        // The map holds plain values; a poisoned guard is still usable.
        self.extras
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;

    #[test]
    fn configured_symbols_resolve() {
        let registry = UnitRegistry::new();
        assert_eq!(registry.get("kg").unwrap().name(), "kg");
        assert_eq!(registry.get("N m").unwrap().name(), "N m");
    }

    #[test]
    fn register_and_resolve() {
        let registry = UnitRegistry::new();
        registry.register("knot", "m s^-1", 0.5144444444444445).unwrap();
        let knot = registry.get("knot").unwrap();
        assert_eq!(knot.name(), "knot");
        assert_eq!(knot.si_units(), "m s^-1");
        assert_eq!(knot.si_scaling_factor(), 0.5144444444444445);

        let speed = Quantity::from_unit(2.0, knot).unwrap();
        let si = speed.to("m s^-1").unwrap();
        assert_eq!(si.value().scalar().unwrap(), 1.028888888888889);
    }

    #[test]
    fn registered_composition_keeps_physical_identity() {
        let registry = UnitRegistry::new();
        registry.register("Q", "N m", 1.0).unwrap();
        assert_eq!(registry.get("Q").unwrap(), Unit::new("J").unwrap());

        registry.register("Z", "N m", 1000.0).unwrap();
        let z = registry.get("Z").unwrap();
        assert_eq!(
            z.si_scaling_factor(),
            1000.0 * Unit::new("J").unwrap().si_scaling_factor()
        );
        assert_eq!(z.dimensions(), Unit::new("J").unwrap().dimensions());
    }

    #[test]
    fn builtin_symbols_cannot_be_overridden() {
        let registry = UnitRegistry::new();
        let err = registry.register("kg", "g", 1000.0).unwrap_err();
        assert_eq!(err, UnitsError::UnitAlreadyRegistered("kg".to_string()));
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = UnitRegistry::new();
        registry.register("fortnight", "s", 1209600.0).unwrap();
        let err = registry.register("fortnight", "h", 336.0).unwrap_err();
        assert_eq!(
            err,
            UnitsError::UnitAlreadyRegistered("fortnight".to_string())
        );
    }

    #[test]
    fn registrations_are_instance_scoped() {
        let first = UnitRegistry::new();
        let second = UnitRegistry::new();
        first.register("smoot", "m", 1.7018).unwrap();
        assert!(first.get("smoot").is_ok());
        assert_eq!(
            second.get("smoot").unwrap_err(),
            UnitsError::UnknownSymbol("smoot".to_string())
        );
    }

    #[test]
    fn invalid_symbols_are_rejected() {
        let registry = UnitRegistry::new();
        assert!(registry.register("", "m", 1.0).is_err());
        assert!(registry.register("two words", "m", 1.0).is_err());
        assert!(registry.register("x^2", "m", 1.0).is_err());
    }

    #[test]
    fn names_include_registrations() {
        let registry = UnitRegistry::new();
        registry.register("smoot", "m", 1.7018).unwrap();
        let names = registry.names();
        assert!(names.contains(&"kg".to_string()));
        assert!(names.contains(&"smoot".to_string()));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn registered_unit_composition_must_parse() {
        let registry = UnitRegistry::new();
        let err = registry.register("blob", "beans", 1.0).unwrap_err();
        assert_eq!(err, UnitsError::UnknownSymbol("beans".to_string()));
    }
}
