//! Static unit configuration and the `UnitTable` snapshot.
//!
//! All unit definitions come from a structured JSON document with four
//! sections: multiplier prefixes, unit systems, base units, and derived
//! units. Nothing in the algebra is hard-coded; the embedded `cfg.json`
//! is just the default document.
//!
//! A [`UnitTable`] is an immutable snapshot of that document plus the
//! angle-as-dimension flag captured at construction time. Units built
//! from a snapshot are never retroactively affected by later toggles.

use std::collections::{HashMap, HashSet};
use std::sync::{LazyLock, Mutex};

use serde::Deserialize;

use crate::dimensions::{BaseDimension, Dimensions};
use crate::error::UnitsError;
use crate::parse;

const CFG_JSON: &str = include_str!("cfg.json");
const QUANTITY_TABLES_JSON: &str = include_str!("quantity_tables.json");

/// Environment toggle for the process-default table. Values `0`, `false`,
/// `off`, and `no` make angle and solid angle dimensionless.
pub const ANGLE_AS_DIMENSION_ENV: &str = "QUANTITIES_ANGLE_AS_DIMENSION";

/// Base unit definition: dimension type, SI scaling factor, SI offset.
///
/// The offset is expressed in the unit's own scale and is nonzero only
/// for absolute temperature units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BaseUnitDef {
    #[serde(rename = "type")]
    pub kind: BaseDimension,
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
}

/// Derived unit definition: a composition unit string and a factor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DerivedUnitDef {
    pub composition: String,
    #[serde(default = "one")]
    pub factor: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    multipliers: HashMap<String, f64>,
    unit_systems: HashMap<String, HashMap<String, String>>,
    base_units: HashMap<String, BaseUnitDef>,
    derived_units: HashMap<String, DerivedUnitDef>,
}

/// A derived unit expanded down to base units; memoized per table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedDerived {
    pub dimensions: Dimensions,
    pub factor: f64,
}

/// Immutable registry of configured units.
///
/// Lookups are resolved against the snapshot only; registering units at
/// runtime is the registry's job, not the table's.
pub struct UnitTable {
    /// Prefix symbols sorted longest-first for maximal-match parsing.
    multipliers: Vec<(String, f64)>,
    base_units: HashMap<String, BaseUnitDef>,
    derived_units: HashMap<String, DerivedUnitDef>,
    unit_systems: HashMap<String, HashMap<BaseDimension, String>>,
    quantity_tables: HashMap<String, HashMap<String, String>>,
    /// SI base symbol per dimension (factor 1, offset 0).
    si_symbols: HashMap<BaseDimension, String>,
    angle_as_dimension: bool,
    derived_cache: Mutex<HashMap<String, ResolvedDerived>>,
}

impl UnitTable {
    /// Build a table from the embedded configuration.
    pub fn builtin(angle_as_dimension: bool) -> Result<UnitTable, UnitsError> {
        Self::from_json(CFG_JSON, QUANTITY_TABLES_JSON, angle_as_dimension)
    }

    /// Build a table from configuration documents.
    ///
    /// `cfg` must carry the four definition sections; `quantity_tables`
    /// maps system names to named-quantity tables. Validation happens
    /// here, not at first use: unparseable compositions, cyclic derived
    /// units, and malformed unit systems are reported immediately.
    pub fn from_json(
        cfg: &str,
        quantity_tables: &str,
        angle_as_dimension: bool,
    ) -> Result<UnitTable, UnitsError> {
        let document: ConfigDocument =
            serde_json::from_str(cfg).map_err(|e| UnitsError::Config(e.to_string()))?;
        let quantity_tables: HashMap<String, HashMap<String, String>> =
            serde_json::from_str(quantity_tables)
                .map_err(|e| UnitsError::Config(e.to_string()))?;

        let mut multipliers: Vec<(String, f64)> = document.multipliers.into_iter().collect();
        multipliers.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let mut unit_systems = HashMap::new();
        for (name, entries) in document.unit_systems {
            let mut system = HashMap::new();
            for (axis, symbol) in entries {
                let axis = BaseDimension::ALL
                    .into_iter()
                    .find(|d| d.name() == axis)
                    .ok_or_else(|| {
                        UnitsError::Config(format!("unknown base dimension `{axis}` in `{name}`"))
                    })?;
                system.insert(axis, symbol);
            }
            unit_systems.insert(name, system);
        }

        // The SI system names the canonical symbol per axis; scanning
        // for factor-1 base units alone would be ambiguous (delta_K and
        // delta_C both scale by one).
        let mut si_symbols: HashMap<BaseDimension, String> =
            unit_systems.get("SI").cloned().unwrap_or_default();
        for (symbol, def) in &document.base_units {
            if def.factor == 1.0 && def.offset == 0.0 {
                si_symbols.entry(def.kind).or_insert_with(|| symbol.clone());
            }
        }

        let table = UnitTable {
            multipliers,
            base_units: document.base_units,
            derived_units: document.derived_units,
            unit_systems,
            quantity_tables,
            si_symbols,
            angle_as_dimension,
            derived_cache: Mutex::new(HashMap::new()),
        };
        table.validate()?;

        tracing::debug!(
            base_units = table.base_units.len(),
            derived_units = table.derived_units.len(),
            systems = table.unit_systems.len(),
            angle_as_dimension,
            "unit table loaded"
        );
        Ok(table)
    }

    /// Whether angle and solid angle contribute to dimension vectors.
    pub fn angle_as_dimension(&self) -> bool {
        self.angle_as_dimension
    }

    /// True when `symbol` is a configured base or derived unit.
    pub fn is_known(&self, symbol: &str) -> bool {
        self.base_units.contains_key(symbol) || self.derived_units.contains_key(symbol)
    }

    pub(crate) fn base_unit(&self, symbol: &str) -> Option<&BaseUnitDef> {
        self.base_units.get(symbol)
    }

    pub(crate) fn derived_unit(&self, symbol: &str) -> Option<&DerivedUnitDef> {
        self.derived_units.get(symbol)
    }

    /// Prefix symbols and scales, longest symbol first.
    pub(crate) fn multipliers(&self) -> &[(String, f64)] {
        &self.multipliers
    }

    pub(crate) fn multiplier_scale(&self, prefix: &str) -> Option<f64> {
        self.multipliers
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|&(_, scale)| scale)
    }

    /// Dimension vector contributed by one base unit, with the angle
    /// toggle applied.
    pub(crate) fn dimension_of(&self, kind: BaseDimension) -> Dimensions {
        if !self.angle_as_dimension
            && matches!(kind, BaseDimension::Angle | BaseDimension::SolidAngle)
        {
            return Dimensions::NONE;
        }
        Dimensions::base(kind, 1.0)
    }

    /// SI base symbol for a dimension, falling back to the axis name for
    /// sparse custom configurations.
    pub(crate) fn si_symbol(&self, kind: BaseDimension) -> &str {
        self.si_symbols
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.name())
    }

    /// All configured unit symbols (base and derived), sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self
            .base_units
            .keys()
            .chain(self.derived_units.keys())
            .map(String::as_str)
            .collect();
        symbols.sort_unstable();
        symbols
    }

    /// Base-unit mapping of a configured unit system.
    pub(crate) fn system(
        &self,
        name: &str,
    ) -> Result<&HashMap<BaseDimension, String>, UnitsError> {
        self.unit_systems
            .get(name)
            .ok_or_else(|| UnitsError::InvalidUnitSystem(name.to_string()))
    }

    /// Unit string for a named physical quantity in one system's table.
    pub fn quantity_entry(&self, system: &str, entry: &str) -> Result<&str, UnitsError> {
        let table = self
            .quantity_tables
            .get(system)
            .ok_or_else(|| UnitsError::InvalidUnitSystem(system.to_string()))?;
        table
            .get(entry)
            .map(String::as_str)
            .ok_or_else(|| UnitsError::UnknownTableEntry(entry.to_string()))
    }

    /// Expand a derived unit to its base-unit dimensions and factor.
    ///
    /// Compositions are resolved lazily on first reference and memoized
    /// for the lifetime of the snapshot. Cycles were rejected at load
    /// time, so the recursion terminates.
    pub(crate) fn resolve_derived(&self, symbol: &str) -> Result<ResolvedDerived, UnitsError> {
        if let Some(resolved) = self.cache_lock().get(symbol) {
            return Ok(*resolved);
        }
        let def = self
            .derived_unit(symbol)
            .ok_or_else(|| UnitsError::UnknownSymbol(symbol.to_string()))?;
        let terms = parse::parse_terms(self, &def.composition)?;
        let inner = parse::resolve_terms(self, &terms)?;
        let resolved = ResolvedDerived {
            dimensions: inner.dimensions,
            factor: def.factor * inner.factor,
        };
        self.cache_lock().insert(symbol.to_string(), resolved);
        Ok(resolved)
    }

    fn cache_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ResolvedDerived>> {
        // The cache holds plain values; a poisoned guard is still usable.
        self.derived_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn validate(&self) -> Result<(), UnitsError> {
        self.check_cycles()?;

        // Every composition must parse against this table.
        for def in self.derived_units.values() {
            parse::parse_terms(self, &def.composition)?;
        }

        // Unit systems may only reference configured base units of the
        // matching type.
        for entries in self.unit_systems.values() {
            for (&axis, symbol) in entries {
                let def = self
                    .base_units
                    .get(symbol)
                    .ok_or_else(|| UnitsError::NotBaseUnit(symbol.clone()))?;
                if def.kind != axis {
                    return Err(UnitsError::IncorrectUnitType {
                        unit: symbol.clone(),
                        slot: axis.name().to_string(),
                    });
                }
            }
        }

        // Quantity tables are thin lookups, but a broken entry should
        // still fail at load, not at first use.
        for table in self.quantity_tables.values() {
            for units in table.values() {
                parse::parse_terms(self, units)?;
            }
        }
        Ok(())
    }

    /// Depth-first traversal of the derived-unit expansion graph with a
    /// visiting set; any back edge is a configuration error.
    fn check_cycles(&self) -> Result<(), UnitsError> {
        let mut done: HashSet<&str> = HashSet::new();
        for symbol in self.derived_units.keys() {
            let mut visiting = HashSet::new();
            self.visit(symbol, &mut visiting, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        symbol: &'a str,
        visiting: &mut HashSet<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<(), UnitsError> {
        if done.contains(symbol) {
            return Ok(());
        }
        if !visiting.insert(symbol) {
            return Err(UnitsError::CyclicComposition(symbol.to_string()));
        }
        if let Some(def) = self.derived_units.get(symbol) {
            for term in def.composition.split_whitespace() {
                let body = term.split('^').next().unwrap_or(term);
                let referenced = if self.is_known(body) {
                    Some(body)
                } else {
                    // A prefixed reference still points at the bare symbol.
                    self.multipliers
                        .iter()
                        .map(|(p, _)| p.as_str())
                        .filter_map(|p| body.strip_prefix(p))
                        .find(|rest| self.is_known(rest))
                };
                if let Some(referenced) = referenced {
                    if self.derived_units.contains_key(referenced) {
                        // Borrow through the map key so the lifetime
                        // outlives this term's slice.
                        let key = self
                            .derived_units
                            .keys()
                            .find(|k| k.as_str() == referenced)
                            .map(String::as_str)
                            .unwrap_or(symbol);
                        self.visit(key, visiting, done)?;
                    }
                }
            }
        }
        visiting.remove(symbol);
        done.insert(symbol);
        Ok(())
    }
}

impl std::fmt::Debug for UnitTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitTable")
            .field("base_units", &self.base_units.len())
            .field("derived_units", &self.derived_units.len())
            .field("unit_systems", &self.unit_systems.len())
            .field("angle_as_dimension", &self.angle_as_dimension)
            .finish()
    }
}

static DEFAULT_TABLE: LazyLock<UnitTable> = LazyLock::new(|| {
    let angle_as_dimension = std::env::var(ANGLE_AS_DIMENSION_ENV)
        .map(|v| !matches!(v.trim(), "0" | "false" | "off" | "no"))
        .unwrap_or(true);
    UnitTable::builtin(angle_as_dimension).expect("embedded unit configuration is valid")
});

/// Process-default table built from the embedded configuration.
///
/// The angle toggle is read from [`ANGLE_AS_DIMENSION_ENV`] exactly once,
/// on first access.
pub fn default_table() -> &'static UnitTable {
    &DEFAULT_TABLE
}
