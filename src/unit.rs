//! Units and unit algebra.
//!
//! A [`Unit`] is an immutable value: a canonical name, the merged term
//! list it was built from, a dimension vector, and the SI conversion
//! pair (scaling factor and offset). Two units are equal when their
//! dimensions, factor, and offset agree, so `Unit::new("N m")` equals
//! `Unit::new("J")` even though their names differ.

use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::dimensions::{BaseDimension, Dimensions};
use crate::error::UnitsError;
use crate::parse::{self, RawTerm};
use crate::systems::UnitSystem;
use crate::tables::{default_table, UnitTable};

/// One merged term of a unit's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Term {
    token: String,
    exponent: f64,
    /// Present only when the token is an unprefixed configured base
    /// unit; carries what the name alone cannot recover.
    base: Option<TermBase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct TermBase {
    kind: BaseDimension,
    offset: f64,
}

/// Whether a unit is an absolute temperature or a temperature interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemperatureKind {
    Absolute,
    Difference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TempOp {
    Add,
    Sub,
}

/// Units to use when adding or subtracting across the absolute/interval
/// temperature boundary: convert the right operand to `operand`, tag
/// the result with `result`.
#[derive(Debug)]
pub(crate) struct TempRule {
    pub result: Unit,
    pub operand: Unit,
}

/// A physical unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    name: String,
    terms: Vec<Term>,
    dimensions: Dimensions,
    si_units: String,
    si_scaling_factor: f64,
    si_offset: f64,
}

impl Unit {
    /// Parse a unit string against the process-default table.
    ///
    /// The empty string is the dimensionless unit.
    pub fn new(units: &str) -> Result<Unit, UnitsError> {
        Self::with_table(default_table(), units)
    }

    /// Parse a unit string against an explicit table snapshot.
    pub fn with_table(table: &UnitTable, units: &str) -> Result<Unit, UnitsError> {
        let raw = parse::parse_terms(table, units)?;
        let resolution = parse::resolve_terms(table, &raw)?;
        let terms = merge_raw_terms(table, raw);
        Ok(Self::assemble(table, terms, resolution.dimensions, resolution.factor))
    }

    /// The dimensionless unit with no name.
    pub fn dimensionless() -> Unit {
        Unit {
            name: String::new(),
            terms: Vec::new(),
            dimensions: Dimensions::NONE,
            si_units: String::new(),
            si_scaling_factor: 1.0,
            si_offset: 0.0,
        }
    }

    /// Build the unit a dimension vector maps to in a unit system.
    ///
    /// Axes are visited in canonical order, so mass-length-time
    /// dimensions in the British Technical system come out as
    /// `slug ft s` compositions.
    pub fn from_dimensions(dimensions: &Dimensions, system: &UnitSystem) -> Unit {
        let mut unit = Unit::dimensionless();
        for (axis, exponent) in dimensions.iter_nonzero() {
            unit = unit.mul(&system.unit_for(axis).powf(exponent));
        }
        unit
    }

    /// Look up a named physical quantity in one system's quantity
    /// table, e.g. `("Torque", "SI")` for `N m`.
    pub fn from_table_entry(entry: &str, system: &str) -> Result<Unit, UnitsError> {
        let table = default_table();
        Unit::with_table(table, table.quantity_entry(system, entry)?)
    }

    /// Wrap a resolved composition under a new symbol, scaled by
    /// `factor`. Used for runtime-registered units.
    pub(crate) fn registered(symbol: &str, composition: &Unit, factor: f64) -> Unit {
        Unit {
            name: symbol.to_string(),
            terms: vec![Term {
                token: symbol.to_string(),
                exponent: 1.0,
                base: None,
            }],
            dimensions: composition.dimensions,
            si_units: composition.si_units.clone(),
            si_scaling_factor: factor * composition.si_scaling_factor,
            si_offset: 0.0,
        }
    }

    fn assemble(table: &UnitTable, terms: Vec<Term>, dimensions: Dimensions, factor: f64) -> Unit {
        let name = render_terms(&terms);
        let si_offset = single_bare_base(&terms).map_or(0.0, |base| base.offset);
        Unit {
            name,
            terms,
            dimensions,
            si_units: render_si(table, &dimensions),
            si_scaling_factor: factor,
            si_offset,
        }
    }

    fn rebuild(terms: Vec<Term>, dimensions: Dimensions, factor: f64) -> Unit {
        let merged = merge_terms(terms);
        Self::assemble(default_table(), merged, dimensions, factor)
    }

    /// Canonical name, terms in first-appearance order.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// SI expression of this unit's dimensions, in canonical axis order.
    pub fn si_units(&self) -> &str {
        &self.si_units
    }

    /// Multiplicative part of the SI conversion.
    pub fn si_scaling_factor(&self) -> f64 {
        self.si_scaling_factor
    }

    /// Additive part of the SI conversion, in this unit's own scale.
    /// Nonzero only for bare absolute temperature units.
    pub fn si_offset(&self) -> f64 {
        self.si_offset
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimensions.is_dimensionless()
    }

    /// True when the two units' quantities can be converted into each
    /// other. Looser than dimension equality only for the
    /// temperature/interval pairing.
    pub fn convertible_to(&self, other: &Unit) -> bool {
        self.dimensions.convertible_to(&other.dimensions)
    }

    /// Map a value in this unit to SI.
    pub(crate) fn to_si(&self, value: f64) -> f64 {
        (value + self.si_offset) * self.si_scaling_factor
    }

    /// Map an SI value back into this unit.
    pub(crate) fn from_si(&self, value: f64) -> f64 {
        value / self.si_scaling_factor - self.si_offset
    }

    /// Multiply two units. Term lists concatenate and merge, so the
    /// name records the operation history: `kg` × `K` is `kg K`.
    pub fn mul(&self, other: &Unit) -> Unit {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self::rebuild(
            terms,
            self.dimensions.mul(&other.dimensions),
            self.si_scaling_factor * other.si_scaling_factor,
        )
    }

    /// Divide two units.
    pub fn div(&self, other: &Unit) -> Unit {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().map(|t| Term {
            token: t.token.clone(),
            exponent: -t.exponent,
            base: t.base,
        }));
        Self::rebuild(
            terms,
            self.dimensions.div(&other.dimensions),
            self.si_scaling_factor / other.si_scaling_factor,
        )
    }

    /// Raise a unit to a real power. Fractional exponents are legal.
    pub fn powf(&self, exponent: f64) -> Unit {
        let terms = self
            .terms
            .iter()
            .map(|t| Term {
                token: t.token.clone(),
                exponent: t.exponent * exponent,
                base: t.base,
            })
            .collect();
        Self::rebuild(
            terms,
            self.dimensions.pow(exponent),
            self.si_scaling_factor.powf(exponent),
        )
    }

    /// Project this unit into another unit system by dimension vector.
    pub fn convert(&self, system: &UnitSystem) -> Unit {
        Unit::from_dimensions(&self.dimensions, system)
    }

    /// Symbols of all configured units with exactly the same dimensions,
    /// excluding this unit's own name. Sorted.
    pub fn compatible_units(&self) -> Vec<String> {
        default_table()
            .symbols()
            .into_iter()
            .filter(|symbol| *symbol != self.name)
            .filter_map(|symbol| Unit::new(symbol).ok().map(|unit| (symbol, unit)))
            .filter(|(_, unit)| unit.dimensions == self.dimensions)
            .map(|(symbol, _)| symbol.to_string())
            .collect()
    }

    pub(crate) fn temperature_kind(&self) -> Option<TemperatureKind> {
        let base = single_bare_base(&self.terms)?;
        match base.kind {
            BaseDimension::Temperature => Some(TemperatureKind::Absolute),
            BaseDimension::TemperatureDifference => Some(TemperatureKind::Difference),
            _ => None,
        }
    }

    /// The interval counterpart of an absolute temperature unit:
    /// `delta_<name>`, same scale, zero offset.
    pub(crate) fn delta_counterpart(&self) -> Result<Unit, UnitsError> {
        Unit::new(&format!("delta_{}", self.name))
    }

    /// The absolute counterpart of an interval unit, recovered by
    /// stripping the `delta_` prefix from the name.
    pub(crate) fn absolute_counterpart(&self) -> Result<Unit, UnitsError> {
        Unit::new(self.name.strip_prefix("delta_").unwrap_or(&self.name))
    }

    /// Decide how addition or subtraction behaves when either operand is
    /// a temperature unit.
    ///
    /// `self` is the left operand and wins the choice of scale:
    /// - absolute + absolute is prohibited;
    /// - absolute - absolute yields this unit's interval counterpart;
    /// - absolute +/- interval stays in this absolute unit;
    /// - interval +/- absolute moves to this unit's absolute counterpart.
    ///
    /// `Ok(None)` means plain dimensional addition applies.
    pub(crate) fn temperature_rule(
        &self,
        other: &Unit,
        op: TempOp,
    ) -> Result<Option<TempRule>, UnitsError> {
        use TemperatureKind::{Absolute, Difference};
        match (self.temperature_kind(), other.temperature_kind()) {
            (Some(Absolute), Some(Absolute)) => match op {
                TempOp::Add => Err(UnitsError::ProhibitedTemperatureOperation),
                TempOp::Sub => Ok(Some(TempRule {
                    result: self.delta_counterpart()?,
                    operand: self.clone(),
                })),
            },
            (Some(Absolute), Some(Difference)) => Ok(Some(TempRule {
                result: self.clone(),
                operand: self.delta_counterpart()?,
            })),
            (Some(Difference), Some(Absolute)) => {
                let absolute = self.absolute_counterpart()?;
                Ok(Some(TempRule {
                    result: absolute.clone(),
                    operand: absolute,
                }))
            }
            _ => Ok(None),
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::dimensionless()
    }
}

impl PartialEq for Unit {
    /// Physical equality: dimensions, scaling factor, and offset.
    /// The name does not participate, so `kcm` equals `dam`.
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions
            && self.si_scaling_factor == other.si_scaling_factor
            && self.si_offset == other.si_offset
    }
}

impl Eq for Unit {}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimensions.to_bits().hash(state);
        self.si_scaling_factor.to_bits().hash(state);
        self.si_offset.to_bits().hash(state);
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::new(s)
    }
}

fn merge_raw_terms(table: &UnitTable, raw: Vec<RawTerm>) -> Vec<Term> {
    let terms = raw
        .into_iter()
        .map(|t| {
            let base = match t.prefix {
                None => table.base_unit(&t.symbol).map(|def| TermBase {
                    kind: def.kind,
                    offset: def.offset,
                }),
                Some(_) => None,
            };
            Term {
                token: t.token(),
                exponent: t.exponent,
                base,
            }
        })
        .collect();
    merge_terms(terms)
}

/// Accumulate exponents of repeated tokens, preserving first-appearance
/// order, then drop cancelled terms.
fn merge_terms(terms: Vec<Term>) -> Vec<Term> {
    let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
    for term in terms {
        match merged.iter_mut().find(|t| t.token == term.token) {
            Some(existing) => existing.exponent += term.exponent,
            None => merged.push(term),
        }
    }
    merged.retain(|t| t.exponent != 0.0);
    merged
}

fn single_bare_base(terms: &[Term]) -> Option<TermBase> {
    match terms {
        [term] if term.exponent == 1.0 => term.base,
        _ => None,
    }
}

fn render_terms(terms: &[Term]) -> String {
    let mut out = String::new();
    for term in terms {
        push_term(&mut out, &term.token, term.exponent);
    }
    out
}

/// Render the SI composition of a dimension vector, axes in canonical
/// order.
fn render_si(table: &UnitTable, dimensions: &Dimensions) -> String {
    let mut out = String::new();
    for (axis, exponent) in dimensions.iter_nonzero() {
        push_term(&mut out, table.si_symbol(axis), exponent);
    }
    out
}

fn push_term(out: &mut String, token: &str, exponent: f64) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(token);
    if exponent != 1.0 {
        if exponent.fract() == 0.0 {
            let _ = write!(out, "^{}", exponent as i64);
        } else {
            let _ = write!(out, "^{exponent}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(units: &str) -> Unit {
        Unit::new(units).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= 1e-12 * scale,
            "{actual} != {expected}"
        );
    }

    #[test]
    fn base_unit_fields() {
        let kg = u("kg");
        assert_eq!(kg.name(), "kg");
        assert_eq!(kg.si_units(), "kg");
        assert_eq!(kg.si_scaling_factor(), 1.0);
        assert_eq!(kg.si_offset(), 0.0);
    }

    #[test]
    fn derived_unit_expands_to_si() {
        let n = u("N");
        assert_eq!(n.si_units(), "kg m s^-2");
        assert_eq!(n.si_scaling_factor(), 1.0);
        assert_eq!(u("Pa s").si_units(), "kg m^-1 s^-1");
    }

    #[test]
    fn prefixed_unit_scaling() {
        assert_close(u("km").si_scaling_factor(), 1000.0 * u("m").si_scaling_factor());
        assert_close(u("cm").si_scaling_factor(), 0.01);
    }

    #[test]
    fn temperature_units() {
        let c = u("C");
        assert_eq!(c.si_units(), "K");
        assert_eq!(c.si_offset(), 273.15);
        assert_close(u("F").si_scaling_factor(), 0.5555555555555556);
        assert_eq!(u("F").si_offset(), 459.67);
        assert_eq!(u("delta_C").si_offset(), 0.0);
        assert_close(c.to_si(30.0), 303.15);
        assert_close(c.from_si(303.15), 30.0);
    }

    #[test]
    fn physical_equality_ignores_name() {
        assert_eq!(u("N m"), u("J"));
        assert_ne!(u("N m"), u("W"));
        assert_eq!(u("kcm"), u("dam"));
        assert_eq!(u("kl"), u("m^3"));
        assert_ne!(u("l"), u("m^3"));
        assert_ne!(u("m"), u("ft"));
        assert_ne!(u("K"), u("delta_K"));
    }

    #[test]
    fn canonical_names_round_trip() {
        for symbol in default_table().symbols() {
            let unit = u(symbol);
            assert_eq!(unit.name(), symbol);
            assert_eq!(u(unit.name()).name(), symbol);
        }
    }

    #[test]
    fn from_table_entry() {
        let torque = Unit::from_table_entry("Torque", "SI").unwrap();
        assert_eq!(torque.name(), "N m");
        assert_eq!(Unit::from_table_entry("Force", "BT").unwrap().name(), "lbf");
        assert!(Unit::from_table_entry("Risk", "SI").is_err());
    }

    #[test]
    fn angle_toggle_changes_dimensions() {
        use crate::tables::UnitTable;

        let on = Unit::new("radian").unwrap();
        assert_eq!(on.dimensions().exponent(BaseDimension::Angle), 1.0);

        let table = UnitTable::builtin(false).unwrap();
        let off = Unit::with_table(&table, "radian").unwrap();
        assert!(off.is_dimensionless());
        assert!(Unit::with_table(&table, "sr").unwrap().is_dimensionless());
    }

    #[test]
    fn multiplication_preserves_term_order() {
        let product = u("K").mul(&u("kg")).mul(&u("J"));
        assert_eq!(product.name(), "K kg J");
    }

    #[test]
    fn division_negates_and_cancels() {
        let ratio = u("kg").div(&u("K"));
        assert_eq!(ratio.name(), "kg K^-1");
        let cancelled = u("kg K").div(&u("kg"));
        assert_eq!(cancelled.name(), "K");
        assert_eq!(cancelled.si_offset(), 0.0);
    }

    #[test]
    fn cancellation_restores_temperature_offset() {
        let back = u("kg C").div(&u("kg"));
        assert_eq!(back.name(), "C");
        assert_eq!(back.si_offset(), 273.15);
        assert_eq!(back.temperature_kind(), Some(TemperatureKind::Absolute));
    }

    #[test]
    fn powers() {
        let squared = u("kg K").powf(2.0);
        assert_eq!(squared.name(), "kg^2 K^2");
        let root = u("m^2").powf(0.5);
        assert_eq!(root.name(), "m");
        assert_eq!(u("m").powf(0.0).name(), "");
        assert_eq!(u("m^-1.5").name(), "m^-1.5");
    }

    #[test]
    fn repeated_tokens_accumulate() {
        assert_eq!(u("m m").name(), "m^2");
        assert_eq!(u("m^0").name(), "");
        assert!(u("m^0").is_dimensionless());
    }

    #[test]
    fn temperature_kinds() {
        assert_eq!(u("K").temperature_kind(), Some(TemperatureKind::Absolute));
        assert_eq!(u("delta_F").temperature_kind(), Some(TemperatureKind::Difference));
        assert_eq!(u("kg K").temperature_kind(), None);
        assert_eq!(u("K^2").temperature_kind(), None);
        assert_eq!(u("kg").temperature_kind(), None);
    }

    #[test]
    fn counterparts() {
        assert_eq!(u("C").delta_counterpart().unwrap().name(), "delta_C");
        assert_eq!(u("delta_R").absolute_counterpart().unwrap().name(), "R");
    }

    #[test]
    fn absolute_plus_absolute_is_prohibited() {
        let err = u("K").temperature_rule(&u("C"), TempOp::Add).unwrap_err();
        assert_eq!(err, UnitsError::ProhibitedTemperatureOperation);
    }

    #[test]
    fn absolute_minus_absolute_yields_interval() {
        let rule = u("C").temperature_rule(&u("C"), TempOp::Sub).unwrap().unwrap();
        assert_eq!(rule.result.name(), "delta_C");
        assert_eq!(rule.operand.name(), "C");
    }

    #[test]
    fn convertibility_is_lenient_for_intervals() {
        assert!(u("K").convertible_to(&u("delta_C")));
        assert!(u("delta_F").convertible_to(&u("R")));
        assert!(!u("K").convertible_to(&u("m")));
        // Strict equality stays strict.
        assert_ne!(u("K").dimensions(), u("delta_K").dimensions());
    }

    #[test]
    fn compatible_units_lists_same_dimension_symbols() {
        let ft = u("ft").compatible_units();
        assert_eq!(ft, ["cm", "in", "inch", "m"]);
        let n = u("N").compatible_units();
        assert_eq!(n, ["dyne", "lbf", "pdl"]);
        let dk = u("delta_K").compatible_units();
        assert_eq!(dk, ["delta_C", "delta_F", "delta_R"]);
    }

    #[test]
    fn system_projection() {
        let bt = UnitSystem::new("BT").unwrap();
        let mass_sq = u("kg^2").convert(&bt);
        assert_eq!(mass_sq.name(), "slug^2");
        assert_close(mass_sq.si_scaling_factor(), 212.9820029406007);

        let mixed = u("kg m s^2").convert(&bt);
        assert_eq!(mixed.name(), "slug ft s^2");
    }

    #[test]
    fn dimensionless_unit() {
        let one = u("");
        assert!(one.is_dimensionless());
        assert_eq!(one.name(), "");
        assert_eq!(one.si_scaling_factor(), 1.0);
        assert_eq!(one, Unit::dimensionless());
    }

    #[test]
    fn display_and_fromstr() {
        let unit: Unit = "N m".parse().unwrap();
        assert_eq!(unit.to_string(), "N m");
    }
}
