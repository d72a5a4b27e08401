//! Unit string parsing.
//!
//! A unit string is a space-separated list of terms, each
//! `<prefix?><symbol><^exponent?>`. Parsing is pure over a [`UnitTable`]
//! snapshot: splitting a term into prefix, symbol, and exponent never
//! touches global state, and resolution folds the terms down to a
//! dimension vector and SI scaling factor.

use crate::dimensions::Dimensions;
use crate::error::UnitsError;
use crate::tables::UnitTable;

/// One parsed term of a unit string, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTerm {
    pub prefix: Option<String>,
    pub symbol: String,
    pub exponent: f64,
}

impl RawTerm {
    /// The term as written, without the exponent.
    pub fn token(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{}", self.symbol),
            None => self.symbol.clone(),
        }
    }
}

/// Dimensions and SI scaling factor of a resolved term list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolution {
    pub dimensions: Dimensions,
    pub factor: f64,
}

/// Split one term into prefix, symbol, and exponent.
///
/// The whole body is tried as a configured symbol first, so a symbol
/// that happens to start with a prefix letter ("cd", "min" style
/// collisions) always wins over a prefixed reading. Only when that
/// fails are prefixes peeled off, longest first, and the remainder must
/// itself be configured: "kcm" is kilo + cm, "dam" is deca + m.
pub(crate) fn split_term(table: &UnitTable, term: &str) -> Result<RawTerm, UnitsError> {
    let (body, exponent) = match term.split_once('^') {
        Some((body, raw)) => {
            let exponent = raw.parse::<f64>().map_err(|_| UnitsError::MalformedExponent {
                term: term.to_string(),
                exponent: raw.to_string(),
            })?;
            if !exponent.is_finite() {
                return Err(UnitsError::MalformedExponent {
                    term: term.to_string(),
                    exponent: raw.to_string(),
                });
            }
            (body, exponent)
        }
        None => (term, 1.0),
    };
    if body.is_empty() {
        return Err(UnitsError::UnknownSymbol(term.to_string()));
    }

    if table.is_known(body) {
        return Ok(RawTerm {
            prefix: None,
            symbol: body.to_string(),
            exponent,
        });
    }
    for (prefix, _) in table.multipliers() {
        if let Some(rest) = body.strip_prefix(prefix.as_str()) {
            if table.is_known(rest) {
                return Ok(RawTerm {
                    prefix: Some(prefix.clone()),
                    symbol: rest.to_string(),
                    exponent,
                });
            }
        }
    }
    Err(UnitsError::UnknownSymbol(body.to_string()))
}

/// Parse a full unit string into terms. The empty string (and any
/// all-whitespace string) is the dimensionless unit: zero terms.
pub(crate) fn parse_terms(table: &UnitTable, units: &str) -> Result<Vec<RawTerm>, UnitsError> {
    units
        .split_whitespace()
        .map(|term| split_term(table, term))
        .collect()
}

/// Fold a term list down to dimensions and an SI scaling factor.
///
/// Base units contribute their configured factor and dimension type;
/// derived units are expanded through the table's memoized resolver.
/// Prefix scales participate with the term's exponent applied, so
/// "km^2" scales by a million, not a thousand.
pub(crate) fn resolve_terms(
    table: &UnitTable,
    terms: &[RawTerm],
) -> Result<Resolution, UnitsError> {
    let mut dimensions = Dimensions::NONE;
    let mut factor = 1.0;
    for term in terms {
        if let Some(prefix) = &term.prefix {
            let scale = table
                .multiplier_scale(prefix)
                .ok_or_else(|| UnitsError::UnknownSymbol(term.token()))?;
            factor *= scale.powf(term.exponent);
        }
        if let Some(base) = table.base_unit(&term.symbol) {
            dimensions = dimensions.mul(&table.dimension_of(base.kind).pow(term.exponent));
            factor *= base.factor.powf(term.exponent);
        } else {
            let resolved = table.resolve_derived(&term.symbol)?;
            dimensions = dimensions.mul(&resolved.dimensions.pow(term.exponent));
            factor *= resolved.factor.powf(term.exponent);
        }
    }
    Ok(Resolution { dimensions, factor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::BaseDimension;
    use crate::tables::default_table;

    fn term(units: &str) -> RawTerm {
        split_term(default_table(), units).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= 1e-9 * scale,
            "{actual} != {expected}"
        );
    }

    #[test]
    fn bare_symbol() {
        let t = term("kg");
        assert_eq!(t.prefix, None);
        assert_eq!(t.symbol, "kg");
        assert_eq!(t.exponent, 1.0);
    }

    #[test]
    fn exponents() {
        assert_eq!(term("s^-2").exponent, -2.0);
        assert_eq!(term("m^-1.5").exponent, -1.5);
        assert_eq!(term("m^0").exponent, 0.0);
    }

    #[test]
    fn configured_symbol_beats_prefix_reading() {
        // "cd" is candela, never centi-day.
        let t = term("cd");
        assert_eq!(t.prefix, None);
        assert_eq!(t.symbol, "cd");
    }

    #[test]
    fn longest_prefix_wins() {
        let t = term("dam");
        assert_eq!(t.prefix.as_deref(), Some("da"));
        assert_eq!(t.symbol, "m");

        let t = term("kcm");
        assert_eq!(t.prefix.as_deref(), Some("k"));
        assert_eq!(t.symbol, "cm");
    }

    #[test]
    fn unknown_symbol() {
        let err = split_term(default_table(), "beans").unwrap_err();
        assert_eq!(err, UnitsError::UnknownSymbol("beans".to_string()));
    }

    #[test]
    fn malformed_exponent() {
        let err = split_term(default_table(), "m^two").unwrap_err();
        assert!(matches!(err, UnitsError::MalformedExponent { .. }));
        let err = split_term(default_table(), "m^").unwrap_err();
        assert!(matches!(err, UnitsError::MalformedExponent { .. }));
    }

    #[test]
    fn empty_string_is_dimensionless() {
        let terms = parse_terms(default_table(), "").unwrap();
        assert!(terms.is_empty());
        let terms = parse_terms(default_table(), "   ").unwrap();
        assert!(terms.is_empty());
    }

    #[test]
    fn resolve_base_units() {
        let table = default_table();
        let terms = parse_terms(table, "kg m s^-2").unwrap();
        let r = resolve_terms(table, &terms).unwrap();
        assert_eq!(r.factor, 1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Mass), 1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Length), 1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Time), -2.0);
    }

    #[test]
    fn resolve_derived_units() {
        let table = default_table();
        // Pa s expands through N down to base units.
        let terms = parse_terms(table, "Pa s").unwrap();
        let r = resolve_terms(table, &terms).unwrap();
        assert_eq!(r.factor, 1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Mass), 1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Length), -1.0);
        assert_eq!(r.dimensions.exponent(BaseDimension::Time), -1.0);
    }

    #[test]
    fn prefix_scale_respects_exponent() {
        let table = default_table();
        let km2 = resolve_terms(table, &parse_terms(table, "km^2").unwrap()).unwrap();
        assert_eq!(km2.factor, 1.0e6);
        let per_km = resolve_terms(table, &parse_terms(table, "km^-1").unwrap()).unwrap();
        assert_eq!(per_km.factor, 1.0e-3);
    }

    #[test]
    fn imperial_factors() {
        let table = default_table();
        let r = resolve_terms(table, &parse_terms(table, "lb ft^-1 s^-1").unwrap()).unwrap();
        assert_close(r.factor, 1.4881639435695542);
    }
}
