//! # Unit Registry and Conversion
//!
//! This module maps every accepted measurement unit spelling to its base
//! dimension and converts quantities to and from that base. Three dimensions
//! are supported, each with a fixed base unit:
//!
//! - mass -> grams (`g`)
//! - volume -> milliliters (`ml`)
//! - count -> `piece`
//!
//! ## Features
//!
//! - Case-insensitive, whitespace-tolerant alias lookup
//! - English and Vietnamese unit spellings (`kg`, `cup`, `lạng`, `chén`, ...)
//! - Permissive fallback: unknown spellings resolve to `("piece", 1.0)` and
//!   log a warning, so conversion never fails inside the engine
//! - Opt-in strict lookup via [`UnitRegistry`] for boundary validation

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use log::warn;
use std::collections::HashMap;

/// Base unit of the mass dimension.
pub const BASE_MASS: &str = "g";
/// Base unit of the volume dimension.
pub const BASE_VOLUME: &str = "ml";
/// Base unit of the count dimension.
pub const BASE_COUNT: &str = "piece";

// One flat alias table across all dimensions. The base unit label doubles as
// the dimension tag: two units are comparable iff their base labels match.
const ALIASES: &[(&str, &str, f64)] = &[
    // mass
    ("g", BASE_MASS, 1.0),
    ("gram", BASE_MASS, 1.0),
    ("grams", BASE_MASS, 1.0),
    ("kg", BASE_MASS, 1000.0),
    ("kilogram", BASE_MASS, 1000.0),
    ("kilograms", BASE_MASS, 1000.0),
    ("lạng", BASE_MASS, 100.0),
    // volume
    ("ml", BASE_VOLUME, 1.0),
    ("milliliter", BASE_VOLUME, 1.0),
    ("milliliters", BASE_VOLUME, 1.0),
    ("l", BASE_VOLUME, 1000.0),
    ("liter", BASE_VOLUME, 1000.0),
    ("liters", BASE_VOLUME, 1000.0),
    ("tsp", BASE_VOLUME, 5.0),
    ("teaspoon", BASE_VOLUME, 5.0),
    ("tbsp", BASE_VOLUME, 15.0),
    ("tablespoon", BASE_VOLUME, 15.0),
    ("cup", BASE_VOLUME, 240.0),
    ("cups", BASE_VOLUME, 240.0),
    ("chén", BASE_VOLUME, 100.0),
    ("bát", BASE_VOLUME, 250.0),
    // count
    ("piece", BASE_COUNT, 1.0),
    ("pieces", BASE_COUNT, 1.0),
    ("pc", BASE_COUNT, 1.0),
    ("pcs", BASE_COUNT, 1.0),
    ("cai", BASE_COUNT, 1.0),
    ("cái", BASE_COUNT, 1.0),
    ("cai.", BASE_COUNT, 1.0),
];

lazy_static! {
    static ref UNIT_TABLE: HashMap<&'static str, (&'static str, f64)> = {
        let mut table = HashMap::new();
        for &(alias, base, factor) in ALIASES {
            table.insert(alias, (base, factor));
        }
        table
    };
    static ref VALID_UNITS: Vec<&'static str> = {
        let mut units: Vec<&'static str> = UNIT_TABLE.keys().copied().collect();
        units.sort_unstable();
        units.dedup();
        units
    };
}

/// Resolve a unit spelling after trimming and lowercasing.
fn resolve(unit: &str) -> Option<(&'static str, f64)> {
    let key = unit.trim().to_lowercase();
    UNIT_TABLE.get(key.as_str()).copied()
}

/// Unit lookup with a configurable policy for unknown spellings.
///
/// The default (permissive) policy matches the engine's internal behavior:
/// unknown units resolve to `("piece", 1.0)`. Callers validating user input
/// at the boundary can opt into strict mode, where unknown units are errors.
///
/// # Examples
///
/// ```rust
/// use pantry::units::UnitRegistry;
///
/// let permissive = UnitRegistry::default();
/// assert_eq!(permissive.lookup("XYZ").unwrap(), ("piece", 1.0));
///
/// let strict = UnitRegistry::strict();
/// assert!(strict.lookup("XYZ").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitRegistry {
    /// Whether unknown unit spellings are rejected instead of defaulting.
    pub strict_units: bool,
}

impl UnitRegistry {
    /// Create a registry with strict unit validation enabled.
    pub fn strict() -> Self {
        Self { strict_units: true }
    }

    /// Look up a unit, returning its `(base_unit, scale_factor)` pair.
    ///
    /// In strict mode an unrecognized spelling is an error; otherwise it
    /// falls back to `("piece", 1.0)` with a warning.
    pub fn lookup(&self, unit: &str) -> Result<(&'static str, f64)> {
        match resolve(unit) {
            Some(hit) => Ok(hit),
            None if self.strict_units => bail!("unrecognized unit '{}'", unit),
            None => {
                warn!("Invalid unit '{}', defaulting to 'piece'", unit);
                Ok((BASE_COUNT, 1.0))
            }
        }
    }
}

/// Resolve a unit to its `(base_unit, scale_factor)` pair, permissively.
///
/// Unknown spellings resolve to `("piece", 1.0)` and log a warning. Callers
/// that need to reject bad input should use [`validate_unit`] or a strict
/// [`UnitRegistry`] before the value reaches the engine.
pub fn normalize_unit(unit: &str) -> (&'static str, f64) {
    match resolve(unit) {
        Some(hit) => hit,
        None => {
            warn!("Invalid unit '{}', defaulting to 'piece'", unit);
            (BASE_COUNT, 1.0)
        }
    }
}

/// Report whether a unit spelling is a recognized alias.
pub fn validate_unit(unit: &str) -> bool {
    resolve(unit).is_some()
}

/// All recognized unit spellings, sorted and deduplicated.
///
/// Intended for selection controls in the presentation layer.
pub fn valid_units() -> &'static [&'static str] {
    &VALID_UNITS
}

/// Convert a quantity to its base-dimension representation.
///
/// Never fails: unknown units go through the permissive fallback.
///
/// # Examples
///
/// ```rust
/// use pantry::units::to_base;
///
/// assert_eq!(to_base(0.5, "kg"), (500.0, "g"));
/// assert_eq!(to_base(2.0, "cup"), (480.0, "ml"));
/// ```
pub fn to_base(quantity: f64, unit: &str) -> (f64, &'static str) {
    let (base_unit, factor) = normalize_unit(unit);
    (quantity * factor, base_unit)
}

/// Convert a base-unit quantity back into a target display unit.
///
/// Conversion is undefined across dimensions: if `target_unit` does not
/// belong to `base_unit`'s dimension the mismatch is logged and `base_qty`
/// is returned unchanged, so display callers still have a value to render.
pub fn from_base(base_qty: f64, base_unit: &str, target_unit: &str) -> f64 {
    let (target_base, factor) = normalize_unit(target_unit);
    if target_base != base_unit {
        warn!(
            "Unit mismatch: cannot convert {} to {}",
            base_unit, target_unit
        );
        return base_qty;
    }
    base_qty / factor
}

/// True iff both units resolve to the same base unit.
pub fn same_dimension(u1: &str, u2: &str) -> bool {
    normalize_unit(u1).0 == normalize_unit(u2).0
}

/// Render a quantity for display.
///
/// Integral values print without a decimal point; everything else prints with
/// two decimals, trailing zeros and the trailing point trimmed.
///
/// # Examples
///
/// ```rust
/// use pantry::units::fmt_qty;
///
/// assert_eq!(fmt_qty(2.0), "2");
/// assert_eq!(fmt_qty(2.5), "2.5");
/// assert_eq!(fmt_qty(2.333), "2.33");
/// ```
pub fn fmt_qty(q: f64) -> String {
    let rounded = q.round();
    if (q - rounded).abs() <= 1e-6 * q.abs().max(rounded.abs()) {
        format!("{}", rounded as i64)
    } else {
        format!("{:.2}", q)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_aliases() {
        assert_eq!(normalize_unit("g"), ("g", 1.0));
        assert_eq!(normalize_unit("grams"), ("g", 1.0));
        assert_eq!(normalize_unit("kg"), ("g", 1000.0));
        assert_eq!(normalize_unit("kilograms"), ("g", 1000.0));
        assert_eq!(normalize_unit("lạng"), ("g", 100.0));
    }

    #[test]
    fn test_volume_aliases() {
        assert_eq!(normalize_unit("ml"), ("ml", 1.0));
        assert_eq!(normalize_unit("l"), ("ml", 1000.0));
        assert_eq!(normalize_unit("tsp"), ("ml", 5.0));
        assert_eq!(normalize_unit("tbsp"), ("ml", 15.0));
        assert_eq!(normalize_unit("cup"), ("ml", 240.0));
        assert_eq!(normalize_unit("cups"), ("ml", 240.0));
        assert_eq!(normalize_unit("chén"), ("ml", 100.0));
        assert_eq!(normalize_unit("bát"), ("ml", 250.0));
    }

    #[test]
    fn test_count_aliases() {
        for alias in ["piece", "pieces", "pc", "pcs", "cai", "cái", "cai."] {
            assert_eq!(normalize_unit(alias), ("piece", 1.0), "alias {}", alias);
        }
    }

    #[test]
    fn test_lookup_is_trimmed_and_case_insensitive() {
        assert_eq!(normalize_unit("  KG "), ("g", 1000.0));
        assert_eq!(normalize_unit("Cup"), ("ml", 240.0));
        assert_eq!(normalize_unit("LẠNG"), ("g", 100.0));
    }

    #[test]
    fn test_unknown_unit_falls_back_to_piece() {
        assert_eq!(normalize_unit("XYZ"), ("piece", 1.0));
        assert_eq!(normalize_unit(""), ("piece", 1.0));
        assert!(!validate_unit("XYZ"));
        assert!(validate_unit(" kg "));
    }

    #[test]
    fn test_strict_registry_rejects_unknown() {
        let strict = UnitRegistry::strict();
        assert!(strict.lookup("XYZ").is_err());
        assert_eq!(strict.lookup("kg").unwrap(), ("g", 1000.0));

        let permissive = UnitRegistry::default();
        assert_eq!(permissive.lookup("XYZ").unwrap(), ("piece", 1.0));
    }

    #[test]
    fn test_valid_units_sorted_and_deduplicated() {
        let units = valid_units();
        assert!(units.contains(&"kg"));
        assert!(units.contains(&"bát"));
        let mut sorted = units.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(units, sorted.as_slice());
    }

    #[test]
    fn test_to_base() {
        assert_eq!(to_base(0.5, "kg"), (500.0, "g"));
        assert_eq!(to_base(2.0, "cup"), (480.0, "ml"));
        assert_eq!(to_base(3.0, "XYZ"), (3.0, "piece"));
    }

    #[test]
    fn test_from_base_roundtrip() {
        for (qty, unit) in [(2.5, "cup"), (0.75, "kg"), (6.0, "pieces"), (3.0, "tbsp")] {
            let (base_qty, base_unit) = to_base(qty, unit);
            let back = from_base(base_qty, base_unit, unit);
            assert!((back - qty).abs() < 1e-9, "{} {}", qty, unit);
        }
    }

    #[test]
    fn test_from_base_cross_dimension_returns_input() {
        // g -> ml is undefined; the base quantity comes back unconverted.
        assert_eq!(from_base(500.0, "g", "ml"), 500.0);
        assert_eq!(from_base(100.0, "ml", "kg"), 100.0);
    }

    #[test]
    fn test_same_dimension() {
        assert!(same_dimension("kg", "g"));
        assert!(same_dimension("tbsp", "l"));
        assert!(!same_dimension("kg", "ml"));
        assert!(!same_dimension("cup", "piece"));
    }

    #[test]
    fn test_fmt_qty() {
        assert_eq!(fmt_qty(2.0), "2");
        assert_eq!(fmt_qty(2.5), "2.5");
        assert_eq!(fmt_qty(2.333), "2.33");
        assert_eq!(fmt_qty(0.0), "0");
        assert_eq!(fmt_qty(-4.0), "-4");
        assert_eq!(fmt_qty(1000.0), "1000");
    }
}
