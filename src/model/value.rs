use std::fmt;

use serde::{Deserialize, Serialize};

/// A single namelist parameter value.
///
/// Fortran namelists carry logicals, integers, reals, and character strings,
/// either as scalars or as homogeneous lists. Mixed-type lists are not
/// representable and are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Reals(Vec<f64>),
    Strs(Vec<String>),
}

impl Value {
    /// Returns the contained string for scalar string values, `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Bools(_) | Value::Ints(_) | Value::Reals(_) | Value::Strs(_)
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn logical(b: bool) -> &'static str {
            if b { ".true." } else { ".false." }
        }
        fn real(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
            // Integral values must still read back as reals, so keep a
            // decimal point, or switch to exponent form once `{v:.1}`
            // would lose precision.
            if v.is_finite() && v.fract() == 0.0 {
                if v.abs() < 1e15 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v:e}")
                }
            } else {
                write!(f, "{v}")
            }
        }
        fn quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
            write!(f, "'{}'", s.replace('\'', "''"))
        }
        fn list<T, F>(f: &mut fmt::Formatter<'_>, items: &[T], mut each: F) -> fmt::Result
        where
            F: FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
        {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                each(f, item)?;
            }
            Ok(())
        }

        match self {
            Value::Bool(b) => write!(f, "{}", logical(*b)),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(v) => real(f, *v),
            Value::Str(s) => quoted(f, s),
            Value::Bools(items) => list(f, items, |f, b| write!(f, "{}", logical(*b))),
            Value::Ints(items) => list(f, items, |f, i| write!(f, "{i}")),
            Value::Reals(items) => list(f, items, |f, v| real(f, *v)),
            Value::Strs(items) => list(f, items, |f, s| quoted(f, s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_only_for_scalar_strings() {
        assert_eq!(Value::from("driving/data.nc").as_str(), Some("driving/data.nc"));
        assert_eq!(Value::Int(3).as_str(), None);
        assert_eq!(Value::Strs(vec!["a.nc".into()]).as_str(), None);
    }

    #[test]
    fn display_matches_namelist_grammar() {
        assert_eq!(Value::Bool(true).to_string(), ".true.");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Real(2.0).to_string(), "2.0");
        assert_eq!(Value::Real(0.125).to_string(), "0.125");
        assert_eq!(Value::from("it's").to_string(), "'it''s'");
        assert_eq!(
            Value::Reals(vec![1.0, 2.5]).to_string(),
            "1.0, 2.5"
        );
    }

    #[test]
    fn large_integral_reals_keep_real_form() {
        // `{v:.1}` above 2^53 would print a mantissa the float cannot hold,
        // so wide integral values render in exponent form instead.
        assert_eq!(Value::Real(1e16).to_string(), "1e16");
        assert_eq!(Value::Real(-2.5e18).to_string(), "-2.5e18");
        assert_eq!(Value::Real(9e14).to_string(), "900000000000000.0");
    }
}
