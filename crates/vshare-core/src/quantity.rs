//! Resource quantities in orchestrator notation
//!
//! A quantity is a signed decimal number followed by an optional suffix: a binary SI
//! suffix (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`), a decimal SI suffix (`n`, `u`, `m`,
//! `k`, `M`, `G`, `T`, `P`, `E`) or a decimal exponent (`e3`, `E-2`).

use crate::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A resource quantity as it appears in a quota object.
///
/// The raw text is kept as-is; conversion happens on demand, so a quantity that is
/// not an exact integer (or is not a quantity at all) can still be carried around
/// and simply yields `None` from [`Quantity::as_i64`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity(String);

/// Sign, digits and scaling of a parsed quantity
#[derive(Debug, Clone, PartialEq, Eq)]
struct Parts {
    negative: bool,
    digits: String,
    exp10: i32,
    exp2: u32,
}

impl Quantity {
    /// Wrap a raw quantity string without validating it
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse and validate a quantity string
    pub fn parse(raw: &str) -> Result<Self> {
        parse_parts(raw)?;
        Ok(Self(raw.trim().to_string()))
    }

    /// The raw quantity text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the raw text is syntactically a quantity
    pub fn is_valid(&self) -> bool {
        parse_parts(&self.0).is_ok()
    }

    /// Convert to an `i64` if the value is an exact integer that fits.
    ///
    /// `"10Gi"` converts, `"1.5Gi"` converts (it is a whole number of bytes),
    /// `"500m"` does not.
    pub fn as_i64(&self) -> Option<i64> {
        self.to_i64().ok()
    }

    /// Like [`Quantity::as_i64`], reporting why the conversion failed
    pub fn to_i64(&self) -> Result<i64> {
        let parts = parse_parts(&self.0)?;
        exact_integer(&parts).ok_or_else(|| {
            Error::invalid_quantity(format!("{} is not an integer that fits in i64", self.0))
        })
    }
}

fn parse_parts(raw: &str) -> Result<Parts> {
    let s = raw.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(Error::invalid_quantity("empty quantity")),
    };

    let number_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_end);

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if frac_part.contains('.') || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(Error::invalid_quantity(raw));
    }

    let (suffix_exp10, exp2) = parse_suffix(suffix).ok_or_else(|| Error::invalid_quantity(raw))?;

    let frac_part = frac_part.trim_end_matches('0');
    let frac_len = i32::try_from(frac_part.len()).map_err(|_| Error::invalid_quantity(raw))?;
    let digits = format!("{}{}", int_part, frac_part)
        .trim_start_matches('0')
        .to_string();

    Ok(Parts {
        negative,
        digits,
        exp10: suffix_exp10.saturating_sub(frac_len),
        exp2,
    })
}

/// Map a suffix to its (decimal exponent, binary exponent) pair
fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let scale = match suffix {
        "" => (0, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (exponent.parse::<i32>().ok()?, 0)
        }
    };
    Some(scale)
}

fn exact_integer(parts: &Parts) -> Option<i64> {
    if parts.digits.is_empty() {
        return Some(0);
    }

    let mut value: i128 = parts.digits.parse().ok()?;
    value = value.checked_mul(1i128.checked_shl(parts.exp2)?)?;

    if parts.exp10 >= 0 {
        value = value.checked_mul(10i128.checked_pow(parts.exp10.unsigned_abs())?)?;
    } else {
        let divisor = 10i128.checked_pow(parts.exp10.unsigned_abs())?;
        if value % divisor != 0 {
            return None;
        }
        value /= divisor;
    }

    if parts.negative {
        value = -value;
    }
    i64::try_from(value).ok()
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for Quantity {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Quantity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Quantity, E> {
        Ok(Quantity::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}
