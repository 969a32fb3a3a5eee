//! Resource quantity grammar
//!
//! Parses quantity strings the way the Kubernetes API server does:
//!
//! ```text
//! <quantity>        ::= <signedNumber><suffix>
//! <signedNumber>    ::= <number> | <sign><number>
//! <number>          ::= <digits> | <digits>.<digits> | <digits>. | .<digits>
//! <suffix>          ::= <binarySI> | <decimalExponent> | <decimalSI>
//! <binarySI>        ::= Ki | Mi | Gi | Ti | Pi | Ei
//! <decimalSI>       ::= n | u | m | "" | k | M | G | T | P | E
//! <decimalExponent> ::= "e" <signedNumber> | "E" <signedNumber>
//! ```
//!
//! Nothing here is stricter than the API server: a bare sign or a bare `.`
//! are accepted as zero, exactly like `resource.ParseQuantity`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters the API server allows in the suffix part of a quantity
const SUFFIX_CHARS: &str = "eEinumkKMGTP";

/// Errors produced while parsing a quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must not be empty")]
    Empty,

    #[error("quantity '{0}' must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'")]
    Format(String),

    #[error("unable to parse suffix '{suffix}' of quantity '{quantity}'")]
    Suffix { quantity: String, suffix: String },
}

/// Suffixes the API server recognises besides `e<int>` / `E<int>`
const KNOWN_SUFFIXES: [&str; 16] = [
    "", "n", "u", "m", "k", "M", "G", "T", "P", "E", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei",
];

/// Whether `s` is a binary SI, decimal SI or decimal exponent suffix
///
/// The exponent must fit a signed 64-bit integer.
fn is_known_suffix(s: &str) -> bool {
    if KNOWN_SUFFIXES.contains(&s) {
        return true;
    }

    s.strip_prefix(['e', 'E'])
        .is_some_and(|exponent| exponent.parse::<i64>().is_ok())
}

/// A validated quantity, e.g. `500m`, `2`, `256Mi` or `1e3`
///
/// The original text is kept verbatim; the API server canonicalises it on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    raw: String,
}

impl Quantity {
    /// Parse a quantity string
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let unsigned = input.strip_prefix(['+', '-']).unwrap_or(input);

        let (_, mut rest) = split_digits(unsigned);
        if let Some(after_dot) = rest.strip_prefix('.') {
            rest = split_digits(after_dot).1;
        }

        if !is_suffix_shaped(rest) {
            return Err(QuantityError::Format(input.to_string()));
        }

        if !is_known_suffix(rest) {
            return Err(QuantityError::Suffix {
                quantity: input.to_string(),
                suffix: rest.to_string(),
            });
        }

        Ok(Self {
            raw: input.to_string(),
        })
    }

    /// The quantity exactly as it was written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a leading run of ASCII digits off `s`
fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Suffix letters, then an optional sign, then digits, then nothing
fn is_suffix_shaped(s: &str) -> bool {
    let rest = s.trim_start_matches(|c: char| SUFFIX_CHARS.contains(c));
    let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    rest.bytes().all(|b| b.is_ascii_digit())
}
