// Copyright © 2024 Pathway

//! Culture-sensitive rendering of primitive values.
//!
//! A [`Culture`] plays the role of a format provider: it decides how numbers
//! are spelled out when they are written through an
//! [`AutoFlushTextWriter`](crate::writer::AutoFlushTextWriter).

use std::fmt::Display;

use crate::error::{Error, Result};

const INVARIANT_NAME: &str = "";
const DEFAULT_NAN_SYMBOL: &str = "NaN";
const DEFAULT_POSITIVE_INFINITY_SYMBOL: &str = "Infinity";
const DEFAULT_NEGATIVE_INFINITY_SYMBOL: &str = "-Infinity";

// Placeholder indices and alignments must stay below this.
const MAX_PLACEHOLDER_VALUE: u64 = 1_000_000;

// Magnitudes below this switch to exponent notation, for both float widths.
const SMALL_FLOAT_LIMIT: f64 = 1e-4;
const LARGE_F64_LIMIT: f64 = 1e15;
const LARGE_F32_LIMIT: f64 = 1e7;

// (name, decimal separator)
const KNOWN_CULTURES: &[(&str, &str)] = &[
    ("en-US", "."),
    ("en-GB", "."),
    ("ja-JP", "."),
    ("zh-CN", "."),
    ("hu-HU", ","),
    ("de-DE", ","),
    ("fr-FR", ","),
    ("it-IT", ","),
    ("es-ES", ","),
    ("nl-NL", ","),
    ("pl-PL", ","),
    ("pt-BR", ","),
    ("ru-RU", ","),
    ("sv-SE", ","),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
    decimal_separator: String,
    negative_sign: String,
    nan_symbol: String,
    positive_infinity_symbol: String,
    negative_infinity_symbol: String,
}

impl Culture {
    pub fn invariant() -> Self {
        Self::custom(INVARIANT_NAME, ".")
    }

    /// Looks up one of the built-in cultures by its `language-REGION` name.
    /// The lookup is case-insensitive; an empty name is the invariant culture.
    pub fn from_name(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Ok(Self::invariant());
        }
        KNOWN_CULTURES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(known, separator)| Self::custom(known, separator))
            .ok_or_else(|| Error::invalid_argument(format!("unknown culture {name:?}")))
    }

    pub fn custom(name: &str, decimal_separator: &str) -> Self {
        Self {
            name: name.to_string(),
            decimal_separator: decimal_separator.to_string(),
            negative_sign: "-".to_string(),
            nan_symbol: DEFAULT_NAN_SYMBOL.to_string(),
            positive_infinity_symbol: DEFAULT_POSITIVE_INFINITY_SYMBOL.to_string(),
            negative_infinity_symbol: DEFAULT_NEGATIVE_INFINITY_SYMBOL.to_string(),
        }
    }

    #[must_use]
    pub fn with_negative_sign(mut self, negative_sign: &str) -> Self {
        self.negative_sign = negative_sign.to_string();
        self
    }

    #[must_use]
    pub fn with_special_symbols(
        mut self,
        nan: &str,
        positive_infinity: &str,
        negative_infinity: &str,
    ) -> Self {
        self.nan_symbol = nan.to_string();
        self.positive_infinity_symbol = positive_infinity.to_string();
        self.negative_infinity_symbol = negative_infinity.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_invariant(&self) -> bool {
        self.name == INVARIANT_NAME
    }

    pub fn decimal_separator(&self) -> &str {
        &self.decimal_separator
    }

    pub fn negative_sign(&self) -> &str {
        &self.negative_sign
    }

    fn push_integer(&self, is_negative: bool, magnitude: impl Display, out: &mut String) {
        if is_negative {
            out.push_str(&self.negative_sign);
        }
        out.push_str(&magnitude.to_string());
    }

    fn push_float(&self, value: f64, rendered: &str, out: &mut String) {
        if value.is_nan() {
            out.push_str(&self.nan_symbol);
        } else if value.is_infinite() {
            out.push_str(if value > 0.0 {
                &self.positive_infinity_symbol
            } else {
                &self.negative_infinity_symbol
            });
        } else {
            let (is_negative, digits) = match rendered.strip_prefix('-') {
                Some(digits) => (true, digits),
                None => (false, rendered),
            };
            if is_negative {
                out.push_str(&self.negative_sign);
            }
            match digits.split_once('.') {
                Some((whole, fraction)) => {
                    out.push_str(whole);
                    out.push_str(&self.decimal_separator);
                    out.push_str(fraction);
                }
                None => out.push_str(digits),
            }
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Values that know how to render themselves under a [`Culture`].
pub trait CultureFormat {
    fn format_to(&self, culture: &Culture, out: &mut String);

    fn to_culture_string(&self, culture: &Culture) -> String {
        let mut out = String::new();
        self.format_to(culture, &mut out);
        out
    }
}

impl<T: CultureFormat + ?Sized> CultureFormat for &T {
    fn format_to(&self, culture: &Culture, out: &mut String) {
        (**self).format_to(culture, out);
    }
}

impl CultureFormat for str {
    fn format_to(&self, _culture: &Culture, out: &mut String) {
        out.push_str(self);
    }
}

impl CultureFormat for String {
    fn format_to(&self, _culture: &Culture, out: &mut String) {
        out.push_str(self);
    }
}

impl CultureFormat for char {
    fn format_to(&self, _culture: &Culture, out: &mut String) {
        out.push(*self);
    }
}

impl CultureFormat for bool {
    fn format_to(&self, _culture: &Culture, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }
}

macro_rules! impl_culture_format_signed {
    ($($t:ty),*) => {
        $(
            impl CultureFormat for $t {
                fn format_to(&self, culture: &Culture, out: &mut String) {
                    culture.push_integer(*self < 0, self.unsigned_abs(), out);
                }
            }
        )*
    };
}

macro_rules! impl_culture_format_unsigned {
    ($($t:ty),*) => {
        $(
            impl CultureFormat for $t {
                fn format_to(&self, culture: &Culture, out: &mut String) {
                    culture.push_integer(false, self, out);
                }
            }
        )*
    };
}

impl_culture_format_signed!(i8, i16, i32, i64, i128, isize);
impl_culture_format_unsigned!(u8, u16, u32, u64, u128, usize);

fn uses_exponent(value: f64, large_limit: f64) -> bool {
    let magnitude = value.abs();
    magnitude.is_finite()
        && magnitude > 0.0
        && (magnitude >= large_limit || magnitude < SMALL_FLOAT_LIMIT)
}

/// Rewrites Rust's `1.5e-7` as `1.5E-07`: upper-case marker, explicit sign
/// and at least two exponent digits.
fn with_exponent_marker(scientific: &str) -> String {
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        None => scientific.to_string(),
    }
}

impl CultureFormat for f64 {
    fn format_to(&self, culture: &Culture, out: &mut String) {
        let rendered = if uses_exponent(*self, LARGE_F64_LIMIT) {
            with_exponent_marker(&format!("{self:e}"))
        } else {
            self.to_string()
        };
        culture.push_float(*self, &rendered, out);
    }
}

impl CultureFormat for f32 {
    fn format_to(&self, culture: &Culture, out: &mut String) {
        let value = f64::from(*self);
        // f32 is rendered with its own shortest representation, not the widened f64 one
        let rendered = if uses_exponent(value, LARGE_F32_LIMIT) {
            with_exponent_marker(&format!("{self:e}"))
        } else {
            self.to_string()
        };
        culture.push_float(value, &rendered, out);
    }
}

/// Expands a composite format string such as `"This is: {0}"`.
///
/// Placeholders are `{index}` or `{index,alignment}`; a positive alignment
/// pads on the left, a negative one on the right. `{{` and `}}` stand for
/// literal braces. Indices and alignments of a million or more are rejected
/// as malformed.
pub fn format_composite(
    template: &str,
    args: &[&dyn CultureFormat],
    culture: &Culture,
) -> Result<String> {
    let malformed = |reason| Error::Format(template.to_string(), reason);

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(malformed("unmatched closing brace")),
            '{' => {
                let mut placeholder = String::new();
                let mut terminated = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        terminated = true;
                        break;
                    }
                    placeholder.push(c);
                }
                if !terminated {
                    return Err(malformed("unterminated placeholder"));
                }
                let (index, alignment) = match placeholder.split_once(',') {
                    Some((index, alignment)) => (index, Some(alignment)),
                    None => (placeholder.as_str(), None),
                };
                let index: u64 = index
                    .trim()
                    .parse()
                    .map_err(|_| malformed("placeholder index is not a number"))?;
                let arg = usize::try_from(index)
                    .ok()
                    .filter(|_| index < MAX_PLACEHOLDER_VALUE)
                    .and_then(|index| args.get(index))
                    .ok_or_else(|| malformed("placeholder index is out of range"))?;
                let width = match alignment {
                    Some(alignment) => {
                        let width: i64 = alignment
                            .trim()
                            .parse()
                            .map_err(|_| malformed("alignment is not a number"))?;
                        if width.unsigned_abs() >= MAX_PLACEHOLDER_VALUE {
                            return Err(malformed("alignment is out of range"));
                        }
                        Some(width)
                    }
                    None => None,
                };
                let rendered = arg.to_culture_string(culture);
                match width {
                    Some(width) => {
                        let len = rendered.chars().count();
                        let pad = usize::try_from(width.unsigned_abs())
                            .unwrap_or(usize::MAX)
                            .saturating_sub(len);
                        if width >= 0 {
                            out.extend(std::iter::repeat(' ').take(pad));
                            out.push_str(&rendered);
                        } else {
                            out.push_str(&rendered);
                            out.extend(std::iter::repeat(' ').take(pad));
                        }
                    }
                    None => out.push_str(&rendered),
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
