//! # Value Coercion
//!
//! Converts a decoded tree value into a concrete field type, in three layers:
//!
//! 1. Direct match: the value already has the target's shape
//!    (`"x"` into `String`, `true` into `bool`, `8080` into `u16`)
//! 2. Safe widening: strings parse into numbers and booleans, numbers and
//!    booleans render into strings, integral floats become integers
//! 3. Generic fallback: container and serde types decode through `serde`; a
//!    string value is re-decoded as a JSON document, which is how
//!    `APP__LOG__OUTPUTS='["stdout"]'` lands in a `Vec<String>`
//!
//! Nothing truncates silently: `1.5` never becomes an integer and `70000`
//! never becomes a `u16`.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Number;

use crate::{CoerceError, Value};

/// A leaf type the binder can fill from a tree value or a default literal.
pub trait Coerce: Sized {
    /// Type description used in error messages.
    const EXPECTED: &'static str;

    fn coerce(value: &Value) -> Result<Self, CoerceError>;

    fn parse_default(_literal: &str) -> Result<Self, CoerceError> {
        Err(CoerceError::UnsupportedDefault {
            target: Self::EXPECTED
        })
    }
}

/// Coerce `value` into `T`.
///
/// ```
/// use confluent::{Value, coerce};
///
/// let port: u16 = coerce(&Value::String("9000".into())).unwrap();
/// assert_eq!(port, 9000);
///
/// let outputs: Vec<String> = coerce(&Value::String(r#"["stdout"]"#.into())).unwrap();
/// assert_eq!(outputs, vec!["stdout".to_string()]);
/// ```
pub fn coerce<T: Coerce>(value: &Value) -> Result<T, CoerceError> {
    T::coerce(value)
}

/// Decode `value` into any serde type, re-decoding string content as JSON
/// when the value itself does not fit.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, CoerceError> {
    match T::deserialize(value) {
        Ok(decoded) => Ok(decoded),
        Err(direct) => match value {
            Value::String(raw) => serde_json::from_str(raw).map_err(|_| CoerceError::Decode(direct)),
            _ => Err(CoerceError::Decode(direct))
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping"
    }
}

fn mismatch(expected: &'static str, value: &Value) -> CoerceError {
    CoerceError::Mismatch {
        expected,
        found: kind_of(value)
    }
}

fn parse_literal<T>(literal: &str, expected: &'static str) -> Result<T, CoerceError>
where
    T: FromStr,
    T::Err: Display
{
    literal.parse::<T>().map_err(|err| CoerceError::Parse {
        expected,
        literal: literal.to_string(),
        reason: err.to_string()
    })
}

/// Parses a float literal, rejecting finite text that overflows the target.
/// Spelled-out infinities (`inf`, `-infinity`) are kept.
fn finite_literal<T>(literal: &str, expected: &'static str) -> Result<T, CoerceError>
where
    T: FromStr + Into<f64> + Copy,
    T::Err: Display
{
    let parsed: T = parse_literal(literal, expected)?;
    let spelled_infinite = literal.to_ascii_lowercase().contains("inf");
    if parsed.into().is_infinite() && !spelled_infinite {
        return Err(CoerceError::OutOfRange {
            expected,
            value: literal.to_string()
        });
    }
    Ok(parsed)
}

fn integer_from_number<T>(number: &Number, expected: &'static str) -> Result<T, CoerceError>
where
    T: TryFrom<u64> + TryFrom<i64>
{
    let out_of_range = || CoerceError::OutOfRange {
        expected,
        value: number.to_string()
    };

    if let Some(unsigned) = number.as_u64() {
        return T::try_from(unsigned).map_err(|_| out_of_range());
    }
    if let Some(signed) = number.as_i64() {
        return T::try_from(signed).map_err(|_| out_of_range());
    }

    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0.0 => {
            if float >= 0.0 && float < u64::MAX as f64 {
                T::try_from(float as u64).map_err(|_| out_of_range())
            } else if float < 0.0 && float >= i64::MIN as f64 {
                T::try_from(float as i64).map_err(|_| out_of_range())
            } else {
                Err(out_of_range())
            }
        }
        _ => Err(CoerceError::Parse {
            expected,
            literal: number.to_string(),
            reason: "fractional number".to_string()
        })
    }
}

impl Coerce for String {
    const EXPECTED: &'static str = "string";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(mismatch(Self::EXPECTED, other))
        }
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        Ok(literal.to_string())
    }
}

impl Coerce for PathBuf {
    const EXPECTED: &'static str = "path";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(s) => Ok(PathBuf::from(s)),
            other => Err(mismatch(Self::EXPECTED, other))
        }
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        Ok(PathBuf::from(literal))
    }
}

impl Coerce for bool {
    const EXPECTED: &'static str = "bool";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => parse_literal(s.trim(), Self::EXPECTED),
            other => Err(mismatch(Self::EXPECTED, other))
        }
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        parse_literal(literal, Self::EXPECTED)
    }
}

impl Coerce for char {
    const EXPECTED: &'static str = "char";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(s) => parse_literal(s, Self::EXPECTED),
            other => Err(mismatch(Self::EXPECTED, other))
        }
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        parse_literal(literal, Self::EXPECTED)
    }
}

macro_rules! coerce_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Coerce for $ty {
            const EXPECTED: &'static str = stringify!($ty);

            fn coerce(value: &Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Number(number) => integer_from_number(number, Self::EXPECTED),
                    Value::String(raw) => parse_literal(raw.trim(), Self::EXPECTED),
                    other => Err(mismatch(Self::EXPECTED, other))
                }
            }

            fn parse_default(literal: &str) -> Result<Self, CoerceError> {
                parse_literal(literal, Self::EXPECTED)
            }
        }
    )*};
}

coerce_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! coerce_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Coerce for $ty {
            const EXPECTED: &'static str = stringify!($ty);

            fn coerce(value: &Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Number(number) => {
                        let wide = number.as_f64().ok_or_else(|| mismatch(Self::EXPECTED, value))?;
                        let narrowed = wide as $ty;
                        if narrowed.is_infinite() {
                            return Err(CoerceError::OutOfRange {
                                expected: Self::EXPECTED,
                                value: number.to_string()
                            });
                        }
                        Ok(narrowed)
                    }
                    Value::String(raw) => parse_literal(raw.trim(), Self::EXPECTED),
                    other => Err(mismatch(Self::EXPECTED, other))
                }
            }

            fn parse_default(literal: &str) -> Result<Self, CoerceError> {
                parse_literal(literal, Self::EXPECTED)
            }
        }
    )*};
}

coerce_float!(f32, f64);

impl Coerce for Value {
    const EXPECTED: &'static str = "value";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        Ok(value.clone())
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        Ok(Value::String(literal.to_string()))
    }
}

impl<T: Coerce> Coerce for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::coerce(other).map(Some)
        }
    }

    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        T::parse_default(literal).map(Some)
    }
}

impl<T: DeserializeOwned> Coerce for Vec<T> {
    const EXPECTED: &'static str = "sequence";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        decode(value)
    }

    /// Comma-separated literal; every piece decodes as a string, so only
    /// string-like element types accept defaults.
    fn parse_default(literal: &str) -> Result<Self, CoerceError> {
        literal
            .split(',')
            .map(|piece| T::deserialize(Value::String(piece.to_string())).map_err(CoerceError::from))
            .collect()
    }
}

impl<T: DeserializeOwned> Coerce for HashMap<String, T> {
    const EXPECTED: &'static str = "mapping";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        decode(value)
    }
}

impl<T: DeserializeOwned> Coerce for BTreeMap<String, T> {
    const EXPECTED: &'static str = "mapping";

    fn coerce(value: &Value) -> Result<Self, CoerceError> {
        decode(value)
    }
}

/// Make serde types usable as bindable leaf fields.
///
/// Values decode through `serde` (with the JSON re-decode of string content);
/// default literals decode from a plain string, which suits unit-variant enums.
///
/// ```
/// use confluent::{Bind, bind_leaf};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, PartialEq)]
/// #[serde(rename_all = "lowercase")]
/// enum Level {
///     #[default]
///     Info,
///     Debug,
/// }
///
/// bind_leaf!(Level);
///
/// #[derive(Default, Bind)]
/// struct Log {
///     #[bind(default = "debug")]
///     level: Level,
/// }
/// ```
#[macro_export]
macro_rules! bind_leaf {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Coerce for $ty {
            const EXPECTED: &'static str = stringify!($ty);

            fn coerce(value: &$crate::Value) -> ::core::result::Result<Self, $crate::CoerceError> {
                $crate::coerce::decode(value)
            }

            fn parse_default(literal: &str) -> ::core::result::Result<Self, $crate::CoerceError> {
                $crate::coerce::decode(&$crate::Value::String(literal.to_string()))
            }
        }

        impl $crate::BindField for $ty {
            fn bind_value(
                &mut self,
                key: &str,
                value: &$crate::Value
            ) -> ::core::result::Result<(), $crate::BindError> {
                $crate::bind::bind_leaf_value(self, key, value)
            }

            fn bind_default(&mut self, literal: &str) -> ::core::result::Result<(), $crate::CoerceError> {
                *self = <$ty as $crate::Coerce>::parse_default(literal)?;
                Ok(())
            }
        }
    )+};
}
