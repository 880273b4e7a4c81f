//! Typed conversion of cell values
//!
//! Null converts to the target type's empty value (`""`, `0`, `0.0`,
//! `false`, `None`, `Decimal::ZERO`). Text is parsed; a malformed string is a
//! `ConversionError` wrapping the parser's own error.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::frame::{Value, ValueType};

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A value could not be converted to the requested type
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Text did not parse as the target type
    #[error("cannot parse '{text}' as {target}: {source}")]
    Parse {
        text: String,
        target: &'static str,
        #[source]
        source: BoxedSource,
    },

    /// Numeric value does not fit the target type
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    /// No conversion exists between these types
    #[error("cannot convert {from} to {target}")]
    Unsupported { from: ValueType, target: &'static str },
}

impl ConversionError {
    fn parse(text: &str, target: &'static str, source: impl Into<BoxedSource>) -> Self {
        ConversionError::Parse {
            text: text.to_string(),
            target,
            source: source.into(),
        }
    }

    fn unsupported(value: &Value, target: &'static str) -> Self {
        ConversionError::Unsupported {
            from: value.value_type(),
            target,
        }
    }
}

/// Types a cell can be read as
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl FromValue for Option<Value> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok((!value.is_null()).then(|| value.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(match value {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(0),
            Value::Integer(i) => Ok(*i),
            Value::Float(f) => {
                let t = f.trunc();
                if t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64 {
                    Ok(t as i64)
                } else {
                    Err(ConversionError::OutOfRange {
                        value: f.to_string(),
                        target: "i64",
                    })
                }
            }
            Value::Boolean(b) => Ok(i64::from(*b)),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| ConversionError::parse(s, "i64", e)),
            Value::Timestamp(_) => Err(ConversionError::unsupported(value, "i64")),
        }
    }
}

macro_rules! narrow_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    let wide = i64::from_value(value)?;
                    <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                        value: wide.to_string(),
                        target: stringify!($t),
                    })
                }
            }
        )*
    };
}

narrow_int!(i8, i16, i32);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| ConversionError::parse(s, "f64", e)),
            Value::Timestamp(_) => Err(ConversionError::unsupported(value, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(Decimal::ZERO),
            Value::Integer(i) => Ok(Decimal::from(*i)),
            Value::Float(f) => Decimal::try_from(*f).map_err(|_| ConversionError::OutOfRange {
                value: f.to_string(),
                target: "decimal",
            }),
            Value::Boolean(b) => Ok(Decimal::from(i64::from(*b))),
            Value::Text(s) => {
                let t = s.trim();
                t.parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(t))
                    .map_err(|e| ConversionError::parse(s, "decimal", e))
            }
            Value::Timestamp(_) => Err(ConversionError::unsupported(value, "decimal")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(false),
            Value::Boolean(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Text(s) => match s.trim() {
                "1" => Ok(true),
                "0" => Ok(false),
                t => t
                    .to_ascii_lowercase()
                    .parse::<bool>()
                    .map_err(|e| ConversionError::parse(s, "bool", e)),
            },
            Value::Timestamp(_) => Err(ConversionError::unsupported(value, "bool")),
        }
    }
}

impl FromValue for Option<DateTime<Utc>> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            Value::Timestamp(t) => Ok(Some(*t)),
            // Integers are epoch milliseconds
            Value::Integer(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .map(Some)
                .ok_or_else(|| ConversionError::OutOfRange {
                    value: ms.to_string(),
                    target: "timestamp",
                }),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| ConversionError::parse(s, "timestamp", e)),
            Value::Float(_) | Value::Boolean(_) => {
                Err(ConversionError::unsupported(value, "timestamp"))
            }
        }
    }
}

impl FromValue for Option<NaiveDate> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => {
                let s = s.trim();
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return Ok(Some(date));
                }
                DateTime::parse_from_rfc3339(s)
                    .map(|t| Some(t.with_timezone(&Utc).date_naive()))
                    .map_err(|e| ConversionError::parse(s, "date", e))
            }
            other => Ok(Option::<DateTime<Utc>>::from_value(other)?.map(|t| t.date_naive())),
        }
    }
}
