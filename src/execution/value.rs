//! Runtime values for dry runs, printed the way Python prints them.

use std::fmt;

use crate::language::Constant;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    None,
    Tuple(Vec<Value>),
    List(Vec<Value>),
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Value {
        match constant {
            Constant::Integer(value) => Value::Integer(*value),
            Constant::Float(value) => Value::Float(*value),
            Constant::String(value) => Value::String(value.clone()),
            Constant::Boolean(value) => Value::Boolean(*value),
            Constant::None => Value::None,
        }
    }
}

/// Either kind of number, with booleans counting as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_float(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::Boolean(_) => "bool",
            Value::None => "NoneType",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::String(value) => !value.is_empty(),
            Value::Boolean(value) => *value,
            Value::None => false,
            Value::Tuple(items) | Value::List(items) => !items.is_empty(),
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(value) => Some(Number::Integer(*value)),
            Value::Boolean(value) => Some(Number::Integer(*value as i64)),
            Value::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    /// Python's repr(), used for the items inside containers.
    pub fn repr(&self) -> String {
        match self {
            Value::String(value) => {
                if value.contains('\'') && !value.contains('"') {
                    format!("\"{}\"", value)
                } else {
                    format!(
                        "'{}'",
                        value
                            .replace('\\', "\\\\")
                            .replace('\'', "\\'")
                            .replace('\n', "\\n")
                    )
                }
            }
            _ => self.to_string(),
        }
    }

    /// Equality as Python's `==` sees it: numbers compare by value across
    /// int, float, and bool.
    pub fn equals(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Integer(a)), Some(Number::Integer(b))) => a == b,
            (Some(a), Some(b)) => a.as_float() == b.as_float(),
            _ => match (self, other) {
                (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => {
                    a.len() == b.len()
                        && a.iter()
                            .zip(b)
                            .all(|(x, y)| x.equals(y))
                }
                _ => self == other,
            },
        }
    }
}

pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // 1e+16, 1.5e-05
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn join(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::repr)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", format_float(*value)),
            Value::String(value) => write!(f, "{}", value),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
            Value::None => write!(f, "None"),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join(items)),
            Value::List(items) => write!(f, "[{}]", join(items)),
        }
    }
}
