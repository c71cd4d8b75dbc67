use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Serialize, Serializer};

/// Rendering used for missing cells in on-screen tables.
pub const MISSING_DISPLAY: &str = "<NA>";

const NA_TOKENS: &[&str] = &[
    "na", "n/a", "nan", "-nan", "null", "none", "#n/a", "#na", "<na>", "-1.#ind", "1.#qnan",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text form used by exports; missing cells become empty fields.
    pub fn as_field(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => boolean_label(*b).to_string(),
        }
    }

    /// Text form used by on-screen tables.
    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => MISSING_DISPLAY.to_string(),
            other => other.as_field(),
        }
    }

    fn float_key(value: f64) -> u64 {
        if value == 0.0 { 0 } else { value.to_bits() }
    }
}

// Floats compare by bit pattern (with signed zeros folded) so rows can be
// hashed for duplicate detection.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => Value::float_key(*a) == Value::float_key(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => {}
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => Value::float_key(*f).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

pub fn boolean_label(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Integral floats keep a trailing `.0` so exported columns stay recognisably
/// floating point.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn is_missing_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    NA_TOKENS.contains(&lowered.as_str())
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Converts a raw cell into a value of the given column type. Cells that do
/// not fit the type become missing.
pub fn parse_typed_value(raw: &str, ty: ColumnType) -> Value {
    if is_missing_token(raw) {
        return Value::Missing;
    }
    let trimmed = raw.trim();
    match ty {
        ColumnType::Integer => trimmed.parse().map(Value::Integer).unwrap_or(Value::Missing),
        ColumnType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Missing),
        ColumnType::Boolean => parse_boolean(trimmed)
            .map(Value::Boolean)
            .unwrap_or(Value::Missing),
        ColumnType::Text => Value::Text(raw.to_string()),
    }
}

/// Tallies how many cells of a column fit each candidate type.
#[derive(Debug, Clone, Default)]
pub struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
}

impl TypeCandidate {
    pub fn observe(&mut self, raw: &str) {
        if is_missing_token(raw) {
            return;
        }
        let trimmed = raw.trim();
        self.non_empty += 1;
        if trimmed.parse::<i64>().is_ok() {
            self.integer_matches += 1;
        }
        if trimmed.parse::<f64>().is_ok() {
            self.float_matches += 1;
        }
        if parse_boolean(trimmed).is_some() {
            self.boolean_matches += 1;
        }
    }

    pub fn decide(&self) -> ColumnType {
        if self.non_empty == 0 {
            ColumnType::Text
        } else if self.integer_matches == self.non_empty {
            ColumnType::Integer
        } else if self.float_matches == self.non_empty {
            ColumnType::Float
        } else if self.boolean_matches == self.non_empty {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }
}
