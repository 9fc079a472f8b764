//! Declarative record layouts shared by every reader.
//!
//! A [`Schema`] is an ordered list of named fields, each with a numeric
//! [`FieldKind`]. The same type describes a parameter header, a diagnostic
//! table row, and a profile or spectrum row.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Float,
    Integer,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
        }
    }

    /// Parse one token as this kind. Floats accept Fortran `D` exponents.
    pub fn parse(self, token: &str) -> Option<Value> {
        match self {
            Self::Float => parse_float(token).map(Value::Float),
            Self::Integer => token.trim().parse::<i64>().ok().map(Value::Integer),
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

pub(crate) fn parse_float(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Ok(value) = token.parse::<f64>() {
        return Some(value);
    }
    if token.contains(['d', 'D']) {
        return token.replace(['d', 'D'], "E").parse::<f64>().ok();
    }
    None
}

/// A single typed scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Logical(bool),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Float(_) => Some(FieldKind::Float),
            Self::Integer(_) => Some(FieldKind::Integer),
            Self::Logical(_) | Self::Text(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            Self::Logical(_) | Self::Text(_) => None,
        }
    }

    /// Integers, and floats holding an exact integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Logical(value) => Some(*value),
            _ => None,
        }
    }

    /// Convert to `kind`, or `None` when that would lose information.
    pub fn coerce(&self, kind: FieldKind) -> Option<Value> {
        match kind {
            FieldKind::Float => self.as_f64().map(Value::Float),
            FieldKind::Integer => self.as_i64().map(Value::Integer),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Logical(true) => f.write_str(".true."),
            Self::Logical(false) => f.write_str(".false."),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldKind)>,
        S: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(name, kind)| Field::new(name, kind))
                .collect(),
        }
    }

    /// A schema where every field is a float.
    pub fn floats(names: &[&str]) -> Self {
        Self::from_pairs(names.iter().map(|name| (*name, FieldKind::Float)))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Prepend `dims` float columns named `k0..k{dims-1}`.
    pub fn with_index_columns(&self, dims: usize) -> Self {
        let mut fields = index_column_names(dims)
            .into_iter()
            .map(|name| Field::new(name, FieldKind::Float))
            .collect::<Vec<_>>();
        fields.extend(self.fields.iter().cloned());
        Self { fields }
    }

    /// Split a whitespace-delimited line and parse every token per field.
    ///
    /// The error string names the offending column; callers attach the path
    /// and line number.
    pub fn parse_record(&self, line: &str) -> Result<Vec<Value>, String> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() != self.fields.len() {
            return Err(format!(
                "expected {} columns, found {}",
                self.fields.len(),
                tokens.len()
            ));
        }

        tokens
            .iter()
            .zip(&self.fields)
            .map(|(token, field)| {
                field.kind.parse(token).ok_or_else(|| {
                    format!(
                        "column '{}' expects {} but found '{}'",
                        field.name, field.kind, token
                    )
                })
            })
            .collect()
    }
}

pub fn index_column_names(dims: usize) -> Vec<String> {
    (0..dims).map(|index| format!("k{index}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, Schema, Value, parse_float};

    #[test]
    fn float_tokens_accept_fortran_exponents() {
        assert_eq!(parse_float("1.5D-03"), Some(1.5e-3));
        assert_eq!(parse_float("-2.0d+02"), Some(-200.0));
        assert_eq!(parse_float("3.25E+00"), Some(3.25));
        assert_eq!(parse_float("abc"), None);
    }

    #[test]
    fn integer_kind_rejects_fractional_tokens() {
        assert_eq!(FieldKind::Integer.parse("128"), Some(Value::Integer(128)));
        assert_eq!(FieldKind::Integer.parse("1.5"), None);
        assert_eq!(FieldKind::Float.parse("128"), Some(Value::Float(128.0)));
    }

    #[test]
    fn coercion_refuses_lossy_conversions() {
        assert_eq!(
            Value::Float(64.0).coerce(FieldKind::Integer),
            Some(Value::Integer(64))
        );
        assert_eq!(Value::Float(64.5).coerce(FieldKind::Integer), None);
        assert_eq!(
            Value::Integer(3).coerce(FieldKind::Float),
            Some(Value::Float(3.0))
        );
        assert_eq!(Value::Logical(true).coerce(FieldKind::Float), None);
    }

    #[test]
    fn record_parsing_checks_width_and_types() {
        let schema = Schema::from_pairs([
            ("istep", FieldKind::Integer),
            ("t", FieldKind::Float),
        ]);

        assert_eq!(
            schema.parse_record("  10   0.5 "),
            Ok(vec![Value::Integer(10), Value::Float(0.5)])
        );
        assert_eq!(
            schema.parse_record("10"),
            Err("expected 2 columns, found 1".to_string())
        );
        assert_eq!(
            schema.parse_record("ten 0.5"),
            Err("column 'istep' expects integer but found 'ten'".to_string())
        );
    }

    #[test]
    fn index_columns_are_prepended_in_order() {
        let schema = Schema::floats(&["energy_u"]).with_index_columns(2);
        let names = schema.names().collect::<Vec<_>>();
        assert_eq!(names, vec!["k0", "k1", "energy_u"]);
    }

    #[test]
    fn float_display_round_trips() {
        let value = Value::Float(0.1 + 0.2);
        let reparsed = parse_float(&value.to_string()).expect("display should reparse");
        assert_eq!(reparsed, 0.1 + 0.2);
        assert_eq!(Value::Float(100.0).to_string(), "100.0");
    }
}
