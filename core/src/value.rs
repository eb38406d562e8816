//! Value types for query results.
//!
//! Datums are the atomic values carried in result rows. Quarry supports the
//! scalar types Bool, Int4, Int8, Float8, Char(n) and Text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int4,
    Int8,
    Float8,
    /// Fixed-width character string of the given length.
    Char(u32),
    Text,
}

impl DataType {
    /// Resolve a SQL type name (case-insensitive).
    pub fn from_sql_name(name: &str, length: Option<u32>) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => DataType::Bool,
            "int" | "int4" | "integer" => DataType::Int4,
            "bigint" | "int8" => DataType::Int8,
            "float" | "float8" | "double" | "real" => DataType::Float8,
            "char" | "character" => DataType::Char(length.unwrap_or(1)),
            "text" | "varchar" | "string" => DataType::Text,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns true for the integer and floating point types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int4 | DataType::Int8 | DataType::Float8)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOLEAN"),
            DataType::Int4 => write!(f, "INT4"),
            DataType::Int8 => write!(f, "INT8"),
            DataType::Float8 => write!(f, "FLOAT8"),
            DataType::Char(n) => write!(f, "CHAR({})", n),
            DataType::Text => write!(f, "TEXT"),
        }
    }
}

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    /// Null/missing value.
    Null,
    Bool(bool),
    /// 32-bit signed integer.
    Int4(i32),
    /// 64-bit signed integer.
    Int8(i64),
    /// 64-bit floating point.
    Float8(f64),
    /// UTF-8 string (TEXT and CHAR columns).
    Text(String),
}

impl Datum {
    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a 32-bit integer. Int8 values are narrowed when they fit.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Datum::Int4(i) => Some(*i),
            Datum::Int8(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Get as a 64-bit integer.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Datum::Int4(i) => Some(*i as i64),
            Datum::Int8(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a float. Integers are widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Datum::Int4(i) => Some(*i as f64),
            Datum::Int8(i) => Some(*i as f64),
            Datum::Float8(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "NULL",
            Datum::Bool(_) => "BOOLEAN",
            Datum::Int4(_) => "INT4",
            Datum::Int8(_) => "INT8",
            Datum::Float8(_) => "FLOAT8",
            Datum::Text(_) => "TEXT",
        }
    }

    /// Compare values for sorting. Null sorts first; numeric types compare by value.
    /// Values of unrelated types return Equal (stable sort behavior).
    pub fn cmp_sortable(&self, other: &Datum) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Null, _) => Ordering::Less,
            (_, Datum::Null) => Ordering::Greater,
            (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
            (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
            (a, b) => match (a.as_long(), b.as_long()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => match (a.as_double(), b.as_double()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                },
            },
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int4(i) => write!(f, "{}", i),
            Datum::Int8(i) => write!(f, "{}", i),
            Datum::Float8(v) => write!(f, "{}", v),
            Datum::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Self {
        Datum::Int4(i)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Self {
        Datum::Int8(i)
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Datum::Float8(f)
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Datum::Null)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of columns describing a table or a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Create an empty schema (statements without output).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// Position of a column, matched case-insensitively.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// One row of datums, positionally aligned with a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Datum>,
}

impl Row {
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&Datum> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Datum> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Datum>> for Row {
    fn from(values: Vec<Datum>) -> Self {
        Self::new(values)
    }
}

/// Helper macro to build a [`Row`] from literal values.
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Row::new(vec![$($crate::Datum::from($value)),+])
    };
}
