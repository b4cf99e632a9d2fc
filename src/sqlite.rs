use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Core value types bound into SQLite statements
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Convert a text-encoded cell according to its column's declared type.
    ///
    /// Text cells are taken verbatim. In numeric columns a bare `NULL` (any case)
    /// binds as NULL, and an `INT` cell that is not an integer but still a number
    /// binds as a real, leaving the conversion to the column's affinity.
    /// Returns `None` when a numeric column receives text that is not a number.
    pub fn from_cell(data_type: DataType, cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        match data_type {
            DataType::Text => Some(Value::Text(cell.to_string())),
            _ if trimmed.eq_ignore_ascii_case("NULL") => Some(Value::Null),
            DataType::Integer => match trimmed.parse::<i64>() {
                Ok(i) => Some(Value::Integer(i)),
                Err(_) => parse_real(trimmed),
            },
            DataType::Real => parse_real(trimmed),
        }
    }
}

fn parse_real(cell: &str) -> Option<Value> {
    cell.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Real)
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Declared column type. Rendered as `INT`, `TEXT` or `REAL` in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "INT", alias = "INTEGER")]
    Integer,
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "REAL")]
    Real,
}

impl DataType {
    pub fn sql_name(self) -> &'static str {
        match self {
            DataType::Integer => "INT",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
        }
    }
}

/// One column of a table to be created.
///
/// Columns are `NOT NULL` unless marked nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary_key: false,
            is_nullable: false,
        }
    }

    /// Mark the column as the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Drop the implicit `NOT NULL` constraint
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }
}

/// Declared columns plus accumulated rows of text-encoded cells, inserted as
/// multi-row statements.
///
/// Every row has exactly one cell per declared column; `add_row` enforces this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    columns: Vec<(String, DataType)>,
    rows: Vec<Vec<String>>,
}

impl RowBatch {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, DataType)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. A row whose length differs from the column count is rejected
    /// and leaves the batch untouched.
    pub fn add_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::validation("row batch declares no columns"));
        }
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(Error::validation(format!(
                "row has {} values but the batch declares {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[(String, DataType)] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Positional parameter bindings for SQL queries
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: Vec<Value>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }
    /// Append a value for the next placeholder
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// SQL statement with typed parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: Params::new(),
        }
    }
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// One selected row: column name to the cell rendered as text.
pub type ResultRow = BTreeMap<String, String>;

/// Render a cell as text. NULL renders empty; reals follow [`real_to_text`].
pub(crate) fn cell_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => real_to_text(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Significant digits SQLite keeps when it turns a real into text.
const REAL_TEXT_DIGITS: usize = 15;

/// Format a real the way SQLite's `%!.15g` conversion does: 15 significant digits,
/// trailing zeros dropped but at least one digit after the point, exponent form
/// (`1.0e+15`, `2.5e-05`) below 1e-4 or from 1e15 up.
pub(crate) fn real_to_text(f: f64) -> String {
    if f.is_nan() {
        return String::new();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if f == 0.0 {
        return "0.0".to_string();
    }

    // Correctly rounded `d.dddddddddddddde<exp>`.
    let sci = format!("{:.*e}", REAL_TEXT_DIGITS - 1, f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');

    let mut out = String::with_capacity(REAL_TEXT_DIGITS + 8);
    if f < 0.0 {
        out.push('-');
    }
    if exp < -4 || exp >= REAL_TEXT_DIGITS as i32 {
        let (lead, rest) = digits.split_at(1);
        out.push_str(lead);
        out.push('.');
        out.push_str(if rest.is_empty() { "0" } else { rest });
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exp.abs()));
    } else if exp >= 0 {
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            out.push_str(digits);
            out.extend(std::iter::repeat('0').take(int_len - digits.len()));
            out.push_str(".0");
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    } else {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
        out.push_str(digits);
    }
    out
}

/// A table created at startup by [`crate::Database::from_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// SQLite database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Tables to create if they are missing
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and no tables
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            tables: Vec::new(),
        }
    }

    pub fn add_table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_batch() -> RowBatch {
        RowBatch::new([
            ("ID", DataType::Integer),
            ("NAME", DataType::Text),
            ("AGE", DataType::Integer),
            ("ADDRESS", DataType::Text),
            ("SALARY", DataType::Real),
        ])
    }

    #[test]
    fn test_add_row_matching_arity() {
        let mut batch = company_batch();
        batch.add_row(["5", "James", "31", "London", "23000"]).unwrap();
        assert_eq!(batch.len(), 1);
        batch.add_row(["6", "Kim", "22", "Seoul", "18000.5"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[1][1], "Kim");
    }

    #[test]
    fn test_add_row_wrong_arity_leaves_batch_unchanged() {
        let mut batch = company_batch();
        let err = batch.add_row(["1", "Paul", "32"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(batch.len(), 0);

        batch.add_row(["1", "Paul", "32", "California", "20000"]).unwrap();
        assert!(batch.add_row(["2", "Allen", "25", "Texas", "15000", "extra"]).is_err());
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_add_row_without_columns() {
        let mut batch = RowBatch::new(Vec::<(String, DataType)>::new());
        assert!(batch.add_row(Vec::<String>::new()).is_err());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_value_from_cell() {
        assert_eq!(Value::from_cell(DataType::Integer, " 31 "), Some(Value::Integer(31)));
        assert_eq!(Value::from_cell(DataType::Real, "20000.00"), Some(Value::Real(20000.0)));
        assert_eq!(
            Value::from_cell(DataType::Text, " London "),
            Some(Value::Text(" London ".to_string()))
        );
        assert_eq!(Value::from_cell(DataType::Integer, "3.5"), Some(Value::Real(3.5)));
        assert_eq!(Value::from_cell(DataType::Integer, "1e3"), Some(Value::Real(1000.0)));
        assert_eq!(Value::from_cell(DataType::Integer, "thirty"), None);
        assert_eq!(Value::from_cell(DataType::Real, " null "), Some(Value::Null));
        assert_eq!(Value::from_cell(DataType::Integer, "NULL"), Some(Value::Null));
        assert_eq!(
            Value::from_cell(DataType::Text, "NULL"),
            Some(Value::Text("NULL".to_string()))
        );
        assert_eq!(Value::from_cell(DataType::Real, "NaN"), None);
        assert_eq!(Value::from_cell(DataType::Real, "abc"), None);
    }

    #[test]
    fn test_cell_to_text() {
        assert_eq!(cell_to_text(ValueRef::Null), "");
        assert_eq!(cell_to_text(ValueRef::Integer(-7)), "-7");
        assert_eq!(cell_to_text(ValueRef::Real(23000.0)), "23000.0");
        assert_eq!(cell_to_text(ValueRef::Real(0.25)), "0.25");
        assert_eq!(cell_to_text(ValueRef::Real(1e20)), "1.0e+20");
        assert_eq!(cell_to_text(ValueRef::Text(b"James")), "James");
    }

    #[test]
    fn test_real_to_text() {
        assert_eq!(real_to_text(0.30000000000000004), "0.3");
        assert_eq!(real_to_text(1e15), "1.0e+15");
        assert_eq!(real_to_text(-1.5e20), "-1.5e+20");
        assert_eq!(real_to_text(123456789012345.6), "123456789012346.0");
        assert_eq!(real_to_text(999999999999999.0), "999999999999999.0");
        assert_eq!(real_to_text(20000.5), "20000.5");
        assert_eq!(real_to_text(0.0001), "0.0001");
        assert_eq!(real_to_text(0.000025), "2.5e-05");
        assert_eq!(real_to_text(1e-300), "1.0e-300");
        assert_eq!(real_to_text(-0.0), "0.0");
        assert_eq!(real_to_text(f64::INFINITY), "Inf");
    }

    #[test]
    fn test_column_descriptor_defaults() {
        let col = ColumnDescriptor::new("ADDRESS", DataType::Text);
        assert!(!col.is_primary_key);
        assert!(!col.is_nullable);
        let col = col.nullable();
        assert!(col.is_nullable);
        assert_eq!(DataType::Real.sql_name(), "REAL");
    }
}
