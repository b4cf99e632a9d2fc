//! SQL text builders. Nothing here touches a connection.
//!
//! Table and column names are spliced in verbatim; they are never quoted or escaped.

use crate::error::{Error, Result};
use crate::sqlite::{ColumnDescriptor, Params, RowBatch, SqlQuery, Value};

const CREATE_TABLE: &str = "CREATE TABLE ";
const INSERT_INTO: &str = "INSERT INTO ";
const PRIMARY_KEY: &str = "PRIMARY KEY";
const NOT_NULL: &str = "NOT NULL";
const VALUES: &str = "VALUES";
const SELECT_ALL: &str = "SELECT * FROM ";

/// `CREATE TABLE <table> (<col> <TYPE>[ PRIMARY KEY][ NOT NULL],...)`
pub fn create_table_sql(table: &str, columns: &[ColumnDescriptor]) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::validation(format!("table {table} must declare at least one column")));
    }
    let defs: Vec<String> = columns
        .iter()
        .map(|col| {
            let mut def = format!("{} {}", col.name, col.data_type.sql_name());
            if col.is_primary_key {
                def.push(' ');
                def.push_str(PRIMARY_KEY);
            }
            if !col.is_nullable {
                def.push(' ');
                def.push_str(NOT_NULL);
            }
            def
        })
        .collect();
    Ok(format!("{CREATE_TABLE}{table} ({})", defs.join(",")))
}

/// `INSERT INTO <table> (<columns>) VALUES (<row1>),(<row2>),...`
///
/// Each entry of `value_rows` is the caller-formatted literal list for one row; text
/// values must already be quoted (see [`quote_literal`]).
pub fn insert_sql<S: AsRef<str>>(table: &str, columns: &str, value_rows: &[S]) -> Result<String> {
    if value_rows.is_empty() {
        return Err(Error::validation(format!(
            "insert into {table} needs at least one row"
        )));
    }
    let rows: Vec<String> = value_rows
        .iter()
        .map(|row| format!("({})", row.as_ref()))
        .collect();
    Ok(format!("{INSERT_INTO}{table} ({columns}) {VALUES} {}", rows.join(",")))
}

/// Highest `?N` SQLite accepts in one statement.
pub const MAX_BOUND_PARAMETERS: usize = 32766;

/// Multi-row inserts for a typed batch, with every cell bound as a parameter
/// converted by its column's declared type.
///
/// Rows are split so no statement binds more than `max_params` values; a batch that
/// fits yields a single statement. Every cell is converted before anything is
/// returned, so a bad cell anywhere rejects the whole batch.
pub fn insert_batch_queries(
    table: &str,
    batch: &RowBatch,
    max_params: usize,
) -> Result<Vec<SqlQuery>> {
    if batch.is_empty() {
        return Err(Error::validation(format!(
            "insert into {table} needs at least one row"
        )));
    }
    let columns = batch.columns();
    let rows_per_statement = max_params / columns.len();
    if rows_per_statement == 0 {
        return Err(Error::validation(format!(
            "insert into {table} binds {} columns per row, more than the limit of {max_params}",
            columns.len()
        )));
    }
    let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
    let names = names.join(",");

    let mut queries = Vec::with_capacity(batch.len().div_ceil(rows_per_statement));
    for chunk in batch.rows().chunks(rows_per_statement) {
        let mut params = Params::new();
        let mut groups = Vec::with_capacity(chunk.len());
        for row in chunk {
            let mut placeholders = Vec::with_capacity(columns.len());
            for ((name, data_type), cell) in columns.iter().zip(row) {
                let value = Value::from_cell(*data_type, cell).ok_or_else(|| {
                    Error::validation(format!(
                        "value {cell:?} for column {name} is not a valid {}",
                        data_type.sql_name()
                    ))
                })?;
                params = params.with_value(value);
                placeholders.push(format!("?{}", params.values.len()));
            }
            groups.push(format!("({})", placeholders.join(",")));
        }
        let statement = format!("{INSERT_INTO}{table} ({names}) {VALUES} {}", groups.join(","));
        queries.push(SqlQuery::new(statement).with_params(params));
    }
    Ok(queries)
}

/// `SELECT * FROM <table>`
pub fn select_all_sql(table: &str) -> String {
    format!("{SELECT_ALL}{table}")
}

/// Wrap text in single quotes for use in a literal value list, doubling any
/// embedded quote.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    quoted.push_str(&value.replace('\'', "''"));
    quoted.push('\'');
    quoted
}
