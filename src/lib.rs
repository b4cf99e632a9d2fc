//! Thin SQLite helper layer.
//!
//! # Intention
//!
//! - Open a database file, create tables from column descriptors, insert rows and
//!   read whole tables back as column-name to text mappings.
//! - Persist an append-only sequence of ledger records in a fixed `ledger` table.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Every call is synchronous and issues a single statement; there are no
//!   transactions, pooling or retries.
//! - Table and column names are used verbatim. Typed inserts bind their values;
//!   string-form inserts trust the caller's literal lists.

pub mod database;
pub mod error;
pub mod ledger;
pub mod sqlite;
pub mod statement;

pub use database::Database;
pub use error::{Error, Result};
pub use ledger::{ledger_schema, LedgerRecord, LEDGER_TABLE};
pub use sqlite::{
    ColumnDescriptor, DataType, Params, ResultRow, RowBatch, SqlQuery, SqliteConfig, TableSpec,
    Value,
};
pub use statement::quote_literal;
