//! Fixed `ledger` table holding an append-only sequence of ledger entries.
//!
//! The schema is an ordinary [`ColumnDescriptor`] list with `seq_no` as primary key,
//! so creation and insertion go through the same paths as any other table.

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{Error, Result};
use crate::sqlite::{ColumnDescriptor, DataType, ResultRow, RowBatch};

pub const LEDGER_TABLE: &str = "ledger";

const LEDGER_COLUMNS: [(&str, DataType); 10] = [
    ("seq_no", DataType::Integer),
    ("time", DataType::Integer),
    ("ledger_hash", DataType::Text),
    ("prev_ledger_hash", DataType::Text),
    ("data_hash", DataType::Text),
    ("state_hash", DataType::Text),
    ("patch_hash", DataType::Text),
    ("user_hash", DataType::Text),
    ("input_hash", DataType::Text),
    ("output_hash", DataType::Text),
];

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub seq_no: u64,
    pub time: u64,
    pub ledger_hash: String,
    pub prev_ledger_hash: String,
    pub data_hash: String,
    pub state_hash: String,
    pub patch_hash: String,
    pub user_hash: String,
    pub input_hash: String,
    pub output_hash: String,
}

impl LedgerRecord {
    /// Cells in column order, integers checked against SQLite's signed range.
    fn to_cells(&self) -> Result<Vec<String>> {
        Ok(vec![
            stored_integer("seq_no", self.seq_no)?,
            stored_integer("time", self.time)?,
            self.ledger_hash.clone(),
            self.prev_ledger_hash.clone(),
            self.data_hash.clone(),
            self.state_hash.clone(),
            self.patch_hash.clone(),
            self.user_hash.clone(),
            self.input_hash.clone(),
            self.output_hash.clone(),
        ])
    }

    /// Rebuild a record from a selected `ledger` row.
    pub fn from_row(row: &ResultRow) -> Result<Self> {
        Ok(Self {
            seq_no: integer_cell(row, "seq_no")?,
            time: integer_cell(row, "time")?,
            ledger_hash: text_cell(row, "ledger_hash")?,
            prev_ledger_hash: text_cell(row, "prev_ledger_hash")?,
            data_hash: text_cell(row, "data_hash")?,
            state_hash: text_cell(row, "state_hash")?,
            patch_hash: text_cell(row, "patch_hash")?,
            user_hash: text_cell(row, "user_hash")?,
            input_hash: text_cell(row, "input_hash")?,
            output_hash: text_cell(row, "output_hash")?,
        })
    }
}

fn stored_integer(column: &str, value: u64) -> Result<String> {
    i64::try_from(value)
        .map(|v| v.to_string())
        .map_err(|_| {
            Error::validation(format!("{column} {value} exceeds the SQLite integer range"))
        })
}

fn text_cell(row: &ResultRow, column: &str) -> Result<String> {
    row.get(column)
        .cloned()
        .ok_or_else(|| Error::validation(format!("ledger row has no {column} column")))
}

fn integer_cell(row: &ResultRow, column: &str) -> Result<u64> {
    let cell = text_cell(row, column)?;
    cell.parse().map_err(|_| {
        Error::validation(format!("ledger {column} {cell:?} is not an unsigned integer"))
    })
}

/// Column descriptors of the `ledger` table.
pub fn ledger_schema() -> Vec<ColumnDescriptor> {
    LEDGER_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, (name, data_type))| {
            let col = ColumnDescriptor::new(*name, *data_type);
            if i == 0 {
                col.primary_key()
            } else {
                col
            }
        })
        .collect()
}

impl Database {
    /// Create the `ledger` table.
    pub fn create_ledger_table(&self) -> Result<()> {
        self.create_table(LEDGER_TABLE, &ledger_schema())
    }

    /// Append one ledger record as a single-row insert.
    pub fn insert_ledger_row(&self, record: &LedgerRecord) -> Result<()> {
        let mut batch = RowBatch::new(LEDGER_COLUMNS);
        batch.add_row(record.to_cells()?)?;
        self.insert_batch(LEDGER_TABLE, &batch)?;
        Ok(())
    }

    /// Read back every ledger record in sequence order.
    pub fn select_ledger(&self) -> Result<Vec<LedgerRecord>> {
        let mut records = self
            .select_all(LEDGER_TABLE)?
            .iter()
            .map(LedgerRecord::from_row)
            .collect::<Result<Vec<_>>>()?;
        records.sort_by_key(|r| r.seq_no);
        Ok(records)
    }
}
