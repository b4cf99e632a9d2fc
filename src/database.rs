use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::sqlite::{cell_to_text, ColumnDescriptor, ResultRow, RowBatch, SqlQuery, SqliteConfig};
use crate::statement;

/// An open SQLite database file.
///
/// The connection is released when the handle is dropped. Use [`Database::close`]
/// to observe close errors.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `path`, creating the file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "can't open database");
            Error::Open {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        info!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Open {
            path: ":memory:".to_string(),
            source: e,
        })?;
        Ok(Self { conn, path: None })
    }

    /// Open the configured file and create any declared table that is missing.
    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        let db = Self::open(&config.db_path)?;
        for table in &config.tables {
            if db.table_exists(&table.name)? {
                debug!(table = %table.name, "table already exists");
                continue;
            }
            db.create_table(&table.name, &table.columns)?;
        }
        Ok(db)
    }

    /// Path of the file backing this database, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute one raw SQL statement that returns no rows.
    pub fn exec(&self, sql: &str) -> Result<()> {
        debug!(sql, "executing statement");
        self.conn
            .execute_batch(sql)
            .map_err(|e| self.execute_failed(sql, e))
    }

    /// Execute a statement with bound parameters, returning the affected row count.
    pub fn execute(&self, query: &SqlQuery) -> Result<usize> {
        debug!(
            sql = %query.statement,
            params = query.params.values.len(),
            "executing statement"
        );
        self.conn
            .execute(&query.statement, params_from_iter(query.params.values.iter()))
            .map_err(|e| self.execute_failed(&query.statement, e))
    }

    /// Run a query, invoking `callback` once per result row with every cell
    /// rendered as text.
    pub fn for_each_row<F>(&self, sql: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(ResultRow),
    {
        debug!(sql, "running query");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| self.execute_failed(sql, e))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([]).map_err(|e| self.execute_failed(sql, e))?;
        while let Some(row) = rows.next().map_err(|e| self.execute_failed(sql, e))? {
            let mut result = ResultRow::new();
            for (i, name) in names.iter().enumerate() {
                let cell = row.get_ref(i).map_err(|e| self.execute_failed(sql, e))?;
                result.insert(name.clone(), cell_to_text(cell));
            }
            callback(result);
        }
        Ok(())
    }

    /// Check if a table exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        const SQL: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";
        let count: i64 = self
            .conn
            .query_row(SQL, [table], |row| row.get(0))
            .map_err(|e| self.execute_failed(SQL, e))?;
        Ok(count > 0)
    }

    /// Create `table` with the given columns.
    pub fn create_table(&self, table: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        let sql = statement::create_table_sql(table, columns)?;
        self.exec(&sql)?;
        info!(table, columns = columns.len(), "table created");
        Ok(())
    }

    /// Insert rows given as caller-formatted literal lists, one entry per row.
    ///
    /// `columns` is the comma-joined column list (`"ID,NAME,AGE"`); text values in
    /// each row must already be quoted.
    pub fn insert_values<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &str,
        value_rows: &[S],
    ) -> Result<()> {
        let sql = statement::insert_sql(table, columns, value_rows)?;
        self.exec(&sql)
    }

    /// Insert a single caller-formatted row.
    pub fn insert_value(&self, table: &str, columns: &str, value_row: &str) -> Result<()> {
        self.insert_values(table, columns, &[value_row])
    }

    /// Insert every row of a typed batch, returning the number of rows inserted.
    ///
    /// A batch that binds more values than SQLite allows in one statement is split
    /// into several statements run under a savepoint, so the call still inserts all
    /// rows or none.
    pub fn insert_batch(&self, table: &str, batch: &RowBatch) -> Result<usize> {
        let queries =
            statement::insert_batch_queries(table, batch, statement::MAX_BOUND_PARAMETERS)?;
        if let [query] = queries.as_slice() {
            return self.execute(query);
        }

        debug!(table, statements = queries.len(), "splitting batch insert");
        self.exec("SAVEPOINT insert_batch")?;
        let inserted = queries
            .iter()
            .try_fold(0, |total, query| self.execute(query).map(|n| total + n));
        match inserted {
            Ok(total) => {
                self.exec("RELEASE insert_batch")?;
                Ok(total)
            }
            Err(e) => {
                self.exec("ROLLBACK TO insert_batch; RELEASE insert_batch")?;
                Err(e)
            }
        }
    }

    /// Select every row of `table`.
    pub fn select_all(&self, table: &str) -> Result<Vec<ResultRow>> {
        let mut rows = Vec::new();
        self.for_each_row(&statement::select_all_sql(table), |row| rows.push(row))?;
        debug!(table, rows = rows.len(), "selected rows");
        Ok(rows)
    }

    /// Close the connection, reporting any error from the engine.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| Error::Close(e))?;
        if let Some(path) = path {
            info!(path = %path.display(), "database closed");
        }
        Ok(())
    }

    fn execute_failed(&self, sql: &str, e: rusqlite::Error) -> Error {
        error!(sql, error = %e, "SQL error");
        Error::execute(sql, e)
    }
}
