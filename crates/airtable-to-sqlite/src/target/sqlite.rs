//! SQLite destination implementation.
//!
//! Implements the `Destination` trait on top of a single-connection sqlx pool.
//! Foreign key enforcement is switched off on the connection: constraints are
//! recorded in the schema but rows can be written in any order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info};

use crate::core::identifier::{quote_ident, quote_list};
use crate::core::schema::{ColumnInfo, ForeignKey, TableDef};
use crate::core::traits::Destination;
use crate::core::value::{Batch, SqlValue};
use crate::error::{ExportError, Result};

/// Default upper bound on bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER).
pub const SQLITE_MAX_PARAMS: usize = 32766;

/// SQLite destination database.
pub struct SqliteDestination {
    pool: SqlitePool,
    max_params: usize,
}

/// Column as read back from `pragma_table_info`, with its primary key position.
struct TableColumn {
    name: String,
    data_type: String,
    /// 1-based position in the primary key, 0 when not part of it.
    pk: i64,
}

impl SqliteDestination {
    /// Create a fresh database file, replacing any existing one.
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed existing database {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(false);
        let destination = Self::connect(options).await?;

        info!("Created SQLite database {:?}", path);
        Ok(destination)
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(false);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection: in-memory databases are per connection, and the run is sequential.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            max_params: SQLITE_MAX_PARAMS,
        })
    }

    /// Override the per-statement parameter limit.
    pub fn with_max_params(mut self, max_params: usize) -> Self {
        self.max_params = max_params.max(1);
        self
    }

    /// Get a clone of the underlying connection pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Generate CREATE TABLE DDL.
    fn generate_ddl(table: &TableDef) -> Result<String> {
        let mut defs = table
            .columns
            .iter()
            .map(|c| Ok(format!("{} {}", quote_ident(&c.name)?, c.column_type.sql_type())))
            .collect::<Result<Vec<_>>>()?;

        if !table.primary_key.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", quote_list(&table.primary_key)?));
        }

        Ok(format!(
            "CREATE TABLE {} (\n    {}\n)",
            quote_ident(&table.name)?,
            defs.join(",\n    ")
        ))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<TableColumn>> {
        let rows: Vec<SqliteRow> =
            sqlx::query("SELECT name, type, pk FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| TableColumn {
                name: row.get::<String, _>("name"),
                data_type: row.get::<String, _>("type"),
                pk: row.get::<i64, _>("pk"),
            })
            .collect())
    }

    /// Check a new key against the current schema and the table's existing keys.
    async fn validate_foreign_key(&self, fk: &ForeignKey, existing: &[ForeignKey]) -> Result<()> {
        let columns = self.table_columns(&fk.table).await?;
        if columns.is_empty() {
            return Err(ExportError::foreign_key(
                &fk.table,
                format!("table '{}' does not exist ({})", fk.table, fk),
            ));
        }
        if !columns.iter().any(|c| c.name == fk.column) {
            return Err(ExportError::foreign_key(
                &fk.table,
                format!("no such column: {}", fk.column),
            ));
        }

        let other_columns = self.table_columns(&fk.other_table).await?;
        if other_columns.is_empty() {
            return Err(ExportError::foreign_key(
                &fk.table,
                format!("referenced table '{}' does not exist ({})", fk.other_table, fk),
            ));
        }
        if !other_columns.iter().any(|c| c.name == fk.other_column) {
            return Err(ExportError::foreign_key(
                &fk.table,
                format!("no such column: {}.{}", fk.other_table, fk.other_column),
            ));
        }

        if existing.contains(fk) {
            return Err(ExportError::foreign_key(
                &fk.table,
                format!("foreign key already exists: {}", fk),
            ));
        }

        Ok(())
    }

    /// Statements recreating a table with the given foreign keys while keeping
    /// its columns, primary key and rows.
    async fn rebuild_statements(
        &self,
        table: &str,
        foreign_keys: &[ForeignKey],
        taken_names: &mut HashSet<String>,
    ) -> Result<Vec<String>> {
        let columns = self.table_columns(table).await?;

        let mut pk: Vec<&TableColumn> = columns.iter().filter(|c| c.pk > 0).collect();
        pk.sort_by_key(|c| c.pk);

        let mut defs = columns
            .iter()
            .map(|c| Ok(format!("{} {}", quote_ident(&c.name)?, c.data_type)))
            .collect::<Result<Vec<_>>>()?;
        if !pk.is_empty() {
            let pk_names: Vec<&str> = pk.iter().map(|c| c.name.as_str()).collect();
            defs.push(format!("PRIMARY KEY ({})", quote_list(&pk_names)?));
        }
        for fk in foreign_keys {
            defs.push(format!(
                "FOREIGN KEY({}) REFERENCES {}({})",
                quote_ident(&fk.column)?,
                quote_ident(&fk.other_table)?,
                quote_ident(&fk.other_column)?
            ));
        }

        let mut temp_name = format!("{}_new", table);
        let mut suffix = 1;
        while taken_names.contains(&temp_name) {
            suffix += 1;
            temp_name = format!("{}_new{}", table, suffix);
        }
        taken_names.insert(temp_name.clone());

        let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let column_list = quote_list(&column_names)?;
        let quoted_table = quote_ident(table)?;
        let quoted_temp = quote_ident(&temp_name)?;

        Ok(vec![
            format!("CREATE TABLE {} (\n    {}\n)", quoted_temp, defs.join(",\n    ")),
            format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                quoted_temp, column_list, column_list, quoted_table
            ),
            format!("DROP TABLE {}", quoted_table),
            format!("ALTER TABLE {} RENAME TO {}", quoted_temp, quoted_table),
        ])
    }

    fn bind_row<'args>(
        builder: &mut sqlx::query_builder::Separated<'_, 'args, Sqlite, &'static str>,
        row: &[SqlValue],
    ) {
        for value in row {
            match value {
                SqlValue::Null => builder.push_bind(Option::<String>::None),
                SqlValue::Bool(v) => builder.push_bind(*v),
                SqlValue::Integer(v) => builder.push_bind(*v),
                SqlValue::Real(v) => builder.push_bind(*v),
                SqlValue::Text(v) => builder.push_bind(v.clone()),
            };
        }
    }
}

#[async_trait]
impl Destination for SqliteDestination {
    async fn create_table(&self, table: &TableDef) -> Result<()> {
        let ddl = Self::generate_ddl(table)?;
        debug!("{}", ddl);
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn add_foreign_keys(&self, foreign_keys: &[ForeignKey]) -> Result<()> {
        let mut by_table: BTreeMap<&str, BTreeSet<&ForeignKey>> = BTreeMap::new();
        for fk in foreign_keys {
            by_table.entry(fk.table.as_str()).or_default().insert(fk);
        }

        let mut existing_by_table = BTreeMap::new();
        for (table, fks) in &by_table {
            let existing = self.foreign_keys(table).await?;
            for fk in fks {
                self.validate_foreign_key(fk, &existing).await?;
            }
            existing_by_table.insert(*table, existing);
        }

        // The pool has a single connection, so every schema read happens
        // before the transaction takes it.
        let mut taken_names: HashSet<String> = self.table_names().await?.into_iter().collect();
        let mut statements = Vec::new();
        for (table, fks) in by_table {
            let mut all = existing_by_table.remove(table).unwrap_or_default();
            all.extend(fks.into_iter().cloned());
            debug!("Adding foreign keys to {} ({} total)", table, all.len());
            statements.extend(self.rebuild_statements(table, &all, &mut taken_names).await?);
        }

        let mut tx = self.pool.begin().await?;
        for sql in &statements {
            debug!("{}", sql);
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn insert_batch(&self, table: &str, batch: &Batch) -> Result<u64> {
        if batch.is_empty() || batch.columns.is_empty() {
            return Ok(0);
        }

        let prefix = format!(
            "INSERT INTO {} ({}) ",
            quote_ident(table)?,
            quote_list(&batch.columns)?
        );
        let rows_per_statement = (self.max_params / batch.columns.len()).max(1);

        let mut written = 0u64;
        let mut tx = self.pool.begin().await?;
        for chunk in batch.rows.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(prefix.as_str());
            builder.push_values(chunk, |mut b, row| Self::bind_row(&mut b, row));
            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        debug!("Inserted {} rows into {}", written, table);
        Ok(written)
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(self
            .table_columns(table)
            .await?
            .into_iter()
            .map(|c| ColumnInfo {
                name: c.name,
                data_type: c.data_type,
                is_pk: c.pk > 0,
            })
            .collect())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"SELECT "table", "from", "to" FROM pragma_foreign_key_list(?) ORDER BY id, seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                ForeignKey::new(
                    table,
                    row.get::<String, _>("from"),
                    row.get::<String, _>("table"),
                    row.get::<Option<String>, _>("to").unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDef, ColumnType};

    async fn setup() -> SqliteDestination {
        let db = SqliteDestination::in_memory().await.unwrap();
        db.create_table(
            &TableDef::new(
                "My Table",
                vec![
                    ColumnDef::text("_id"),
                    ColumnDef::new("_createdTime", ColumnType::Timestamp),
                    ColumnDef::new("Amount", ColumnType::Real),
                    ColumnDef::new("Done", ColumnType::Boolean),
                ],
            )
            .with_primary_key(["_id"]),
        )
        .await
        .unwrap();
        db.create_table(&TableDef::new(
            "My Table_fld1",
            vec![ColumnDef::text("recordId"), ColumnDef::text("otherRecordId")],
        ))
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_table_and_columns() {
        let db = setup().await;

        let names = db.table_names().await.unwrap();
        assert!(names.contains(&"My Table".to_string()));
        assert!(db.table_exists("My Table_fld1").await.unwrap());
        assert!(!db.table_exists("Nope").await.unwrap());

        let columns = db.columns("My Table").await.unwrap();
        let summary: Vec<(&str, &str, bool)> = columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str(), c.is_pk))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("_id", "TEXT", true),
                ("_createdTime", "TEXT", false),
                ("Amount", "FLOAT", false),
                ("Done", "INTEGER", false),
            ]
        );
    }

    #[tokio::test]
    async fn test_insert_batch() {
        let db = setup().await;
        let mut batch = Batch::new(["_id", "_createdTime", "Amount", "Done"]);
        batch.push(vec![
            "rec1".into(),
            "2021-01-01T00:00:00.000Z".into(),
            SqlValue::Integer(3),
            SqlValue::Bool(true),
        ]);
        batch.push(vec!["rec2".into(), SqlValue::Null, SqlValue::Real(1.5), SqlValue::Null]);

        assert_eq!(db.insert_batch("My Table", &batch).await.unwrap(), 2);
        assert_eq!(db.insert_batch("My Table", &Batch::new(["_id"])).await.unwrap(), 0);

        let row = sqlx::query(r#"SELECT "Done", "Amount" FROM "My Table" WHERE "_id" = 'rec1'"#)
            .fetch_one(&db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("Done"), 1);
        assert_eq!(row.get::<f64, _>("Amount"), 3.0);
    }

    #[tokio::test]
    async fn test_insert_batch_is_chunked() {
        let db = setup().await.with_max_params(5);
        let mut batch = Batch::new(["recordId", "otherRecordId"]);
        for i in 0..7 {
            batch.push(vec![format!("rec{i}").into(), "recX".into()]);
        }
        assert_eq!(db.insert_batch("My Table_fld1", &batch).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_add_foreign_keys_keeps_rows_and_key() {
        let db = setup().await;
        let mut batch = Batch::new(["recordId", "otherRecordId"]);
        batch.push(vec!["rec1".into(), "rec2".into()]);
        db.insert_batch("My Table_fld1", &batch).await.unwrap();

        let fks = vec![
            ForeignKey::new("My Table_fld1", "recordId", "My Table", "_id"),
            ForeignKey::new("My Table_fld1", "otherRecordId", "My Table", "_id"),
        ];
        db.add_foreign_keys(&fks).await.unwrap();

        let mut found = db.foreign_keys("My Table_fld1").await.unwrap();
        found.sort();
        let mut expected = fks.clone();
        expected.sort();
        assert_eq!(found, expected);

        let count: i64 = sqlx::query(r#"SELECT COUNT(*) AS n FROM "My Table_fld1""#)
            .fetch_one(&db.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);

        // a second round adds to the existing constraints
        db.add_foreign_keys(&[ForeignKey::new("My Table", "_id", "My Table_fld1", "recordId")])
            .await
            .unwrap();
        assert_eq!(db.foreign_keys("My Table").await.unwrap().len(), 1);
        let pks: Vec<String> = db
            .columns("My Table")
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_pk)
            .map(|c| c.name)
            .collect();
        assert_eq!(pks, vec!["_id"]);
    }

    #[tokio::test]
    async fn test_add_foreign_key_to_missing_table_fails() {
        let db = setup().await;
        let err = db
            .add_foreign_keys(&[ForeignKey::new("My Table_fld1", "otherRecordId", "tbl999", "_id")])
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::ForeignKey { .. }));
        assert!(err.to_string().contains("tbl999"));
        // nothing was applied
        assert!(db.foreign_keys("My Table_fld1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_foreign_key_on_missing_column_fails() {
        let db = setup().await;
        let err = db
            .add_foreign_keys(&[ForeignKey::new("My Table", "nope", "My Table_fld1", "recordId")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such column: nope"));
    }

    #[tokio::test]
    async fn test_duplicate_foreign_key_fails() {
        let db = setup().await;
        let fk = ForeignKey::new("My Table_fld1", "recordId", "My Table", "_id");
        // duplicates within one call collapse
        db.add_foreign_keys(&[fk.clone(), fk.clone()]).await.unwrap();
        let err = db.add_foreign_keys(&[fk]).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Base 123.db");
        std::fs::write(&path, b"not a database").unwrap();

        let db = SqliteDestination::create(&path).await.unwrap();
        db.create_table(&TableDef::new("t", vec![ColumnDef::text("a")]))
            .await
            .unwrap();
        assert_eq!(db.table_names().await.unwrap(), vec!["t"]);
        db.close().await;
        assert!(path.exists());
    }
}
