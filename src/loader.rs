use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{SalesRecord, SalesTable};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid table name `{0}`")]
    InvalidTable(String),
    #[error("row {row}: column `{column}` is missing or has an unsupported type")]
    BadColumn { row: usize, column: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
    Sqlite,
}

impl SourceFormat {
    /// `.csv` and `.parquet` (optionally followed by `.gz`/`.gzip`) by name, SQLite otherwise.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let name = name
            .strip_suffix(".gzip")
            .or_else(|| name.strip_suffix(".gz"))
            .unwrap_or(&name);

        if name.ends_with(".csv") {
            SourceFormat::Csv
        } else if name.ends_with(".parquet") || name.ends_with(".pq") {
            SourceFormat::Parquet
        } else {
            SourceFormat::Sqlite
        }
    }
}

/// Column layout of the grocery sales export.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    store_nbr: String,
    family: String,
    sales: f64,
}

pub fn load_table(path: &Path, table_name: &str) -> Result<SalesTable, LoadError> {
    let format = SourceFormat::detect(path);

    let records = match format {
        SourceFormat::Csv => {
            let reader = csv::Reader::from_path(path)?;
            read_csv(reader)?
        }
        SourceFormat::Parquet => read_parquet(File::open(path)?)?,
        SourceFormat::Sqlite => {
            let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            read_sqlite(&conn, table_name)?
        }
    };

    info!(path = %path.display(), ?format, rows = records.len(), "sales table loaded");
    Ok(SalesTable::new(records))
}

pub fn read_sqlite(conn: &Connection, table_name: &str) -> Result<Vec<SalesRecord>, LoadError> {
    if table_name.is_empty()
        || !table_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(LoadError::InvalidTable(table_name.to_string()));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT date, CAST(store_nbr AS TEXT), family, sales
         FROM {table_name}
         ORDER BY date"
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok(SalesRecord {
            date: row.get(0)?,
            store_id: row.get(1)?,
            product_family: row.get(2)?,
            sales: row.get(3)?,
        })
    })?;

    let mut records = Vec::new();
    for row in rows {
        push_valid(&mut records, row?);
    }
    Ok(records)
}

pub fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<SalesRecord>, LoadError> {
    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        push_valid(
            &mut records,
            SalesRecord {
                date: row.date,
                store_id: row.store_nbr,
                product_family: row.family,
                sales: row.sales,
            },
        );
    }
    Ok(records)
}

/// Reads the `date, store_nbr, family, sales` columns of a parquet file.
/// Page compression (gzip, snappy) is handled by the reader.
pub fn read_parquet(file: File) -> Result<Vec<SalesRecord>, LoadError> {
    let reader = SerializedFileReader::new(file)?;
    let mut records = Vec::new();

    for (index, row) in reader.get_row_iter(None)?.enumerate() {
        let row = row?;
        let (mut date, mut store_id, mut family, mut sales) = (None, None, None, None);

        for (name, field) in row.get_column_iter() {
            match name.as_str() {
                "date" => date = field_date(field),
                "store_nbr" => store_id = field_text(field),
                "family" => family = field_text(field),
                "sales" => sales = field_number(field),
                _ => {}
            }
        }

        let bad = |column| LoadError::BadColumn { row: index, column };
        push_valid(
            &mut records,
            SalesRecord {
                date: date.ok_or_else(|| bad("date"))?,
                store_id: store_id.ok_or_else(|| bad("store_nbr"))?,
                product_family: family.ok_or_else(|| bad("family"))?,
                sales: sales.ok_or_else(|| bad("sales"))?,
            },
        );
    }
    Ok(records)
}

fn field_date(field: &Field) -> Option<NaiveDate> {
    match field {
        Field::Date(days) => {
            NaiveDate::from_ymd_opt(1970, 1, 1).map(|epoch| epoch + Duration::days(i64::from(*days)))
        }
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms).map(|t| t.date_naive()),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us).map(|t| t.date_naive()),
        Field::Str(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s.as_str()), "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn field_text(field: &Field) -> Option<String> {
    match field {
        Field::Str(s) => Some(s.clone()),
        Field::Int(v) => Some(v.to_string()),
        Field::Long(v) => Some(v.to_string()),
        _ => None,
    }
}

fn field_number(field: &Field) -> Option<f64> {
    match field {
        Field::Double(v) => Some(*v),
        Field::Float(v) => Some(f64::from(*v)),
        Field::Int(v) => Some(f64::from(*v)),
        Field::Long(v) => Some(*v as f64),
        _ => None,
    }
}

fn push_valid(records: &mut Vec<SalesRecord>, record: SalesRecord) {
    if !record.sales.is_finite() || record.sales < 0.0 {
        warn!(
            date = %record.date,
            store = %record.store_id,
            family = %record.product_family,
            sales = record.sales,
            "skipping row with invalid sales"
        );
        return;
    }
    records.push(record);
}
