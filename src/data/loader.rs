use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::model::{CellValue, Month, SalesDataset, TransactionRow, Weekday};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Anything that stops the source table from becoming a [`SalesDataset`].
/// All variants are fatal for the dataset being loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unreadable Arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{header}' (or '{name}')")]
    MissingColumn {
        header: &'static str,
        name: &'static str,
    },

    #[error("row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{} contains no rows", .0.display())]
    Empty(PathBuf),
}

// ---------------------------------------------------------------------------
// Column catalogue
// ---------------------------------------------------------------------------

/// The columns a transaction table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Location,
    Year,
    Week,
    Weekday,
    Month,
    Hour,
    Product,
    Family,
    Quantity,
    UnitPrice,
    Total,
    ServiceId,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Location,
        Column::Year,
        Column::Week,
        Column::Weekday,
        Column::Month,
        Column::Hour,
        Column::Product,
        Column::Family,
        Column::Quantity,
        Column::UnitPrice,
        Column::Total,
        Column::ServiceId,
    ];

    /// Header used by the cleaned point-of-sale export.
    pub fn header(self) -> &'static str {
        match self {
            Column::Location => "Local",
            Column::Year => "Año",
            Column::Week => "Semana",
            Column::Weekday => "Día Semana",
            Column::Month => "Mes",
            Column::Hour => "Hora",
            Column::Product => "Producto",
            Column::Family => "Familia",
            Column::Quantity => "Cantidad",
            Column::UnitPrice => "Precio Unitario",
            Column::Total => "Total",
            Column::ServiceId => "Servicio",
        }
    }

    /// snake_case alias.
    pub fn name(self) -> &'static str {
        match self {
            Column::Location => "location",
            Column::Year => "year",
            Column::Week => "week",
            Column::Weekday => "weekday",
            Column::Month => "month",
            Column::Hour => "hour",
            Column::Product => "product",
            Column::Family => "family",
            Column::Quantity => "quantity",
            Column::UnitPrice => "unit_price",
            Column::Total => "total",
            Column::ServiceId => "service_id",
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Column::Location
                | Column::Weekday
                | Column::Month
                | Column::Product
                | Column::Family
                | Column::ServiceId
        )
    }

    pub fn matches(self, header: &str) -> bool {
        let header = header.trim_start_matches('\u{feff}').trim();
        header == self.header() || header.eq_ignore_ascii_case(self.name())
    }

    fn missing(self) -> LoadError {
        LoadError::MissingColumn {
            header: self.header(),
            name: self.name(),
        }
    }
}

/// Position of every required column within `headers`.
fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Result<[usize; 12], LoadError> {
    let mut positions = [0usize; 12];
    for column in Column::ALL {
        positions[column as usize] = headers
            .iter()
            .position(|h| column.matches(h.as_ref()))
            .ok_or_else(|| column.missing())?;
    }
    Ok(positions)
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated with a header row
/// * `.parquet` – one column per field, any integer/float/string encoding
/// * `.json`    – `[{ "Local": "...", "Año": 2019, ... }, ...]`
pub fn load_file(path: &Path) -> Result<SalesDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let dataset = SalesDataset::from_rows(rows);
    if dataset.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    log::debug!("parsed {} rows from {}", dataset.len(), path.display());
    Ok(dataset)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Row typing (shared by every format)
// ---------------------------------------------------------------------------

/// Turn one source row into a [`TransactionRow`].  `cell` yields the raw value
/// of a column for this row; `row_no` is 1-based and only used in errors.
fn build_row(
    row_no: usize,
    cell: impl Fn(Column) -> CellValue,
) -> Result<TransactionRow, LoadError> {
    let invalid = |column: Column, value: &CellValue| LoadError::InvalidValue {
        row: row_no,
        column: column.header(),
        value: value.to_string(),
    };
    let text = |column: Column| {
        let value = cell(column);
        value.as_text().ok_or_else(|| invalid(column, &value))
    };
    let integer = |column: Column, range: RangeInclusive<i64>| {
        let value = cell(column);
        value
            .as_i64()
            .filter(|n| range.contains(n))
            .ok_or_else(|| invalid(column, &value))
    };
    let number = |column: Column| {
        let value = cell(column);
        value
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(column, &value))
    };

    let weekday = {
        let value = cell(Column::Weekday);
        value
            .as_text()
            .and_then(|label| Weekday::parse(&label))
            .ok_or_else(|| invalid(Column::Weekday, &value))?
    };
    let month = {
        let value = cell(Column::Month);
        value
            .as_text()
            .and_then(|label| Month::parse(&label))
            .ok_or_else(|| invalid(Column::Month, &value))?
    };

    Ok(TransactionRow {
        location: text(Column::Location)?,
        year: integer(Column::Year, i32::MIN as i64..=i32::MAX as i64)? as i32,
        week: integer(Column::Week, 1..=53)? as u8,
        weekday,
        month,
        hour: integer(Column::Hour, 0..=23)? as u8,
        product: text(Column::Product)?,
        family: text(Column::Family)?,
        quantity: number(Column::Quantity)?,
        unit_price: number(Column::UnitPrice)?,
        total: number(Column::Total)?,
        service_id: {
            let value = cell(Column::ServiceId);
            value
                .as_identifier()
                .ok_or_else(|| invalid(Column::ServiceId, &value))?
        },
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the export's column names, one line item per
/// record.  Extra columns (client, discount, index) are ignored.
fn load_csv(path: &Path) -> Result<Vec<TransactionRow>, LoadError> {
    let file = std::fs::File::open(path).map_err(io_error(path))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let positions = resolve_columns(&headers)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = build_row(i + 1, |column| {
            CellValue::String(record.get(positions[column as usize]).unwrap_or("").to_string())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<TransactionRow>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = match root {
        JsonValue::Array(records) => records,
        other => {
            return Err(LoadError::InvalidValue {
                row: 0,
                column: "<root>",
                value: format!("expected an array of records, found {}", json_kind(&other)),
            })
        }
    };

    if let Some(JsonValue::Object(first)) = records.first() {
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        resolve_columns(&keys)?;
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or_else(|| LoadError::InvalidValue {
            row: i + 1,
            column: "<record>",
            value: json_kind(record).to_string(),
        })?;
        rows.push(build_row(i + 1, |column| json_field(obj, column))?);
    }
    Ok(rows)
}

fn json_field(obj: &Map<String, JsonValue>, column: Column) -> CellValue {
    obj.iter()
        .find(|(key, _)| column.matches(key))
        .map(|(_, value)| json_to_cell(value))
        .unwrap_or(CellValue::Null)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

fn json_kind(val: &JsonValue) -> &'static str {
    match val {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
///
/// Each required column is cast to Utf8 (text columns) or Float64 (numeric
/// columns) so dictionary-encoded categoricals and any integer width work.
fn load_parquet(path: &Path) -> Result<Vec<TransactionRow>, LoadError> {
    let file = std::fs::File::open(path).map_err(io_error(path))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    // Checked against the file schema so a zero-row file still reports
    // missing columns.
    let positions = {
        let schema = builder.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        resolve_columns(&names)?
    };
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let columns = Column::ALL
            .iter()
            .map(|&column| typed_column(batch.column(positions[column as usize]), column))
            .collect::<Result<Vec<_>, _>>()?;

        let offset = rows.len();
        for row in 0..batch.num_rows() {
            rows.push(build_row(offset + row + 1, |column| {
                columns[column as usize].cell(row)
            })?);
        }
    }
    Ok(rows)
}

/// A required column after casting to the type its typing rule expects.
enum TypedColumn {
    Text(StringArray),
    Number(Float64Array),
}

impl TypedColumn {
    fn cell(&self, row: usize) -> CellValue {
        match self {
            TypedColumn::Text(arr) if !arr.is_null(row) => {
                CellValue::String(arr.value(row).to_string())
            }
            TypedColumn::Number(arr) if !arr.is_null(row) => CellValue::Float(arr.value(row)),
            _ => CellValue::Null,
        }
    }
}

fn typed_column(array: &ArrayRef, column: Column) -> Result<TypedColumn, LoadError> {
    let target = if column.is_text() {
        DataType::Utf8
    } else {
        DataType::Float64
    };
    let casted = cast(array.as_ref(), &target)?;
    let unexpected = || LoadError::InvalidValue {
        row: 0,
        column: column.header(),
        value: format!("column of type {:?}", array.data_type()),
    };

    if column.is_text() {
        casted
            .as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .map(TypedColumn::Text)
            .ok_or_else(unexpected)
    } else {
        casted
            .as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .map(TypedColumn::Number)
            .ok_or_else(unexpected)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str =
        "Local,Año,Semana,Día Semana,Mes,Hora,Producto,Familia,Cantidad,Precio Unitario,Total,Servicio,Cliente";

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_export_csv_with_calendar_types() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
             Valencia,2019,12,tuesday,March,21,Pad Thai,NOODLES,2,9.5,19.0,1001,\n\
             Valencia,2019,12,Tuesday,March,21,Agua,BEBIDAS,1,2.0,2.0,1001.0,anon\n"
        );
        let path = write_file(&dir, "sales.csv", &body);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.rows[0];
        assert_eq!(first.location, "Valencia");
        assert_eq!(first.year, 2019);
        assert_eq!(first.week, 12);
        assert_eq!(first.weekday, Weekday::Tuesday);
        assert_eq!(first.month, Month::March);
        assert_eq!(first.hour, 21);
        assert_eq!(first.total, 19.0);
        assert_eq!(first.service_id, "1001");
        assert_eq!(ds.rows[1].service_id, "1001");
        assert_eq!(ds.families, vec!["NOODLES", "BEBIDAS"]);
    }

    #[test]
    fn accepts_snake_case_headers() {
        let dir = tempfile::tempdir().unwrap();
        let body = "location,year,week,weekday,month,hour,product,family,quantity,unit_price,total,service_id\n\
                    Pozuelo,2020,32,Sunday,August,15,Nasi Goreng,RICE BOWL,1,11.0,11.0,S-9\n";
        let path = write_file(&dir, "sales.csv", body);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.rows[0].weekday, Weekday::Sunday);
        assert_eq!(ds.rows[0].service_id, "S-9");
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Local,Año,Semana,Día Semana,Mes,Hora,Producto,Familia,Cantidad,Precio Unitario,Servicio\n";
        let path = write_file(&dir, "sales.csv", body);

        match load_file(&path) {
            Err(LoadError::MissingColumn { header, .. }) => assert_eq!(header, "Total"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn unknown_weekday_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\nValencia,2019,12,Lunes,March,21,Pad Thai,NOODLES,2,9.5,19.0,1001,\n");
        let path = write_file(&dir, "sales.csv", &body);

        match load_file(&path) {
            Err(LoadError::InvalidValue { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Día Semana");
                assert_eq!(value, "Lunes");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn week_out_of_range_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\nValencia,2019,54,Monday,March,21,Pad Thai,NOODLES,2,9.5,19.0,1001,\n");
        let path = write_file(&dir, "sales.csv", &body);
        assert!(matches!(
            load_file(&path),
            Err(LoadError::InvalidValue { column: "Semana", .. })
        ));
    }

    #[test]
    fn missing_file_and_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_file(&dir.path().join("absent.csv")),
            Err(LoadError::Io { .. })
        ));
        assert!(matches!(
            load_file(&dir.path().join("sales.xlsx")),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sales.csv", &format!("{HEADER}\n"));
        assert!(matches!(load_file(&path), Err(LoadError::Empty(_))));
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"[
            {"Local": "Barcelona", "Año": 2020, "Semana": 3, "Día Semana": "Friday",
             "Mes": "January", "Hora": 14, "Producto": "Pad Thai", "Familia": "NOODLES",
             "Cantidad": 1, "Precio Unitario": 10.5, "Total": 10.5, "Servicio": 77}
        ]"#;
        let path = write_file(&dir, "sales.json", body);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.rows[0].weekday, Weekday::Friday);
        assert_eq!(ds.rows[0].service_id, "77");
        assert_eq!(ds.rows[0].unit_price, 10.5);
    }

    #[test]
    fn loads_parquet_with_integer_and_string_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.parquet");

        let text = |name: &str| Field::new(name, DataType::Utf8, false);
        let int = |name: &str| Field::new(name, DataType::Int64, false);
        let float = |name: &str| Field::new(name, DataType::Float64, false);
        let schema = Arc::new(Schema::new(vec![
            text("Local"),
            int("Año"),
            int("Semana"),
            text("Día Semana"),
            text("Mes"),
            int("Hora"),
            text("Producto"),
            text("Familia"),
            int("Cantidad"),
            float("Precio Unitario"),
            float("Total"),
            int("Servicio"),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["Mallorca", "Mallorca"])),
            Arc::new(Int64Array::from(vec![2019, 2019])),
            Arc::new(Int64Array::from(vec![22, 23])),
            Arc::new(StringArray::from(vec!["Saturday", "Sunday"])),
            Arc::new(StringArray::from(vec!["June", "June"])),
            Arc::new(Int64Array::from(vec![21, 15])),
            Arc::new(StringArray::from(vec!["Pad Thai", "Nasi Goreng"])),
            Arc::new(StringArray::from(vec!["NOODLES", "RICE BOWL"])),
            Arc::new(Int64Array::from(vec![2, 1])),
            Arc::new(Float64Array::from(vec![12.0, 11.5])),
            Arc::new(Float64Array::from(vec![24.0, 11.5])),
            Arc::new(Int64Array::from(vec![5, 6])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[1].weekday, Weekday::Sunday);
        assert_eq!(ds.rows[1].week, 23);
        assert_eq!(ds.rows[0].quantity, 2.0);
        assert_eq!(ds.rows[0].service_id, "5");
    }

    #[test]
    fn zero_row_parquet_reports_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("Local", DataType::Utf8, false),
            Field::new("Año", DataType::Int64, false),
            Field::new("Semana", DataType::Int64, false),
        ]));
        let file = std::fs::File::create(&path).unwrap();
        ArrowWriter::try_new(file, schema, None).unwrap().close().unwrap();

        match load_file(&path) {
            Err(LoadError::MissingColumn { header, .. }) => assert_eq!(header, "Día Semana"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn json_root_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sales.json", r#"{"rows": []}"#);
        assert!(matches!(
            load_file(&path),
            Err(LoadError::InvalidValue { row: 0, column: "<root>", .. })
        ));
    }
}
