use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::Dataset;
use crate::error::LoadError;

/// Rows echoed to the debug log after a successful load.
const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a data file into a [`Dataset`]. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – any flat Parquet table
/// * anything else      – space-delimited text with a header row (`.dat`)
///
/// Has no side effects beyond logging; the caller decides what to replace.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        _ => load_dat(path)?,
    };
    if dataset.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    log_preview(&dataset);
    Ok(dataset)
}

fn log_preview(dataset: &Dataset) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for name in dataset.column_names() {
        if let Some(dtype) = dataset.dtype(&name) {
            log::debug!("column {name:?}: {dtype}");
        }
    }
    let head = dataset.batch().slice(0, dataset.len().min(PREVIEW_ROWS));
    match pretty_format_batches(&[head]) {
        Ok(table) => log::debug!("{}:\n{table}", dataset.source().display()),
        Err(e) => log::debug!("preview unavailable: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Space-delimited text loader
// ---------------------------------------------------------------------------

/// Layout:
///
/// ```text
/// SimTime DatTime  Pressure Temp
/// 0       0.0      101.3    20
/// 1       0.5      101.1    21
/// ```
///
/// Runs of spaces are one delimiter. Every row must have as many fields as
/// the header.
fn load_dat(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut headers: Option<Vec<String>> = None;
    let mut cells: Vec<Vec<String>> = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let fields: Vec<&str> = record
            .iter()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }

        match &headers {
            None => {
                cells = vec![Vec::new(); fields.len()];
                headers = Some(fields.iter().map(|f| f.to_string()).collect());
            }
            Some(h) => {
                if fields.len() != h.len() {
                    return Err(LoadError::Malformed {
                        path: path.to_path_buf(),
                        line: record.position().map(|p| p.line()).unwrap_or(0),
                        expected: h.len(),
                        found: fields.len(),
                    });
                }
                for (column, value) in cells.iter_mut().zip(fields) {
                    column.push(value.to_string());
                }
            }
        }
    }

    let headers = headers.ok_or_else(|| LoadError::NoHeader(path.to_path_buf()))?;

    let mut fields = Vec::with_capacity(headers.len());
    let mut arrays = Vec::with_capacity(headers.len());
    for (name, column) in headers.iter().zip(&cells) {
        let array = infer_column(column);
        fields.push(Field::new(name, array.data_type().clone(), false));
        arrays.push(array);
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    Ok(Dataset::new(batch, path))
}

/// Pick the narrowest dtype every cell parses as: integer, then float, then text.
fn infer_column(cells: &[String]) -> ArrayRef {
    if let Some(ints) = parse_all::<i64>(cells) {
        return Arc::new(Int64Array::from(ints));
    }
    if let Some(floats) = parse_all::<f64>(cells) {
        return Arc::new(Float64Array::from(floats));
    }
    Arc::new(StringArray::from(cells.to_vec()))
}

fn parse_all<T: std::str::FromStr>(cells: &[String]) -> Option<Vec<T>> {
    cells.iter().map(|c| c.parse::<T>().ok()).collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table. Written by Pandas (`df.to_parquet()`) or
/// Polars (`df.write_parquet()`); every column becomes a dataset column.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(parquet_err)?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;
    Ok(Dataset::new(batch, path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::DataType;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::ColumnDtype;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_space_delimited_with_dtypes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "run.dat",
            "SimTime DatTime  A    B   tag\n\
             0 0.0  1.5  10  on\n\
             1   0.5  2.5  20  off\n\
             \n\
             2 1.0  3.5  30 on\n",
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names(), vec!["SimTime", "DatTime", "A", "B", "tag"]);
        assert_eq!(ds.dtype("SimTime"), Some(ColumnDtype::Integer));
        assert_eq!(ds.dtype("DatTime"), Some(ColumnDtype::Float));
        assert_eq!(ds.dtype("tag"), Some(ColumnDtype::Other));
        assert_eq!(ds.y_candidates(), vec!["A", "B"]);
        assert_eq!(ds.column_values("B"), Some(vec![10.0, 20.0, 30.0]));
    }

    #[test]
    fn inconsistent_row_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.dat", "SimTime A B\n0 1 2\n1 2\n");
        match load_file(&path) {
            Err(LoadError::Malformed {
                line,
                expected,
                found,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.dat", "SimTime A\n");
        assert!(matches!(load_file(&path), Err(LoadError::Empty(_))));

        let blank = write_file(&dir, "blank.dat", "\n\n");
        assert!(matches!(load_file(&blank), Err(LoadError::NoHeader(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.dat")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn loads_parquet_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("SimTime", DataType::Int64, false),
            Field::new("A", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![0, 1, 2, 3])) as ArrayRef,
                Arc::new(Float64Array::from(vec![0.0, 0.5, 1.0, 1.5])) as ArrayRef,
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.y_candidates(), vec!["A"]);
        assert_eq!(ds.column_values("A"), Some(vec![0.0, 0.5, 1.0, 1.5]));
    }
}
