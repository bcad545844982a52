use std::fmt;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

// ---------------------------------------------------------------------------
// Column dtype
// ---------------------------------------------------------------------------

/// Coarse dtype tag of a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDtype {
    Integer,
    Float,
    Other,
}

impl ColumnDtype {
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnDtype::Integer,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => ColumnDtype::Float,
            _ => ColumnDtype::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnDtype::Integer | ColumnDtype::Float)
    }
}

impl fmt::Display for ColumnDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDtype::Integer => write!(f, "integer"),
            ColumnDtype::Float => write!(f, "float"),
            ColumnDtype::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// AxisRange – closed numeric interval on one axis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Intersect with `outer`. Bounds lying entirely outside collapse onto
    /// the nearest edge of `outer`.
    pub fn clamp_to(&self, outer: &AxisRange) -> AxisRange {
        let min = self.min.clamp(outer.min, outer.max);
        let max = self.max.clamp(outer.min, outer.max);
        AxisRange { min, max }
    }

    /// Grow by `fraction` of the span on both sides; degenerate ranges get a
    /// unit half-width so they remain drawable.
    pub fn padded(&self, fraction: f64) -> AxisRange {
        let span = self.span();
        if span.abs() < f64::EPSILON {
            return AxisRange::new(self.min - 1.0, self.max + 1.0);
        }
        AxisRange::new(self.min - span * fraction, self.max + span * fraction)
    }

    /// Min/max over the finite values of `values`.
    pub fn of_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<AxisRange> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        (min <= max).then_some(AxisRange { min, max })
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &AxisRange) -> AxisRange {
        AxisRange::new(self.min.min(other.min), self.max.max(other.max))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Recognised X-axis column labels; never offered as Y candidates.
pub const X_AXIS_LABELS: [&str; 2] = ["SimTime", "DatTime"];

/// One loaded data file held as an Arrow record batch.
///
/// Replaced wholesale on every load; never mutated in place. Arrow guarantees
/// that every column of the batch has the same length.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    source: PathBuf,
}

impl Dataset {
    pub fn new(batch: RecordBatch, source: impl Into<PathBuf>) -> Self {
        Self {
            batch,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// All column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn dtype(&self, name: &str) -> Option<ColumnDtype> {
        let schema = self.batch.schema();
        let field = schema.field_with_name(name).ok()?;
        Some(ColumnDtype::from_arrow(field.data_type()))
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.dtype(name).is_some_and(ColumnDtype::is_numeric)
    }

    /// Integer/float columns, in file order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .filter(|f| ColumnDtype::from_arrow(f.data_type()).is_numeric())
            .map(|f| f.name().clone())
            .collect()
    }

    /// Columns offered in the Y-axis dropdowns: numeric, and not one of the
    /// X-axis labels.
    pub fn y_candidates(&self) -> Vec<String> {
        self.numeric_columns()
            .into_iter()
            .filter(|c| !X_AXIS_LABELS.contains(&c.as_str()))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// A numeric column widened to `f64`; nulls become NaN.
    /// `None` for unknown or non-numeric columns.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        if !self.is_numeric(name) {
            return None;
        }
        let array = self.column(name)?;
        let widened = cast(array, &DataType::Float64).ok()?;
        let floats = widened.as_any().downcast_ref::<Float64Array>()?;
        Some(
            floats
                .iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect(),
        )
    }

    /// Min/max of a numeric column, ignoring NaN.
    pub fn extent(&self, name: &str) -> Option<AxisRange> {
        let values = self.column_values(name)?;
        AxisRange::of_values(&values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};

    use super::*;

    fn sample() -> Dataset {
        let schema = Schema::new(vec![
            Field::new("SimTime", DataType::Int64, false),
            Field::new("A", DataType::Float64, false),
            Field::new("label", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![3, 1, 2])) as ArrayRef,
                Arc::new(Float64Array::from(vec![0.5, f64::NAN, -1.5])) as ArrayRef,
                Arc::new(StringArray::from(vec!["x", "y", "z"])) as ArrayRef,
            ],
        )
        .unwrap();
        Dataset::new(batch, "sample.dat")
    }

    #[test]
    fn inventory_excludes_non_numeric_and_axis_columns() {
        let ds = sample();
        assert_eq!(ds.column_names(), vec!["SimTime", "A", "label"]);
        assert_eq!(ds.numeric_columns(), vec!["SimTime", "A"]);
        assert_eq!(ds.y_candidates(), vec!["A"]);
        assert_eq!(ds.dtype("label"), Some(ColumnDtype::Other));
        assert_eq!(ds.dtype("missing"), None);
    }

    #[test]
    fn integer_columns_widen_to_f64() {
        let ds = sample();
        assert_eq!(ds.column_values("SimTime"), Some(vec![3.0, 1.0, 2.0]));
        assert!(ds.column_values("label").is_none());
    }

    #[test]
    fn extent_skips_nan() {
        let ds = sample();
        assert_eq!(ds.extent("A"), Some(AxisRange::new(-1.5, 0.5)));
        assert_eq!(ds.extent("SimTime"), Some(AxisRange::new(1.0, 3.0)));
    }

    #[test]
    fn clamp_never_leaves_outer_range() {
        let outer = AxisRange::new(0.0, 10.0);
        assert_eq!(
            AxisRange::new(-5.0, 4.0).clamp_to(&outer),
            AxisRange::new(0.0, 4.0)
        );
        assert_eq!(
            AxisRange::new(12.0, 15.0).clamp_to(&outer),
            AxisRange::new(10.0, 10.0)
        );
    }
}
