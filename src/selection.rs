use std::fmt;

use crate::data::model::{AxisRange, Dataset};
use crate::error::InvalidRangeError;

// ---------------------------------------------------------------------------
// Axis / view enumerations
// ---------------------------------------------------------------------------

/// The recognised X-axis columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XAxis {
    #[default]
    SimTime,
    DatTime,
}

impl XAxis {
    pub const ALL: [XAxis; 2] = [XAxis::SimTime, XAxis::DatTime];

    pub fn column(self) -> &'static str {
        match self {
            XAxis::SimTime => "SimTime",
            XAxis::DatTime => "DatTime",
        }
    }
}

impl fmt::Display for XAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Choice in the optional second Y dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SecondAxis {
    #[default]
    Unselected,
    /// Explicitly "no second series".
    Omit,
    Column(String),
}

impl SecondAxis {
    pub fn column(&self) -> Option<&str> {
        match self {
            SecondAxis::Column(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Plot,
    Histogram,
}

// ---------------------------------------------------------------------------
// Selection – everything the user has chosen
// ---------------------------------------------------------------------------

/// Mutable record of the user's choices. Created once at startup and reset
/// (never recreated) when a new file is loaded.
///
/// `zoom_range` is kept inside `original_range` by every mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub x_axis: XAxis,
    y_column_1: Option<String>,
    y_column_2: SecondAxis,
    zoom_range: AxisRange,
    original_range: AxisRange,
    /// Y axis locked while the X axis is zoomed or panned.
    pub box_zoom_enabled: bool,
    /// Raw text; parsed when consumed.
    pub vertical_marker: String,
    pub horizontal_marker: String,
    pub zero_filter_enabled: bool,
    pub active_view: ActiveView,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            x_axis: XAxis::default(),
            y_column_1: None,
            y_column_2: SecondAxis::Unselected,
            zoom_range: AxisRange::new(0.0, 0.0),
            original_range: AxisRange::new(0.0, 0.0),
            box_zoom_enabled: true,
            vertical_marker: String::new(),
            horizontal_marker: String::new(),
            zero_filter_enabled: false,
            active_view: ActiveView::Plot,
        }
    }
}

impl Selection {
    pub fn y_column_1(&self) -> Option<&str> {
        self.y_column_1.as_deref()
    }

    pub fn y_column_2(&self) -> &SecondAxis {
        &self.y_column_2
    }

    /// The second series to draw: a real column distinct from the first.
    /// A duplicate of `y_column_1` is treated as unselected.
    pub fn effective_y2(&self) -> Option<&str> {
        let y2 = self.y_column_2.column()?;
        (Some(y2) != self.y_column_1()).then_some(y2)
    }

    pub fn zoom_range(&self) -> AxisRange {
        self.zoom_range
    }

    pub fn original_range(&self) -> AxisRange {
        self.original_range
    }

    /// Start over for a freshly loaded dataset. Box-zoom, zero-filter, the X
    /// axis and the active tab are preferences and survive.
    pub fn reset_for_new_dataset(&mut self, original_range: AxisRange) {
        self.original_range = original_range;
        self.zoom_range = original_range;
        self.clear_markers();
        self.y_column_1 = None;
        self.y_column_2 = SecondAxis::Unselected;
    }

    /// Switch the X column. Its extent becomes the new reference range since
    /// the old bounds belong to a different domain.
    pub fn set_x_axis(&mut self, axis: XAxis, extent: AxisRange) {
        self.x_axis = axis;
        self.original_range = extent;
        self.zoom_range = extent;
    }

    /// Zoom the X domain. Inverted bounds are rejected; anything else is
    /// clamped to the dataset extent and the applied window returned.
    pub fn set_zoom(&mut self, min: f64, max: f64) -> Result<AxisRange, InvalidRangeError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(InvalidRangeError { min, max });
        }
        self.zoom_range = AxisRange::new(min, max).clamp_to(&self.original_range);
        Ok(self.zoom_range)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_range = self.original_range;
    }

    /// Accepts only numeric columns of `dataset`.
    pub fn set_y_column_1(&mut self, column: Option<String>, dataset: &Dataset) -> bool {
        if let Some(name) = &column {
            if !dataset.is_numeric(name) {
                log::warn!("ignoring Y column {name:?}: not a numeric column of the dataset");
                return false;
            }
        }
        self.y_column_1 = column;
        true
    }

    pub fn set_y_column_2(&mut self, choice: SecondAxis, dataset: &Dataset) -> bool {
        if let SecondAxis::Column(name) = &choice {
            if !dataset.is_numeric(name) {
                log::warn!("ignoring second Y column {name:?}: not a numeric column of the dataset");
                return false;
            }
        }
        self.y_column_2 = choice;
        true
    }

    /// Exchange the two Y columns; no-op unless the second one is a real column.
    pub fn swap_y_axes(&mut self) {
        let SecondAxis::Column(second) = &mut self.y_column_2 else {
            return;
        };
        let Some(first) = self.y_column_1.as_mut() else {
            return;
        };
        std::mem::swap(first, second);
    }

    pub fn clear_markers(&mut self) {
        self.vertical_marker.clear();
        self.horizontal_marker.clear();
    }

    pub fn vertical_marker_value(&self) -> Option<f64> {
        parse_marker("vertical", &self.vertical_marker)
    }

    pub fn horizontal_marker_value(&self) -> Option<f64> {
        parse_marker("horizontal", &self.horizontal_marker)
    }
}

/// Empty text means unset; unparsable text is unset with a warning.
fn parse_marker(which: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            log::warn!("invalid {which} line position {raw:?}; ignoring");
            None
        }
    }
}
