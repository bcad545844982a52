//! View synchronization: derives everything the shell displays from
//! `(Dataset, Selection)` through the single entry point
//! [`ViewSynchronizer::synchronize`].
//!
//! ```text
//!   Trigger ──▶ synchronize ──▶ Artifacts { plot | histogram, full stats, zoom stats }
//!                    │
//!                    └──▶ RangeWrite (programmatic) ──▶ shell ──▶ relayout echo
//!                                                                   │
//!                              ZoomGuard swallows the echo ◀────────┘
//! ```
//!
//! Each trigger names the selection fields it changed, so only the artifacts
//! depending on those fields are rebuilt; the rest are carried over from the
//! previous synchronization.

use std::fmt;

use crate::data::filter::{bin_counts, indices_in_window, take, without_zeros, Bin};
use crate::data::model::{AxisRange, Dataset};
use crate::data::stats::{summarize, StatsOutcome};
use crate::selection::{ActiveView, Selection};

/// Bars per histogram trace.
pub const HISTOGRAM_BINS: usize = 30;

/// Fraction of the data span added above and below plotted Y values.
pub const Y_PADDING: f64 = 0.05;

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// What changed since the last synchronization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// X axis, a Y column, a swap, or a new dataset.
    ColumnChange,
    /// The user panned/zoomed the rendered chart to `viewport`.
    ZoomChangeUser { viewport: AxisRange },
    /// Zoom window or box-zoom mode changed from the controls.
    ZoomChangeProgrammatic,
    FilterToggle,
    TabChange,
    MarkerChange,
}

/// Artifacts a trigger invalidates.
#[derive(Debug, Clone, Copy)]
struct Scope {
    plot: bool,
    histogram: bool,
    full_stats: bool,
    keep_zoom_stats: bool,
}

impl Trigger {
    fn scope(&self) -> Scope {
        match self {
            Trigger::ColumnChange => Scope {
                plot: true,
                histogram: true,
                full_stats: true,
                keep_zoom_stats: false,
            },
            Trigger::ZoomChangeUser { .. } | Trigger::ZoomChangeProgrammatic => Scope {
                plot: true,
                histogram: false,
                full_stats: false,
                keep_zoom_stats: false,
            },
            Trigger::FilterToggle => Scope {
                plot: false,
                histogram: true,
                full_stats: true,
                keep_zoom_stats: true,
            },
            Trigger::TabChange => Scope {
                plot: false,
                histogram: false,
                full_stats: false,
                keep_zoom_stats: true,
            },
            Trigger::MarkerChange => Scope {
                plot: true,
                histogram: false,
                full_stats: false,
                keep_zoom_stats: true,
            },
        }
    }

    /// Whether the displayed range must be pushed to the chart afterwards.
    fn writes_range(&self) -> bool {
        matches!(
            self,
            Trigger::ColumnChange | Trigger::ZoomChangeProgrammatic | Trigger::TabChange
        )
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// One named numeric series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub column: String,
    pub values: Vec<f64>,
}

/// Declarative description of the line plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub x_label: String,
    pub x: Vec<f64>,
    pub y1: Trace,
    pub y2: Option<Trace>,
    pub vertical_marker: Option<f64>,
    pub horizontal_marker: Option<f64>,
    /// Displayed X domain (the zoom window).
    pub x_window: AxisRange,
    /// Y locked to the full-series range while X is zoomed.
    pub y_locked: bool,
}

impl PlotSeries {
    pub fn title(&self) -> String {
        match &self.y2 {
            Some(y2) => format!(
                "Plot of {} and {} vs {}",
                self.y1.column, y2.column, self.x_label
            ),
            None => format!("Plot of {} vs {}", self.y1.column, self.x_label),
        }
    }

    /// Primary Y range for an X window: the padded full-series range when
    /// locked, otherwise fitted to the points inside `window`.
    pub fn y1_range_for(&self, window: &AxisRange) -> AxisRange {
        self.fit(&self.y1.values, window)
    }

    pub fn y2_range_for(&self, window: &AxisRange) -> Option<AxisRange> {
        self.y2.as_ref().map(|t| self.fit(&t.values, window))
    }

    fn fit(&self, values: &[f64], window: &AxisRange) -> AxisRange {
        let full = AxisRange::of_values(values).unwrap_or(AxisRange::new(0.0, 0.0));
        if self.y_locked {
            return full.padded(Y_PADDING);
        }
        let visible = take(values, &indices_in_window(&self.x, window));
        AxisRange::of_values(&visible)
            .unwrap_or(full)
            .padded(Y_PADDING)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramTrace {
    pub column: String,
    /// Values after the zero filter (if enabled).
    pub values: Vec<f64>,
    pub bins: Vec<Bin>,
}

/// Declarative description of the overlaid histograms. All traces share one
/// bin layout.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub traces: Vec<HistogramTrace>,
    pub value_range: Option<AxisRange>,
}

impl HistogramSeries {
    pub fn title(&self) -> String {
        let names: Vec<&str> = self.traces.iter().map(|t| t.column.as_str()).collect();
        format!("Histogram of {}", names.join(" and "))
    }

    /// True when filtering left nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|t| t.values.is_empty())
    }
}

/// Column name → summary, in Y1, Y2 order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    entries: Vec<(String, StatsOutcome)>,
}

impl StatsTable {
    pub fn get(&self, column: &str) -> Option<&StatsOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatsOutcome)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, StatsOutcome)> for StatsTable {
    fn from_iter<I: IntoIterator<Item = (String, StatsOutcome)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Stats restricted to the last user-reported viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomStats {
    pub viewport: AxisRange,
    pub table: StatsTable,
}

/// Everything derived from the current dataset and selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    pub plot: Option<PlotSeries>,
    pub histogram: Option<HistogramSeries>,
    pub full_stats: StatsTable,
    pub zoom_stats: Option<ZoomStats>,
}

/// Why no artifacts exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    NoDataset,
    NoYColumn,
    MissingXColumn(String),
    MissingYColumn(String),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::NoDataset => write!(f, "Open a data file to begin (File > Open)"),
            Placeholder::NoYColumn => write!(f, "Select a Y-axis column"),
            Placeholder::MissingXColumn(c) => {
                write!(f, "X column {c:?} is missing or not numeric in this file")
            }
            Placeholder::MissingYColumn(c) => {
                write!(f, "Y column {c:?} is missing or not numeric in this file")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback guard
// ---------------------------------------------------------------------------

/// A programmatic axis-range update for the chart to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeWrite {
    pub token: u64,
    pub x: AxisRange,
    pub y: AxisRange,
}

/// One-shot suppression token for the relayout echo of a [`RangeWrite`].
#[derive(Debug, Default)]
struct ZoomGuard {
    armed: Option<(u64, AxisRange)>,
}

impl ZoomGuard {
    fn arm(&mut self, token: u64, x: AxisRange) {
        self.armed = Some((token, x));
    }

    fn disarm(&mut self) {
        self.armed = None;
    }

    /// Consumes the token. Returns true if `reported` echoes the armed write.
    fn consume(&mut self, reported: &AxisRange) -> bool {
        match self.armed.take() {
            Some((token, written)) if same_range(&written, reported) => {
                log::debug!("relayout echo of range write #{token} suppressed");
                true
            }
            _ => false,
        }
    }
}

fn same_range(a: &AxisRange, b: &AxisRange) -> bool {
    let tol = 1e-9 * a.span().abs().max(1.0);
    (a.min - b.min).abs() <= tol && (a.max - b.max).abs() <= tol
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ViewSynchronizer {
    artifacts: Option<Artifacts>,
    placeholder: Option<Placeholder>,
    guard: ZoomGuard,
    pending_write: Option<RangeWrite>,
    next_token: u64,
}

impl ViewSynchronizer {
    pub fn new() -> Self {
        Self {
            placeholder: Some(Placeholder::NoDataset),
            ..Default::default()
        }
    }

    pub fn artifacts(&self) -> Option<&Artifacts> {
        self.artifacts.as_ref()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    /// Hand the pending programmatic range update to the shell.
    pub fn take_range_write(&mut self) -> Option<RangeWrite> {
        self.pending_write.take()
    }

    /// Screen an inbound relayout. Returns false when it is the echo of our
    /// own range write and must not be treated as a user zoom.
    pub fn accept_relayout(&mut self, reported: &AxisRange) -> bool {
        !self.guard.consume(reported)
    }

    /// Bring the artifacts in line with `(dataset, selection)`.
    pub fn synchronize(
        &mut self,
        trigger: Trigger,
        dataset: Option<&Dataset>,
        selection: &Selection,
    ) {
        log::debug!("synchronize: {trigger:?}");

        let inputs = match Inputs::extract(dataset, selection) {
            Ok(inputs) => inputs,
            Err(placeholder) => {
                log::debug!("nothing to show: {placeholder}");
                self.artifacts = None;
                self.pending_write = None;
                self.placeholder = Some(placeholder);
                return;
            }
        };
        self.placeholder = None;

        let (mut next, scope) = match self.artifacts.take() {
            Some(prev) => (prev, trigger.scope()),
            None => (Artifacts::default(), Trigger::ColumnChange.scope()),
        };

        if scope.plot {
            next.plot = None;
        }
        if scope.histogram {
            next.histogram = None;
        }
        if scope.full_stats {
            next.full_stats = inputs.full_range_stats(selection.zero_filter_enabled);
        }
        next.zoom_stats = match trigger {
            Trigger::ZoomChangeUser { viewport } => Some(ZoomStats {
                viewport,
                table: inputs.zoom_range_stats(&viewport),
            }),
            _ if scope.keep_zoom_stats => next.zoom_stats,
            _ => None,
        };

        let mut fresh_plot = false;
        match selection.active_view {
            ActiveView::Plot => {
                next.histogram = None;
                if next.plot.is_none() {
                    next.plot = Some(inputs.plot_series(selection));
                    fresh_plot = true;
                }
            }
            ActiveView::Histogram => {
                next.plot = None;
                if next.histogram.is_none() {
                    next.histogram = Some(inputs.histogram_series(selection.zero_filter_enabled));
                }
            }
        }

        // A user zoom already shows its range and supersedes any write the
        // chart has not applied yet.
        let user_zoom = matches!(trigger, Trigger::ZoomChangeUser { .. });
        if user_zoom && self.pending_write.take().is_some() {
            log::debug!("pending range write superseded by user zoom");
            self.guard.disarm();
        }
        if !user_zoom && fresh_plot && (trigger.writes_range() || self.artifacts_were_empty(&scope)) {
            if let Some(plot) = &next.plot {
                self.issue_range_write(plot);
            }
        }

        self.artifacts = Some(next);
    }

    /// Build the non-active view on demand (e.g. for export) without
    /// disturbing the chart.
    pub fn materialize(&mut self, view: ActiveView, dataset: Option<&Dataset>, selection: &Selection) {
        let Some(artifacts) = self.artifacts.as_mut() else {
            return;
        };
        let Ok(inputs) = Inputs::extract(dataset, selection) else {
            return;
        };
        match view {
            ActiveView::Plot if artifacts.plot.is_none() => {
                artifacts.plot = Some(inputs.plot_series(selection));
            }
            ActiveView::Histogram if artifacts.histogram.is_none() => {
                artifacts.histogram =
                    Some(inputs.histogram_series(selection.zero_filter_enabled));
            }
            _ => {}
        }
    }

    fn artifacts_were_empty(&self, scope: &Scope) -> bool {
        scope.plot && scope.histogram && scope.full_stats
    }

    fn issue_range_write(&mut self, plot: &PlotSeries) {
        self.next_token += 1;
        // The chart cannot show a zero-width window and would echo a widened
        // one, so widen it here and arm the guard with what is drawn.
        let write = RangeWrite {
            token: self.next_token,
            x: plot.x_window.padded(0.0),
            y: plot.y1_range_for(&plot.x_window),
        };
        self.guard.arm(write.token, write.x);
        self.pending_write = Some(write);
    }
}

// ---------------------------------------------------------------------------
// Column extraction and artifact builders
// ---------------------------------------------------------------------------

struct Inputs {
    x_label: String,
    x: Vec<f64>,
    y1: Trace,
    y2: Option<Trace>,
}

impl Inputs {
    fn extract(dataset: Option<&Dataset>, selection: &Selection) -> Result<Self, Placeholder> {
        let dataset = dataset.ok_or(Placeholder::NoDataset)?;
        let y1_name = selection.y_column_1().ok_or(Placeholder::NoYColumn)?;
        let x_name = selection.x_axis.column();

        let x = dataset
            .column_values(x_name)
            .ok_or_else(|| Placeholder::MissingXColumn(x_name.to_string()))?;
        let y1 = dataset
            .column_values(y1_name)
            .ok_or_else(|| Placeholder::MissingYColumn(y1_name.to_string()))?;

        let y2 = selection.effective_y2().and_then(|name| {
            let values = dataset.column_values(name);
            if values.is_none() {
                log::warn!("second Y column {name:?} not usable; drawing one series");
            }
            values.map(|values| Trace {
                column: name.to_string(),
                values,
            })
        });

        Ok(Self {
            x_label: x_name.to_string(),
            x,
            y1: Trace {
                column: y1_name.to_string(),
                values: y1,
            },
            y2,
        })
    }

    fn traces(&self) -> impl Iterator<Item = &Trace> {
        std::iter::once(&self.y1).chain(self.y2.as_ref())
    }

    fn plot_series(&self, selection: &Selection) -> PlotSeries {
        PlotSeries {
            x_label: self.x_label.clone(),
            x: self.x.clone(),
            y1: self.y1.clone(),
            y2: self.y2.clone(),
            vertical_marker: selection.vertical_marker_value(),
            horizontal_marker: selection.horizontal_marker_value(),
            x_window: selection.zoom_range(),
            y_locked: selection.box_zoom_enabled,
        }
    }

    fn histogram_series(&self, zero_filter: bool) -> HistogramSeries {
        let filtered: Vec<(String, Vec<f64>)> = self
            .traces()
            .map(|t| (t.column.clone(), filter_values(&t.values, zero_filter)))
            .collect();

        let value_range = filtered
            .iter()
            .filter_map(|(_, v)| AxisRange::of_values(v))
            .reduce(|a, b| a.union(&b));

        let traces = filtered
            .into_iter()
            .map(|(column, values)| {
                let bins = value_range
                    .map(|r| bin_counts(&values, &r, HISTOGRAM_BINS))
                    .unwrap_or_default();
                HistogramTrace {
                    column,
                    values,
                    bins,
                }
            })
            .collect();

        HistogramSeries {
            traces,
            value_range,
        }
    }

    fn full_range_stats(&self, zero_filter: bool) -> StatsTable {
        self.traces()
            .map(|t| (t.column.clone(), summarize(&filter_values(&t.values, zero_filter))))
            .collect()
    }

    fn zoom_range_stats(&self, viewport: &AxisRange) -> StatsTable {
        let idx = indices_in_window(&self.x, viewport);
        self.traces()
            .map(|t| (t.column.clone(), summarize(&take(&t.values, &idx))))
            .collect()
    }
}

fn filter_values(values: &[f64], zero_filter: bool) -> Vec<f64> {
    if zero_filter {
        without_zeros(values)
    } else {
        values.to_vec()
    }
}
