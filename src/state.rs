use std::path::{Path, PathBuf};

use crate::data::loader::load_file;
use crate::data::model::{AxisRange, Dataset};
use crate::error::{ExportError, LoadError};
use crate::export;
use crate::prefs::{ExportFormat, PreferencesStore};
use crate::selection::{ActiveView, SecondAxis, Selection, XAxis};
use crate::sync::{Trigger, ViewSynchronizer};

// ---------------------------------------------------------------------------
// Shell events
// ---------------------------------------------------------------------------

/// One user edit of the selection, as reported by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    XAxis(XAxis),
    YColumn1(Option<String>),
    YColumn2(SecondAxis),
    SwapYAxes,
    Zoom { min: f64, max: f64 },
    ResetZoom,
    BoxZoom(bool),
    VerticalMarker(String),
    HorizontalMarker(String),
    ResetMarkers,
    ZeroFilter(bool),
    ActiveView(ActiveView),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    SelectionChanged(SelectionChange),
    /// The chart's visible X range changed (user pan/zoom or the echo of a
    /// programmatic range write).
    ViewportRelayout { x_min: f64, x_max: f64 },
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until the user opens a file).
    pub dataset: Option<Dataset>,

    pub selection: Selection,

    /// Derived artifacts and the pending range write for the chart.
    pub sync: ViewSynchronizer,

    pub prefs: PreferencesStore,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(prefs: PreferencesStore) -> Self {
        Self {
            dataset: None,
            selection: Selection::default(),
            sync: ViewSynchronizer::new(),
            prefs,
            status_message: None,
        }
    }

    /// Load `path` and make it the current dataset.
    ///
    /// On failure nothing but the status message changes.
    pub fn open_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let dataset = match load_file(path) {
            Ok(ds) => ds,
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                return Err(e);
            }
        };

        // Keep the preferred X axis if this file has it.
        let axis = std::iter::once(self.selection.x_axis)
            .chain(XAxis::ALL)
            .find(|a| dataset.extent(a.column()).is_some())
            .unwrap_or(self.selection.x_axis);
        let extent = dataset
            .extent(axis.column())
            .unwrap_or(AxisRange::new(0.0, 0.0));

        self.selection.x_axis = axis;
        self.selection.reset_for_new_dataset(extent);
        if let Some(first) = dataset.y_candidates().into_iter().next() {
            self.selection.set_y_column_1(Some(first), &dataset);
        }

        log::info!(
            "Loaded {} rows, {} columns from {}",
            dataset.len(),
            dataset.column_names().len(),
            path.display()
        );
        self.status_message = Some(format!(
            "Loaded {} ({} rows)",
            file_label(path),
            dataset.len()
        ));
        self.dataset = Some(dataset);
        self.synchronize(Trigger::ColumnChange);

        if let Err(e) = self.prefs.record_opened(path) {
            log::warn!("recent files not saved: {e}");
            self.status_message = Some(format!("Loaded {}; recent files not saved: {e}", file_label(path)));
        }
        Ok(())
    }

    /// Apply one shell event and resynchronize what it affects.
    pub fn handle(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::SelectionChanged(change) => self.apply_change(change),
            ShellEvent::ViewportRelayout { x_min, x_max } => self.relayout(x_min, x_max),
        }
    }

    fn apply_change(&mut self, change: SelectionChange) {
        log::debug!("selection change: {change:?}");
        let trigger = match change {
            SelectionChange::XAxis(axis) => {
                match self.dataset.as_ref().and_then(|d| d.extent(axis.column())) {
                    Some(extent) => self.selection.set_x_axis(axis, extent),
                    None => self.selection.x_axis = axis,
                }
                Trigger::ColumnChange
            }
            SelectionChange::YColumn1(column) => {
                let Some(ds) = &self.dataset else { return };
                if !self.selection.set_y_column_1(column, ds) {
                    self.status_message = Some("Y column must be numeric".into());
                    return;
                }
                Trigger::ColumnChange
            }
            SelectionChange::YColumn2(choice) => {
                let Some(ds) = &self.dataset else { return };
                if !self.selection.set_y_column_2(choice, ds) {
                    self.status_message = Some("Y column must be numeric".into());
                    return;
                }
                Trigger::ColumnChange
            }
            SelectionChange::SwapYAxes => {
                self.selection.swap_y_axes();
                Trigger::ColumnChange
            }
            SelectionChange::Zoom { min, max } => match self.selection.set_zoom(min, max) {
                Ok(_) => Trigger::ZoomChangeProgrammatic,
                Err(e) => {
                    log::warn!("ignoring zoom: {e}");
                    return;
                }
            },
            SelectionChange::ResetZoom => {
                self.selection.reset_zoom();
                Trigger::ZoomChangeProgrammatic
            }
            SelectionChange::BoxZoom(enabled) => {
                self.selection.box_zoom_enabled = enabled;
                Trigger::ZoomChangeProgrammatic
            }
            SelectionChange::VerticalMarker(text) => {
                self.selection.vertical_marker = text;
                Trigger::MarkerChange
            }
            SelectionChange::HorizontalMarker(text) => {
                self.selection.horizontal_marker = text;
                Trigger::MarkerChange
            }
            SelectionChange::ResetMarkers => {
                self.selection.clear_markers();
                Trigger::MarkerChange
            }
            SelectionChange::ZeroFilter(enabled) => {
                self.selection.zero_filter_enabled = enabled;
                Trigger::FilterToggle
            }
            SelectionChange::ActiveView(view) => {
                if self.selection.active_view == view {
                    return;
                }
                self.selection.active_view = view;
                Trigger::TabChange
            }
        };
        self.synchronize(trigger);
    }

    fn relayout(&mut self, x_min: f64, x_max: f64) {
        let reported = AxisRange::new(x_min, x_max);
        if !self.sync.accept_relayout(&reported) || self.sync.artifacts().is_none() {
            return;
        }
        match self.selection.set_zoom(x_min, x_max) {
            Ok(viewport) => self.synchronize(Trigger::ZoomChangeUser { viewport }),
            Err(e) => log::warn!("ignoring relayout: {e}"),
        }
    }

    fn synchronize(&mut self, trigger: Trigger) {
        self.sync
            .synchronize(trigger, self.dataset.as_ref(), &self.selection);
    }

    /// Export `view` to the configured directory, building it first if its
    /// tab has not been shown.
    pub fn export(&mut self, view: ActiveView) -> Result<PathBuf, ExportError> {
        self.sync
            .materialize(view, self.dataset.as_ref(), &self.selection);
        let result = export::export(
            view,
            self.prefs.export_target(),
            self.sync.artifacts(),
            &self.selection,
        );
        match &result {
            Ok(path) => self.status_message = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("export failed: {e}");
                self.status_message = Some(format!("Export failed: {e}"));
            }
        }
        result
    }

    pub fn set_export_target(&mut self, directory: PathBuf, format: ExportFormat) {
        if let Err(e) = self.prefs.set_export_target(directory, format) {
            log::warn!("export settings not saved: {e}");
            self.status_message = Some(format!("Export settings not saved: {e}"));
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;
    use crate::data::stats::StatsOutcome;

    /// SimTime 0..=10, DatTime = SimTime / 2, A = 10 * SimTime, B = SimTime².
    fn write_scenario(dir: &Path) -> PathBuf {
        let mut text = String::from("SimTime DatTime A  B\n");
        for t in 0..=10 {
            writeln!(text, "{t}  {}  {} {}", t as f64 / 2.0, t * 10, t * t).unwrap();
        }
        let path = dir.join("scenario.dat");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn state(dir: &Path) -> AppState {
        AppState::new(PreferencesStore::open(dir.join("prefs.toml")))
    }

    fn select(state: &mut AppState, change: SelectionChange) {
        state.handle(ShellEvent::SelectionChanged(change));
    }

    fn relayout(state: &mut AppState, x_min: f64, x_max: f64) {
        state.handle(ShellEvent::ViewportRelayout { x_min, x_max });
    }

    #[test]
    fn open_selects_first_column_and_records_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());

        state.open_file(&path).unwrap();
        assert_eq!(state.selection.y_column_1(), Some("A"));
        assert_eq!(state.selection.original_range(), AxisRange::new(0.0, 10.0));
        assert_eq!(state.prefs.recents(), &[path.clone()]);
        assert!(state.sync.artifacts().unwrap().plot.is_some());
        assert!(state.sync.take_range_write().is_some());
    }

    #[test]
    fn user_zoom_scopes_stats_without_writing_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        state.sync.take_range_write();

        select(&mut state, SelectionChange::Zoom { min: 2.0, max: 8.0 });
        let write = state.sync.take_range_write().unwrap();
        assert_eq!(write.x, AxisRange::new(2.0, 8.0));

        // The chart echoes our own write: not a user zoom.
        relayout(&mut state, 2.0, 8.0);
        assert!(state.sync.artifacts().unwrap().zoom_stats.is_none());

        relayout(&mut state, 3.0, 7.0);
        assert!(state.sync.take_range_write().is_none());
        assert_eq!(state.selection.zoom_range(), AxisRange::new(3.0, 7.0));

        let zoom = state.sync.artifacts().unwrap().zoom_stats.clone().unwrap();
        let a = zoom.table.get("A").unwrap().summary().unwrap();
        assert_eq!(a.count, 5);
        assert_eq!((a.min, a.max), (30.0, 70.0));
        // Full-range stats are untouched by the zoom.
        let full = state.sync.artifacts().unwrap().full_stats.get("A").unwrap();
        assert_eq!(full.summary().unwrap().count, 11);
    }

    #[test]
    fn failed_open_keeps_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_scenario(dir.path());
        let bad = dir.path().join("bad.dat");
        std::fs::write(&bad, "SimTime A\n1 2\n3\n").unwrap();

        let mut state = state(dir.path());
        state.open_file(&good).unwrap();
        select(&mut state, SelectionChange::Zoom { min: 1.0, max: 4.0 });
        let before = state.selection.clone();

        assert!(state.open_file(&bad).is_err());
        assert_eq!(state.dataset.as_ref().unwrap().source(), good.as_path());
        assert_eq!(state.selection, before);
        assert_eq!(state.prefs.recents(), &[good]);
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn inverted_zoom_is_ignored_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        state.sync.take_range_write();
        let status = state.status_message.clone();

        select(&mut state, SelectionChange::Zoom { min: 8.0, max: 2.0 });
        assert_eq!(state.selection.zoom_range(), AxisRange::new(0.0, 10.0));
        assert!(state.sync.take_range_write().is_none());
        assert_eq!(state.status_message, status);
        assert!(!state.status_message.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn pan_before_write_is_applied_keeps_the_users_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        state.sync.take_range_write();

        // Controls zoom and a chart pan land in the same frame.
        select(&mut state, SelectionChange::Zoom { min: 2.0, max: 8.0 });
        relayout(&mut state, 1.0, 9.0);

        assert_eq!(state.selection.zoom_range(), AxisRange::new(1.0, 9.0));
        assert!(state.sync.take_range_write().is_none());
        let zoom = state.sync.artifacts().unwrap().zoom_stats.clone().unwrap();
        assert_eq!(zoom.viewport, AxisRange::new(1.0, 9.0));
    }

    #[test]
    fn x_axis_switch_rebases_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        select(&mut state, SelectionChange::Zoom { min: 6.0, max: 9.0 });

        select(&mut state, SelectionChange::XAxis(XAxis::DatTime));
        assert_eq!(state.selection.original_range(), AxisRange::new(0.0, 5.0));
        assert_eq!(state.selection.zoom_range(), AxisRange::new(0.0, 5.0));
        let plot = state.sync.artifacts().unwrap().plot.clone().unwrap();
        assert_eq!(plot.x_label, "DatTime");
    }

    #[test]
    fn swap_and_duplicate_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();

        select(&mut state, SelectionChange::YColumn2(SecondAxis::Column("B".into())));
        select(&mut state, SelectionChange::SwapYAxes);
        let plot = state.sync.artifacts().unwrap().plot.clone().unwrap();
        assert_eq!(plot.title(), "Plot of B and A vs SimTime");

        select(&mut state, SelectionChange::YColumn2(SecondAxis::Column("B".into())));
        let plot = state.sync.artifacts().unwrap().plot.clone().unwrap();
        assert!(plot.y2.is_none());

        select(&mut state, SelectionChange::YColumn1(Some("nope".into())));
        assert_eq!(state.selection.y_column_1(), Some("B"));
    }

    #[test]
    fn tabs_materialize_lazily_and_rewrite_the_plot_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        state.sync.take_range_write();

        select(&mut state, SelectionChange::ActiveView(ActiveView::Histogram));
        assert!(state.sync.take_range_write().is_none());
        assert!(state.sync.artifacts().unwrap().histogram.is_some());

        select(&mut state, SelectionChange::ActiveView(ActiveView::Plot));
        assert!(state.sync.take_range_write().is_some());
    }

    #[test]
    fn zero_filter_empties_constant_zero_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zeros.dat");
        std::fs::write(&path, "SimTime Z\n0 0\n1 0\n2 0\n").unwrap();
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();

        select(&mut state, SelectionChange::ZeroFilter(true));
        let stats = state.sync.artifacts().unwrap().full_stats.get("Z").cloned();
        assert_eq!(stats, Some(StatsOutcome::EmptyRange));
    }

    #[test]
    fn export_builds_the_hidden_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path());
        let mut state = state(dir.path());
        state.open_file(&path).unwrap();
        state.set_export_target(dir.path().to_path_buf(), ExportFormat::Svg);

        let out = state.export(ActiveView::Histogram).unwrap();
        assert!(out.starts_with(dir.path()));
        assert!(out
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("histogram_"));
        assert!(state.status_message.as_deref().unwrap().starts_with("Saved"));
    }

    #[test]
    fn export_without_data_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        let err = state.export(ActiveView::Plot).unwrap_err();
        assert!(matches!(err, ExportError::NothingRendered));
        assert!(state.status_message.is_some());
    }
}
