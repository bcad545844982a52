use std::path::PathBuf;

use eframe::egui::{self, Button, Color32, DragValue, RichText, ScrollArea, SelectableLabel, Ui};

use crate::data::model::AxisRange;
use crate::prefs::{ExportFormat, RECENT_CAPACITY};
use crate::selection::{ActiveView, SecondAxis, XAxis};
use crate::state::{AppState, SelectionChange, ShellEvent};

// ---------------------------------------------------------------------------
// Left side panel – selection controls
// ---------------------------------------------------------------------------

/// Edit buffers for controls whose value is only applied on demand.
#[derive(Debug, Default)]
pub struct Controls {
    zoom_min: f64,
    zoom_max: f64,
    /// Zoom window the buffers were last filled from.
    shown_zoom: Option<AxisRange>,
}

/// Render the left control panel. Edits are pushed to `events` and applied
/// by the caller.
pub fn side_panel(ui: &mut Ui, state: &AppState, controls: &mut Controls, events: &mut Vec<ShellEvent>) {
    let mut emit = |change: SelectionChange| events.push(ShellEvent::SelectionChanged(change));

    let Some(dataset) = &state.dataset else {
        ui.heading("Axes");
        ui.separator();
        ui.label("No dataset loaded.");
        return;
    };
    let sel = &state.selection;
    let candidates = dataset.y_candidates();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Axes");
            ui.separator();

            // ---- X axis ----
            ui.strong("X axis");
            egui::ComboBox::from_id_salt("x_axis")
                .selected_text(sel.x_axis.column())
                .show_ui(ui, |ui: &mut Ui| {
                    for axis in XAxis::ALL {
                        let label = SelectableLabel::new(sel.x_axis == axis, axis.column());
                        if ui
                            .add_enabled(dataset.is_numeric(axis.column()), label)
                            .clicked()
                        {
                            emit(SelectionChange::XAxis(axis));
                        }
                    }
                });

            // ---- Y axis 1 ----
            ui.strong("Y axis");
            egui::ComboBox::from_id_salt("y_column_1")
                .selected_text(sel.y_column_1().unwrap_or("Select…"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui
                        .selectable_label(sel.y_column_1().is_none(), "Select…")
                        .clicked()
                    {
                        emit(SelectionChange::YColumn1(None));
                    }
                    for col in &candidates {
                        if ui
                            .selectable_label(sel.y_column_1() == Some(col.as_str()), col)
                            .clicked()
                        {
                            emit(SelectionChange::YColumn1(Some(col.clone())));
                        }
                    }
                });

            // ---- Y axis 2 ----
            ui.strong("Second Y axis (right)");
            let y2_text = match sel.y_column_2() {
                SecondAxis::Unselected => "Select…",
                SecondAxis::Omit => "None",
                SecondAxis::Column(c) => c.as_str(),
            };
            egui::ComboBox::from_id_salt("y_column_2")
                .selected_text(y2_text)
                .show_ui(ui, |ui: &mut Ui| {
                    let fixed = [
                        (SecondAxis::Unselected, "Select…"),
                        (SecondAxis::Omit, "None"),
                    ];
                    for (choice, label) in fixed {
                        if ui.selectable_label(sel.y_column_2() == &choice, label).clicked() {
                            emit(SelectionChange::YColumn2(choice));
                        }
                    }
                    for col in &candidates {
                        if ui
                            .selectable_label(sel.y_column_2().column() == Some(col.as_str()), col)
                            .clicked()
                        {
                            emit(SelectionChange::YColumn2(SecondAxis::Column(col.clone())));
                        }
                    }
                });

            let can_swap = sel.y_column_1().is_some() && sel.y_column_2().column().is_some();
            if ui.add_enabled(can_swap, Button::new("Swap Y axes")).clicked() {
                emit(SelectionChange::SwapYAxes);
            }

            // ---- Zoom ----
            ui.add_space(8.0);
            ui.heading("Zoom");
            ui.separator();

            let zoom = sel.zoom_range();
            if controls.shown_zoom != Some(zoom) {
                controls.zoom_min = zoom.min;
                controls.zoom_max = zoom.max;
                controls.shown_zoom = Some(zoom);
            }
            let speed = (sel.original_range().span() / 500.0).max(1e-6);
            ui.horizontal(|ui: &mut Ui| {
                ui.label("X min");
                ui.add(DragValue::new(&mut controls.zoom_min).speed(speed));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("X max");
                ui.add(DragValue::new(&mut controls.zoom_max).speed(speed));
            });
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply Zoom").clicked() {
                    emit(SelectionChange::Zoom {
                        min: controls.zoom_min,
                        max: controls.zoom_max,
                    });
                }
                if ui.button("Reset Zoom").clicked() {
                    emit(SelectionChange::ResetZoom);
                }
            });

            let mut box_zoom = sel.box_zoom_enabled;
            if ui
                .checkbox(&mut box_zoom, "Box zoom (lock Y axis)")
                .on_hover_text("Keep the Y range fixed while zooming or panning X")
                .changed()
            {
                emit(SelectionChange::BoxZoom(box_zoom));
            }

            // ---- Reference lines ----
            ui.add_space(8.0);
            ui.heading("Reference lines");
            ui.separator();

            let mut vertical = sel.vertical_marker.clone();
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Vertical at x =");
                if ui.text_edit_singleline(&mut vertical).changed() {
                    emit(SelectionChange::VerticalMarker(vertical.clone()));
                }
            });
            let mut horizontal = sel.horizontal_marker.clone();
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Horizontal at y =");
                if ui.text_edit_singleline(&mut horizontal).changed() {
                    emit(SelectionChange::HorizontalMarker(horizontal.clone()));
                }
            });
            if ui.button("Reset Lines").clicked() {
                emit(SelectionChange::ResetMarkers);
            }

            // ---- Histogram ----
            ui.add_space(8.0);
            ui.heading("Histogram");
            ui.separator();

            let mut zero_filter = sel.zero_filter_enabled;
            if ui.checkbox(&mut zero_filter, "Exclude zero values").changed() {
                emit(SelectionChange::ZeroFilter(zero_filter));
            }
        });
}

/// Plot / Histogram tab strip.
pub fn view_tabs(ui: &mut Ui, state: &AppState, events: &mut Vec<ShellEvent>) {
    ui.horizontal(|ui: &mut Ui| {
        for (view, label) in [(ActiveView::Plot, "Plot"), (ActiveView::Histogram, "Histogram")] {
            if ui
                .selectable_label(state.selection.active_view == view, label)
                .clicked()
            {
                events.push(ShellEvent::SelectionChanged(SelectionChange::ActiveView(view)));
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.menu_button("Open Recent", |ui: &mut Ui| {
                let recents = state.prefs.recents().to_vec();
                for slot in 0..RECENT_CAPACITY {
                    match recents.get(slot) {
                        Some(path) => {
                            if ui.button(path.display().to_string()).clicked() {
                                // Failures land in the status line.
                                let _ = state.open_file(path);
                                ui.close_menu();
                            }
                        }
                        None => {
                            ui.add_enabled(false, Button::new("(empty)"));
                        }
                    }
                }
            });
        });

        ui.menu_button("Export", |ui: &mut Ui| {
            if ui.button("Export Plot").clicked() {
                let _ = state.export(ActiveView::Plot);
                ui.close_menu();
            }
            if ui.button("Export Histogram").clicked() {
                let _ = state.export(ActiveView::Histogram);
                ui.close_menu();
            }
            ui.separator();

            let target = state.prefs.export_target().clone();
            ui.label(
                RichText::new(format!("Folder: {}", target.directory.display())).weak(),
            );
            if ui.button("Choose Folder…").clicked() {
                if let Some(dir) = pick_export_dir(&target.directory) {
                    state.set_export_target(dir, target.format);
                }
                ui.close_menu();
            }
            ui.menu_button(format!("Format: {}", target.format), |ui: &mut Ui| {
                for format in ExportFormat::ALL {
                    if ui
                        .radio(target.format == format, format.to_string())
                        .clicked()
                    {
                        state.set_export_target(target.directory.clone(), format);
                        ui.close_menu();
                    }
                }
            });
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} rows, {} columns",
                ds.source()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                ds.len(),
                ds.column_names().len()
            ));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            let failed = msg.starts_with("Error") || msg.contains("failed") || msg.contains("not saved");
            let text = RichText::new(msg);
            ui.label(if failed { text.color(Color32::RED) } else { text });
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &["dat", "txt", "parquet", "pq"])
        .add_filter("Whitespace-delimited", &["dat", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        // Failures land in the status line.
        let _ = state.open_file(&path);
    }
}

fn pick_export_dir(current: &std::path::Path) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export folder")
        .set_directory(current)
        .pick_folder()
}
