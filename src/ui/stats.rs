use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::stats::StatsOutcome;
use crate::sync::{Artifacts, StatsTable};

// ---------------------------------------------------------------------------
// Stats tables (bottom panel)
// ---------------------------------------------------------------------------

/// Full-range stats on the left, stats of the last user-zoomed viewport on
/// the right.
pub fn stats_panel(ui: &mut Ui, artifacts: Option<&Artifacts>) {
    let Some(artifacts) = artifacts else {
        ui.label("No statistics: select a Y column.");
        return;
    };
    let full = &artifacts.full_stats;

    ui.columns(2, |cols| {
        cols[0].strong("Full range");
        stats_table(&mut cols[0], "full_stats", full.iter());

        match &artifacts.zoom_stats {
            Some(zoom) if !zoom.table.is_empty() => {
                cols[1].strong(format!(
                    "Visible range  [{}, {}]",
                    fmt_num(zoom.viewport.min),
                    fmt_num(zoom.viewport.max)
                ));
                stats_table(&mut cols[1], "zoom_stats", aligned_rows(full, &zoom.table));
            }
            _ => {
                cols[1].strong("Visible range");
                cols[1].label(RichText::new("Zoom or pan the plot to see stats for the visible range").weak());
            }
        }
    });
}

/// Rows of `zoom` in the row order of `full`.
fn aligned_rows<'a>(
    full: &'a StatsTable,
    zoom: &'a StatsTable,
) -> impl Iterator<Item = (&'a str, &'a StatsOutcome)> {
    full.iter()
        .filter_map(move |(name, _)| zoom.get(name).map(|s| (name, s)))
}

fn stats_table<'a>(ui: &mut Ui, id: &str, rows: impl Iterator<Item = (&'a str, &'a StatsOutcome)>) {
    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(110.0).at_least(70.0)) // Column name
            .columns(Column::initial(75.0).at_least(50.0), 6)
            .header(20.0, |mut header| {
                for title in ["Column", "Count", "Mean", "Median", "Std Dev", "Min", "Max"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (name, outcome) in rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(name);
                        });
                        match outcome.summary() {
                            Some(s) => {
                                row.col(|ui| {
                                    ui.label(s.count.to_string());
                                });
                                for v in [s.mean, s.median, s.std_dev, s.min, s.max] {
                                    row.col(|ui| {
                                        ui.label(fmt_num(v));
                                    });
                                }
                            }
                            None => {
                                row.col(|ui| {
                                    ui.label(RichText::new("no data in range").italics());
                                });
                            }
                        }
                    });
                }
            });
    });
}

fn fmt_num(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e6 || v.abs() < 1e-3) {
        format!("{v:.3e}")
    } else {
        format!("{v:.4}")
    }
}
