use eframe::egui::{RichText, Ui};
use egui_plot::{
    AxisHints, Bar, BarChart, HLine, HPlacement, Legend, Line, LineStyle, Plot, PlotBounds, VLine,
};

use crate::color::{series_color, translucent, HORIZONTAL_MARKER, VERTICAL_MARKER};
use crate::data::model::AxisRange;
use crate::state::ShellEvent;
use crate::sync::{HistogramSeries, ViewSynchronizer};

// ---------------------------------------------------------------------------
// Main plot (central panel, "Plot" tab)
// ---------------------------------------------------------------------------

/// Chart-side memory between frames.
#[derive(Debug, Default)]
pub struct PlotView {
    /// Last X range reported back as a relayout.
    last_reported: Option<AxisRange>,
}

/// Linear map of the right-axis series into left-axis coordinates, so both
/// share one egui plot.
#[derive(Debug, Clone, Copy)]
struct SecondaryScale {
    primary: AxisRange,
    secondary: AxisRange,
}

impl SecondaryScale {
    fn new(primary: AxisRange, secondary: AxisRange) -> Self {
        Self {
            primary: primary.padded(0.0),
            secondary: secondary.padded(0.0),
        }
    }

    fn to_primary(&self, v: f64) -> f64 {
        self.primary.min + (v - self.secondary.min) / self.secondary.span() * self.primary.span()
    }

    fn to_secondary(&self, v: f64) -> f64 {
        self.secondary.min + (v - self.primary.min) / self.primary.span() * self.secondary.span()
    }
}

/// Render the line plot, apply any pending range write and report the
/// visible X range when it changes.
pub fn main_plot(
    ui: &mut Ui,
    sync: &mut ViewSynchronizer,
    view: &mut PlotView,
    events: &mut Vec<ShellEvent>,
) {
    let write = sync.take_range_write();
    if write.is_some() {
        // Always report the echo so the guard token is consumed.
        view.last_reported = None;
    }

    let Some(series) = sync.artifacts().and_then(|a| a.plot.as_ref()) else {
        placeholder(ui, sync);
        return;
    };

    let scale = series.y2.as_ref().and_then(|t| {
        let primary = AxisRange::of_values(&series.y1.values)?;
        let secondary = AxisRange::of_values(&t.values)?;
        Some(SecondaryScale::new(primary, secondary))
    });

    let mut plot = Plot::new("main_plot")
        .legend(Legend::default())
        .x_axis_label(series.x_label.as_str())
        .allow_double_click_reset(false)
        .allow_boxed_zoom(!series.y_locked);
    plot = if series.y_locked {
        plot.allow_drag([true, false])
            .allow_zoom([true, false])
            .allow_scroll([true, false])
    } else {
        plot.allow_drag(true).allow_zoom(true).allow_scroll(true)
    };

    let mut y_axes = vec![AxisHints::new_y().label(series.y1.column.as_str())];
    if let (Some(trace), Some(scale)) = (&series.y2, scale) {
        y_axes.push(
            AxisHints::new_y()
                .label(trace.column.as_str())
                .placement(HPlacement::Right)
                .formatter(move |mark, _range| format!("{:.3}", scale.to_secondary(mark.value))),
        );
    }
    plot = plot.custom_y_axes(y_axes);

    let response = plot.show(ui, |plot_ui| {
        if let Some(write) = write {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [write.x.min, write.y.min],
                [write.x.max, write.y.max],
            ));
        }

        plot_ui.line(
            Line::new(points(&series.x, &series.y1.values, |v| v))
                .name(&series.y1.column)
                .color(series_color(0))
                .width(1.5),
        );
        if let (Some(trace), Some(scale)) = (&series.y2, scale) {
            plot_ui.line(
                Line::new(points(&series.x, &trace.values, |v| scale.to_primary(v)))
                    .name(format!("{} (right)", trace.column))
                    .color(series_color(1))
                    .width(1.5),
            );
        }

        if let Some(x) = series.vertical_marker {
            plot_ui.vline(
                VLine::new(x)
                    .name(format!("x = {x}"))
                    .color(VERTICAL_MARKER)
                    .style(LineStyle::dashed_loose()),
            );
        }
        if let Some(y) = series.horizontal_marker {
            plot_ui.hline(
                HLine::new(y)
                    .name(format!("y = {y}"))
                    .color(HORIZONTAL_MARKER)
                    .style(LineStyle::dashed_loose()),
            );
        }
    });

    let bounds = response.transform.bounds();
    let visible = AxisRange::new(bounds.min()[0], bounds.max()[0]);
    if visible.min.is_finite() && visible.max.is_finite() && view.last_reported != Some(visible) {
        view.last_reported = Some(visible);
        events.push(ShellEvent::ViewportRelayout {
            x_min: visible.min,
            x_max: visible.max,
        });
    }
}

fn points(x: &[f64], y: &[f64], map: impl Fn(f64) -> f64) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| [xi, map(yi)])
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram ("Histogram" tab)
// ---------------------------------------------------------------------------

pub fn histogram(ui: &mut Ui, sync: &ViewSynchronizer) {
    let Some(hist) = sync.artifacts().and_then(|a| a.histogram.as_ref()) else {
        placeholder(ui, sync);
        return;
    };
    if hist.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new("No data in range").italics());
        });
        return;
    }
    histogram_chart(ui, hist);
}

fn histogram_chart(ui: &mut Ui, hist: &HistogramSeries) {
    Plot::new("histogram")
        .legend(Legend::default())
        .x_axis_label("Value")
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for (i, trace) in hist.traces.iter().enumerate() {
                let color = translucent(series_color(i), 0.5);
                let bars: Vec<Bar> = trace
                    .bins
                    .iter()
                    .map(|b| Bar::new(b.center(), b.count as f64).width(b.width()))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(&trace.column).color(color));
            }
        });
}

fn placeholder(ui: &mut Ui, sync: &ViewSynchronizer) {
    let text = sync
        .placeholder()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Nothing to show".to_string());
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(text);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_scale_round_trips_axis_values() {
        let scale = SecondaryScale::new(AxisRange::new(0.0, 10.0), AxisRange::new(100.0, 200.0));
        assert_eq!(scale.to_primary(150.0), 5.0);
        assert_eq!(scale.to_secondary(5.0), 150.0);
        assert_eq!(scale.to_primary(100.0), 0.0);
    }
}
