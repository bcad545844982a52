//! Headless export of the plot or histogram to PNG, JPG or SVG.
//!
//! The figure is redrawn from the synchronized artifacts with plotters rather
//! than captured from the window, so exports do not depend on what is on
//! screen or on the window size.

use std::path::{Path, PathBuf};
use std::sync::Once;

use chrono::{Local, NaiveDateTime};
use eframe::egui::Color32;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::color::{series_color, HORIZONTAL_MARKER, VERTICAL_MARKER};
use crate::data::filter::indices_in_window;
use crate::data::model::AxisRange;
use crate::error::ExportError;
use crate::prefs::{ExportFormat, ExportTarget};
use crate::selection::{ActiveView, Selection};
use crate::sync::{Artifacts, HistogramSeries, PlotSeries};

/// Pixel size of raster exports and the SVG viewport.
pub const EXPORT_SIZE: (u32, u32) = (1600, 900);

/// Render the requested view into `target.directory` and return the path of
/// the written file.
///
/// The plot uses the current zoom window as its X range; its Y range follows
/// the box-zoom setting captured in the plot artifact.
pub fn export(
    view: ActiveView,
    target: &ExportTarget,
    artifacts: Option<&Artifacts>,
    selection: &Selection,
) -> Result<PathBuf, ExportError> {
    let artifacts = artifacts.ok_or(ExportError::NothingRendered)?;
    let figure = match view {
        ActiveView::Plot => Figure::Plot {
            series: artifacts.plot.as_ref().ok_or(ExportError::NothingRendered)?,
            window: selection.zoom_range(),
        },
        ActiveView::Histogram => Figure::Histogram(
            artifacts
                .histogram
                .as_ref()
                .ok_or(ExportError::NothingRendered)?,
        ),
    };

    check_writable(&target.directory)?;
    let path = target
        .directory
        .join(file_name(view, target.format, Local::now().naive_local()));

    render(&figure, target.format, &path)?;
    log::info!("exported {}", path.display());
    Ok(path)
}

/// `main_plot_YYYYMMDD_HHMMSS.png` and friends.
pub fn file_name(view: ActiveView, format: ExportFormat, at: NaiveDateTime) -> String {
    let prefix = match view {
        ActiveView::Plot => "main_plot",
        ActiveView::Histogram => "histogram",
    };
    format!(
        "{prefix}_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn check_writable(dir: &Path) -> Result<(), ExportError> {
    let meta = std::fs::metadata(dir).map_err(|e| ExportError::NotWritable {
        dir: dir.to_path_buf(),
        source: Some(e),
    })?;
    if !meta.is_dir() || meta.permissions().readonly() {
        return Err(ExportError::NotWritable {
            dir: dir.to_path_buf(),
            source: None,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

enum Figure<'a> {
    Plot {
        series: &'a PlotSeries,
        window: AxisRange,
    },
    Histogram(&'a HistogramSeries),
}

fn render(figure: &Figure<'_>, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    register_fonts();
    let (width, height) = EXPORT_SIZE;

    match format {
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, EXPORT_SIZE).into_drawing_area();
            figure.draw(&root)?;
            root.present().map_err(render_err)?;
        }
        ExportFormat::Png | ExportFormat::Jpg => {
            let mut buffer = vec![0u8; (width * height * 3) as usize];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, EXPORT_SIZE).into_drawing_area();
                figure.draw(&root)?;
                root.present().map_err(render_err)?;
            }
            let image = image::RgbImage::from_raw(width, height, buffer)
                .ok_or_else(|| ExportError::Render("bitmap buffer size mismatch".into()))?;
            let encoding = match format {
                ExportFormat::Jpg => image::ImageFormat::Jpeg,
                _ => image::ImageFormat::Png,
            };
            image.save_with_format(path, encoding)?;
        }
    }
    Ok(())
}

impl Figure<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), ExportError> {
        root.fill(&WHITE).map_err(render_err)?;
        match self {
            Figure::Plot { series, window } => draw_plot(root, series, *window),
            Figure::Histogram(hist) => draw_histogram(root, hist),
        }
    }
}

fn draw_plot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotSeries,
    window: AxisRange,
) -> Result<(), ExportError> {
    let x = window.padded(0.0);
    let y1 = plot.y1_range_for(&window);
    let y2 = plot.y2_range_for(&window);
    let y2_axis = y2.unwrap_or(y1);

    let mut chart = ChartBuilder::on(root)
        .caption(plot.title(), ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .right_y_label_area_size(if y2.is_some() { 70 } else { 0 })
        .build_cartesian_2d(x.min..x.max, y1.min..y1.max)
        .map_err(render_err)?
        .set_secondary_coord(x.min..x.max, y2_axis.min..y2_axis.max);

    chart
        .configure_mesh()
        .x_desc(plot.x_label.as_str())
        .y_desc(plot.y1.column.as_str())
        .draw()
        .map_err(render_err)?;

    let visible = indices_in_window(&plot.x, &x);
    let points = |values: &[f64]| -> Vec<(f64, f64)> {
        visible
            .iter()
            .map(|&i| (plot.x[i], values[i]))
            .filter(|(_, y)| y.is_finite())
            .collect()
    };

    chart
        .draw_series(LineSeries::new(
            points(&plot.y1.values),
            rgb(series_color(0)).stroke_width(2),
        ))
        .map_err(render_err)?;

    if let Some(trace) = &plot.y2 {
        chart
            .configure_secondary_axes()
            .y_desc(trace.column.as_str())
            .draw()
            .map_err(render_err)?;
        chart
            .draw_secondary_series(LineSeries::new(
                points(&trace.values),
                rgb(series_color(1)).stroke_width(2),
            ))
            .map_err(render_err)?;
    }

    if let Some(v) = plot.vertical_marker {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(v, y1.min), (v, y1.max)],
                rgb(VERTICAL_MARKER).stroke_width(2),
            )))
            .map_err(render_err)?;
    }
    if let Some(h) = plot.horizontal_marker {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x.min, h), (x.max, h)],
                rgb(HORIZONTAL_MARKER).stroke_width(2),
            )))
            .map_err(render_err)?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    hist: &HistogramSeries,
) -> Result<(), ExportError> {
    let x = hist
        .value_range
        .unwrap_or(AxisRange::new(0.0, 1.0))
        .padded(0.02);
    let max_count = hist
        .traces
        .iter()
        .flat_map(|t| &t.bins)
        .map(|b| b.count)
        .max()
        .unwrap_or(0)
        .max(1);

    let caption = if hist.is_empty() {
        format!("{} (no data in range)", hist.title())
    } else {
        hist.title()
    };

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x.min..x.max, 0.0..max_count as f64 * 1.1)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Value")
        .y_desc("Count")
        .draw()
        .map_err(render_err)?;

    for (i, trace) in hist.traces.iter().enumerate() {
        let color = rgb(series_color(i));
        chart
            .draw_series(trace.bins.iter().filter(|b| b.count > 0).map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.mix(0.5).filled())
            }))
            .map_err(render_err)?
            .label(trace.column.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    Ok(())
}

/// Bitmap text needs real glyphs; reuse the font egui ships with.
fn register_fonts() {
    static FONTS: Once = Once::new();
    FONTS.call_once(|| {
        let registered = plotters::style::register_font(
            "sans-serif",
            FontStyle::Normal,
            epaint_default_fonts::UBUNTU_LIGHT,
        );
        if registered.is_err() {
            log::warn!("export font unavailable, labels may be missing");
        }
    });
}

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

fn render_err(e: impl std::fmt::Debug) -> ExportError {
    ExportError::Render(format!("{e:?}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Dataset;
    use crate::selection::SecondAxis;
    use crate::sync::{Trigger, ViewSynchronizer};

    fn synced(view: ActiveView) -> (Selection, ViewSynchronizer) {
        let t: Vec<f64> = (0..50).map(f64::from).collect();
        let a: Vec<f64> = t.iter().map(|v| v.sin()).collect();
        let b: Vec<f64> = t.iter().map(|v| v * 100.0).collect();
        let schema = Schema::new(vec![
            Field::new("SimTime", DataType::Float64, false),
            Field::new("A", DataType::Float64, false),
            Field::new("B", DataType::Float64, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from(t)) as ArrayRef,
                Arc::new(Float64Array::from(a)) as ArrayRef,
                Arc::new(Float64Array::from(b)) as ArrayRef,
            ],
        )
        .unwrap();
        let ds = Dataset::new(batch, "export.dat");

        let mut sel = Selection::default();
        sel.reset_for_new_dataset(ds.extent("SimTime").unwrap());
        sel.set_y_column_1(Some("A".into()), &ds);
        sel.set_y_column_2(SecondAxis::Column("B".into()), &ds);
        sel.vertical_marker = "10".into();
        sel.set_zoom(5.0, 30.0).unwrap();
        sel.active_view = view;

        let mut sync = ViewSynchronizer::new();
        sync.synchronize(Trigger::ColumnChange, Some(&ds), &sel);
        (sel, sync)
    }

    fn target(dir: &Path, format: ExportFormat) -> ExportTarget {
        ExportTarget {
            directory: dir.to_path_buf(),
            format,
        }
    }

    #[test]
    fn file_name_carries_view_and_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            file_name(ActiveView::Plot, ExportFormat::Png, at),
            "main_plot_20240309_140507.png"
        );
        assert_eq!(
            file_name(ActiveView::Histogram, ExportFormat::Svg, at),
            "histogram_20240309_140507.svg"
        );
    }

    #[test]
    fn nothing_synchronized_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = export(
            ActiveView::Plot,
            &target(dir.path(), ExportFormat::Png),
            None,
            &Selection::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NothingRendered));

        // Histogram never materialized while the plot tab was active.
        let (sel, sync) = synced(ActiveView::Plot);
        let err = export(
            ActiveView::Histogram,
            &target(dir.path(), ExportFormat::Png),
            sync.artifacts(),
            &sel,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NothingRendered));
    }

    #[test]
    fn missing_directory_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let (sel, sync) = synced(ActiveView::Plot);
        let err = export(
            ActiveView::Plot,
            &target(&dir.path().join("gone"), ExportFormat::Png),
            sync.artifacts(),
            &sel,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NotWritable { .. }));
    }

    #[test]
    fn png_export_decodes_at_export_size() {
        let dir = tempfile::tempdir().unwrap();
        let (sel, sync) = synced(ActiveView::Plot);
        let path = export(
            ActiveView::Plot,
            &target(dir.path(), ExportFormat::Png),
            sync.artifacts(),
            &sel,
        )
        .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("main_plot_") && name.ends_with(".png"));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), EXPORT_SIZE);
    }

    #[test]
    fn svg_histogram_export_writes_markup() {
        let dir = tempfile::tempdir().unwrap();
        let (sel, sync) = synced(ActiveView::Histogram);
        let path = export(
            ActiveView::Histogram,
            &target(dir.path(), ExportFormat::Svg),
            sync.artifacts(),
            &sel,
        )
        .unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Histogram of A and B"));
    }

    #[test]
    fn jpg_export_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let (sel, sync) = synced(ActiveView::Plot);
        let path = export(
            ActiveView::Plot,
            &target(dir.path(), ExportFormat::Jpg),
            sync.artifacts(),
            &sel,
        )
        .unwrap();
        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
