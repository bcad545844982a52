use eframe::egui;

use crate::prefs::PreferencesStore;
use crate::selection::ActiveView;
use crate::state::{AppState, ShellEvent};
use crate::ui::panels::{self, Controls};
use crate::ui::plot::{self, PlotView};
use crate::ui::stats;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DatPlotApp {
    pub state: AppState,
    controls: Controls,
    plot_view: PlotView,
}

impl DatPlotApp {
    pub fn new(prefs: PreferencesStore) -> Self {
        Self {
            state: AppState::new(prefs),
            controls: Controls::default(),
            plot_view: PlotView::default(),
        }
    }
}

impl eframe::App for DatPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut events: Vec<ShellEvent> = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state, &mut self.controls, &mut events);
            });

        // ---- Bottom panel: stats ----
        egui::TopBottomPanel::bottom("stats_panel")
            .resizable(true)
            .default_height(140.0)
            .show(ctx, |ui| {
                stats::stats_panel(ui, self.state.sync.artifacts());
            });

        // ---- Central panel: plot / histogram ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::view_tabs(ui, &self.state, &mut events);
            ui.separator();
            match self.state.selection.active_view {
                ActiveView::Plot => {
                    plot::main_plot(ui, &mut self.state.sync, &mut self.plot_view, &mut events)
                }
                ActiveView::Histogram => plot::histogram(ui, &self.state.sync),
            }
        });

        if !events.is_empty() {
            for event in events {
                self.state.handle(event);
            }
            ctx.request_repaint();
        }
    }
}
