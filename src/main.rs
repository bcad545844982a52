mod app;
mod color;
mod data;
mod error;
mod export;
mod prefs;
mod selection;
mod state;
mod sync;
mod ui;

use app::DatPlotApp;
use eframe::egui;
use prefs::PreferencesStore;

fn main() -> eframe::Result {
    env_logger::init();

    let prefs = PreferencesStore::open_default();
    if let Some(path) = prefs.path() {
        log::info!("Preferences at {}", path.display());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DatPlot – Simulation Data Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(DatPlotApp::new(prefs)))),
    )
}
