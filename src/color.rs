use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Series colours
// ---------------------------------------------------------------------------

/// Hue of the first series; later series rotate by the golden angle so any
/// two neighbours stay far apart on the wheel.
const BASE_HUE: f32 = 210.0;
const GOLDEN_ANGLE: f32 = 137.508;

pub const VERTICAL_MARKER: Color32 = Color32::from_rgb(220, 50, 47);
pub const HORIZONTAL_MARKER: Color32 = Color32::from_rgb(38, 139, 60);

/// Colour for the `index`-th plotted series (0 = Y1, 1 = Y2).
pub fn series_color(index: usize) -> Color32 {
    let hue = (BASE_HUE + index as f32 * GOLDEN_ANGLE) % 360.0;
    hsl_to_color32(Hsl::new(hue, 0.75, 0.45))
}

/// Same colour with `alpha` opacity, for overlaid histogram bars.
pub fn translucent(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}
