//! Colors and stroke widths for the chain view.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Graph area background
    pub const GRAPH: Color32 = Color32::from_rgb(14, 17, 23);

    /// Control panel background
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);
}

/// Node fill scale: fixed hue, saturation grows with probability
pub mod fill {
    /// Hue in degrees
    pub const HUE: f32 = 207.0;

    pub const LIGHTNESS: f32 = 0.49;
}

/// Link and arrowhead color
pub const LINK: Color32 = Color32::from_rgb(150, 155, 165);

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    /// State names and percentages
    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    /// Status lines
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// State colors for interactive elements
pub mod state {
    use super::*;

    /// Rejected loads and step errors
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);

    /// Animation running indicator
    pub const RUNNING: Color32 = Color32::from_rgb(34, 197, 94);
}

/// Stroke widths
pub mod stroke_width {
    /// Link paths
    pub const LINK: f32 = 3.0;

    /// Node circle border
    pub const NODE: f32 = 1.5;
}

/// Convert HSL to RGB color. `h` in degrees, `s` and `l` in 0.0 - 1.0
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(channel(r), channel(g), channel(b))
}
