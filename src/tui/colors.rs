//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Quadrant;

/// Used for Do
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Used for Schedule
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Used for Delegate
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for Eliminate
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
/// Used for the Suggested pane
pub const STEEL_BLUE: Color = Color::Rgb(40, 70, 120);

/// Accent color of a quadrant pane.
pub fn quadrant_color(q: Quadrant) -> Color {
    match q {
        Quadrant::Do => DARK_RED,
        Quadrant::Schedule => DARK_GREEN,
        Quadrant::Delegate => GOLD,
        Quadrant::Eliminate => DARK_PURPLE,
    }
}

/// Readable foreground on top of `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        GOLD => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
