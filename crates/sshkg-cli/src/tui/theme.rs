//! Color theme for the interactive screens.

use ratatui::style::Color;

/// Color theme. Matches the palette of the default dark terminal profile.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Title banner
    pub title: Color,
    /// Highlighted list entry and success messages
    pub success: Color,
    /// Error screen
    pub error: Color,
    /// Overwrite warning
    pub warning: Color,
    /// Key hints and secondary text
    pub help: Color,
    /// Body text
    pub text: Color,
    /// Unfilled part of the progress bar
    pub track: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Color::Rgb(0x04, 0xB5, 0x75),
            success: Color::Rgb(0x04, 0xB5, 0x75),
            error: Color::Rgb(0xFF, 0x5F, 0x87),
            warning: Color::Rgb(0xFF, 0xA5, 0x00),
            help: Color::Rgb(0x62, 0x62, 0x62),
            text: Color::Reset,
            track: Color::DarkGray,
        }
    }
}
