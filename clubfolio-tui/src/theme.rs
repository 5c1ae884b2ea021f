//! Parrot/neon palette and the styles built from it.
//!
//! - **Accent**: electric cyan (focus, headings)
//! - **Positive / Negative**: neon green / hot pink (gains, losses)
//! - **Warning**: neon orange
//! - **Muted**: steel blue (secondary text)

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

/// One line colour per investor, cycled.
const INVESTOR_COLORS: [Color; 6] = [
    ACCENT,
    WARNING,
    NEUTRAL,
    POSITIVE,
    Color::Rgb(255, 215, 0),
    Color::Rgb(240, 128, 128),
];

pub fn investor_color(index: usize) -> Color {
    INVESTOR_COLORS[index % INVESTOR_COLORS.len()]
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

/// Green for gains, pink for losses, muted when unknown.
pub fn pnl_style(value: Option<f64>) -> Style {
    match value {
        Some(v) if v >= 0.0 => positive(),
        Some(_) => negative(),
        None => muted(),
    }
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

pub fn cursor() -> Style {
    accent().add_modifier(Modifier::REVERSED)
}
