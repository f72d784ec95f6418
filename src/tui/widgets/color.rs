use ratatui::style::{Color, Style};

use crate::Config;
use crate::models::{Category, Priority};

/// The active theme resolved to terminal colors
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub fg: Color,
    pub bg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub grid: Color,
}

impl ThemeColors {
    pub fn from_config(config: &Config) -> Self {
        let theme = config.get_active_theme();
        Self {
            fg: parse_color(&theme.fg),
            bg: parse_color(&theme.bg),
            highlight_fg: parse_color(&theme.highlight_fg),
            highlight_bg: parse_color(&theme.highlight_bg),
            grid: parse_color(&theme.grid),
        }
    }

    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn highlight(&self) -> Style {
        Style::default().fg(self.highlight_fg).bg(self.highlight_bg)
    }
}

/// Border color of a card
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Work => Color::Blue,
        Category::Personal => Color::Magenta,
        Category::Shopping => Color::Yellow,
        Category::Health => Color::Green,
        Category::Learning => Color::Cyan,
        Category::Other => Color::Gray,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::LightYellow,
        Priority::Low => Color::LightGreen,
    }
}

/// Short marker shown on cards and in lists
pub fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!!",
        Priority::Medium => "!!",
        Priority::Low => "!",
    }
}

/// Parse a color string into a ratatui Color
/// Supports:
/// - Named colors: black, red, green, yellow, blue, magenta, cyan, white, gray/grey,
///   darkgray and the light* variants
/// - Hex format: #RRGGBB or #RGB
/// - RGB format: rgb(255,0,0) or rgb(255, 0, 0)
/// Unrecognized colors fall back to white
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();

    match s.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "lightgrey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ if s.starts_with('#') => parse_hex_color(&s).unwrap_or(Color::White),
        _ if s.starts_with("rgb(") => parse_rgb_color(&s).unwrap_or(Color::White),
        _ => Color::White,
    }
}

fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            // #RGB -> #RRGGBB
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| (v << 4) | v);
            Some(Color::Rgb(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

fn parse_rgb_color(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<u8> = content
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts[..] {
        [r, g, b] => Some(Color::Rgb(r, g, b)),
        _ => None,
    }
}

/// Format a Color back to its config string
pub fn format_color_for_display(color: &Color) -> String {
    match color {
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::White => "white".to_string(),
        Color::Gray => "gray".to_string(),
        Color::DarkGray => "darkgray".to_string(),
        Color::LightRed => "lightred".to_string(),
        Color::LightGreen => "lightgreen".to_string(),
        Color::LightYellow => "lightyellow".to_string(),
        Color::LightBlue => "lightblue".to_string(),
        Color::LightMagenta => "lightmagenta".to_string(),
        Color::LightCyan => "lightcyan".to_string(),
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(_) => "indexed".to_string(),
        Color::Reset => "reset".to_string(),
    }
}

/// WCAG relative luminance, 0.0 (dark) to 1.0 (light)
fn calculate_luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |channel: u8| {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Black or white, whichever reads better on `background`.
/// RGB colors use luminance; named colors use how terminals usually render them.
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => calculate_luminance(r, g, b) < 0.5,
        other => matches!(other, Color::Black | Color::Blue | Color::Magenta | Color::Red),
    };
    if dark { Color::White } else { Color::Black }
}
