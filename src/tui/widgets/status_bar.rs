use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::tui::widgets::color::{ThemeColors, get_contrast_text_color};

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&String>,
    key_hints: &[String],
    colors: &ThemeColors,
) {
    let max_width = area.width as usize;
    let (content, style) = match message {
        // Messages stand out against the hints
        Some(msg) => (
            truncate(msg, max_width),
            Style::default()
                .fg(get_contrast_text_color(colors.highlight_bg))
                .bg(colors.highlight_bg)
                .add_modifier(Modifier::BOLD),
        ),
        None => (fit_hints(key_hints, max_width), colors.normal()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
    kept + ELLIPSIS
}

/// Join as many hints as fit in `max_width`, ending with an ellipsis when some are dropped
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    let mut len = 0;

    for (i, hint) in hints.iter().enumerate() {
        let hint_len = hint.chars().count();
        let added = if i == 0 { hint_len } else { SEPARATOR.chars().count() + hint_len };

        if len + added > max_width {
            if i == 0 {
                return truncate(hint, max_width);
            }
            if len + ELLIPSIS.len() > max_width {
                text = text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
            }
            text.push_str(ELLIPSIS);
            return text;
        }

        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
        len += added;
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".to_string(), "n: New".to_string(), "/: Search".to_string()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • n: New • /: Search");
    }

    #[test]
    fn overflow_ends_with_ellipsis() {
        assert_eq!(fit_hints(&hints(), 20), "q: Quit • n: New...");
        assert_eq!(fit_hints(&hints(), 18), "q: Quit • n: Ne...");
    }

    #[test]
    fn long_first_hint_is_truncated() {
        assert_eq!(fit_hints(&hints(), 5), "q:...");
        assert_eq!(truncate("short", 10), "short");
    }
}
