pub mod ai_panel;
pub mod bulk_ops;
pub mod canvas;
pub mod color;
pub mod confirm_delete;
pub mod editor;
pub mod filter_modal;
pub mod filters_box;
pub mod form;
pub mod help;
pub mod status_bar;
pub mod templates;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::widgets::color::ThemeColors;
use crate::tui::widgets::editor::Editor;

/// Centered rect taking a percentage of `area`.
/// Based on the ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

/// Centered rect with a fixed height, clamped to `area`
pub fn popup_area_with_height(area: Rect, percent_x: u16, height: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

fn field_block(label: &str, active: bool, colors: &ThemeColors) -> Block<'static> {
    let title = if active {
        format!("> {}", label)
    } else {
        format!("  {}", label)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(if active { colors.highlight() } else { colors.normal() })
}

/// Bordered single-line input. Places the terminal cursor when active.
pub fn render_text_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    editor: &mut Editor,
    active: bool,
    colors: &ThemeColors,
) {
    let block = field_block(label, active, colors);
    let inner = block.inner(area);
    editor.update_horizontal_scroll(inner.width as usize);

    let paragraph = Paragraph::new(editor.visible_text(inner.width as usize))
        .block(block)
        .style(colors.normal());
    f.render_widget(paragraph, area);

    if active {
        if let Some((x, y)) = editor.cursor_screen_pos(inner) {
            f.set_cursor_position((x, y));
        }
    }
}

/// Bordered selector showing `< value >`
pub fn render_choice_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    active: bool,
    colors: &ThemeColors,
) {
    let text = if active {
        format!("< {} >", value)
    } else {
        format!("  {}", value)
    };
    let paragraph = Paragraph::new(text)
        .block(field_block(label, active, colors))
        .style(colors.normal());
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(popup_area(area, 50, 40), Rect::new(25, 15, 50, 20));
        assert_eq!(popup_area_with_height(area, 60, 10), Rect::new(20, 20, 60, 10));
        assert_eq!(popup_area_with_height(Rect::new(0, 0, 100, 6), 60, 10).height, 6);
    }
}
