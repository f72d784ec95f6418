use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::tui::widgets::color::ThemeColors;
use crate::utils::format_key_binding_for_display;

/// Always-visible summary of the active search and filters
pub fn render_filters_box(f: &mut Frame, area: Rect, summary: &str, config: &Config, colors: &ThemeColors) {
    let title = format!(
        "{}: Search  {}: Filters",
        format_key_binding_for_display(&config.key_bindings.search),
        format_key_binding_for_display(&config.key_bindings.filter)
    );
    let paragraph = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(title).style(colors.normal()))
        .style(colors.normal());
    f.render_widget(paragraph, area);
}
