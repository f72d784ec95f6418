use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::config::KeyBindings;
use crate::tui::widgets::color::ThemeColors;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as display;

pub fn render_help(f: &mut Frame, area: Rect, bindings: &KeyBindings, colors: &ThemeColors) {
    let popup = popup_area(area, 70, 85);
    f.render_widget(Clear, popup);

    let paragraph = Paragraph::new(build_help_text(bindings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(colors.normal()),
        )
        .style(colors.normal())
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);
}

pub fn build_help_text(k: &KeyBindings) -> String {
    let mut text = String::new();

    text.push_str("Canvas:\n");
    text.push_str("  Arrows: Pan view\n");
    text.push_str("  Shift+Arrows: Move focused card\n");
    text.push_str(&format!("  {} / {}: Focus next / previous card\n", display(&k.next_card), display(&k.prev_card)));
    text.push_str(&format!("  {} / {}: Zoom in / out\n", display(&k.zoom_in), display(&k.zoom_out)));
    text.push_str(&format!("  {}: Center on shown cards\n", display(&k.center)));
    text.push('\n');

    text.push_str("Cards:\n");
    text.push_str(&format!("  {}: New todo\n", display(&k.new)));
    text.push_str("  Enter / e: Edit focused todo\n");
    text.push_str(&format!("  {}: Delete focused todo\n", display(&k.delete)));
    text.push_str(&format!("  {}: Select / unselect focused\n", display(&k.toggle_select)));
    text.push_str(&format!("  {}: Select all shown (again to clear)\n", display(&k.select_all)));
    text.push_str(&format!("  {}: Clear selection\n", display(&k.clear_selection)));
    text.push('\n');

    text.push_str("Panels:\n");
    text.push_str(&format!("  {}: Search\n", display(&k.search)));
    text.push_str(&format!("  {}: Filters\n", display(&k.filter)));
    text.push_str(&format!("  {}: Templates\n", display(&k.templates)));
    text.push_str(&format!("  {}: Bulk operations\n", display(&k.bulk)));
    text.push_str(&format!("  {}: AI assistant\n", display(&k.ai)));
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  Left / Right: Change priority or category\n");
    text.push_str(&format!("  {}: Undo typing\n", display("Ctrl+z")));
    text.push_str(&format!("  {}: Improve title with AI\n", display("Ctrl+r")));
    text.push_str(&format!("  {}: Suggest category and priority\n", display("Ctrl+g")));
    text.push_str("  Enter: Save\n");
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", display(&k.quit)));
    text.push_str(&format!("  {}: Show / hide help\n", display(&k.help)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_reflects_configured_bindings() {
        let mut bindings = KeyBindings::default();
        bindings.bulk = "m".to_string();
        let text = build_help_text(&bindings);
        assert!(text.contains("  m: Bulk operations"));
        assert!(text.contains("F1: Show / hide help"));
    }
}
