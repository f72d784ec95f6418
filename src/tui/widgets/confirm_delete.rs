use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::DeleteTarget;
use crate::tui::widgets::color::ThemeColors;
use crate::tui::widgets::popup_area_with_height;

pub fn render_confirm_delete(
    f: &mut Frame,
    area: Rect,
    target: &DeleteTarget,
    selection: usize,
    colors: &ThemeColors,
) {
    let popup = popup_area_with_height(area, 50, 11);
    f.render_widget(Clear, popup);

    let (question, name) = match target {
        DeleteTarget::Todo { title, .. } => ("Delete this todo?".to_string(), title.clone()),
        DeleteTarget::Selected(count) => (
            format!("Delete {} selected todo{}?", count, if *count == 1 { "" } else { "s" }),
            String::new(),
        ),
        DeleteTarget::Template { name, .. } => ("Delete this template?".to_string(), name.clone()),
    };

    let mut lines = vec![Line::styled(question, colors.normal()), Line::from("")];
    if !name.is_empty() {
        lines.push(Line::styled(name, colors.normal()));
        lines.push(Line::from(""));
    }
    for (index, option) in ["Delete", "Cancel"].iter().enumerate() {
        let (text, style) = if index == selection {
            (format!("> {} <", option), colors.highlight())
        } else {
            (format!("  {}  ", option), colors.normal())
        };
        lines.push(Line::styled(text, style));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("↑↓: choose • Enter: confirm • Esc: cancel", colors.normal()));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .title_alignment(Alignment::Center)
                .style(colors.normal()),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(paragraph, popup);
}
