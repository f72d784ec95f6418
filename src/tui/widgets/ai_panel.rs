use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::ai::InsightKind;
use crate::tui::App;
use crate::tui::app::{AiFocus, AiResults};
use crate::tui::widgets::color::{ThemeColors, category_color, priority_color, priority_marker};
use crate::tui::widgets::render_text_field;
use crate::utils::format_key_binding_for_display;

fn insight_label(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Productivity => "productivity",
        InsightKind::Organization => "organization",
        InsightKind::Suggestion => "suggestion",
        InsightKind::Pattern => "pattern",
    }
}

/// Wrap `text` into lines of at most `width` chars, breaking on spaces
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() { word.chars().count() } else { current.chars().count() + 1 + word.chars().count() };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn render_ai_panel(f: &mut Frame, area: Rect, app: &mut App) {
    let colors = ThemeColors::from_config(&app.config);
    let title = if app.ai.is_online() { "AI Assistant" } else { "AI Assistant (offline)" };
    let block = Block::default().borders(Borders::ALL).title(title).style(colors.normal());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(1), // Source note
            Constraint::Min(1),    // Results
            Constraint::Length(3), // Hints
        ])
        .split(inner);

    let panel = &mut app.ai_panel;
    let input_active = panel.focus == AiFocus::Input;
    render_text_field(f, rows[0], "What are you planning?", &mut panel.input, input_active, &colors);

    let text_width = rows[2].width.saturating_sub(4) as usize;
    let (items, from_fallback): (Vec<ListItem>, bool) = match &panel.results {
        AiResults::Empty => (Vec::new(), false),
        AiResults::Suggestions { items, from_fallback } => (
            items
                .iter()
                .map(|s| {
                    let mut lines = vec![Line::from(vec![
                        Span::styled(
                            format!("{:<4}", priority_marker(s.priority)),
                            Style::default().fg(priority_color(s.priority)),
                        ),
                        Span::styled(s.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(format!(" [{}]", s.category), Style::default().fg(category_color(s.category))),
                    ])];
                    lines.extend(wrap_words(&s.reasoning, text_width).into_iter().map(|l| Line::from(format!("    {}", l))));
                    ListItem::new(lines)
                })
                .collect(),
            *from_fallback,
        ),
        AiResults::Insights { items, from_fallback } => (
            items
                .iter()
                .map(|insight| {
                    let mut lines = vec![Line::from(vec![
                        Span::styled(format!("[{}] ", insight_label(insight.kind)), Style::default().fg(colors.grid)),
                        Span::styled(insight.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    ])];
                    lines.extend(wrap_words(&insight.description, text_width).into_iter().map(|l| Line::from(format!("    {}", l))));
                    if let Some(ref action) = insight.action {
                        lines.extend(
                            wrap_words(&format!("-> {}", action), text_width)
                                .into_iter()
                                .map(|l| Line::from(format!("    {}", l))),
                        );
                    }
                    ListItem::new(lines)
                })
                .collect(),
            *from_fallback,
        ),
    };

    let note = match (&panel.results, from_fallback) {
        (AiResults::Empty, _) => "",
        (_, true) => "Offline results",
        (_, false) => "From Gemini",
    };
    f.render_widget(Paragraph::new(note).style(colors.normal()), rows[1]);

    if items.is_empty() {
        let empty = match panel.results {
            AiResults::Insights { .. } => "No insights right now",
            _ => "Describe a plan and press Enter for suggestions",
        };
        f.render_widget(Paragraph::new(empty).style(colors.normal()).wrap(Wrap { trim: true }), rows[2]);
    } else {
        let highlight = if panel.focus == AiFocus::Results { colors.highlight() } else { colors.normal() };
        let list = List::new(items)
            .style(colors.normal())
            .highlight_style(highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(panel.selected));
        f.render_stateful_widget(list, rows[2], &mut state);
    }

    let hints = format!(
        "Enter: suggest • {}: template • {}: analyze • Tab: results • Enter/A: add one/all • Esc: close",
        format_key_binding_for_display("Ctrl+t"),
        format_key_binding_for_display("Ctrl+y"),
    );
    f.render_widget(Paragraph::new(hints).style(colors.normal()).wrap(Wrap { trim: true }), rows[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_words_breaks_on_spaces() {
        assert_eq!(wrap_words("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap_words("", 10), Vec::<String>::new());
        assert_eq!(wrap_words("supercalifragilistic", 5), vec!["supercalifragilistic"]);
    }
}
