use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::{TemplateField, TemplateForm, TodoField, TodoForm};
use crate::tui::widgets::color::ThemeColors;
use crate::tui::widgets::{popup_area_with_height, render_choice_field, render_text_field};
use crate::utils::format_key_binding_for_display;

/// Create/edit popup for a todo
pub fn render_todo_form(f: &mut Frame, area: Rect, form: &mut TodoForm, online: bool, colors: &ThemeColors) {
    let popup = popup_area_with_height(area, 60, 15);
    f.render_widget(Clear, popup);

    let title = if form.editing_id.is_some() { "Edit Todo" } else { "New Todo" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(colors.normal());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let field = form.current_field;
    render_text_field(f, rows[0], "Title", &mut form.title, field == TodoField::Title, colors);
    render_choice_field(f, rows[1], "Priority", form.priority.as_str(), field == TodoField::Priority, colors);
    render_choice_field(f, rows[2], "Category", form.category.as_str(), field == TodoField::Category, colors);

    let ai_note = if online { "" } else { " (offline)" };
    let hints = format!(
        "{}: improve title • {}: suggest category{} • Enter: save • Esc: cancel",
        format_key_binding_for_display("Ctrl+r"),
        format_key_binding_for_display("Ctrl+g"),
        ai_note
    );
    f.render_widget(
        Paragraph::new(hints).style(colors.normal()).wrap(Wrap { trim: true }),
        rows[4],
    );
}

/// Inline form inside the templates panel
pub fn render_template_form(f: &mut Frame, area: Rect, form: &mut TemplateForm, colors: &ThemeColors) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let field = form.current_field;
    render_text_field(f, rows[0], "Name", &mut form.name, field == TemplateField::Name, colors);
    render_text_field(f, rows[1], "Title", &mut form.title, field == TemplateField::Title, colors);
    render_choice_field(f, rows[2], "Priority", form.priority.as_str(), field == TemplateField::Priority, colors);
    render_choice_field(f, rows[3], "Category", form.category.as_str(), field == TemplateField::Category, colors);
    f.render_widget(
        Paragraph::new("Enter: save • Esc: back").style(colors.normal()),
        rows[4],
    );
}
