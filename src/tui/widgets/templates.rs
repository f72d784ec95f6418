use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::tui::App;
use crate::tui::widgets::color::{ThemeColors, category_color, priority_marker};
use crate::tui::widgets::form::render_template_form;

pub fn render_templates_panel(f: &mut Frame, area: Rect, app: &mut App) {
    let colors = ThemeColors::from_config(&app.config);
    let title = if app.templates.form.is_some() { "Templates > New" } else { "Templates" };
    let block = Block::default().borders(Borders::ALL).title(title).style(colors.normal());
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(ref mut form) = app.templates.form {
        render_template_form(f, inner, form, &colors);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    let templates = app.store.templates();
    if templates.is_empty() {
        f.render_widget(
            Paragraph::new("No templates. Press a to add one.").style(colors.normal()),
            rows[0],
        );
    } else {
        let items: Vec<ListItem> = templates
            .iter()
            .map(|template| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            format!("{:<4}", priority_marker(template.priority)),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(template.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    ]),
                    Line::from(vec![
                        Span::raw("    "),
                        Span::raw(template.title.clone()),
                        Span::styled(
                            format!(" [{}]", template.category),
                            Style::default().fg(category_color(template.category)),
                        ),
                    ]),
                ])
            })
            .collect();

        let list = List::new(items)
            .style(colors.normal())
            .highlight_style(colors.highlight())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(app.templates.selected));
        f.render_stateful_widget(list, rows[0], &mut state);
    }

    f.render_widget(
        Paragraph::new("Enter: use • a: add • d: delete • Esc: close")
            .style(colors.normal())
            .wrap(Wrap { trim: true }),
        rows[1],
    );
}
