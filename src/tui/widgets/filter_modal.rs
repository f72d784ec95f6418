use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::App;
use crate::tui::app::FilterField;
use crate::tui::widgets::color::ThemeColors;
use crate::tui::widgets::{popup_area_with_height, render_choice_field, render_text_field};

/// Search and filter popup; changes apply as they are made
pub fn render_filter_modal(f: &mut Frame, area: Rect, app: &mut App) {
    let colors = ThemeColors::from_config(&app.config);
    let criteria = app.store.criteria().clone();
    let shown = app.store.filtered_todos().len();
    let total = app.store.todos().len();
    let Some(ref mut state) = app.filter_form else {
        return;
    };

    let popup = popup_area_with_height(area, 60, 16);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Search & Filters")
        .title_alignment(Alignment::Center)
        .style(colors.normal());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Length(3), // Priority
            Constraint::Length(3), // Category
            Constraint::Length(1), // Clear
            Constraint::Min(0),
            Constraint::Length(1), // Count
        ])
        .split(inner);

    let field = state.current_field;
    render_text_field(f, rows[0], "Search", &mut state.query, field == FilterField::Query, &colors);
    render_choice_field(
        f,
        rows[1],
        "Priority",
        &criteria.priority.to_string(),
        field == FilterField::Priority,
        &colors,
    );
    render_choice_field(
        f,
        rows[2],
        "Category",
        &criteria.category.to_string(),
        field == FilterField::Category,
        &colors,
    );

    let clear_style = if field == FilterField::Clear { colors.highlight() } else { colors.normal() };
    f.render_widget(
        Paragraph::new("[ Clear filters ]").alignment(Alignment::Center).style(clear_style),
        rows[3],
    );
    f.render_widget(
        Paragraph::new(format!("Showing {} of {}", shown, total))
            .alignment(Alignment::Center)
            .style(colors.normal()),
        rows[5],
    );
}
