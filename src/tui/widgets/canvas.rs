use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::models::Todo;
use crate::placement::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::tui::App;
use crate::tui::viewport::Viewport;
use crate::tui::widgets::color::{ThemeColors, category_color, priority_color, priority_marker};

/// Canvas units between grid marks
const GRID_SPACING: f64 = 500.0;

pub fn render_canvas(f: &mut Frame, area: Rect, app: &App) {
    let colors = ThemeColors::from_config(&app.config);
    let viewport = app.ui.viewport;

    let title = format!(
        " Canvas  zoom {}  center ({:.0}, {:.0}) ",
        viewport.zoom, viewport.center.x, viewport.center.y
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(colors.normal());
    let inner = block.inner(area);
    f.render_widget(block, area);

    render_grid(f, inner, &viewport, &colors);

    let todos = app.store.filtered_todos();
    if todos.is_empty() {
        let message = if app.store.todos().is_empty() {
            format!(
                "No todos yet. Press {} to add one.",
                crate::utils::format_key_binding_for_display(&app.config.key_bindings.new)
            )
        } else {
            "No todos match the current filters".to_string()
        };
        let y = inner.y + inner.height / 2;
        let line = Rect::new(inner.x, y, inner.width, inner.height.min(1));
        f.render_widget(Paragraph::new(message).alignment(Alignment::Center).style(colors.normal()), line);
        return;
    }

    // Focused card last so it draws on top
    let focused = app.ui.focused.as_deref();
    let (front, back): (Vec<&Todo>, Vec<&Todo>) = todos.into_iter().partition(|t| Some(t.id.as_str()) == focused);
    for todo in back.iter().chain(front.iter()) {
        if let Some(rect) = viewport.card_rect(todo.position, inner) {
            let is_focused = Some(todo.id.as_str()) == focused;
            render_card(f, rect, todo, is_focused, app.store.is_selected(&todo.id), &colors);
        }
    }
}

/// `+` marks where grid lines cross, inside the canvas bounds only
fn render_grid(f: &mut Frame, area: Rect, viewport: &Viewport, colors: &ThemeColors) {
    let buffer = f.buffer_mut();
    let steps_x = (CANVAS_WIDTH / GRID_SPACING) as usize;
    let steps_y = (CANVAS_HEIGHT / GRID_SPACING) as usize;

    for i in 0..=steps_x {
        for j in 0..=steps_y {
            let point = crate::models::Position::new(i as f64 * GRID_SPACING, j as f64 * GRID_SPACING);
            let (col, row) = viewport.to_screen(point, area);
            let (col, row) = (col.round(), row.round());
            if col < 0.0 || row < 0.0 || col >= area.width as f64 || row >= area.height as f64 {
                continue;
            }
            if let Some(cell) = buffer.cell_mut((area.x + col as u16, area.y + row as u16)) {
                cell.set_symbol("+").set_fg(colors.grid);
            }
        }
    }
}

fn render_card(f: &mut Frame, rect: Rect, todo: &Todo, focused: bool, selected: bool, colors: &ThemeColors) {
    f.render_widget(Clear, rect);
    let border_color = category_color(todo.category);
    let marker = priority_marker(todo.priority);

    // Too small for a box: a colored chip with the marker
    if rect.width < 6 || rect.height < 3 {
        let style = Style::default().fg(colors.bg).bg(border_color);
        let text = if selected { format!("*{}", marker) } else { marker.to_string() };
        f.render_widget(Paragraph::new(text).style(style), rect);
        return;
    }

    let mut title = vec![Span::styled(
        format!(" {} ", marker),
        Style::default().fg(priority_color(todo.priority)).add_modifier(Modifier::BOLD),
    )];
    if selected {
        title.push(Span::styled("[x] ", Style::default().fg(colors.highlight_fg).bg(colors.highlight_bg)));
    }

    let (border_type, body_style) = if focused {
        (BorderType::Thick, colors.highlight())
    } else {
        (BorderType::Rounded, colors.normal())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color))
        .title(Line::from(title))
        .style(body_style);

    let lines = vec![
        Line::from(Span::styled(todo.title.clone(), body_style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(todo.category.to_string(), Style::default().fg(border_color))),
    ];
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, rect);
}
