use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::tui::App;
use crate::tui::app::BulkAction;
use crate::tui::widgets::color::ThemeColors;

/// Label for an action row given the current selection
pub fn action_label(app: &App, action: BulkAction) -> String {
    match action {
        BulkAction::ToggleSelectAll => {
            if app.store.all_filtered_selected() {
                "Clear selection".to_string()
            } else {
                "Select all shown".to_string()
            }
        }
        BulkAction::SetPriority => format!("Set priority  < {} >", app.bulk.priority),
        BulkAction::SetCategory => format!("Set category  < {} >", app.bulk.category),
        BulkAction::DeleteSelected => format!("Delete selected ({})", app.store.selected_ids().len()),
    }
}

pub fn render_bulk_panel(f: &mut Frame, area: Rect, app: &App) {
    let colors = ThemeColors::from_config(&app.config);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Bulk Operations")
        .style(colors.normal());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    let summary = format!(
        "{} selected, {} shown",
        app.store.selected_ids().len(),
        app.store.filtered_todos().len()
    );
    f.render_widget(Paragraph::new(summary).style(colors.normal()), rows[0]);

    let items: Vec<ListItem> = BulkAction::ALL
        .iter()
        .map(|action| ListItem::new(action_label(app, *action)))
        .collect();
    let list = List::new(items)
        .style(colors.normal())
        .highlight_style(colors.highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.bulk.selected));
    f.render_stateful_widget(list, rows[1], &mut state);

    f.render_widget(
        Paragraph::new("↑↓: choose • ←→: change value • Enter: apply • Esc: close")
            .style(colors.normal())
            .wrap(Wrap { trim: true }),
        rows[2],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::ai::AiAssistant;
    use crate::models::{Category, NewTodo, Priority};
    use crate::store::TodoStore;

    #[test]
    fn labels_track_selection_state() {
        let mut app = App::new(Config::default(), TodoStore::new(), AiAssistant::offline()).unwrap();
        let id = app.store.create_todo(NewTodo::new("a", Priority::Low, Category::Work));
        assert_eq!(action_label(&app, BulkAction::ToggleSelectAll), "Select all shown");

        app.store.toggle_selection(&id);
        assert_eq!(action_label(&app, BulkAction::ToggleSelectAll), "Clear selection");
        assert_eq!(action_label(&app, BulkAction::DeleteSelected), "Delete selected (1)");
        assert_eq!(action_label(&app, BulkAction::SetPriority), "Set priority  < high >");
    }
}
