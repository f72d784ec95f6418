use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::{AiFocus, Mode};
use crate::tui::widgets::{
    ai_panel::render_ai_panel,
    bulk_ops::render_bulk_panel,
    canvas::render_canvas,
    color::ThemeColors,
    confirm_delete::render_confirm_delete,
    filter_modal::render_filter_modal,
    filters_box::render_filters_box,
    form::render_todo_form,
    help::render_help,
    status_bar::render_status_bar,
    templates::render_templates_panel,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let colors = ThemeColors::from_config(&app.config);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Todo Canvas")
        .title_alignment(Alignment::Center)
        .style(colors.normal());
    f.render_widget(outer_block, f.area());

    // Focus recentering needs the size of what was actually drawn
    app.ui.canvas_area = layout.canvas_area;
    render_canvas(f, layout.canvas_area, app);

    if layout.panel_area.width > 0 {
        match app.ui.mode {
            Mode::Templates => render_templates_panel(f, layout.panel_area, app),
            Mode::Bulk => render_bulk_panel(f, layout.panel_area, app),
            Mode::Ai => render_ai_panel(f, layout.panel_area, app),
            _ => {}
        }
    }

    let summary = app.get_filter_summary();
    render_filters_box(f, layout.filters_area, &summary, &app.config, &colors);

    // Overlays after normal content
    match app.ui.mode {
        Mode::TodoForm => {
            let online = app.ai.is_online();
            if let Some(ref mut form) = app.form.todo_form {
                render_todo_form(f, layout.inner_area, form, online, &colors);
            }
        }
        Mode::Filter => render_filter_modal(f, layout.inner_area, app),
        Mode::Help => render_help(f, layout.inner_area, &app.config.key_bindings, &colors),
        _ => {}
    }

    if let Some(ref target) = app.modals.delete_confirmation {
        render_confirm_delete(f, layout.inner_area, target, app.modals.delete_modal_selection, &colors);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &colors);
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let k = &app.config.key_bindings;
    if app.modals.delete_confirmation.is_some() {
        return vec!["Enter: confirm".to_string(), "Esc: cancel".to_string()];
    }

    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Close help", display(&k.help))],
        Mode::TodoForm => vec![
            "Tab: Next field".to_string(),
            "←→: Change value".to_string(),
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::Filter => vec![
            "Tab: Next field".to_string(),
            "←→: Change value".to_string(),
            "Enter: Done".to_string(),
            "Esc: Close".to_string(),
        ],
        Mode::Templates if app.templates.form.is_some() => vec![
            "Tab: Next field".to_string(),
            "Enter: Save template".to_string(),
            "Esc: Back".to_string(),
        ],
        Mode::Templates => vec![
            "↑↓: Choose".to_string(),
            "Enter: Use".to_string(),
            "a: Add".to_string(),
            "d: Delete".to_string(),
            "Esc: Close".to_string(),
        ],
        Mode::Bulk => vec![
            "↑↓: Choose".to_string(),
            "←→: Change value".to_string(),
            "Enter: Apply".to_string(),
            "Esc: Close".to_string(),
        ],
        Mode::Ai if app.ai_panel.focus == AiFocus::Results => vec![
            "↑↓: Choose".to_string(),
            "Enter: Add".to_string(),
            "A: Add all".to_string(),
            "Tab: Input".to_string(),
            "Esc: Close".to_string(),
        ],
        Mode::Ai => vec![
            "Enter: Suggest".to_string(),
            format!("{}: Template", display("Ctrl+t")),
            format!("{}: Analyze", display("Ctrl+y")),
            "Esc: Close".to_string(),
        ],
        Mode::Canvas => vec![
            format!("{}: Quit", display(&k.quit)),
            format!("{}: New", display(&k.new)),
            format!("{}: Next card", display(&k.next_card)),
            "Enter: Edit".to_string(),
            format!("{}: Delete", display(&k.delete)),
            "Arrows: Pan".to_string(),
            "Shift+Arrows: Move".to_string(),
            format!("{}: Select", display(&k.toggle_select)),
            format!("{}: Templates", display(&k.templates)),
            format!("{}: Bulk", display(&k.bulk)),
            format!("{}: AI", display(&k.ai)),
            format!("{}: Help", display(&k.help)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::ai::AiAssistant;
    use crate::models::{Category, NewTodo, Position, Priority};
    use crate::store::TodoStore;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                let layout = Layout::calculate(f.area(), app.panel_open());
                render(f, app, &layout);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(Config::default(), TodoStore::new(), AiAssistant::offline()).unwrap()
    }

    #[test]
    fn empty_canvas_shows_prompt() {
        let mut app = app();
        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Todo Canvas"));
        assert!(screen.contains("No todos yet. Press n to add one."));
        assert!(screen.contains("No filters | Showing 0 of 0"));
    }

    #[test]
    fn visible_card_shows_its_title() {
        let mut app = app();
        let id = app.store.create_todo(NewTodo::new("Water plants", Priority::High, Category::Health));
        app.store.reposition_todo(&id, Position::new(2400.0, 2400.0));
        app.ui.viewport.center = Position::new(2500.0, 2500.0);

        let screen = draw(&mut app, 120, 40);
        assert!(screen.contains("Water plants"));
        assert!(screen.contains("!!!"));
        assert_eq!(app.ui.canvas_area, Rect::new(1, 1, 118, 34));
    }

    #[test]
    fn panels_and_overlays_render() {
        let mut app = app();
        app.enter_templates_mode();
        let screen = draw(&mut app, 120, 40);
        assert!(screen.contains("Daily Standup"));

        app.enter_bulk_mode();
        assert!(draw(&mut app, 120, 40).contains("Bulk Operations"));

        app.exit_to_canvas();
        app.enter_create_mode();
        assert!(draw(&mut app, 120, 40).contains("New Todo"));
    }

    #[test]
    fn hints_follow_mode() {
        let mut app = app();
        assert_eq!(get_key_hints(&app)[0], "q: Quit");
        app.enter_help_mode();
        assert_eq!(get_key_hints(&app), vec!["Esc or F1: Close help".to_string()]);
    }
}
