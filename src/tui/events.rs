use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;
use tracing::info;

use crate::tui::App;
use crate::tui::app::{AiFocus, FilterField, Mode, TemplateField, TodoField};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::utils::has_primary_modifier;

/// Restores the terminal when dropped, including on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: false,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Restore on normal exit; drop does nothing afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already cleaning up, errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before the alternate screen so the error lands in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::TerminalTooSmall {
            width,
            height,
            min_width,
            min_height,
        });
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!(width, height, "tui started");

    loop {
        app.check_status_message_timeout();

        terminal.draw(|f| {
            let layout = Layout::calculate(f.area(), app.panel_open());
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                // Press only; Windows also reports releases
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if handle_key_event(&mut app, key_event)? {
                        break;
                    }
                }
                // Next draw picks up the new size
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

/// Route a key press by mode. Returns true when the app should quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    // The confirmation overlays every mode
    if app.modals.delete_confirmation.is_some() {
        handle_delete_confirmation(app, key_event);
        return Ok(false);
    }

    match app.ui.mode {
        Mode::Canvas => return Ok(handle_canvas_mode(app, key_event)),
        Mode::TodoForm => handle_todo_form_mode(app, key_event),
        Mode::Filter => handle_filter_mode(app, key_event),
        Mode::Templates => handle_templates_mode(app, key_event),
        Mode::Bulk => handle_bulk_mode(app, key_event),
        Mode::Ai => handle_ai_mode(app, key_event),
        Mode::Help => {
            if key_event.code == KeyCode::Esc
                || app.keys.help.matches(&key_event)
                || app.keys.quit.matches(&key_event)
            {
                app.exit_help_mode();
            }
        }
    }
    Ok(false)
}

/// Shared single-line editing. Returns true when the text changed.
fn edit_line(editor: &mut Editor, key_event: KeyEvent) -> bool {
    let primary = has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Char('z') if primary => editor.undo(),
        KeyCode::Char(c) if !primary => {
            editor.insert_char(c);
            true
        }
        KeyCode::Backspace => {
            let before = editor.len();
            editor.delete_char();
            editor.len() != before
        }
        KeyCode::Delete => {
            let before = editor.len();
            editor.delete_forward();
            editor.len() != before
        }
        KeyCode::Left if primary => {
            editor.move_cursor_word_left();
            false
        }
        KeyCode::Right if primary => {
            editor.move_cursor_word_right();
            false
        }
        KeyCode::Left => {
            editor.move_cursor_left();
            false
        }
        KeyCode::Right => {
            editor.move_cursor_right();
            false
        }
        KeyCode::Home => {
            editor.move_cursor_home();
            false
        }
        KeyCode::End => {
            editor.move_cursor_end();
            false
        }
        _ => false,
    }
}

fn handle_delete_confirmation(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            app.modals.delete_modal_selection = 1 - app.modals.delete_modal_selection.min(1);
        }
        KeyCode::Enter => {
            if app.modals.delete_modal_selection == 0 {
                app.confirm_delete();
            } else {
                app.cancel_delete();
            }
        }
        KeyCode::Char('y') => app.confirm_delete(),
        KeyCode::Esc | KeyCode::Char('n') => app.cancel_delete(),
        _ => {}
    }
}

fn handle_canvas_mode(app: &mut App, key_event: KeyEvent) -> bool {
    let keys = app.keys.clone();

    if keys.quit.matches(&key_event) {
        return true;
    }
    if keys.help.matches(&key_event) {
        app.enter_help_mode();
    } else if keys.new.matches(&key_event) {
        app.enter_create_mode();
    } else if keys.delete.matches(&key_event) {
        app.request_delete_focused();
    } else if keys.search.matches(&key_event) {
        app.enter_filter_mode(FilterField::Query);
    } else if keys.filter.matches(&key_event) {
        app.enter_filter_mode(FilterField::Priority);
    } else if keys.templates.matches(&key_event) {
        app.enter_templates_mode();
    } else if keys.bulk.matches(&key_event) {
        app.enter_bulk_mode();
    } else if keys.ai.matches(&key_event) {
        app.enter_ai_mode();
    } else if keys.center.matches(&key_event) {
        app.center_view();
    } else if keys.zoom_in.matches(&key_event) {
        app.zoom_in();
    } else if keys.zoom_out.matches(&key_event) {
        app.zoom_out();
    } else if keys.next_card.matches(&key_event) {
        app.focus_next(true);
    } else if keys.prev_card.matches(&key_event) {
        app.focus_next(false);
    } else if keys.toggle_select.matches(&key_event) {
        app.toggle_focused_selection();
    } else if keys.select_all.matches(&key_event) {
        app.toggle_select_all();
    } else if keys.clear_selection.matches(&key_event) {
        app.clear_selection();
    } else {
        let moving = key_event.modifiers.contains(KeyModifiers::SHIFT);
        let step = match key_event.code {
            KeyCode::Left => Some((-1.0, 0.0)),
            KeyCode::Right => Some((1.0, 0.0)),
            KeyCode::Up => Some((0.0, -1.0)),
            KeyCode::Down => Some((0.0, 1.0)),
            _ => None,
        };
        match (step, key_event.code) {
            (Some((dx, dy)), _) if moving => app.move_focused(dx, dy),
            (Some((dx, dy)), _) => app.pan(dx, dy),
            (None, KeyCode::Enter) | (None, KeyCode::Char('e')) => app.enter_edit_mode(),
            _ => {}
        }
    }
    false
}

fn handle_todo_form_mode(app: &mut App, key_event: KeyEvent) {
    let primary = has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Esc => return app.exit_todo_form(),
        KeyCode::Enter => return app.save_todo_form(),
        KeyCode::Tab => return app.navigate_todo_form_field(true),
        KeyCode::BackTab => return app.navigate_todo_form_field(false),
        KeyCode::Char('r') if primary => return app.improve_form_title(),
        KeyCode::Char('g') if primary => return app.categorize_form(),
        _ => {}
    }

    let Some(field) = app.form.todo_form.as_ref().map(|form| form.current_field) else {
        return;
    };
    match field {
        TodoField::Title => {
            if let Some(ref mut form) = app.form.todo_form {
                edit_line(&mut form.title, key_event);
            }
        }
        TodoField::Priority | TodoField::Category => match key_event.code {
            KeyCode::Left | KeyCode::Up => app.cycle_todo_form_value(false),
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => app.cycle_todo_form_value(true),
            _ => {}
        },
    }
}

fn handle_filter_mode(app: &mut App, key_event: KeyEvent) {
    let Some(field) = app.filter_form.as_ref().map(|state| state.current_field) else {
        return;
    };
    match key_event.code {
        KeyCode::Esc => return app.exit_filter_mode(),
        KeyCode::Tab => return app.navigate_filter_field(true),
        KeyCode::BackTab => return app.navigate_filter_field(false),
        KeyCode::Enter => {
            if field == FilterField::Clear {
                app.clear_filters();
            }
            return app.exit_filter_mode();
        }
        _ => {}
    }

    match field {
        FilterField::Query => {
            let changed = app
                .filter_form
                .as_mut()
                .is_some_and(|state| edit_line(&mut state.query, key_event));
            if changed {
                app.apply_filter_query();
            }
        }
        FilterField::Priority | FilterField::Category => match key_event.code {
            KeyCode::Left | KeyCode::Up => app.cycle_filter_value(false),
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => app.cycle_filter_value(true),
            _ => {}
        },
        FilterField::Clear => {
            if key_event.code == KeyCode::Char(' ') {
                app.clear_filters();
            }
        }
    }
}

fn handle_templates_mode(app: &mut App, key_event: KeyEvent) {
    if let Some(field) = app.templates.form.as_ref().map(|form| form.current_field) {
        match key_event.code {
            KeyCode::Esc => app.cancel_template_form(),
            KeyCode::Enter => app.save_template_form(),
            KeyCode::Tab => app.navigate_template_form_field(true),
            KeyCode::BackTab => app.navigate_template_form_field(false),
            _ => match field {
                TemplateField::Name | TemplateField::Title => {
                    if let Some(ref mut form) = app.templates.form {
                        let editor = if field == TemplateField::Name {
                            &mut form.name
                        } else {
                            &mut form.title
                        };
                        edit_line(editor, key_event);
                    }
                }
                TemplateField::Priority | TemplateField::Category => match key_event.code {
                    KeyCode::Left | KeyCode::Up => app.cycle_template_form_value(false),
                    KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => {
                        app.cycle_template_form_value(true)
                    }
                    _ => {}
                },
            },
        }
        return;
    }

    if key_event.code == KeyCode::Esc || app.keys.templates.matches(&key_event) {
        return app.exit_to_canvas();
    }
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_template_selection(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_template_selection(true),
        KeyCode::Enter => app.use_selected_template(),
        KeyCode::Char('a') => app.start_template_form(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_template(),
        _ => {}
    }
}

fn handle_bulk_mode(app: &mut App, key_event: KeyEvent) {
    if key_event.code == KeyCode::Esc || app.keys.bulk.matches(&key_event) {
        return app.exit_to_canvas();
    }
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_bulk_selection(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_bulk_selection(true),
        KeyCode::Left => app.cycle_bulk_value(false),
        KeyCode::Right => app.cycle_bulk_value(true),
        KeyCode::Enter => app.execute_bulk_action(),
        _ => {}
    }
}

fn handle_ai_mode(app: &mut App, key_event: KeyEvent) {
    let primary = has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Esc => return app.exit_to_canvas(),
        KeyCode::Tab | KeyCode::BackTab => return app.toggle_ai_focus(),
        KeyCode::Char('t') if primary => return app.run_smart_template(),
        KeyCode::Char('y') if primary => return app.run_analysis(),
        _ => {}
    }

    match app.ai_panel.focus {
        AiFocus::Input => {
            if key_event.code == KeyCode::Enter {
                app.run_suggestions();
            } else {
                edit_line(&mut app.ai_panel.input, key_event);
            }
        }
        AiFocus::Results => match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => app.move_ai_selection(false),
            KeyCode::Down | KeyCode::Char('j') => app.move_ai_selection(true),
            KeyCode::Enter => app.add_selected_suggestion(),
            KeyCode::Char('A') => app.add_all_suggestions(),
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::ai::AiAssistant;
    use crate::models::{Category, NewTodo, Priority};
    use crate::store::TodoStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn app() -> App {
        let store = TodoStore::new().with_rng(StdRng::seed_from_u64(3));
        App::new(Config::default(), store, AiAssistant::offline()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn quit_only_from_canvas() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form.todo_form.as_ref().unwrap().title.text(), "q");

        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn create_todo_through_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Book dentist");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.ui.mode, Mode::Canvas);
        let todo = &app.store.todos()[0];
        assert_eq!(todo.title, "Book dentist");
        assert_eq!(todo.priority, Priority::High);
    }

    #[test]
    fn search_applies_while_typing() {
        let mut app = app();
        app.store.create_todo(NewTodo::new("Call mom", Priority::High, Category::Personal));
        app.store.create_todo(NewTodo::new("Buy milk", Priority::Low, Category::Shopping));

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "mi");
        assert_eq!(app.store.filtered_todos().len(), 1);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.store.filtered_todos().len(), 2);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::Canvas);
    }

    #[test]
    fn shift_arrow_moves_and_plain_arrow_pans() {
        let mut app = app();
        let id = app.store.create_todo(NewTodo::new("card", Priority::Low, Category::Work));
        let start = app.store.todo(&id).unwrap().position;
        press(&mut app, KeyCode::Tab);
        let center = app.ui.viewport.center;

        handle_key_event(&mut app, KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(app.store.todo(&id).unwrap().position, start.offset(20.0, 0.0));
        assert_eq!(app.ui.viewport.center, center);

        press(&mut app, KeyCode::Down);
        assert_eq!(app.ui.viewport.center, center.offset(0.0, 200.0));
    }

    #[test]
    fn delete_confirmation_blocks_other_keys() {
        let mut app = app();
        app.store.create_todo(NewTodo::new("card", Priority::Low, Category::Work));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('d'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.store.todos().len(), 1);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.todos().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);
        assert!(app.store.todos().is_empty());
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        let quit = handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert!(quit);
    }
}
