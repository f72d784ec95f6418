use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::info;

use crate::Config;
use crate::ai::{AiAssistant, Insight, TodoSuggestion};
use crate::config::KeyBindings;
use crate::models::{
    BulkUpdate, Category, Filter, NewTemplate, NewTodo, Priority, Todo, TodoUpdate,
};
use crate::store::TodoStore;
use crate::tui::error::TuiError;
use crate::tui::viewport::Viewport;
use crate::tui::widgets::editor::Editor;
use crate::utils::{ParsedKeyBinding, parse_key_binding};

/// How long a status message stays before the key hints return
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Canvas,
    TodoForm,
    Filter,
    Templates,
    Bulk,
    Ai,
    Help,
}

/// Key bindings from config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub filter: ParsedKeyBinding,
    pub toggle_select: ParsedKeyBinding,
    pub select_all: ParsedKeyBinding,
    pub clear_selection: ParsedKeyBinding,
    pub bulk: ParsedKeyBinding,
    pub templates: ParsedKeyBinding,
    pub ai: ParsedKeyBinding,
    pub center: ParsedKeyBinding,
    pub zoom_in: ParsedKeyBinding,
    pub zoom_out: ParsedKeyBinding,
    pub next_card: ParsedKeyBinding,
    pub prev_card: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_config(bindings: &KeyBindings) -> Result<Self, TuiError> {
        fn parse(name: &str, value: &str) -> Result<ParsedKeyBinding, TuiError> {
            parse_key_binding(value).map_err(|e| TuiError::KeyBindingError(format!("{}: {}", name, e)))
        }

        Ok(Self {
            quit: parse("quit", &bindings.quit)?,
            new: parse("new", &bindings.new)?,
            delete: parse("delete", &bindings.delete)?,
            search: parse("search", &bindings.search)?,
            filter: parse("filter", &bindings.filter)?,
            toggle_select: parse("toggle_select", &bindings.toggle_select)?,
            select_all: parse("select_all", &bindings.select_all)?,
            clear_selection: parse("clear_selection", &bindings.clear_selection)?,
            bulk: parse("bulk", &bindings.bulk)?,
            templates: parse("templates", &bindings.templates)?,
            ai: parse("ai", &bindings.ai)?,
            center: parse("center", &bindings.center)?,
            zoom_in: parse("zoom_in", &bindings.zoom_in)?,
            zoom_out: parse("zoom_out", &bindings.zoom_out)?,
            next_card: parse("next_card", &bindings.next_card)?,
            prev_card: parse("prev_card", &bindings.prev_card)?,
            help: parse("help", &bindings.help)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoField {
    Title,
    Priority,
    Category,
}

#[derive(Debug, Clone)]
pub struct TodoForm {
    pub current_field: TodoField,
    pub title: Editor,
    pub priority: Priority,
    pub category: Category,
    pub editing_id: Option<String>, // None for new todos
}

impl TodoForm {
    pub fn new() -> Self {
        Self {
            current_field: TodoField::Title,
            title: Editor::new(),
            priority: Priority::default(),
            category: Category::default(),
            editing_id: None,
        }
    }

    pub fn for_todo(todo: &Todo) -> Self {
        Self {
            current_field: TodoField::Title,
            title: Editor::from_string(&todo.title),
            priority: todo.priority,
            category: todo.category,
            editing_id: Some(todo.id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Name,
    Title,
    Priority,
    Category,
}

#[derive(Debug, Clone)]
pub struct TemplateForm {
    pub current_field: TemplateField,
    pub name: Editor,
    pub title: Editor,
    pub priority: Priority,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Query,
    Priority,
    Category,
    Clear,
}

#[derive(Debug, Clone)]
pub struct FilterFormState {
    pub current_field: FilterField,
    pub query: Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    ToggleSelectAll,
    SetPriority,
    SetCategory,
    DeleteSelected,
}

impl BulkAction {
    pub const ALL: [BulkAction; 4] = [
        BulkAction::ToggleSelectAll,
        BulkAction::SetPriority,
        BulkAction::SetCategory,
        BulkAction::DeleteSelected,
    ];
}

#[derive(Debug, Clone)]
pub struct BulkPanelState {
    pub selected: usize,
    pub priority: Priority,
    pub category: Category,
}

impl Default for BulkPanelState {
    fn default() -> Self {
        Self {
            selected: 0,
            priority: Priority::High,
            category: Category::Work,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplatePanelState {
    pub selected: usize,
    pub form: Option<TemplateForm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiFocus {
    Input,
    Results,
}

#[derive(Debug, Clone, Default)]
pub enum AiResults {
    #[default]
    Empty,
    Suggestions {
        items: Vec<TodoSuggestion>,
        from_fallback: bool,
    },
    Insights {
        items: Vec<Insight>,
        from_fallback: bool,
    },
}

impl AiResults {
    pub fn len(&self) -> usize {
        match self {
            AiResults::Empty => 0,
            AiResults::Suggestions { items, .. } => items.len(),
            AiResults::Insights { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct AiPanelState {
    pub input: Editor,
    pub focus: AiFocus,
    pub results: AiResults,
    pub selected: usize,
}

impl Default for AiPanelState {
    fn default() -> Self {
        Self {
            input: Editor::new(),
            focus: AiFocus::Input,
            results: AiResults::Empty,
            selected: 0,
        }
    }
}

/// What the delete confirmation will remove
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Todo { id: String, title: String },
    Selected(usize),
    Template { id: String, name: String },
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_confirmation: Option<DeleteTarget>,
    pub delete_modal_selection: usize, // 0 = Delete, 1 = Cancel
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub mode: Mode,
    pub viewport: Viewport,
    pub focused: Option<String>,
    /// Canvas area from the last draw
    pub canvas_area: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub todo_form: Option<TodoForm>,
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub store: TodoStore,
    pub ai: AiAssistant,
    pub keys: KeyMap,

    // Grouped state
    pub ui: UiState,
    pub form: FormState,
    pub filter_form: Option<FilterFormState>,
    pub templates: TemplatePanelState,
    pub bulk: BulkPanelState,
    pub ai_panel: AiPanelState,
    pub modals: ModalState,
    pub status: StatusState,
}

/// Previous value in a cycle given only its `next` step
fn step_back<T: Copy + PartialEq>(current: T, next: impl Fn(T) -> T) -> T {
    let mut candidate = current;
    loop {
        let after = next(candidate);
        if after == current {
            return candidate;
        }
        candidate = after;
    }
}

fn cycle<T: Copy + PartialEq>(value: T, forward: bool, next: impl Fn(T) -> T) -> T {
    if forward { next(value) } else { step_back(value, next) }
}

impl App {
    pub fn new(config: Config, store: TodoStore, ai: AiAssistant) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config.key_bindings)?;

        let mut viewport = Viewport::new(store.placement().center(), config.canvas.default_zoom);
        if let Some(centroid) = store.filtered_centroid() {
            viewport.center_on_card(centroid);
        }

        Ok(Self {
            config,
            store,
            ai,
            keys,
            ui: UiState {
                mode: Mode::Canvas,
                viewport,
                focused: None,
                canvas_area: Rect::default(),
            },
            form: FormState::default(),
            filter_form: None,
            templates: TemplatePanelState::default(),
            bulk: BulkPanelState::default(),
            ai_panel: AiPanelState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
        })
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed() >= STATUS_MESSAGE_TIMEOUT {
                self.clear_status_message();
            }
        }
    }

    /// Side panels share the screen with the canvas
    pub fn panel_open(&self) -> bool {
        matches!(self.ui.mode, Mode::Templates | Mode::Bulk | Mode::Ai)
    }

    pub fn exit_to_canvas(&mut self) {
        self.ui.mode = Mode::Canvas;
    }

    pub fn get_filter_summary(&self) -> String {
        let shown = self.store.filtered_todos().len();
        let total = self.store.todos().len();
        let selected = self.store.selected_ids().len();
        let mut summary = format!("{} | Showing {} of {}", self.store.criteria().summary(), shown, total);
        if selected > 0 {
            summary.push_str(&format!(" | {} selected", selected));
        }
        summary
    }

    // --- Canvas navigation ---

    pub fn focused_todo(&self) -> Option<&Todo> {
        self.ui.focused.as_deref().and_then(|id| self.store.todo(id))
    }

    /// Drop focus when the card is gone or filtered out
    pub fn sync_focus(&mut self) {
        if let Some(ref id) = self.ui.focused {
            let visible = self.store.filtered_todos().iter().any(|t| &t.id == id);
            if !visible {
                self.ui.focused = None;
            }
        }
    }

    /// Move focus through the filtered view in display order
    pub fn focus_next(&mut self, forward: bool) {
        let ids: Vec<String> = self.store.filtered_todos().iter().map(|t| t.id.clone()).collect();
        if ids.is_empty() {
            self.ui.focused = None;
            return;
        }

        let current = self
            .ui
            .focused
            .as_ref()
            .and_then(|id| ids.iter().position(|candidate| candidate == id));
        let index = match (current, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
        };
        self.ui.focused = Some(ids[index].clone());
        self.ensure_focused_visible();
    }

    /// Recenter on the focused card when it is not fully on screen
    pub fn ensure_focused_visible(&mut self) {
        if let Some(position) = self.focused_todo().map(|t| t.position) {
            if !self.ui.viewport.shows_card(position, self.ui.canvas_area) {
                self.ui.viewport.center_on_card(position);
            }
        }
    }

    /// Pan by whole steps in each direction
    pub fn pan(&mut self, steps_x: f64, steps_y: f64) {
        let step = self.config.canvas.pan_step;
        self.ui.viewport.pan(steps_x * step, steps_y * step);
    }

    /// Move the focused card by whole steps; no overlap check
    pub fn move_focused(&mut self, steps_x: f64, steps_y: f64) {
        let step = self.config.canvas.move_step;
        let Some((id, position)) = self.focused_todo().map(|t| (t.id.clone(), t.position)) else {
            self.set_status_message("No card focused (Tab to focus one)");
            return;
        };
        self.store
            .reposition_todo(&id, position.offset(steps_x * step, steps_y * step));
    }

    pub fn zoom_in(&mut self) {
        if !self.ui.viewport.zoom_in() {
            self.set_status_message("Already at closest zoom");
        }
    }

    pub fn zoom_out(&mut self) {
        if !self.ui.viewport.zoom_out() {
            self.set_status_message("Already at farthest zoom");
        }
    }

    /// Center on the filtered cards, or the canvas middle when there are none
    pub fn center_view(&mut self) {
        match self.store.filtered_centroid() {
            Some(centroid) => self.ui.viewport.center_on_card(centroid),
            None => self.ui.viewport.center = self.store.placement().center(),
        }
    }

    // --- Selection ---

    pub fn toggle_focused_selection(&mut self) {
        match self.ui.focused.clone() {
            Some(id) => self.store.toggle_selection(&id),
            None => self.set_status_message("No card focused (Tab to focus one)"),
        }
    }

    /// Select every filtered card, or clear when they are all selected already
    pub fn toggle_select_all(&mut self) {
        if self.store.all_filtered_selected() {
            self.store.clear_selection();
            self.set_status_message("Selection cleared");
        } else {
            self.store.select_all_filtered();
            let count = self.store.selected_ids().len();
            self.set_status_message(format!("{} selected", count));
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.store.selected_ids().is_empty() {
            self.store.clear_selection();
            self.set_status_message("Selection cleared");
        }
    }

    // --- Todo form ---

    pub fn enter_create_mode(&mut self) {
        self.form.todo_form = Some(TodoForm::new());
        self.ui.mode = Mode::TodoForm;
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(form) = self.focused_todo().map(TodoForm::for_todo) else {
            self.set_status_message("No card focused (Tab to focus one)");
            return;
        };
        self.form.todo_form = Some(form);
        self.ui.mode = Mode::TodoForm;
    }

    pub fn exit_todo_form(&mut self) {
        self.form.todo_form = None;
        self.ui.mode = Mode::Canvas;
    }

    pub fn navigate_todo_form_field(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.todo_form {
            form.current_field = match (form.current_field, forward) {
                (TodoField::Title, true) => TodoField::Priority,
                (TodoField::Priority, true) => TodoField::Category,
                (TodoField::Category, true) => TodoField::Title,
                (TodoField::Title, false) => TodoField::Category,
                (TodoField::Priority, false) => TodoField::Title,
                (TodoField::Category, false) => TodoField::Priority,
            };
        }
    }

    /// Left/Right on the priority or category field
    pub fn cycle_todo_form_value(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.todo_form {
            match form.current_field {
                TodoField::Priority => form.priority = cycle(form.priority, forward, Priority::next),
                TodoField::Category => form.category = cycle(form.category, forward, Category::next),
                TodoField::Title => {}
            }
        }
    }

    /// Create or update from the form. The form stays open when the title is blank.
    pub fn save_todo_form(&mut self) {
        let Some(form) = self.form.todo_form.take() else {
            return;
        };
        if form.title.is_blank() {
            self.form.todo_form = Some(form);
            self.set_status_message("Title is required");
            return;
        }

        let title = form.title.text().trim().to_string();
        match form.editing_id {
            Some(id) => {
                self.store.update_todo(
                    &id,
                    TodoUpdate {
                        title: Some(title),
                        priority: Some(form.priority),
                        category: Some(form.category),
                        position: None,
                    },
                );
                self.set_status_message("Todo updated");
            }
            None => {
                let id = self
                    .store
                    .create_todo(NewTodo::new(title, form.priority, form.category));
                self.ui.focused = Some(id);
                self.sync_focus();
                self.ensure_focused_visible();
                self.set_status_message("Todo created");
            }
        }
        self.ui.mode = Mode::Canvas;
    }

    /// Replace the form title with the assistant's rewrite
    pub fn improve_form_title(&mut self) {
        let Some((title, category)) = self
            .form
            .todo_form
            .as_ref()
            .map(|form| (form.title.text(), form.category))
        else {
            return;
        };
        if title.trim().is_empty() {
            self.set_status_message("Type a title first");
            return;
        }

        let answer = self.ai.improve_title(title.trim(), category);
        if let Some(ref mut form) = self.form.todo_form {
            form.title.set_text(&answer.value);
        }
        if answer.from_fallback {
            self.set_status_message("AI unavailable, title unchanged");
        } else {
            self.set_status_message("Title improved (Ctrl+z to undo)");
        }
    }

    /// Fill priority and category from the assistant
    pub fn categorize_form(&mut self) {
        let Some(title) = self.form.todo_form.as_ref().map(|form| form.title.text()) else {
            return;
        };
        if title.trim().is_empty() {
            self.set_status_message("Type a title first");
            return;
        }

        let answer = self.ai.categorize(title.trim());
        if let Some(ref mut form) = self.form.todo_form {
            form.category = answer.value.category;
            form.priority = answer.value.priority;
        }
        let source = if answer.from_fallback { "keywords" } else { "AI" };
        self.set_status_message(format!(
            "{} / {} ({}): {}",
            answer.value.category, answer.value.priority, source, answer.value.reasoning
        ));
    }

    // --- Search and filters ---

    pub fn enter_filter_mode(&mut self, field: FilterField) {
        self.filter_form = Some(FilterFormState {
            current_field: field,
            query: Editor::from_string(&self.store.criteria().query),
        });
        self.ui.mode = Mode::Filter;
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_form = None;
        self.ui.mode = Mode::Canvas;
        self.sync_focus();
    }

    pub fn navigate_filter_field(&mut self, forward: bool) {
        if let Some(ref mut state) = self.filter_form {
            const ORDER: [FilterField; 4] = [
                FilterField::Query,
                FilterField::Priority,
                FilterField::Category,
                FilterField::Clear,
            ];
            let index = ORDER.iter().position(|f| *f == state.current_field).unwrap_or(0);
            let next = if forward {
                (index + 1) % ORDER.len()
            } else {
                (index + ORDER.len() - 1) % ORDER.len()
            };
            state.current_field = ORDER[next];
        }
    }

    /// Push the query editor's text into the store (filters apply live)
    pub fn apply_filter_query(&mut self) {
        if let Some(ref state) = self.filter_form {
            let query = state.query.text();
            self.store.set_search_query(query);
        }
    }

    pub fn cycle_filter_value(&mut self, forward: bool) {
        let Some(field) = self.filter_form.as_ref().map(|s| s.current_field) else {
            return;
        };
        match field {
            FilterField::Priority => {
                let current = self.store.criteria().priority;
                self.store
                    .set_priority_filter(cycle(current, forward, Filter::<Priority>::next));
            }
            FilterField::Category => {
                let current = self.store.criteria().category;
                self.store
                    .set_category_filter(cycle(current, forward, Filter::<Category>::next));
            }
            FilterField::Query | FilterField::Clear => {}
        }
    }

    pub fn clear_filters(&mut self) {
        self.store.clear_filters();
        if let Some(ref mut state) = self.filter_form {
            state.query.clear();
        }
        self.set_status_message("Filters cleared");
    }

    // --- Templates panel ---

    pub fn enter_templates_mode(&mut self) {
        self.templates.form = None;
        self.templates.selected = self
            .templates
            .selected
            .min(self.store.templates().len().saturating_sub(1));
        self.ui.mode = Mode::Templates;
    }

    pub fn move_template_selection(&mut self, down: bool) {
        let len = self.store.templates().len();
        if len == 0 {
            return;
        }
        self.templates.selected = if down {
            (self.templates.selected + 1) % len
        } else {
            (self.templates.selected + len - 1) % len
        };
    }

    pub fn use_selected_template(&mut self) {
        let Some(template) = self.store.templates().get(self.templates.selected).cloned() else {
            return;
        };
        if let Some(id) = self.store.create_from_template(&template.id) {
            self.ui.focused = Some(id);
            self.sync_focus();
            self.ensure_focused_visible();
            self.set_status_message(format!("Created \"{}\"", template.title));
        }
    }

    pub fn request_delete_template(&mut self) {
        if let Some(template) = self.store.templates().get(self.templates.selected) {
            self.modals.delete_confirmation = Some(DeleteTarget::Template {
                id: template.id.clone(),
                name: template.name.clone(),
            });
            self.modals.delete_modal_selection = 0;
        }
    }

    pub fn start_template_form(&mut self) {
        self.templates.form = Some(TemplateForm {
            current_field: TemplateField::Name,
            name: Editor::new(),
            title: Editor::new(),
            priority: Priority::default(),
            category: Category::default(),
        });
    }

    pub fn cancel_template_form(&mut self) {
        self.templates.form = None;
    }

    pub fn navigate_template_form_field(&mut self, forward: bool) {
        if let Some(ref mut form) = self.templates.form {
            const ORDER: [TemplateField; 4] = [
                TemplateField::Name,
                TemplateField::Title,
                TemplateField::Priority,
                TemplateField::Category,
            ];
            let index = ORDER.iter().position(|f| *f == form.current_field).unwrap_or(0);
            let next = if forward {
                (index + 1) % ORDER.len()
            } else {
                (index + ORDER.len() - 1) % ORDER.len()
            };
            form.current_field = ORDER[next];
        }
    }

    pub fn cycle_template_form_value(&mut self, forward: bool) {
        if let Some(ref mut form) = self.templates.form {
            match form.current_field {
                TemplateField::Priority => form.priority = cycle(form.priority, forward, Priority::next),
                TemplateField::Category => form.category = cycle(form.category, forward, Category::next),
                TemplateField::Name | TemplateField::Title => {}
            }
        }
    }

    pub fn save_template_form(&mut self) {
        let Some(form) = self.templates.form.take() else {
            return;
        };
        if form.name.is_blank() || form.title.is_blank() {
            self.templates.form = Some(form);
            self.set_status_message("Name and title are required");
            return;
        }

        self.store.add_template(NewTemplate {
            name: form.name.text().trim().to_string(),
            title: form.title.text().trim().to_string(),
            priority: form.priority,
            category: form.category,
        });
        self.templates.selected = self.store.templates().len().saturating_sub(1);
        self.set_status_message("Template added");
    }

    // --- Bulk panel ---

    pub fn enter_bulk_mode(&mut self) {
        self.ui.mode = Mode::Bulk;
    }

    pub fn move_bulk_selection(&mut self, down: bool) {
        let len = BulkAction::ALL.len();
        self.bulk.selected = if down {
            (self.bulk.selected + 1) % len
        } else {
            (self.bulk.selected + len - 1) % len
        };
    }

    pub fn selected_bulk_action(&self) -> BulkAction {
        BulkAction::ALL[self.bulk.selected % BulkAction::ALL.len()]
    }

    pub fn cycle_bulk_value(&mut self, forward: bool) {
        match self.selected_bulk_action() {
            BulkAction::SetPriority => {
                self.bulk.priority = cycle(self.bulk.priority, forward, Priority::next)
            }
            BulkAction::SetCategory => {
                self.bulk.category = cycle(self.bulk.category, forward, Category::next)
            }
            BulkAction::ToggleSelectAll | BulkAction::DeleteSelected => {}
        }
    }

    pub fn execute_bulk_action(&mut self) {
        match self.selected_bulk_action() {
            BulkAction::ToggleSelectAll => self.toggle_select_all(),
            BulkAction::SetPriority => {
                let count = self.store.update_selected(BulkUpdate {
                    priority: Some(self.bulk.priority),
                    category: None,
                });
                self.set_status_message(format!("Priority set to {} on {} todos", self.bulk.priority, count));
            }
            BulkAction::SetCategory => {
                let count = self.store.update_selected(BulkUpdate {
                    priority: None,
                    category: Some(self.bulk.category),
                });
                self.set_status_message(format!("Category set to {} on {} todos", self.bulk.category, count));
            }
            BulkAction::DeleteSelected => {
                let count = self.store.selected_ids().len();
                if count == 0 {
                    self.set_status_message("Nothing selected");
                } else {
                    self.modals.delete_confirmation = Some(DeleteTarget::Selected(count));
                    self.modals.delete_modal_selection = 0;
                }
            }
        }
        self.sync_focus();
    }

    // --- AI panel ---

    pub fn enter_ai_mode(&mut self) {
        self.ai_panel.focus = AiFocus::Input;
        self.ui.mode = Mode::Ai;
    }

    pub fn toggle_ai_focus(&mut self) {
        self.ai_panel.focus = match self.ai_panel.focus {
            AiFocus::Input if !self.ai_panel.results.is_empty() => AiFocus::Results,
            _ => AiFocus::Input,
        };
    }

    fn ai_context(&mut self) -> Option<String> {
        let context = self.ai_panel.input.text().trim().to_string();
        if context.is_empty() {
            self.set_status_message("Describe what you are planning first");
            return None;
        }
        Some(context)
    }

    fn show_suggestions(&mut self, items: Vec<TodoSuggestion>, from_fallback: bool) {
        let count = items.len();
        self.ai_panel.results = AiResults::Suggestions { items, from_fallback };
        self.ai_panel.selected = 0;
        if count > 0 {
            self.ai_panel.focus = AiFocus::Results;
        }
        self.set_status_message(if from_fallback {
            format!("{} offline suggestions", count)
        } else {
            format!("{} suggestions", count)
        });
    }

    pub fn run_suggestions(&mut self) {
        let Some(context) = self.ai_context() else {
            return;
        };
        let answer = self.ai.suggest_todos(&context, self.store.todos());
        self.show_suggestions(answer.value, answer.from_fallback);
    }

    pub fn run_smart_template(&mut self) {
        let Some(context) = self.ai_context() else {
            return;
        };
        let answer = self.ai.smart_template(&context);
        self.show_suggestions(answer.value, answer.from_fallback);
    }

    pub fn run_analysis(&mut self) {
        let answer = self.ai.analyze_productivity(self.store.todos());
        let count = answer.value.len();
        self.ai_panel.results = AiResults::Insights {
            items: answer.value,
            from_fallback: answer.from_fallback,
        };
        self.ai_panel.selected = 0;
        self.set_status_message(if count == 0 {
            "No insights right now".to_string()
        } else {
            format!("{} insights", count)
        });
    }

    pub fn move_ai_selection(&mut self, down: bool) {
        let len = self.ai_panel.results.len();
        if len == 0 {
            return;
        }
        self.ai_panel.selected = if down {
            (self.ai_panel.selected + 1) % len
        } else {
            (self.ai_panel.selected + len - 1) % len
        };
    }

    /// Add the highlighted suggestion to the canvas and drop it from the list
    pub fn add_selected_suggestion(&mut self) {
        let AiResults::Suggestions { ref mut items, .. } = self.ai_panel.results else {
            return;
        };
        if self.ai_panel.selected >= items.len() {
            return;
        }
        let suggestion = items.remove(self.ai_panel.selected);
        if self.ai_panel.selected >= items.len() {
            self.ai_panel.selected = items.len().saturating_sub(1);
        }
        if items.is_empty() {
            self.ai_panel.focus = AiFocus::Input;
        }

        let id = self.store.create_todo(NewTodo::new(
            suggestion.title.clone(),
            suggestion.priority,
            suggestion.category,
        ));
        info!(id = %id, "added suggested todo");
        self.set_status_message(format!("Added \"{}\"", suggestion.title));
    }

    pub fn add_all_suggestions(&mut self) {
        let AiResults::Suggestions { ref mut items, .. } = self.ai_panel.results else {
            return;
        };
        let suggestions = std::mem::take(items);
        for suggestion in &suggestions {
            self.store.create_todo(NewTodo::new(
                suggestion.title.clone(),
                suggestion.priority,
                suggestion.category,
            ));
        }
        self.ai_panel.selected = 0;
        self.ai_panel.focus = AiFocus::Input;
        self.set_status_message(format!("Added {} todos", suggestions.len()));
    }

    // --- Delete confirmation ---

    pub fn request_delete_focused(&mut self) {
        match self.focused_todo() {
            Some(todo) => {
                self.modals.delete_confirmation = Some(DeleteTarget::Todo {
                    id: todo.id.clone(),
                    title: todo.title.clone(),
                });
                self.modals.delete_modal_selection = 0;
            }
            None => self.set_status_message("No card focused (Tab to focus one)"),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
        self.modals.delete_modal_selection = 0;
    }

    pub fn confirm_delete(&mut self) {
        let Some(target) = self.modals.delete_confirmation.take() else {
            return;
        };
        self.modals.delete_modal_selection = 0;

        match target {
            DeleteTarget::Todo { id, title } => {
                if self.store.delete_todo(&id) {
                    self.set_status_message(format!("Deleted \"{}\"", title));
                }
            }
            DeleteTarget::Selected(_) => {
                let count = self.store.delete_selected();
                self.set_status_message(format!("Deleted {} todos", count));
            }
            DeleteTarget::Template { id, name } => {
                if self.store.delete_template(&id) {
                    let len = self.store.templates().len();
                    self.templates.selected = self.templates.selected.min(len.saturating_sub(1));
                    self.set_status_message(format!("Deleted template \"{}\"", name));
                }
            }
        }
        self.sync_focus();
    }

    // --- Help ---

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::Canvas;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn app() -> App {
        let store = TodoStore::new().with_rng(StdRng::seed_from_u64(11));
        App::new(Config::default(), store, AiAssistant::offline()).unwrap()
    }

    fn add(app: &mut App, title: &str, priority: Priority, category: Category) -> String {
        app.store.create_todo(NewTodo::new(title, priority, category))
    }

    fn type_title(app: &mut App, text: &str) {
        let form = app.form.todo_form.as_mut().unwrap();
        for ch in text.chars() {
            form.title.insert_char(ch);
        }
    }

    #[test]
    fn invalid_key_binding_is_rejected() {
        let mut config = Config::default();
        config.key_bindings.bulk = "Hyper+b".to_string();
        let result = App::new(config, TodoStore::new(), AiAssistant::offline());
        assert!(matches!(result, Err(TuiError::KeyBindingError(_))));
    }

    #[test]
    fn focus_cycles_through_filtered_view() {
        let mut app = app();
        let a = add(&mut app, "alpha", Priority::Low, Category::Work);
        let b = add(&mut app, "beta", Priority::High, Category::Work);
        let c = add(&mut app, "gamma", Priority::Low, Category::Work);

        app.focus_next(true);
        assert_eq!(app.ui.focused.as_deref(), Some(a.as_str()));
        app.focus_next(false);
        assert_eq!(app.ui.focused.as_deref(), Some(c.as_str()));

        app.store.set_priority_filter(Filter::Only(Priority::High));
        app.sync_focus();
        assert_eq!(app.ui.focused, None);
        app.focus_next(true);
        assert_eq!(app.ui.focused.as_deref(), Some(b.as_str()));
    }

    #[test]
    fn focusing_an_offscreen_card_recenters() {
        let mut app = app();
        app.ui.canvas_area = Rect::new(0, 0, 100, 40);
        let id = add(&mut app, "far", Priority::Low, Category::Work);
        app.store.reposition_todo(&id, Position::new(100.0, 100.0));

        app.focus_next(true);
        assert_eq!(app.ui.viewport.center, Position::new(250.0, 180.0));
    }

    #[test]
    fn shift_arrows_move_the_focused_card() {
        let mut app = app();
        let id = add(&mut app, "mover", Priority::Low, Category::Work);
        let start = app.store.todo(&id).unwrap().position;

        app.move_focused(1.0, 0.0);
        assert_eq!(app.store.todo(&id).unwrap().position, start);
        assert!(app.status.message.is_some());

        app.focus_next(true);
        app.move_focused(1.0, -2.0);
        assert_eq!(app.store.todo(&id).unwrap().position, start.offset(20.0, -40.0));
    }

    #[test]
    fn center_view_uses_centroid_or_canvas_middle() {
        let mut app = app();
        app.ui.viewport.pan(1000.0, 1000.0);
        app.center_view();
        assert_eq!(app.ui.viewport.center, Position::new(2500.0, 2500.0));

        let a = add(&mut app, "a", Priority::Low, Category::Work);
        let b = add(&mut app, "b", Priority::Low, Category::Work);
        app.store.reposition_todo(&a, Position::new(0.0, 0.0));
        app.store.reposition_todo(&b, Position::new(200.0, 400.0));
        app.center_view();
        assert_eq!(app.ui.viewport.center, Position::new(250.0, 280.0));
    }

    #[test]
    fn select_all_toggles_against_filtered_view() {
        let mut app = app();
        add(&mut app, "a", Priority::Low, Category::Work);
        add(&mut app, "b", Priority::Low, Category::Health);

        app.store.set_category_filter(Filter::Only(Category::Work));
        app.toggle_select_all();
        assert_eq!(app.store.selected_ids().len(), 1);
        app.toggle_select_all();
        assert!(app.store.selected_ids().is_empty());
    }

    #[test]
    fn create_form_requires_title_and_focuses_new_card() {
        let mut app = app();
        app.enter_create_mode();
        app.save_todo_form();
        assert_eq!(app.ui.mode, Mode::TodoForm);
        assert!(app.store.todos().is_empty());

        type_title(&mut app, "  Water plants ");
        app.navigate_todo_form_field(true);
        app.cycle_todo_form_value(true);
        app.navigate_todo_form_field(true);
        app.cycle_todo_form_value(false);
        app.save_todo_form();

        assert_eq!(app.ui.mode, Mode::Canvas);
        let todo = app.focused_todo().unwrap();
        assert_eq!(todo.title, "Water plants");
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.category, Category::Learning);
    }

    #[test]
    fn edit_form_updates_in_place() {
        let mut app = app();
        let id = add(&mut app, "draft", Priority::Low, Category::Work);
        let position = app.store.todo(&id).unwrap().position;
        app.focus_next(true);

        app.enter_edit_mode();
        type_title(&mut app, " v2");
        app.save_todo_form();

        let todo = app.store.todo(&id).unwrap();
        assert_eq!(todo.title, "draft v2");
        assert_eq!(todo.position, position);
        assert_eq!(app.store.todos().len(), 1);
    }

    #[test]
    fn offline_categorize_fills_form_from_keywords() {
        let mut app = app();
        app.enter_create_mode();
        type_title(&mut app, "buy batteries");
        app.categorize_form();
        let form = app.form.todo_form.as_ref().unwrap();
        assert_eq!(form.category, Category::Shopping);
        assert_eq!(form.priority, Priority::Low);

        app.improve_form_title();
        assert_eq!(app.form.todo_form.as_ref().unwrap().title.text(), "buy batteries");
    }

    #[test]
    fn filter_modal_applies_live_and_clears() {
        let mut app = app();
        add(&mut app, "Call mom", Priority::High, Category::Personal);
        add(&mut app, "Buy milk", Priority::Low, Category::Shopping);

        app.enter_filter_mode(FilterField::Query);
        for ch in "MILK".chars() {
            app.filter_form.as_mut().unwrap().query.insert_char(ch);
            app.apply_filter_query();
        }
        assert_eq!(app.store.filtered_todos().len(), 1);

        app.navigate_filter_field(true);
        app.cycle_filter_value(false);
        assert_eq!(app.store.criteria().priority, Filter::Only(Priority::High));
        assert!(app.store.filtered_todos().is_empty());

        app.clear_filters();
        assert!(app.store.criteria().is_default());
        assert!(app.filter_form.as_ref().unwrap().query.is_empty());
    }

    #[test]
    fn bulk_panel_updates_and_deletes_selection() {
        let mut app = app();
        let a = add(&mut app, "a", Priority::Low, Category::Work);
        let b = add(&mut app, "b", Priority::Low, Category::Work);
        app.store.toggle_selection(&a);

        app.enter_bulk_mode();
        app.move_bulk_selection(true);
        assert_eq!(app.selected_bulk_action(), BulkAction::SetPriority);
        app.execute_bulk_action();
        assert_eq!(app.store.todo(&a).unwrap().priority, Priority::High);
        assert_eq!(app.store.todo(&b).unwrap().priority, Priority::Low);

        app.move_bulk_selection(false);
        app.move_bulk_selection(false);
        assert_eq!(app.selected_bulk_action(), BulkAction::DeleteSelected);
        app.execute_bulk_action();
        assert_eq!(app.modals.delete_confirmation, Some(DeleteTarget::Selected(1)));
        app.confirm_delete();
        assert!(app.store.todo(&a).is_none());
        assert!(app.store.todo(&b).is_some());
    }

    #[test]
    fn deleting_focused_card_needs_confirmation() {
        let mut app = app();
        let id = add(&mut app, "temp", Priority::Low, Category::Work);
        app.focus_next(true);

        app.request_delete_focused();
        app.cancel_delete();
        assert!(app.store.todo(&id).is_some());

        app.request_delete_focused();
        app.confirm_delete();
        assert!(app.store.todo(&id).is_none());
        assert_eq!(app.ui.focused, None);
    }

    #[test]
    fn templates_panel_uses_adds_and_deletes() {
        let mut app = app();
        app.enter_templates_mode();
        app.move_template_selection(true);
        app.use_selected_template();
        assert_eq!(app.store.todos()[0].title, "Buy groceries for the week");

        app.start_template_form();
        for ch in "Review".chars() {
            app.templates.form.as_mut().unwrap().name.insert_char(ch);
        }
        app.save_template_form();
        assert!(app.templates.form.is_some());

        app.navigate_template_form_field(true);
        for ch in "Weekly review".chars() {
            app.templates.form.as_mut().unwrap().title.insert_char(ch);
        }
        app.save_template_form();
        assert_eq!(app.store.templates().len(), 4);
        assert_eq!(app.templates.selected, 3);

        app.request_delete_template();
        app.confirm_delete();
        assert_eq!(app.store.templates().len(), 3);
        assert_eq!(app.templates.selected, 2);
    }

    #[test]
    fn offline_suggestions_can_be_added() {
        let mut app = app();
        app.enter_ai_mode();
        app.run_suggestions();
        assert!(app.ai_panel.results.is_empty());

        for ch in "work project".chars() {
            app.ai_panel.input.insert_char(ch);
        }
        app.run_suggestions();
        assert_eq!(app.ai_panel.results.len(), 3);
        assert_eq!(app.ai_panel.focus, AiFocus::Results);

        app.move_ai_selection(true);
        app.add_selected_suggestion();
        assert_eq!(app.store.todos().len(), 1);
        assert_eq!(app.store.todos()[0].title, "Create project timeline and milestones");
        assert_eq!(app.ai_panel.results.len(), 2);

        app.add_all_suggestions();
        assert_eq!(app.store.todos().len(), 3);
        assert!(app.ai_panel.results.is_empty());
    }
}
