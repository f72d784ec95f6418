use chrono::Utc;
use rand::RngCore;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    BulkUpdate, Category, Filter, FilterCriteria, NewTemplate, NewTodo, Position, Priority, Todo,
    TodoTemplate, TodoUpdate,
};
use crate::placement::PlacementEngine;

/// Borrowed view of the persistable part of the store
#[derive(Debug, Clone, Copy)]
pub struct StoreSnapshot<'a> {
    pub todos: &'a [Todo],
    pub templates: &'a [TodoTemplate],
}

/// Notified after every mutation of the todo or template collections.
/// Observers cannot fail the mutation; they are fire-and-forget.
pub trait StoreObserver {
    fn on_change(&mut self, snapshot: StoreSnapshot<'_>);
}

impl<F> StoreObserver for F
where
    F: FnMut(StoreSnapshot<'_>),
{
    fn on_change(&mut self, snapshot: StoreSnapshot<'_>) {
        self(snapshot)
    }
}

/// Templates every fresh store starts with
pub fn default_templates() -> Vec<TodoTemplate> {
    vec![
        TodoTemplate {
            id: "1".to_string(),
            name: "Daily Standup".to_string(),
            title: "Prepare for daily standup meeting".to_string(),
            priority: Priority::Medium,
            category: Category::Work,
        },
        TodoTemplate {
            id: "2".to_string(),
            name: "Grocery Run".to_string(),
            title: "Buy groceries for the week".to_string(),
            priority: Priority::Low,
            category: Category::Shopping,
        },
        TodoTemplate {
            id: "3".to_string(),
            name: "Exercise".to_string(),
            title: "30-minute workout session".to_string(),
            priority: Priority::High,
            category: Category::Health,
        },
    ]
}

/// Single owner of todos, templates, selection and filter criteria.
///
/// Every mutation goes through a method on this type. The filtered view is
/// derived on demand and never cached.
pub struct TodoStore {
    todos: Vec<Todo>,
    templates: Vec<TodoTemplate>,
    selected: Vec<String>,
    criteria: FilterCriteria,
    placement: PlacementEngine,
    rng: Box<dyn RngCore>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoStore")
            .field("todos", &self.todos.len())
            .field("templates", &self.templates.len())
            .field("selected", &self.selected)
            .field("criteria", &self.criteria)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    /// Empty store seeded with the default templates
    pub fn new() -> Self {
        Self::from_state(Vec::new(), default_templates())
    }

    /// Store over previously persisted collections
    pub fn from_state(todos: Vec<Todo>, templates: Vec<TodoTemplate>) -> Self {
        Self {
            todos,
            templates,
            selected: Vec::new(),
            criteria: FilterCriteria::default(),
            placement: PlacementEngine::default(),
            rng: Box::new(rand::rng()),
            observers: Vec::new(),
        }
    }

    /// Replace the random source used for placement (seeded generators in tests)
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_placement(mut self, placement: PlacementEngine) -> Self {
        self.placement = placement;
        self
    }

    pub fn subscribe(&mut self, observer: impl StoreObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self) {
        let snapshot = StoreSnapshot {
            todos: &self.todos,
            templates: &self.templates,
        };
        for observer in self.observers.iter_mut() {
            observer.on_change(snapshot);
        }
    }

    // Reads

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn templates(&self) -> &[TodoTemplate] {
        &self.templates
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&TodoTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|selected| selected == id)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            todos: &self.todos,
            templates: &self.templates,
        }
    }

    /// Todos matching the current search and filters, in insertion order
    pub fn filtered_todos(&self) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|todo| self.criteria.matches(todo))
            .collect()
    }

    /// Mean position of the filtered view, `None` when nothing matches
    pub fn filtered_centroid(&self) -> Option<Position> {
        let filtered = self.filtered_todos();
        if filtered.is_empty() {
            return None;
        }
        let count = filtered.len() as f64;
        let (sum_x, sum_y) = filtered
            .iter()
            .fold((0.0, 0.0), |(x, y), todo| (x + todo.position.x, y + todo.position.y));
        Some(Position::new(sum_x / count, sum_y / count))
    }

    /// True when the filtered view is non-empty and entirely selected
    pub fn all_filtered_selected(&self) -> bool {
        let filtered = self.filtered_todos();
        !filtered.is_empty() && filtered.iter().all(|todo| self.is_selected(&todo.id))
    }

    // Todo mutations

    /// Create a todo at a freshly computed non-overlapping position and return its id
    pub fn create_todo(&mut self, new_todo: NewTodo) -> String {
        let placement = self.placement.place(&self.todos, &mut *self.rng);
        debug!(strategy = ?placement.strategy, position = %placement.position, "placed new todo");

        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            title: new_todo.title,
            priority: new_todo.priority,
            category: new_todo.category,
            position: placement.position,
            created_at: Utc::now(),
        };
        let id = todo.id.clone();
        info!(id = %id, title = %todo.title, "created todo");

        self.todos.push(todo);
        self.notify();
        id
    }

    /// Remove a todo and drop it from the selection. Unknown ids are ignored.
    pub fn delete_todo(&mut self, id: &str) -> bool {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        self.selected.retain(|selected| selected != id);

        if self.todos.len() == before {
            debug!(id, "delete ignored, no such todo");
            return false;
        }
        info!(id, "deleted todo");
        self.notify();
        true
    }

    /// Move a todo; no overlap check, manual placement may overlap
    pub fn reposition_todo(&mut self, id: &str, position: Position) -> bool {
        self.update_todo(
            id,
            TodoUpdate {
                position: Some(position),
                ..Default::default()
            },
        )
    }

    /// Merge the given fields into a todo. Unknown ids are ignored.
    pub fn update_todo(&mut self, id: &str, update: TodoUpdate) -> bool {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            debug!(id, "update ignored, no such todo");
            return false;
        };
        if update.position.is_some_and(|position| !position.is_finite()) {
            warn!(id, "ignoring non-finite position");
        }
        update.apply(todo);
        debug!(id, ?update, "updated todo");
        self.notify();
        true
    }

    // Selection

    /// Add the id to the selection if absent, remove it if present.
    /// Ids with no live todo are ignored so the selection only ever names live todos.
    pub fn toggle_selection(&mut self, id: &str) {
        if let Some(index) = self.selected.iter().position(|selected| selected == id) {
            self.selected.remove(index);
        } else if self.todo(id).is_some() {
            self.selected.push(id.to_string());
        }
    }

    /// Select exactly the todos in the filtered view, not the whole collection
    pub fn select_all_filtered(&mut self) {
        self.selected = self
            .filtered_todos()
            .into_iter()
            .map(|todo| todo.id.clone())
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Delete every selected todo and clear the selection; returns how many were removed
    pub fn delete_selected(&mut self) -> usize {
        let selected = std::mem::take(&mut self.selected);
        let before = self.todos.len();
        self.todos.retain(|todo| !selected.contains(&todo.id));
        let removed = before - self.todos.len();

        info!(removed, "deleted selected todos");
        if removed > 0 {
            self.notify();
        }
        removed
    }

    /// Apply the same priority/category edit to every selected todo
    pub fn update_selected(&mut self, update: BulkUpdate) -> usize {
        let mut changed = 0;
        for todo in self.todos.iter_mut() {
            if self.selected.contains(&todo.id) {
                update.apply(todo);
                changed += 1;
            }
        }

        info!(changed, ?update, "bulk updated selected todos");
        if changed > 0 {
            self.notify();
        }
        changed
    }

    // Templates

    pub fn add_template(&mut self, new_template: NewTemplate) -> String {
        let template = TodoTemplate {
            id: Uuid::new_v4().to_string(),
            name: new_template.name,
            title: new_template.title,
            priority: new_template.priority,
            category: new_template.category,
        };
        let id = template.id.clone();
        info!(id = %id, name = %template.name, "created template");

        self.templates.push(template);
        self.notify();
        id
    }

    pub fn delete_template(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|template| template.id != id);
        if self.templates.len() == before {
            debug!(id, "template delete ignored, no such template");
            return false;
        }
        info!(id, "deleted template");
        self.notify();
        true
    }

    /// Create a todo from a template's title, priority and category.
    /// Returns `None` without touching the store when the template is unknown.
    pub fn create_from_template(&mut self, template_id: &str) -> Option<String> {
        let new_todo = match self.template(template_id) {
            Some(template) => NewTodo::from(template),
            None => {
                debug!(template_id, "template not found");
                return None;
            }
        };
        Some(self.create_todo(new_todo))
    }

    // Filters

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.criteria.query = query.into();
    }

    pub fn set_priority_filter(&mut self, priority: Filter<Priority>) {
        self.criteria.priority = priority;
    }

    pub fn set_category_filter(&mut self, category: Filter<Category>) {
        self.criteria.category = category;
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
    }
}
