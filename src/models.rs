use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFieldError {
    #[error("Unknown priority '{0}' (expected low, medium or high)")]
    Priority(String),
    #[error("Unknown category '{0}' (expected work, personal, shopping, health, learning or other)")]
    Category(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Next value in display order, wrapping around (used by selectors)
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParseFieldError::Priority(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    Learning,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Learning,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Learning => "learning",
            Category::Other => "other",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "shopping" => Ok(Category::Shopping),
            "health" => Ok(Category::Health),
            "learning" => Ok(Category::Learning),
            "other" => Ok(Category::Other),
            _ => Err(ParseFieldError::Category(s.to_string())),
        }
    }
}

fn cycle<T: Copy + PartialEq>(values: &[T], current: T, step: usize) -> T {
    let index = values.iter().position(|v| *v == current).unwrap_or(0);
    values[(index + step) % values.len()]
}

/// A point in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite; JSON cannot carry NaN or infinity
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.0}, {:.0})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub category: Category,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTemplate {
    pub id: String,
    pub name: String,
    pub title: String,
    pub priority: Priority,
    pub category: Category,
}

/// Caller-supplied fields for a new todo; id, position and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub priority: Priority,
    pub category: Category,
}

impl NewTodo {
    pub fn new(title: impl Into<String>, priority: Priority, category: Category) -> Self {
        Self {
            title: title.into(),
            priority,
            category,
        }
    }
}

impl From<&TodoTemplate> for NewTodo {
    fn from(template: &TodoTemplate) -> Self {
        Self {
            title: template.title.clone(),
            priority: template.priority,
            category: template.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub title: String,
    pub priority: Priority,
    pub category: Category,
}

/// Partial edit of a todo. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub position: Option<Position>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.position.is_none()
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(ref title) = self.title {
            todo.title = title.clone();
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
        if let Some(position) = self.position.filter(Position::is_finite) {
            todo.position = position;
        }
    }
}

/// Edit applied to every selected todo; only priority and category may be bulk-edited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkUpdate {
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl BulkUpdate {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.category.is_none()
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
    }
}

/// A filter criterion: either the "all" sentinel or one specific value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Only(value) => value.fmt(f),
        }
    }
}

impl<T: FromStr> FromStr for Filter<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

impl Filter<Priority> {
    /// Step through all -> low -> medium -> high -> all
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Only(Priority::ALL[0]),
            Filter::Only(p) if p == Priority::ALL[Priority::ALL.len() - 1] => Filter::All,
            Filter::Only(p) => Filter::Only(p.next()),
        }
    }
}

impl Filter<Category> {
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Only(Category::ALL[0]),
            Filter::Only(c) if c == Category::ALL[Category::ALL.len() - 1] => Filter::All,
            Filter::Only(c) => Filter::Only(c.next()),
        }
    }
}

/// Search and filter state that drives the filtered view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub query: String,
    pub priority: Filter<Priority>,
    pub category: Filter<Category>,
}

impl FilterCriteria {
    pub fn matches(&self, todo: &Todo) -> bool {
        let matches_search = self.query.is_empty()
            || todo.title.to_lowercase().contains(&self.query.to_lowercase());
        matches_search && self.priority.matches(&todo.priority) && self.category.matches(&todo.category)
    }

    pub fn is_default(&self) -> bool {
        self.query.is_empty() && self.priority.is_all() && self.category.is_all()
    }

    /// One-line description for the filters box
    pub fn summary(&self) -> String {
        if self.is_default() {
            return "No filters".to_string();
        }
        let mut parts = Vec::new();
        if !self.query.is_empty() {
            parts.push(format!("Search: \"{}\"", self.query));
        }
        if let Filter::Only(priority) = self.priority {
            parts.push(format!("Priority: {}", priority));
        }
        if let Filter::Only(category) = self.category {
            parts.push(format!("Category: {}", category));
        }
        parts.join(" | ")
    }
}
