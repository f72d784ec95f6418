use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::ai::{AiAssistant, Answer, TodoSuggestion};
use crate::models::{
    BulkUpdate, Category, Filter, NewTemplate, NewTodo, Position, Priority, Todo, TodoUpdate,
};
use crate::store::TodoStore;

#[derive(Parser)]
#[command(name = "tdc")]
#[command(about = "Todo cards on a pannable terminal canvas")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/storage)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive canvas (default if no subcommand)
    Tui,
    /// Add a todo; it is placed automatically on the canvas
    Add {
        title: String,
        #[arg(short, long, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(short, long, default_value_t = Category::Other)]
        category: Category,
    },
    /// List todos matching the filters
    List {
        /// Case-insensitive title substring
        #[arg(short, long)]
        search: Option<String>,
        /// low, medium, high or all
        #[arg(short, long, default_value = "all")]
        priority: Filter<Priority>,
        /// work, personal, shopping, health, learning, other or all
        #[arg(short, long, default_value = "all")]
        category: Filter<Category>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Move a todo to canvas coordinates
    Move {
        id: String,
        #[arg(allow_negative_numbers = true, value_parser = parse_coordinate)]
        x: f64,
        #[arg(allow_negative_numbers = true, value_parser = parse_coordinate)]
        y: f64,
    },
    /// Change a todo's title, priority or category
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Delete todos
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Apply one change to several todos at once
    Bulk {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        category: Option<Category>,
        /// Delete the todos instead
        #[arg(long, conflicts_with_all = ["priority", "category"])]
        delete: bool,
    },
    /// Manage todo templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },
    /// AI suggestions (static suggestions when no API key is configured)
    Ai {
        #[command(subcommand)]
        action: AiCommand,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List templates
    List,
    /// Add a template
    Add {
        name: String,
        title: String,
        #[arg(short, long, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(short, long, default_value_t = Category::Other)]
        category: Category,
    },
    /// Delete a template
    Delete { id: String },
    /// Create a todo from a template
    Use { id: String },
}

#[derive(Subcommand)]
pub enum AiCommand {
    /// Suggest todos for a context
    Suggest {
        context: String,
        /// Add the suggestions to the canvas
        #[arg(long)]
        add: bool,
    },
    /// Productivity insights for the current todos
    Analyze,
    /// Rewrite a title to be more actionable
    Improve {
        title: String,
        #[arg(short, long, default_value_t = Category::Other)]
        category: Category,
    },
    /// Pick a category and priority for a title
    Categorize { title: String },
    /// Related todos for a scenario
    SmartTemplate {
        description: String,
        /// Add the todos to the canvas
        #[arg(long)]
        add: bool,
    },
}

/// Canvas coordinates must survive a trip through the JSON blob
fn parse_coordinate(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite coordinate", s));
    }
    Ok(value)
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Todo not found: {0}")]
    TodoNotFound(String),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Template name cannot be empty")]
    EmptyTemplateName,
    #[error("Nothing to change: pass at least one of --title, --priority or --category")]
    NothingToChange,
    #[error("Failed to serialize output: {0}")]
    SerializeError(#[from] serde_json::Error),
}

fn require_title(title: &str) -> Result<String, CliError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Handle the add command
pub fn handle_add(
    store: &mut TodoStore,
    title: String,
    priority: Priority,
    category: Category,
) -> Result<(), CliError> {
    let title = require_title(&title)?;
    let id = store.create_todo(NewTodo::new(title, priority, category));
    let todo = store.todo(&id).ok_or_else(|| CliError::TodoNotFound(id.clone()))?;
    println!("Todo created at {} (ID: {})", todo.position, id);
    Ok(())
}

/// Handle the list command
pub fn handle_list(
    store: &mut TodoStore,
    search: Option<String>,
    priority: Filter<Priority>,
    category: Filter<Category>,
    json: bool,
) -> Result<(), CliError> {
    store.set_search_query(search.unwrap_or_default());
    store.set_priority_filter(priority);
    store.set_category_filter(category);

    let todos = store.filtered_todos();
    if json {
        println!("{}", serde_json::to_string_pretty(&todos)?);
        return Ok(());
    }

    if todos.is_empty() {
        println!("No todos ({})", store.criteria().summary());
        return Ok(());
    }
    for todo in &todos {
        println!("{}", format_todo_line(todo));
    }
    if !store.criteria().is_default() {
        println!("{} shown ({})", todos.len(), store.criteria().summary());
    }
    Ok(())
}

fn format_todo_line(todo: &Todo) -> String {
    format!(
        "{}  {:<6} {:<8} {:>14}  {}",
        todo.id,
        todo.priority,
        todo.category,
        todo.position.to_string(),
        todo.title
    )
}

/// Handle the move command
pub fn handle_move(store: &mut TodoStore, id: String, x: f64, y: f64) -> Result<(), CliError> {
    if !store.reposition_todo(&id, Position::new(x, y)) {
        return Err(CliError::TodoNotFound(id));
    }
    println!("Moved {} to {}", id, Position::new(x, y));
    Ok(())
}

/// Handle the edit command
pub fn handle_edit(
    store: &mut TodoStore,
    id: String,
    title: Option<String>,
    priority: Option<Priority>,
    category: Option<Category>,
) -> Result<(), CliError> {
    let title = title.as_deref().map(require_title).transpose()?;
    let update = TodoUpdate {
        title,
        priority,
        category,
        position: None,
    };
    if update.is_empty() {
        return Err(CliError::NothingToChange);
    }
    if !store.update_todo(&id, update) {
        return Err(CliError::TodoNotFound(id));
    }
    println!("Updated {}", id);
    Ok(())
}

/// Handle the delete command. Unknown ids are reported but do not stop the others.
pub fn handle_delete(store: &mut TodoStore, ids: Vec<String>) -> Result<(), CliError> {
    let mut missing = Vec::new();
    for id in ids {
        if store.delete_todo(&id) {
            println!("Deleted {}", id);
        } else {
            missing.push(id);
        }
    }
    if !missing.is_empty() {
        return Err(CliError::TodoNotFound(missing.join(", ")));
    }
    Ok(())
}

/// Handle the bulk command: select the ids, then act on the selection
pub fn handle_bulk(
    store: &mut TodoStore,
    ids: Vec<String>,
    priority: Option<Priority>,
    category: Option<Category>,
    delete: bool,
) -> Result<(), CliError> {
    store.clear_selection();
    for id in &ids {
        if store.todo(id).is_none() {
            return Err(CliError::TodoNotFound(id.clone()));
        }
        if !store.is_selected(id) {
            store.toggle_selection(id);
        }
    }

    if delete {
        let count = store.delete_selected();
        println!("Deleted {} todos", count);
        return Ok(());
    }

    let update = BulkUpdate { priority, category };
    if update.is_empty() {
        return Err(CliError::NothingToChange);
    }
    let count = store.update_selected(update);
    store.clear_selection();
    println!("Updated {} todos", count);
    Ok(())
}

/// Handle the template subcommands
pub fn handle_template(store: &mut TodoStore, action: TemplateCommand) -> Result<(), CliError> {
    match action {
        TemplateCommand::List => {
            for template in store.templates() {
                println!(
                    "{}  {:<16} {:<6} {:<8} {}",
                    template.id, template.name, template.priority, template.category, template.title
                );
            }
        }
        TemplateCommand::Add {
            name,
            title,
            priority,
            category,
        } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CliError::EmptyTemplateName);
            }
            let title = require_title(&title)?;
            let id = store.add_template(NewTemplate {
                name,
                title,
                priority,
                category,
            });
            println!("Template created (ID: {})", id);
        }
        TemplateCommand::Delete { id } => {
            if !store.delete_template(&id) {
                return Err(CliError::TemplateNotFound(id));
            }
            println!("Deleted template {}", id);
        }
        TemplateCommand::Use { id } => {
            let todo_id = store
                .create_from_template(&id)
                .ok_or_else(|| CliError::TemplateNotFound(id.clone()))?;
            println!("Todo created from template {} (ID: {})", id, todo_id);
        }
    }
    Ok(())
}

/// Handle the ai subcommands
pub fn handle_ai(store: &mut TodoStore, ai: &AiAssistant, action: AiCommand) -> Result<(), CliError> {
    if !ai.is_online() {
        println!("(offline: showing built-in suggestions)");
    }

    match action {
        AiCommand::Suggest { context, add } => {
            let answer = ai.suggest_todos(&context, store.todos());
            print_suggestions(&answer);
            if add {
                add_suggestions(store, &answer.value);
            }
        }
        AiCommand::Analyze => {
            let answer = ai.analyze_productivity(store.todos());
            if answer.value.is_empty() {
                println!("No insights right now.");
            }
            for insight in &answer.value {
                println!("[{:?}] {}", insight.kind, insight.title);
                println!("    {}", insight.description);
                if let Some(ref action) = insight.action {
                    println!("    -> {}", action);
                }
            }
        }
        AiCommand::Improve { title, category } => {
            let answer = ai.improve_title(&title, category);
            println!("{}", answer.value);
        }
        AiCommand::Categorize { title } => {
            let answer = ai.categorize(&title);
            println!(
                "category: {}\npriority: {}\nreason:   {}",
                answer.value.category, answer.value.priority, answer.value.reasoning
            );
        }
        AiCommand::SmartTemplate { description, add } => {
            let answer = ai.smart_template(&description);
            print_suggestions(&answer);
            if add {
                add_suggestions(store, &answer.value);
            }
        }
    }
    Ok(())
}

fn print_suggestions(answer: &Answer<Vec<TodoSuggestion>>) {
    if answer.value.is_empty() {
        println!("No suggestions.");
    }
    for (i, suggestion) in answer.value.iter().enumerate() {
        println!(
            "{}. {} [{}, {}]\n   {}",
            i + 1,
            suggestion.title,
            suggestion.priority,
            suggestion.category,
            suggestion.reasoning
        );
    }
}

fn add_suggestions(store: &mut TodoStore, suggestions: &[TodoSuggestion]) {
    for suggestion in suggestions {
        let id = store.create_todo(NewTodo::new(
            suggestion.title.clone(),
            suggestion.priority,
            suggestion.category,
        ));
        info!(id = %id, "added suggested todo");
    }
    println!("Added {} todos", suggestions.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["tdc", "--dev"]).unwrap();
        assert!(cli.dev);
        assert!(cli.command.is_none());
    }

    #[test]
    fn add_parses_priority_and_category() {
        let cli = Cli::try_parse_from(["tdc", "add", "Buy milk", "-p", "HIGH", "-c", "shopping"]).unwrap();
        match cli.command {
            Some(Commands::Add { title, priority, category }) => {
                assert_eq!(title, "Buy milk");
                assert_eq!(priority, Priority::High);
                assert_eq!(category, Category::Shopping);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn invalid_priority_is_rejected() {
        assert!(Cli::try_parse_from(["tdc", "add", "x", "--priority", "urgent"]).is_err());
    }

    #[test]
    fn list_filters_default_to_all() {
        let cli = Cli::try_parse_from(["tdc", "list", "--category", "work"]).unwrap();
        match cli.command {
            Some(Commands::List { priority, category, .. }) => {
                assert_eq!(priority, Filter::All);
                assert_eq!(category, Filter::Only(Category::Work));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn move_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["tdc", "move", "abc", "-50", "120.5"]).unwrap();
        match cli.command {
            Some(Commands::Move { x, y, .. }) => assert_eq!((x, y), (-50.0, 120.5)),
            _ => panic!("expected move"),
        }
    }

    #[test]
    fn move_rejects_non_finite_coordinates() {
        for bad in ["NaN", "inf", "-inf", "infinity"] {
            assert!(Cli::try_parse_from(["tdc", "move", "abc", bad, "0"]).is_err(), "{}", bad);
            assert!(Cli::try_parse_from(["tdc", "move", "abc", "0", bad]).is_err(), "{}", bad);
        }
        assert!(Cli::try_parse_from(["tdc", "move", "abc", "east", "0"]).is_err());
    }

    #[test]
    fn blank_titles_are_rejected() {
        let mut store = TodoStore::new();
        assert!(matches!(
            handle_add(&mut store, "   ".to_string(), Priority::Low, Category::Work),
            Err(CliError::EmptyTitle)
        ));
        assert!(store.todos().is_empty());

        handle_add(&mut store, "  Call mom ".to_string(), Priority::Low, Category::Personal).unwrap();
        let id = store.todos()[0].id.clone();
        assert_eq!(store.todos()[0].title, "Call mom");

        assert!(matches!(
            handle_edit(&mut store, id.clone(), Some(String::new()), None, None),
            Err(CliError::EmptyTitle)
        ));
        assert_eq!(store.todo(&id).unwrap().title, "Call mom");
    }

    #[test]
    fn template_add_needs_name_and_title() {
        let mut store = TodoStore::new();
        let add = |name: &str, title: &str| TemplateCommand::Add {
            name: name.to_string(),
            title: title.to_string(),
            priority: Priority::Medium,
            category: Category::Other,
        };

        assert!(matches!(
            handle_template(&mut store, add(" ", "Stretch")),
            Err(CliError::EmptyTemplateName)
        ));
        assert!(matches!(
            handle_template(&mut store, add("Stretch", "")),
            Err(CliError::EmptyTitle)
        ));
        assert_eq!(store.templates().len(), 3);

        handle_template(&mut store, add("Stretch", "Morning stretch")).unwrap();
        assert_eq!(store.templates().len(), 4);
    }

    #[test]
    fn bulk_delete_conflicts_with_field_changes() {
        assert!(Cli::try_parse_from(["tdc", "bulk", "a", "--delete", "--priority", "low"]).is_err());
    }

    #[test]
    fn bulk_updates_only_named_todos() {
        let mut store = TodoStore::new();
        let a = store.create_todo(NewTodo::new("a", Priority::Low, Category::Work));
        let b = store.create_todo(NewTodo::new("b", Priority::Low, Category::Work));

        handle_bulk(&mut store, vec![a.clone()], Some(Priority::High), None, false).unwrap();
        assert_eq!(store.todo(&a).unwrap().priority, Priority::High);
        assert_eq!(store.todo(&b).unwrap().priority, Priority::Low);
        assert!(store.selected_ids().is_empty());

        assert!(matches!(
            handle_bulk(&mut store, vec!["nope".to_string()], None, None, true),
            Err(CliError::TodoNotFound(_))
        ));
        assert_eq!(store.todos().len(), 2);
    }

    #[test]
    fn edit_requires_a_change_and_a_known_id() {
        let mut store = TodoStore::new();
        let id = store.create_todo(NewTodo::new("a", Priority::Low, Category::Work));
        assert!(matches!(
            handle_edit(&mut store, id.clone(), None, None, None),
            Err(CliError::NothingToChange)
        ));
        assert!(matches!(
            handle_edit(&mut store, "nope".to_string(), Some("x".to_string()), None, None),
            Err(CliError::TodoNotFound(_))
        ));
        handle_edit(&mut store, id.clone(), Some("renamed".to_string()), None, None).unwrap();
        assert_eq!(store.todo(&id).unwrap().title, "renamed");
    }
}
