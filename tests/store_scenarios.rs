use rand::SeedableRng;
use rand::rngs::StdRng;
use todo_canvas::models::{BulkUpdate, Filter, NewTemplate, NewTodo, TodoUpdate};
use todo_canvas::placement::PlacementEngine;
use todo_canvas::{Category, Position, Priority, Storage, TodoStore};

fn open(dir: &tempfile::TempDir) -> TodoStore {
    let path = dir.path().join("canvas.db");
    Storage::new(path.to_str().unwrap()).unwrap().into_store()
}

#[test]
fn edits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = open(&dir);
    let keep = store.create_todo(NewTodo::new("Plan sprint", Priority::High, Category::Work));
    let gone = store.create_todo(NewTodo::new("Old errand", Priority::Low, Category::Shopping));
    store.reposition_todo(&keep, Position::new(1200.0, 900.0));
    store.update_todo(
        &keep,
        TodoUpdate {
            title: Some("Plan sprint 12".to_string()),
            ..Default::default()
        },
    );
    store.delete_todo(&gone);
    store.add_template(NewTemplate {
        name: "Review".to_string(),
        title: "Weekly review".to_string(),
        priority: Priority::Medium,
        category: Category::Work,
    });
    drop(store);

    let store = open(&dir);
    assert_eq!(store.todos().len(), 1);
    let todo = store.todo(&keep).unwrap();
    assert_eq!(todo.title, "Plan sprint 12");
    assert_eq!(todo.position, Position::new(1200.0, 900.0));
    assert_eq!(store.templates().len(), 4);
}

#[test]
fn non_finite_move_does_not_lose_the_canvas() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = open(&dir);
    let a = store.create_todo(NewTodo::new("Pay rent", Priority::High, Category::Personal));
    store.create_todo(NewTodo::new("Walk", Priority::Low, Category::Health));
    store.reposition_todo(&a, Position::new(300.0, 400.0));
    store.reposition_todo(&a, Position::new(f64::NAN, 0.0));
    store.reposition_todo(&a, Position::new(f64::INFINITY, 0.0));
    drop(store);

    let store = open(&dir);
    assert_eq!(store.todos().len(), 2);
    assert_eq!(store.todo(&a).unwrap().position, Position::new(300.0, 400.0));
}

#[test]
fn selection_and_filters_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = open(&dir);
    let id = store.create_todo(NewTodo::new("Stretch", Priority::Low, Category::Health));
    store.toggle_selection(&id);
    store.set_search_query("stretch");
    store.set_category_filter(Filter::Only(Category::Health));
    drop(store);

    let store = open(&dir);
    assert!(store.selected_ids().is_empty());
    assert!(store.criteria().is_default());
    assert_eq!(store.filtered_todos().len(), 1);
}

#[test]
fn bulk_changes_only_touch_the_selection() {
    let mut store = TodoStore::new().with_rng(StdRng::seed_from_u64(5));
    let ids: Vec<String> = ["one", "two", "three"]
        .iter()
        .map(|title| store.create_todo(NewTodo::new(*title, Priority::Low, Category::Other)))
        .collect();

    store.toggle_selection(&ids[0]);
    store.toggle_selection(&ids[2]);
    let changed = store.update_selected(BulkUpdate {
        priority: Some(Priority::High),
        category: Some(Category::Learning),
    });
    assert_eq!(changed, 2);
    assert_eq!(store.todo(&ids[1]).unwrap().priority, Priority::Low);
    assert_eq!(store.todo(&ids[2]).unwrap().category, Category::Learning);

    assert_eq!(store.delete_selected(), 2);
    assert!(store.selected_ids().is_empty());
    assert_eq!(store.todos().len(), 1);
}

#[test]
fn templates_spawn_independent_todos() {
    let mut store = TodoStore::new().with_rng(StdRng::seed_from_u64(9));
    let template_id = store.templates()[2].id.clone();

    let first = store.create_from_template(&template_id).unwrap();
    let second = store.create_from_template(&template_id).unwrap();
    assert_ne!(first, second);
    assert!(store.create_from_template("missing").is_none());

    store.delete_template(&template_id);
    assert_eq!(store.todos().len(), 2);
    assert!(store.todos().iter().all(|t| t.title == "30-minute workout session"));
}

#[test]
fn a_busy_canvas_keeps_cards_apart() {
    let engine = PlacementEngine::default();
    let mut store = TodoStore::new().with_rng(StdRng::seed_from_u64(42));
    for i in 0..25 {
        store.create_todo(NewTodo::new(format!("card {}", i), Priority::Medium, Category::Other));
    }

    let todos = store.todos();
    for (i, a) in todos.iter().enumerate() {
        for b in &todos[i + 1..] {
            assert!(!engine.overlaps(a.position, b.position), "{} overlaps {}", a.title, b.title);
        }
    }
}

#[test]
fn search_select_all_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = open(&dir);
    for title in ["A", "B", "C"] {
        store.create_todo(NewTodo::new(title, Priority::Medium, Category::Other));
    }
    store.set_search_query("b");
    let filtered: Vec<String> = store.filtered_todos().iter().map(|t| t.title.clone()).collect();
    assert_eq!(filtered, vec!["B"]);

    store.select_all_filtered();
    let b_id = store.filtered_todos()[0].id.clone();
    assert_eq!(store.selected_ids(), [b_id]);
    store.delete_selected();
    assert!(store.selected_ids().is_empty());
    drop(store);

    let store = open(&dir);
    let titles: Vec<&str> = store.todos().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "C"]);
}

#[test]
fn custom_template_instantiates_its_fields() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = open(&dir);
    let template_id = store.add_template(NewTemplate {
        name: "X".to_string(),
        title: "X".to_string(),
        priority: Priority::Low,
        category: Category::Work,
    });
    let id = store.create_from_template(&template_id).unwrap();
    drop(store);

    let store = open(&dir);
    let todo = store.todo(&id).unwrap();
    assert_eq!((todo.title.as_str(), todo.priority, todo.category), ("X", Priority::Low, Category::Work));
}
