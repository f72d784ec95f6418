//! Static results used whenever the model is unavailable or its output is unusable.

use crate::ai::{Categorization, Insight, InsightKind, TodoSuggestion};
use crate::models::{Category, Priority, Todo};

fn suggestion(title: impl Into<String>, priority: Priority, category: Category, reasoning: &str) -> TodoSuggestion {
    TodoSuggestion {
        title: title.into(),
        priority,
        category,
        reasoning: reasoning.to_string(),
    }
}

pub fn suggestions(context: &str) -> Vec<TodoSuggestion> {
    let context = context.to_lowercase();

    if context.contains("project") || context.contains("work") {
        return vec![
            suggestion("Define project scope and requirements", Priority::High, Category::Work, "Essential first step for any project"),
            suggestion("Create project timeline and milestones", Priority::Medium, Category::Work, "Helps track progress and deadlines"),
            suggestion("Set up project communication channels", Priority::Low, Category::Work, "Ensures team coordination"),
        ];
    }

    if context.contains("vacation") || context.contains("travel") {
        return vec![
            suggestion("Research and book accommodation", Priority::High, Category::Personal, "Secure lodging for your trip"),
            suggestion("Create packing checklist", Priority::Medium, Category::Personal, "Ensure you don't forget essentials"),
            suggestion("Arrange pet/house sitting", Priority::Medium, Category::Personal, "Take care of responsibilities while away"),
        ];
    }

    vec![
        suggestion("Review and organize current tasks", Priority::Medium, Category::Other, "Good starting point for productivity"),
        suggestion("Set daily priorities", Priority::High, Category::Other, "Focus on what matters most"),
    ]
}

pub fn insights(todos: &[Todo]) -> Vec<Insight> {
    let mut insights = Vec::new();

    if todos.len() > 10 {
        insights.push(Insight {
            kind: InsightKind::Organization,
            title: "Consider Breaking Down Large Tasks".to_string(),
            description: "You have many todos. Consider breaking larger tasks into smaller, more manageable pieces.".to_string(),
            actionable: true,
            action: Some("Review your todos and split complex ones into 2-3 smaller tasks".to_string()),
        });
    }

    let high = todos.iter().filter(|t| t.priority == Priority::High).count();
    if high as f64 > todos.len() as f64 * 0.5 {
        insights.push(Insight {
            kind: InsightKind::Productivity,
            title: "Too Many High Priority Items".to_string(),
            description: "When everything is high priority, nothing is. Consider redistributing priorities.".to_string(),
            actionable: true,
            action: Some("Review high priority todos and downgrade some to medium priority".to_string()),
        });
    }

    insights
}

pub fn categorization(title: &str) -> Categorization {
    fn has_any(title: &str, words: &[&str]) -> bool {
        words.iter().any(|w| title.contains(w))
    }

    let title = title.to_lowercase();
    let (category, priority, reasoning) = if has_any(&title, &["buy", "shop", "purchase"]) {
        (Category::Shopping, Priority::Low, "Contains shopping-related keywords")
    } else if has_any(&title, &["work", "meeting", "project"]) {
        (Category::Work, Priority::Medium, "Contains work-related keywords")
    } else if has_any(&title, &["exercise", "health", "doctor"]) {
        (Category::Health, Priority::Medium, "Contains health-related keywords")
    } else {
        (Category::Other, Priority::Medium, "Default categorization")
    };

    Categorization {
        category,
        priority,
        reasoning: reasoning.to_string(),
    }
}

pub fn template(description: &str) -> Vec<TodoSuggestion> {
    vec![
        suggestion(format!("Plan {}", description), Priority::High, Category::Other, "Planning is essential for any endeavor"),
        suggestion(format!("Research requirements for {}", description), Priority::Medium, Category::Other, "Understanding requirements prevents issues"),
        suggestion(format!("Execute {}", description), Priority::Medium, Category::Other, "Taking action on the plan"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use chrono::Utc;

    fn todo(priority: Priority) -> Todo {
        Todo {
            id: "id".to_string(),
            title: "t".to_string(),
            priority,
            category: Category::Other,
            position: Position::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn suggestions_follow_context_keywords() {
        assert_eq!(suggestions("Big WORK launch")[0].category, Category::Work);
        assert_eq!(suggestions("summer travel")[0].category, Category::Personal);
        assert_eq!(suggestions("anything").len(), 2);
    }

    #[test]
    fn categorization_checks_shopping_first() {
        let c = categorization("Buy snacks for project meeting");
        assert_eq!(c.category, Category::Shopping);
        assert_eq!(c.priority, Priority::Low);
        assert_eq!(categorization("See the doctor").category, Category::Health);
        assert_eq!(categorization("Paint fence").category, Category::Other);
    }

    #[test]
    fn insights_flag_crowded_and_high_priority_boards() {
        assert!(insights(&[]).is_empty());

        let many: Vec<Todo> = (0..11).map(|_| todo(Priority::Low)).collect();
        let kinds: Vec<InsightKind> = insights(&many).iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::Organization]);

        let urgent = vec![todo(Priority::High), todo(Priority::High), todo(Priority::Low)];
        let kinds: Vec<InsightKind> = insights(&urgent).iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::Productivity]);
    }

    #[test]
    fn template_mentions_description() {
        let titles: Vec<String> = template("a garden").into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Plan a garden", "Research requirements for a garden", "Execute a garden"]);
    }
}
