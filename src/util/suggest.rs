//! Next-step hints shown after looking at a story, bug or task.

use serde::Serialize;

use crate::model::bug::Bug;
use crate::model::story::Story;
use crate::model::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub action: String,
    pub description: String,
    /// CLI invocation that carries the action out, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub priority: Priority,
}

impl Suggestion {
    fn new(action: &str, description: String, command: Option<String>, priority: Priority) -> Self {
        Self {
            action: action.to_string(),
            description,
            command,
            priority,
        }
    }
}

pub fn for_story(story: &Story, has_related_bugs: bool, has_test_cases: bool) -> Vec<Suggestion> {
    let id = story.id;
    let mut out = Vec::new();
    if matches!(story.status.as_str(), "active" | "draft") {
        out.push(Suggestion::new(
            "Plan development",
            format!("Break story #{id} into development tasks"),
            None,
            Priority::High,
        ));
    }
    if has_related_bugs {
        out.push(Suggestion::new(
            "Review related bugs",
            format!("List the bugs raised against story #{id}"),
            Some(format!("zentao story-bugs {id}")),
            Priority::Medium,
        ));
    }
    if !has_test_cases {
        out.push(Suggestion::new(
            "Write test cases",
            format!("Story #{id} has no test cases yet"),
            story.product.map(|product| {
                format!("zentao testcase-create {product} --story {id} --title <title>")
            }),
            Priority::Medium,
        ));
    }
    out.push(Suggestion::new(
        "Estimate complexity",
        format!("Score the development complexity of story #{id}"),
        Some(format!("zentao analyze story {id}")),
        Priority::Low,
    ));
    out
}

pub fn for_bug(bug: &Bug, has_related_story: bool) -> Vec<Suggestion> {
    let id = bug.id;
    let mut out = Vec::new();
    if bug.status == "active" {
        out.push(Suggestion::new(
            "Fix and resolve",
            format!("Fix bug #{id} and mark it resolved"),
            Some(format!("zentao bug-resolve {id} --resolution fixed")),
            Priority::High,
        ));
    }
    if has_related_story {
        out.push(Suggestion::new(
            "Read the story",
            format!("Open the story bug #{id} was raised against"),
            Some(format!("zentao bug-story {id}")),
            Priority::Medium,
        ));
    }
    out.push(Suggestion::new(
        "Assess priority",
        format!("Score how urgently bug #{id} needs attention"),
        Some(format!("zentao analyze bug {id}")),
        Priority::Medium,
    ));
    if bug.status == "resolved" {
        out.push(Suggestion::new(
            "Verify the fix",
            format!("Confirm the fix for bug #{id} so it can be closed"),
            None,
            Priority::Low,
        ));
    }
    out
}

pub fn for_task(task: &Task) -> Vec<Suggestion> {
    let id = task.id;
    let mut out = Vec::new();
    match task.status.as_str() {
        "wait" => out.push(Suggestion::new(
            "Start the task",
            format!("Move task #{id} to doing"),
            Some(format!("zentao task-update {id} --status doing")),
            Priority::High,
        )),
        "doing" => out.push(Suggestion::new(
            "Finish the task",
            format!("Mark task #{id} done"),
            Some(format!("zentao task-finish {id}")),
            Priority::High,
        )),
        _ => {}
    }
    out.push(Suggestion::new(
        "Estimate workload",
        format!("Estimate the hours task #{id} needs"),
        Some(format!("zentao analyze task {id}")),
        Priority::Low,
    ));
    if let Some(story) = task.story {
        out.push(Suggestion::new(
            "Read the story",
            format!("Open story #{story} behind task #{id}"),
            Some(format!("zentao story {story}")),
            Priority::Medium,
        ));
    }
    out
}

/// Suggestions grouped by priority, highest first.
pub fn to_markdown(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "No suggested actions.".to_string();
    }
    let mut lines = vec!["## Suggested next steps".to_string(), String::new()];
    for (priority, title) in [
        (Priority::High, "High priority"),
        (Priority::Medium, "Medium priority"),
        (Priority::Low, "Low priority"),
    ] {
        let group: Vec<_> = suggestions.iter().filter(|s| s.priority == priority).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(format!("### {title}"));
        lines.push(String::new());
        for (n, suggestion) in group.iter().enumerate() {
            lines.push(format!("{}. **{}**", n + 1, suggestion.action));
            lines.push(format!("   - {}", suggestion.description));
            if let Some(command) = &suggestion.command {
                lines.push(format!("   - `{command}`"));
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn active_story_without_cases() {
        let story: Story =
            serde_json::from_value(json!({"id": 42, "status": "active", "product": "3"})).unwrap();
        let out = for_story(&story, false, false);
        let actions: Vec<&str> = out.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["Plan development", "Write test cases", "Estimate complexity"]);
        assert_eq!(
            out[1].command.as_deref(),
            Some("zentao testcase-create 3 --story 42 --title <title>")
        );
    }

    #[test]
    fn task_suggestions_follow_status() {
        let task: Task =
            serde_json::from_value(json!({"id": 5, "status": "doing", "story": "42"})).unwrap();
        let out = for_task(&task);
        assert_eq!(out[0].command.as_deref(), Some("zentao task-finish 5"));
        assert!(out.iter().any(|s| s.command.as_deref() == Some("zentao story 42")));
    }

    #[test]
    fn markdown_groups_by_priority() {
        let bug: Bug = serde_json::from_value(json!({"id": 8, "status": "active"})).unwrap();
        let md = to_markdown(&for_bug(&bug, true));
        let high = md.find("### High priority").unwrap();
        let medium = md.find("### Medium priority").unwrap();
        assert!(high < medium);
        assert!(!md.contains("### Low priority"));
        assert!(md.contains("`zentao bug-resolve 8 --resolution fixed`"));
        assert_eq!(to_markdown(&[]), "No suggested actions.");
    }
}
