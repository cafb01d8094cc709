//! Markdown renderings and one-line summaries of ZenTao records.

use std::fmt::Display;

use crate::model::bug::Bug;
use crate::model::story::Story;
use crate::model::task::Task;

const PREVIEW_CHARS: usize = 100;

/// First 100 characters of `text`, with `...` when something was cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn field(lines: &mut Vec<String>, label: &str, value: Option<impl Display>) {
    if let Some(value) = value {
        lines.push(format!("**{label}**: {value}"));
    }
}

fn body(lines: &mut Vec<String>, heading: &str, text: &str, placeholder: &str) {
    lines.push(String::new());
    lines.push(format!("## {heading}"));
    lines.push(String::new());
    if text.is_empty() {
        lines.push(format!("*{placeholder}*"));
    } else {
        lines.push(text.to_string());
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

pub fn story_markdown(story: &Story) -> String {
    let mut lines = vec![format!("# Story #{}: {}", story.id, story.title), String::new()];
    field(&mut lines, "Product", story.product_name.as_deref());
    field(&mut lines, "Module", story.module_name.as_deref());
    field(&mut lines, "Status", non_empty(&story.status));
    field(&mut lines, "Priority", story.pri.filter(|p| *p > 0));
    field(&mut lines, "Stage", story.stage.as_deref());
    field(
        &mut lines,
        "Estimate",
        story.estimate.filter(|e| *e > 0.0).map(|e| format!("{e} h")),
    );
    field(&mut lines, "Assigned to", story.assigned_to.as_deref());
    field(&mut lines, "Opened by", story.opened_by.as_deref());
    field(&mut lines, "Opened", story.opened_date.as_deref());
    body(&mut lines, "Description", &story.spec, "No description");
    lines.join("\n")
}

pub fn bug_markdown(bug: &Bug) -> String {
    let mut lines = vec![format!("# Bug #{}: {}", bug.id, bug.title), String::new()];
    field(&mut lines, "Product", bug.product_name.as_deref());
    field(&mut lines, "Status", non_empty(&bug.status));
    field(&mut lines, "Severity", bug.severity.filter(|s| *s > 0));
    field(&mut lines, "Opened", bug.opened_date.as_deref());
    field(&mut lines, "Story", bug.story.map(|id| format!("#{id}")));
    body(&mut lines, "Steps to reproduce", &bug.steps, "No steps recorded");
    lines.join("\n")
}

pub fn task_markdown(task: &Task) -> String {
    let mut lines = vec![format!("# Task #{}: {}", task.id, task.name), String::new()];
    lines.push(format!("**Status**: {}", task.status));
    field(&mut lines, "Priority", task.pri);
    field(&mut lines, "Deadline", task.deadline.as_deref());
    field(&mut lines, "Story", task.story.map(|id| format!("#{id}")));
    field(&mut lines, "Product", task.product.map(|id| format!("#{id}")));
    body(&mut lines, "Description", &task.desc, "No description");
    lines.join("\n")
}

pub fn story_summary(story: &Story) -> String {
    let mut parts = vec![format!("Story #{}: {}", story.id, story.title)];
    if !story.status.is_empty() {
        parts.push(format!("status: {}", story.status));
    }
    if let Some(pri) = story.pri.filter(|p| *p > 0) {
        parts.push(format!("priority: {pri}"));
    }
    if let Some(product) = &story.product_name {
        parts.push(format!("product: {product}"));
    }
    if !story.spec.is_empty() {
        parts.push(format!("description: {}", preview(&story.spec)));
    }
    parts.join(" | ")
}

pub fn bug_summary(bug: &Bug) -> String {
    let mut parts = vec![format!("Bug #{}: {}", bug.id, bug.title)];
    if !bug.status.is_empty() {
        parts.push(format!("status: {}", bug.status));
    }
    if let Some(severity) = bug.severity.filter(|s| *s > 0) {
        parts.push(format!("severity: {severity}"));
    }
    if let Some(product) = &bug.product_name {
        parts.push(format!("product: {product}"));
    }
    if !bug.steps.is_empty() {
        parts.push(format!("steps: {}", preview(&bug.steps)));
    }
    parts.join(" | ")
}
