//! Heuristic effort and urgency scores.

use serde::Serialize;

use crate::model::bug::Bug;
use crate::model::story::Story;
use crate::model::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryComplexity {
    pub score: u8,
    pub description_length: usize,
    pub has_images: bool,
    pub related_bugs: usize,
    pub test_cases: usize,
    pub estimated_hours: u32,
    pub priority_suggestion: Level,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugPriority {
    pub score: u8,
    pub severity: Option<u32>,
    pub has_related_story: bool,
    pub status: String,
    pub suggestion: Level,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWorkload {
    pub estimated_hours: u32,
    pub difficulty: Difficulty,
    pub description_length: usize,
    pub priority: Option<u32>,
    pub has_deadline: bool,
}

fn clamp_score(raw: i32) -> u8 {
    raw.clamp(1, 10) as u8
}

/// Points of the first tier whose threshold `value` exceeds. Tiers are
/// ordered from highest threshold down.
fn tier_points(value: usize, tiers: &[(usize, i32)]) -> i32 {
    tiers
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map_or(0, |(_, points)| *points)
}

pub fn story_complexity(story: &Story, related_bugs: usize, test_cases: usize) -> StoryComplexity {
    let description_length = story.spec.chars().count();
    let has_images = story.spec.contains("<img");

    let mut raw = tier_points(description_length, &[(1000, 3), (500, 2), (200, 1)]);
    if has_images {
        raw += 1;
    }
    raw += tier_points(related_bugs, &[(5, 2), (2, 1)]);
    raw += tier_points(test_cases, &[(10, 2), (5, 1)]);
    if story.pri == Some(1) {
        raw += 1;
    }
    let score = clamp_score(raw);

    let estimated_hours = match score {
        0..=3 => 2,
        4..=6 => 4,
        7..=8 => 8,
        _ => 16,
    };
    let priority_suggestion = match score {
        0..=3 => Level::Low,
        4..=6 => Level::Medium,
        _ => Level::High,
    };

    StoryComplexity {
        score,
        description_length,
        has_images,
        related_bugs,
        test_cases,
        estimated_hours,
        priority_suggestion,
    }
}

pub fn bug_priority(bug: &Bug, has_related_story: bool) -> BugPriority {
    let mut raw = match bug.severity {
        Some(1) => 4,
        Some(2) => 3,
        Some(3) => 2,
        _ => 1,
    };
    match bug.status.as_str() {
        "active" => raw += 2,
        "resolved" => raw -= 1,
        _ => {}
    }
    if has_related_story {
        raw += 1;
    }
    let score = clamp_score(raw);

    let suggestion = match score {
        0..=3 => Level::Low,
        4..=5 => Level::Medium,
        6..=7 => Level::High,
        _ => Level::Urgent,
    };

    BugPriority {
        score,
        severity: bug.severity,
        has_related_story,
        status: bug.status.clone(),
        suggestion,
    }
}

pub fn task_workload(task: &Task) -> TaskWorkload {
    let description_length = task.desc.chars().count();
    let mut estimated_hours = 2;
    if description_length > 500 {
        estimated_hours += 2;
    } else if description_length > 200 {
        estimated_hours += 1;
    }
    if task.pri == Some(1) {
        estimated_hours += 1;
    }

    let difficulty = match estimated_hours {
        0..=2 => Difficulty::Easy,
        3..=4 => Difficulty::Medium,
        _ => Difficulty::Hard,
    };

    TaskWorkload {
        estimated_hours,
        difficulty,
        description_length,
        priority: task.pri,
        has_deadline: task.deadline.is_some(),
    }
}
