use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Record;
use crate::util::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient::small_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub pri: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub desc: String,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub story: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<u64>,
}

impl Record for Task {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Wait,
    Doing,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Wait => "wait",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub consumed: Option<f64>,
    pub left: Option<f64>,
    pub status: Option<TaskStatus>,
    pub finished_date: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total: usize,
    pub wait: usize,
    pub doing: usize,
    pub done: usize,
    pub by_priority: BTreeMap<u32, usize>,
}

impl TaskStatistics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |status: &str| tasks.iter().filter(|t| t.status == status).count();
        let by_priority = (1..=4)
            .map(|pri| (pri, tasks.iter().filter(|t| t.pri == Some(pri)).count()))
            .collect();
        Self {
            total: tasks.len(),
            wait: count("wait"),
            doing: count("doing"),
            done: count("done"),
            by_priority,
        }
    }
}
