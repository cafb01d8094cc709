pub mod bug;
pub mod product;
pub mod story;
pub mod task;
pub mod testing;

use std::collections::HashSet;

use serde::Serialize;

/// Anything with a ZenTao numeric identifier.
pub trait Record {
    fn id(&self) -> u64;
}

/// Drop repeated identifiers, keeping the first occurrence.
pub fn dedup_by_id<T: Record>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id())).collect()
}

/// Result of a best-effort batch stage: what succeeded plus how many items
/// were dropped because their individual fetch failed.
#[derive(Debug, Clone, Serialize)]
pub struct Partial<T> {
    pub items: Vec<T>,
    pub failed: usize,
}

impl<T> Partial<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self { items, failed: 0 }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Outcome of one item inside a batch mutation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem<T> {
    pub id: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    pub results: Vec<BatchItem<T>>,
    pub total: usize,
    pub succeeded: usize,
}

impl<T> BatchReport<T> {
    pub fn from_results(results: Vec<BatchItem<T>>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            results,
        }
    }
}
