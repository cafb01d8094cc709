use tracing::warn;

use super::{collection, entity, product_name, Transport, ZentaoClient};
use crate::error::Result;
use crate::model::bug::{Bug, BugResolution, BugStatistics};
use crate::model::{BatchItem, BatchReport};

impl<T: Transport> ZentaoClient<T> {
    /// Bugs assigned to the logged-in user.
    pub async fn my_bugs(&self) -> Result<Vec<Bug>> {
        let data = self.fetch("/my-bug.json").await?;
        collection(&data, "bugs")
    }

    pub async fn bug(&self, bug_id: u64) -> Result<Bug> {
        let data = self.fetch(&format!("/bug-view-{bug_id}.json")).await?;
        let mut bug: Bug = entity(&data, "bug", "bug", bug_id)?;
        bug.product_name = product_name(&data);
        Ok(bug)
    }

    pub async fn resolve_bug(&self, bug_id: u64, resolution: &BugResolution) -> Result<Bug> {
        let mut form = vec![
            ("resolution", resolution.resolution.as_str().to_string()),
            ("resolvedBuild", resolution.resolved_build.clone().unwrap_or_default()),
            ("comment", resolution.comment.clone().unwrap_or_default()),
        ];
        if let Some(duplicate) = resolution.duplicate_bug {
            form.push(("duplicateBug", duplicate.to_string()));
        }

        self.transport
            .post(&format!("/bug-resolve-{bug_id}.json"), &form)
            .await?;
        self.bug(bug_id).await
    }

    pub async fn batch_resolve_bugs(
        &self,
        bug_ids: &[u64],
        resolution: &BugResolution,
    ) -> BatchReport<Bug> {
        let mut results = Vec::with_capacity(bug_ids.len());
        for &id in bug_ids {
            let item = match self.resolve_bug(id, resolution).await {
                Ok(bug) => BatchItem {
                    id,
                    success: true,
                    record: Some(bug),
                    error: None,
                },
                Err(err) => {
                    warn!(bug = id, error = %err, "bug resolution failed");
                    BatchItem {
                        id,
                        success: false,
                        record: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            results.push(item);
        }
        BatchReport::from_results(results)
    }

    pub async fn bug_statistics(&self) -> Result<BugStatistics> {
        Ok(BugStatistics::from_bugs(&self.my_bugs().await?))
    }
}
