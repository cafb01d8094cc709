use tracing::warn;

use super::{collection, entity, Transport, ZentaoClient};
use crate::error::Result;
use crate::model::task::{Task, TaskStatistics, TaskUpdate};
use crate::model::{BatchItem, BatchReport};

impl<T: Transport> ZentaoClient<T> {
    pub async fn my_tasks(&self) -> Result<Vec<Task>> {
        let data = self.fetch("/my-task.json").await?;
        collection(&data, "tasks")
    }

    pub async fn task(&self, task_id: u64) -> Result<Task> {
        let data = self.fetch(&format!("/task-view-{task_id}.json")).await?;
        entity(&data, "task", "task", task_id)
    }

    /// Record effort or change status, then return the task as stored.
    pub async fn update_task(&self, task_id: u64, update: &TaskUpdate) -> Result<Task> {
        let mut form = Vec::new();
        if let Some(consumed) = update.consumed {
            form.push(("consumed", consumed.to_string()));
        }
        if let Some(left) = update.left {
            form.push(("left", left.to_string()));
        }
        if let Some(status) = update.status {
            form.push(("status", status.as_str().to_string()));
        }
        form.push(("comment", update.comment.clone().unwrap_or_default()));

        self.transport
            .post(&format!("/task-edit-{task_id}.json"), &form)
            .await?;
        self.task(task_id).await
    }

    /// Mark a task finished. The finish date defaults to today.
    pub async fn finish_task(&self, task_id: u64, update: &TaskUpdate) -> Result<Task> {
        let finished_date = update
            .finished_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        let form = [
            ("consumed", update.consumed.unwrap_or(0.0).to_string()),
            ("finishedDate", finished_date),
            ("comment", update.comment.clone().unwrap_or_default()),
        ];

        self.transport
            .post(&format!("/task-finish-{task_id}.json"), &form)
            .await?;
        self.task(task_id).await
    }

    /// Apply the same update to several tasks, one after another. Failures are
    /// reported per task and do not stop the batch.
    pub async fn batch_update_tasks(
        &self,
        task_ids: &[u64],
        update: &TaskUpdate,
    ) -> BatchReport<Task> {
        let mut results = Vec::with_capacity(task_ids.len());
        for &id in task_ids {
            let item = match self.update_task(id, update).await {
                Ok(task) => BatchItem {
                    id,
                    success: true,
                    record: Some(task),
                    error: None,
                },
                Err(err) => {
                    warn!(task = id, error = %err, "task update failed");
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

    pub async fn task_statistics(&self) -> Result<TaskStatistics> {
        Ok(TaskStatistics::from_tasks(&self.my_tasks().await?))
    }
}
