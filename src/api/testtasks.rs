use super::{collection, entity, product_name, Transport, ZentaoClient};
use crate::error::Result;
use crate::model::testing::{TestResult, TestRun, TestTask};

impl<T: Transport> ZentaoClient<T> {
    /// Test tasks of a product, or the user's own when no product is given.
    pub async fn test_tasks(&self, product_id: Option<u64>) -> Result<Vec<TestTask>> {
        let path = match product_id {
            Some(product) => format!("/testtask-browse-{product}.json"),
            None => "/my-testtask.json".to_string(),
        };
        let data = self.fetch(&path).await?;
        collection(&data, "tasks")
    }

    pub async fn test_task(&self, task_id: u64) -> Result<TestTask> {
        let data = self.fetch(&format!("/testtask-view-{task_id}.json")).await?;
        let mut task: TestTask = entity(&data, "task", "test task", task_id)?;
        if task.product_name.is_none() {
            task.product_name = product_name(&data);
        }
        Ok(task)
    }

    pub async fn test_task_results(&self, task_id: u64) -> Result<Vec<TestResult>> {
        let data = self.fetch(&format!("/testtask-cases-{task_id}.json")).await?;
        collection(&data, "runs")
    }

    pub async fn run_test_case(&self, task_id: u64, run: &TestRun) -> Result<()> {
        let form = [
            ("version", run.version.unwrap_or(1).to_string()),
            ("caseResult", run.result.as_str().to_string()),
            ("steps", run.steps.clone().unwrap_or_default()),
            ("comment", run.comment.clone().unwrap_or_default()),
        ];
        self.transport
            .post(
                &format!("/testtask-runCase-{task_id}-{}.json", run.case_id),
                &form,
            )
            .await?;
        Ok(())
    }
}
