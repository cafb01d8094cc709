use super::{collection, entity, product_name, Transport, ZentaoClient};
use crate::error::{Result, ZentaoError};
use crate::model::testing::{NewTestCase, TestCase, TestCaseStatus};
use crate::util::lenient;

impl<T: Transport> ZentaoClient<T> {
    /// First page (up to 100) of a product's test cases, by module or status.
    pub async fn product_test_cases(
        &self,
        product_id: u64,
        status: Option<TestCaseStatus>,
        module_id: Option<u64>,
    ) -> Result<Vec<TestCase>> {
        let (browse_type, param) = match (module_id, status) {
            (Some(module), _) => ("byModule", module),
            (None, Some(status)) if status != TestCaseStatus::All => (status.as_str(), 0),
            _ => ("all", 0),
        };
        let path =
            format!("/testcase-browse-{product_id}-0-{browse_type}-{param}-id_desc-0-100-1.json");
        let data = self.fetch(&path).await?;
        collection(&data, "cases")
    }

    pub async fn test_case(&self, case_id: u64) -> Result<TestCase> {
        let data = self.fetch(&format!("/testcase-view-{case_id}.json")).await?;
        let mut case: TestCase = entity(&data, "case", "test case", case_id)?;
        case.product_name = product_name(&data);
        Ok(case)
    }

    /// Create a case; returns the new id when the server reports one.
    pub async fn create_test_case(&self, case: &NewTestCase) -> Result<Option<u64>> {
        if case.title.trim().is_empty() {
            return Err(ZentaoError::InvalidParams("test case title is empty".into()));
        }
        let form = [
            ("title", case.title.clone()),
            ("type", case.case_type.clone().unwrap_or_else(|| "feature".into())),
            ("pri", case.pri.unwrap_or(3).to_string()),
            ("module", case.module.unwrap_or(0).to_string()),
            ("story", case.story.unwrap_or(0).to_string()),
            ("precondition", case.precondition.clone().unwrap_or_default()),
            ("steps", case.steps.clone().unwrap_or_default()),
            ("status", case.status.clone().unwrap_or_else(|| "normal".into())),
        ];
        let data = self
            .transport
            .post(&format!("/testcase-create-{}.json", case.product), &form)
            .await?;
        Ok(data.get("id").and_then(lenient::as_u64).filter(|id| *id != 0))
    }

    /// Test cases linked from a story's detail view.
    pub async fn story_test_cases(&self, story_id: u64) -> Result<Vec<TestCase>> {
        let data = self.fetch(&format!("/story-view-{story_id}.json")).await?;
        collection(&data, "cases")
    }
}
