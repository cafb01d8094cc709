use super::{entity, product_name, Transport, ZentaoClient};
use crate::error::Result;
use crate::model::story::Story;

impl<T: Transport> ZentaoClient<T> {
    /// Story detail, with product and module names resolved.
    pub async fn story(&self, story_id: u64) -> Result<Story> {
        let data = self.fetch(&format!("/story-view-{story_id}.json")).await?;
        let mut story: Story = entity(&data, "story", "story", story_id)?;
        story.product_name = product_name(&data);

        if let (Some(module), Some(product)) = (story.module, story.product) {
            story.module_name = self.product_modules(product).await.remove(&module);
        }
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::tests::ScriptedTransport;
    use crate::error::ZentaoError;

    #[tokio::test]
    async fn story_detail_resolves_module_name() {
        let transport = ScriptedTransport::new()
            .reply(
                "/story-view-42.json",
                json!({
                    "story": {
                        "id": "42",
                        "title": "Login",
                        "status": "active",
                        "module": "12",
                        "product": "3",
                        "spec": "<p>SSO</p>"
                    },
                    "product": {"name": "Alpha"}
                }),
            )
            .reply("/product-browse-3.json", json!({"modules": {"12": "Auth"}}));
        let calls = transport.calls();
        let client = transport.into_client();

        let story = client.story(42).await.unwrap();
        assert_eq!(story.product_name.as_deref(), Some("Alpha"));
        assert_eq!(story.module_name.as_deref(), Some("Auth"));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn story_without_module_skips_lookup() {
        let transport = ScriptedTransport::new().reply(
            "/story-view-7.json",
            json!({"story": {"id": 7, "title": "t", "module": "0", "product": "3"}}),
        );
        let calls = transport.calls();
        let client = transport.into_client();

        let story = client.story(7).await.unwrap();
        assert_eq!(story.module, None);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn absent_story_is_not_found() {
        let client = ScriptedTransport::new()
            .reply("/story-view-5.json", json!({"story": null}))
            .into_client();
        assert!(matches!(
            client.story(5).await,
            Err(ZentaoError::NotFound { entity: "story", id: 5 })
        ));
    }
}
