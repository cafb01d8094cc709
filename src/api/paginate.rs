use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Transport, ZentaoClient};
use crate::error::{Result, ZentaoError};
use crate::model::story::{Story, StoryStatus};
use crate::util::lenient;

pub const PAGE_SIZE: u32 = 100;
/// Upper bound on pages fetched for one list, whatever the pager claims.
pub const MAX_PAGES: u32 = 100;

/// Position in a `product-browse` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub product_id: u64,
    pub browse_type: &'static str,
    pub page_size: u32,
    pub page: u32,
}

impl PageCursor {
    pub fn new(product_id: u64, browse_type: &'static str) -> Self {
        Self {
            product_id,
            browse_type,
            page_size: PAGE_SIZE,
            page: 1,
        }
    }

    /// `/product-browse-{product}-{branch}-{browseType}-{param}-{orderBy}-`
    /// `{recTotal}-{recPerPage}-{pageID}.json`
    pub fn path(&self) -> String {
        format!(
            "/product-browse-{}-0-{}-0-id_desc-0-{}-{}.json",
            self.product_id, self.browse_type, self.page_size, self.page
        )
    }
}

/// Every story of a product, with what the caller needs to know about how
/// complete that list is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    pub stories: Vec<Story>,
    pub pages_fetched: u32,
    /// The page ceiling was hit while the server still reported more pages.
    pub possibly_truncated: bool,
    /// A status filter was requested but the server only understands
    /// `unclosed`, so it was not applied as asked.
    pub status_filter_lossy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pager {
    total: u64,
    per_page: u64,
}

impl Pager {
    fn from_data(data: &Value) -> Option<Self> {
        let pager = lenient::object(data, "pager")?;
        let total = pager.get("recTotal").and_then(lenient::as_u64)?;
        let per_page = pager
            .get("recPerPage")
            .and_then(lenient::as_u64)
            .filter(|n| *n > 0)?;
        Some(Self { total, per_page })
    }

    fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page)
    }
}

impl<T: Transport> ZentaoClient<T> {
    /// Walk `product-browse` pages until the pager says there is nothing left.
    pub async fn fetch_all_stories(
        &self,
        product_id: u64,
        status: Option<StoryStatus>,
    ) -> Result<StoryPage> {
        let status_filter_lossy = status.is_some();
        if let Some(requested) = status {
            warn!(
                ?requested,
                "story status filter is not supported by the server; listing unclosed stories"
            );
        }

        let mut cursor = PageCursor::new(product_id, StoryStatus::browse_type(status));
        let mut stories = Vec::new();
        let mut seen = HashSet::new();
        let mut possibly_truncated = false;

        loop {
            let data = self.fetch(&cursor.path()).await?;
            let rows = lenient::entries(data.get("stories"));
            let page_len = rows.len();
            for raw in rows {
                let story: Story = serde_json::from_value(raw.clone())
                    .map_err(|e| ZentaoError::decode("stories entry", e))?;
                if seen.insert(story.id) {
                    stories.push(story);
                }
            }
            debug!(product_id, page = cursor.page, rows = page_len, "fetched story page");

            let more = match Pager::from_data(&data) {
                Some(pager) => u64::from(cursor.page) < pager.total_pages() && page_len > 0,
                None => false,
            };
            if !more {
                break;
            }
            if cursor.page >= MAX_PAGES {
                warn!(
                    product_id,
                    pages = MAX_PAGES,
                    "page ceiling reached, story list may be incomplete"
                );
                possibly_truncated = true;
                break;
            }
            cursor.page += 1;
        }

        Ok(StoryPage {
            stories,
            pages_fetched: cursor.page,
            possibly_truncated,
            status_filter_lossy,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::tests::ScriptedTransport;

    fn page(ids: std::ops::RangeInclusive<u64>, pager: Option<(u64, u64)>) -> Value {
        let stories: serde_json::Map<String, Value> = ids
            .map(|id| {
                let story = json!({"id": id.to_string(), "title": format!("story {id}")});
                (id.to_string(), story)
            })
            .collect();
        match pager {
            Some((total, per_page)) => json!({
                "stories": stories,
                "pager": {"recTotal": total.to_string(), "recPerPage": per_page, "pageID": 1}
            }),
            None => json!({"stories": stories}),
        }
    }

    #[test]
    fn cursor_builds_legacy_path() {
        let mut cursor = PageCursor::new(7, "unclosed");
        cursor.page = 3;
        assert_eq!(cursor.path(), "/product-browse-7-0-unclosed-0-id_desc-0-100-3.json");
    }

    fn browse(product_id: u64, page: u32) -> String {
        let mut cursor = PageCursor::new(product_id, "unclosed");
        cursor.page = page;
        cursor.path()
    }

    #[tokio::test]
    async fn stops_after_reported_page_count() {
        let transport = ScriptedTransport::new()
            .reply(&browse(1, 1), page(1..=100, Some((250, 100))))
            .reply(&browse(1, 2), page(101..=200, Some((250, 100))))
            .reply(&browse(1, 3), page(201..=250, Some((250, 100))))
            .reply(&browse(1, 4), page(251..=260, Some((250, 100))));
        let calls = transport.calls();
        let client = ZentaoClient::with_transport(transport);

        let result = client.fetch_all_stories(1, None).await.unwrap();

        assert_eq!(result.stories.len(), 250);
        assert_eq!(result.pages_fetched, 3);
        assert!(!result.possibly_truncated);
        assert!(!result.status_filter_lossy);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_pager_means_single_page() {
        let transport = ScriptedTransport::new()
            .reply_prefix("/product-browse-2-", page(1..=5, None));
        let calls = transport.calls();
        let client = ZentaoClient::with_transport(transport);

        let result = client.fetch_all_stories(2, None).await.unwrap();

        assert_eq!(result.stories.len(), 5);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_page_ends_the_walk() {
        let transport = ScriptedTransport::new()
            .reply(&browse(3, 1), page(1..=100, Some((500, 100))))
            .reply(
                &browse(3, 2),
                json!({"stories": {}, "pager": {"recTotal": 500, "recPerPage": 100}}),
            );
        let calls = transport.calls();
        let client = ZentaoClient::with_transport(transport);

        let result = client.fetch_all_stories(3, None).await.unwrap();

        assert_eq!(result.stories.len(), 100);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn page_ceiling_flags_truncation() {
        let transport = ScriptedTransport::new()
            .reply_prefix("/product-browse-4-", page(1..=100, Some((1_000_000, 100))));
        let calls = transport.calls();
        let client = ZentaoClient::with_transport(transport);

        let result = client.fetch_all_stories(4, None).await.unwrap();

        assert_eq!(calls.lock().unwrap().len(), MAX_PAGES as usize);
        assert!(result.possibly_truncated);
        // Every page repeated the same ids.
        assert_eq!(result.stories.len(), 100);
    }

    #[tokio::test]
    async fn status_filter_is_reported_as_lossy() {
        let transport = ScriptedTransport::new()
            .reply_prefix("/product-browse-5-0-unclosed-", page(1..=2, None));
        let client = ZentaoClient::with_transport(transport);

        let result = client
            .fetch_all_stories(5, Some(StoryStatus::Closed))
            .await
            .unwrap();

        assert!(result.status_filter_lossy);
        assert_eq!(result.stories.len(), 2);
    }

    #[tokio::test]
    async fn page_failure_propagates() {
        let transport = ScriptedTransport::new()
            .fail_prefix("/product-browse-6-", "connection refused");
        let client = ZentaoClient::with_transport(transport);

        let err = client.fetch_all_stories(6, None).await.unwrap_err();
        assert!(matches!(err, ZentaoError::Network { .. }));
    }
}
