use std::cmp::Reverse;

use serde::Serialize;
use tracing::{debug, warn};

use super::{Transport, ZentaoClient};
use crate::error::{Result, ZentaoError};
use crate::model::product::{Product, ProductStories};
use crate::model::story::{Story, StoryStatus};

pub const DEFAULT_LIMIT: usize = 50;
/// Products scanned when a search is not scoped to one product.
pub const PRODUCT_SCAN_LIMIT: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub product_id: Option<u64>,
    pub status: Option<StoryStatus>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub stories: Vec<Story>,
    pub products_searched: usize,
    pub products_failed: usize,
    /// Some product's story walk stopped at the page ceiling.
    pub possibly_truncated: bool,
    /// The status filter was widened to `unclosed` before searching.
    pub status_filter_lossy: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearch {
    pub matches: Vec<ProductStories>,
    pub products_failed: usize,
    pub possibly_truncated: bool,
    pub status_filter_lossy: bool,
}

/// Keep stories mentioning `keyword` in title or spec, title hits first,
/// newest first within each group, then cut to `limit`.
pub fn rank_matches(stories: Vec<Story>, keyword: &str, limit: usize) -> Vec<Story> {
    let needle = keyword.to_lowercase();
    let mut ranked: Vec<(bool, Story)> = stories
        .into_iter()
        .filter_map(|story| {
            let in_title = story.title.to_lowercase().contains(&needle);
            let in_spec = story.spec.to_lowercase().contains(&needle);
            (in_title || in_spec).then_some((in_title, story))
        })
        .collect();
    ranked.sort_by_key(|(in_title, story)| (Reverse(*in_title), Reverse(story.id)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, story)| story).collect()
}

fn require_keyword(keyword: &str) -> Result<()> {
    if keyword.trim().is_empty() {
        return Err(ZentaoError::InvalidParams("search keyword is empty".into()));
    }
    Ok(())
}

impl<T: Transport> ZentaoClient<T> {
    pub async fn search(&self, keyword: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        require_keyword(keyword)?;
        let limit = options.limit.unwrap_or(DEFAULT_LIMIT);

        if let Some(product_id) = options.product_id {
            let page = self.fetch_all_stories(product_id, options.status).await?;
            return Ok(SearchOutcome {
                stories: rank_matches(page.stories, keyword, limit),
                products_searched: 1,
                products_failed: 0,
                possibly_truncated: page.possibly_truncated,
                status_filter_lossy: page.status_filter_lossy,
            });
        }

        let products = self.products().await?;
        let scanned: Vec<Product> = products.into_iter().take(PRODUCT_SCAN_LIMIT).collect();
        let mut pool = Vec::new();
        let mut products_failed = 0;
        let mut possibly_truncated = false;
        for product in &scanned {
            match self.fetch_all_stories(product.id, options.status).await {
                Ok(page) => {
                    possibly_truncated |= page.possibly_truncated;
                    pool.extend(page.stories);
                }
                Err(err) => {
                    warn!(product = product.id, error = %err, "skipping product in search");
                    products_failed += 1;
                }
            }
        }
        debug!(keyword, candidates = pool.len(), products = scanned.len(), "searched stories");

        Ok(SearchOutcome {
            stories: rank_matches(pool, keyword, limit),
            products_searched: scanned.len(),
            products_failed,
            possibly_truncated,
            status_filter_lossy: options.status.is_some(),
        })
    }

    /// Search only the products whose name contains `product_name`.
    pub async fn search_by_product_name(
        &self,
        product_name: &str,
        keyword: &str,
        options: &SearchOptions,
    ) -> Result<ProductSearch> {
        require_keyword(keyword)?;
        let wanted = product_name.to_lowercase();
        let products: Vec<Product> = self
            .products()
            .await?
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&wanted))
            .collect();

        let mut matches = Vec::new();
        let mut products_failed = 0;
        let mut possibly_truncated = false;
        for product in products {
            let scoped = SearchOptions {
                product_id: Some(product.id),
                ..options.clone()
            };
            match self.search(keyword, &scoped).await {
                Ok(outcome) => {
                    possibly_truncated |= outcome.possibly_truncated;
                    if !outcome.stories.is_empty() {
                        matches.push(ProductStories {
                            product,
                            stories: outcome.stories,
                        });
                    }
                }
                Err(err) => {
                    warn!(product = product.id, error = %err, "skipping product in search");
                    products_failed += 1;
                }
            }
        }
        Ok(ProductSearch {
            matches,
            products_failed,
            possibly_truncated,
            status_filter_lossy: options.status.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::api::paginate::MAX_PAGES;
    use crate::api::tests::ScriptedTransport;

    fn story(id: u64, title: &str, spec: &str) -> Story {
        serde_json::from_value(json!({"id": id, "title": title, "spec": spec})).unwrap()
    }

    fn stories_page(stories: &[(u64, &str, &str)]) -> Value {
        let rows: Vec<_> = stories
            .iter()
            .map(|(id, title, spec)| json!({"id": id.to_string(), "title": title, "spec": spec}))
            .collect();
        json!({ "stories": rows })
    }

    /// A page whose pager claims far more rows than the walk will ever reach.
    fn endless_page(stories: &[(u64, &str, &str)]) -> Value {
        let mut page = stories_page(stories);
        page["pager"] = json!({"recTotal": "1000000", "recPerPage": 100, "pageID": 1});
        page
    }

    #[test]
    fn title_matches_rank_before_description_matches() {
        let stories = vec![
            story(1, "Login page", ""),
            story(2, "Profile", "requires login"),
            story(3, "LOGIN audit", ""),
            story(4, "Settings", "after Login"),
            story(5, "Login rate limit", ""),
            story(6, "Unrelated", "nothing"),
        ];
        let ranked = rank_matches(stories, "login", 2);
        let ids: Vec<u64> = ranked.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 3]);
    }

    #[test]
    fn description_matches_follow_in_id_order() {
        let stories = vec![
            story(1, "Login page", ""),
            story(2, "Profile", "requires login"),
            story(4, "Settings", "after Login"),
        ];
        let ids: Vec<u64> = rank_matches(stories, "Login", 10).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }

    #[tokio::test]
    async fn blank_keyword_is_rejected() {
        let client = ScriptedTransport::new().into_client();
        let err = client.search("   ", &SearchOptions::default()).await.unwrap_err();
        assert!(matches!(err, ZentaoError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn unscoped_search_counts_failed_products() {
        let client = ScriptedTransport::new()
            .reply("/product-index-no.json", json!({"products": {"1": "Alpha", "2": "Beta"}}))
            .reply_prefix("/product-browse-1-", stories_page(&[(10, "Crash on login", "")]))
            .fail_prefix("/product-browse-2-", "timed out")
            .into_client();

        let outcome = client.search("crash", &SearchOptions::default()).await.unwrap();
        assert_eq!(outcome.stories.len(), 1);
        assert_eq!(outcome.products_searched, 2);
        assert_eq!(outcome.products_failed, 1);
    }

    #[tokio::test]
    async fn scoped_search_propagates_failure() {
        let client = ScriptedTransport::new()
            .fail_prefix("/product-browse-3-", "timed out")
            .into_client();
        let options = SearchOptions {
            product_id: Some(3),
            ..Default::default()
        };
        assert!(client.search("crash", &options).await.is_err());
    }

    #[tokio::test]
    async fn product_name_search_skips_other_products() {
        let transport = ScriptedTransport::new()
            .reply("/product-index-no.json", json!({"products": {"1": "Alpha", "2": "Beta"}}))
            .reply_prefix("/product-browse-1-", stories_page(&[(10, "Login", "no match here")]));
        let calls = transport.calls();
        let client = transport.into_client();

        let result = client
            .search_by_product_name("Alpha", "crash", &SearchOptions::default())
            .await
            .unwrap();

        assert!(result.matches.is_empty());
        assert_eq!(result.products_failed, 0);
        assert!(!calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.contains("product-browse-2-")));
    }

    #[tokio::test]
    async fn product_name_search_groups_by_product() {
        let client = ScriptedTransport::new()
            .reply(
                "/product-index-no.json",
                json!({"products": {"1": "Alpha app", "2": "alpha api"}}),
            )
            .reply_prefix("/product-browse-1-", stories_page(&[(10, "Crash on save", "")]))
            .reply_prefix("/product-browse-2-", stories_page(&[(20, "Docs", "")]))
            .into_client();

        let result = client
            .search_by_product_name("ALPHA", "crash", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].product.id, 1);
        assert!(!result.possibly_truncated);
        assert!(!result.status_filter_lossy);
    }

    #[tokio::test]
    async fn scoped_search_reports_truncation_and_lossy_filter() {
        let transport = ScriptedTransport::new().reply_prefix(
            "/product-browse-1-",
            endless_page(&[(1, "Crash on login", ""), (2, "Crash on save", ""), (3, "Docs", "")]),
        );
        let calls = transport.calls();
        let client = transport.into_client();
        let options = SearchOptions {
            product_id: Some(1),
            status: Some(StoryStatus::Closed),
            ..Default::default()
        };

        let outcome = client.search("crash", &options).await.unwrap();

        assert_eq!(calls.lock().unwrap().len(), MAX_PAGES as usize);
        assert_eq!(outcome.stories.len(), 2);
        assert!(outcome.possibly_truncated);
        assert!(outcome.status_filter_lossy);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["possiblyTruncated"], true);
        assert_eq!(json["statusFilterLossy"], true);
    }

    #[tokio::test]
    async fn unscoped_search_flags_any_truncated_product() {
        let client = ScriptedTransport::new()
            .reply("/product-index-no.json", json!({"products": {"1": "Alpha", "2": "Beta"}}))
            .reply_prefix("/product-browse-1-", stories_page(&[(10, "Crash on login", "")]))
            .reply_prefix("/product-browse-2-", endless_page(&[(20, "Docs", "")]))
            .into_client();

        let outcome = client.search("crash", &SearchOptions::default()).await.unwrap();

        assert_eq!(outcome.stories.len(), 1);
        assert!(outcome.possibly_truncated);
        assert!(!outcome.status_filter_lossy);
    }

    #[tokio::test]
    async fn product_name_search_carries_flags_without_matches() {
        let client = ScriptedTransport::new()
            .reply("/product-index-no.json", json!({"products": {"1": "Alpha", "2": "Beta"}}))
            .reply_prefix("/product-browse-1-", endless_page(&[(10, "Docs", "")]))
            .into_client();
        let options = SearchOptions {
            status: Some(StoryStatus::Active),
            ..Default::default()
        };

        let result = client
            .search_by_product_name("alpha", "crash", &options)
            .await
            .unwrap();

        assert!(result.matches.is_empty());
        assert!(result.possibly_truncated);
        assert!(result.status_filter_lossy);
    }
}
