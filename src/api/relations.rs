use futures::future::join_all;
use tracing::{debug, warn};

use super::{Transport, ZentaoClient};
use crate::error::Result;
use crate::model::bug::Bug;
use crate::model::story::Story;
use crate::model::Partial;

impl<T: Transport> ZentaoClient<T> {
    /// Bugs from the user's list whose detail view links to `story_id`.
    ///
    /// The list endpoint does not carry the story reference, so every bug's
    /// detail is fetched in one parallel batch. Failed fetches are counted in
    /// [`Partial::failed`]. If all of them fail the first error is returned.
    pub async fn bugs_for_story(&self, story_id: u64) -> Result<Partial<Bug>> {
        let bugs = self.my_bugs().await?;
        if bugs.is_empty() {
            return Ok(Partial::complete(Vec::new()));
        }

        let details = join_all(bugs.iter().map(|bug| self.bug(bug.id))).await;
        let total = details.len();
        let mut items = Vec::new();
        let mut failed = 0;
        let mut first_error = None;
        for (listed, detail) in bugs.iter().zip(details) {
            match detail {
                Ok(bug) if bug.story == Some(story_id) => items.push(bug),
                Ok(_) => {}
                Err(err) => {
                    warn!(bug = listed.id, error = %err, "bug detail fetch failed");
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        if failed == total {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        debug!(story = story_id, matched = items.len(), failed, "resolved bugs for story");
        Ok(Partial { items, failed })
    }

    /// The story a bug was raised against, if any.
    pub async fn story_for_bug(&self, bug_id: u64) -> Result<Option<Story>> {
        match self.bug(bug_id).await?.story {
            Some(story_id) => Ok(Some(self.story(story_id).await?)),
            None => Ok(None),
        }
    }
}
