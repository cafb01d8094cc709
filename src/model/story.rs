use serde::{Deserialize, Serialize};

use super::Record;
use crate::util::lenient;

/// A requirement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
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
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub opened_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub opened_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<String>,
    /// Long-form description, HTML as stored by ZenTao.
    #[serde(default, deserialize_with = "lenient::text")]
    pub spec: String,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub module: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl Record for Story {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Story status as callers think of it. The legacy list endpoint cannot
/// filter on most of these; see [`StoryStatus::browse_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Draft,
    Active,
    Closed,
    Changed,
    All,
}

impl StoryStatus {
    /// Browse-mode path segment sent to the server.
    ///
    /// ZenTao 11.x returns nothing for `all` and ignores the others, so every
    /// status collapses onto `unclosed`. The mapping is lossy.
    pub fn browse_type(status: Option<StoryStatus>) -> &'static str {
        match status {
            Some(StoryStatus::Draft)
            | Some(StoryStatus::Active)
            | Some(StoryStatus::Closed)
            | Some(StoryStatus::Changed)
            | Some(StoryStatus::All)
            | None => "unclosed",
        }
    }
}
