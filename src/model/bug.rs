use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Record;
use crate::util::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
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
    pub severity: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub steps: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub opened_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub story: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<u64>,
    /// Filled from the detail view's product block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl Record for Bug {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    Fixed,
    Notrepro,
    Duplicate,
    Bydesign,
    Willnotfix,
    Tostory,
    External,
}

impl ResolutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionKind::Fixed => "fixed",
            ResolutionKind::Notrepro => "notrepro",
            ResolutionKind::Duplicate => "duplicate",
            ResolutionKind::Bydesign => "bydesign",
            ResolutionKind::Willnotfix => "willnotfix",
            ResolutionKind::Tostory => "tostory",
            ResolutionKind::External => "external",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugResolution {
    pub resolution: ResolutionKind,
    pub resolved_build: Option<String>,
    pub duplicate_bug: Option<u64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugStatistics {
    pub total: usize,
    pub active: usize,
    pub resolved: usize,
    pub closed: usize,
    pub by_severity: BTreeMap<u32, usize>,
}

impl BugStatistics {
    pub fn from_bugs(bugs: &[Bug]) -> Self {
        let count = |status: &str| bugs.iter().filter(|b| b.status == status).count();
        let by_severity = (1..=4)
            .map(|sev| (sev, bugs.iter().filter(|b| b.severity == Some(sev)).count()))
            .collect();
        Self {
            total: bugs.len(),
            active: count("active"),
            resolved: count("resolved"),
            closed: count("closed"),
            by_severity,
        }
    }
}
