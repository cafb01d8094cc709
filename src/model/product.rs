use serde::{Deserialize, Serialize};

use super::story::Story;
use super::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub desc: String,
}

fn default_status() -> String {
    "normal".into()
}

impl Product {
    /// The product index only carries id and name.
    pub fn from_index(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            code: String::new(),
            status: default_status(),
            desc: String::new(),
        }
    }
}

impl Record for Product {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Stories matched within one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductStories {
    pub product: Product,
    pub stories: Vec<Story>,
}
