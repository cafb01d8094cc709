use std::collections::BTreeMap;

use serde::de::Error as _;
use serde_json::Value;
use tracing::debug;

use super::{Transport, ZentaoClient};
use crate::error::{Result, ZentaoError};
use crate::model::product::Product;

impl<T: Transport> ZentaoClient<T> {
    /// All products visible to the user, in ascending id order.
    pub async fn products(&self) -> Result<Vec<Product>> {
        let data = self.fetch("/product-index-no.json").await?;
        let mut products = match data.get("products") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(id, name)| {
                    let id = id.trim().parse::<u64>().map_err(|_| {
                        ZentaoError::decode(
                            "product index",
                            serde_json::Error::custom(format!("invalid product id {id:?}")),
                        )
                    })?;
                    let name = name.as_str().unwrap_or_default().to_string();
                    Ok(Product::from_index(id, name))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    /// Module id → name for a product.
    ///
    /// Not every page exposes the module tree, so a couple of views are tried
    /// in turn and failures are skipped. An empty map means none had one.
    pub async fn product_modules(&self, product_id: u64) -> BTreeMap<u64, String> {
        let paths = [
            format!("/product-browse-{product_id}.json"),
            format!("/story-create-{product_id}.json"),
        ];
        for path in &paths {
            let data = match self.fetch(path).await {
                Ok(data) => data,
                Err(err) => {
                    debug!(path = %path, error = %err, "module tree lookup failed");
                    continue;
                }
            };
            let modules = parse_modules(&data);
            if !modules.is_empty() {
                return modules;
            }
        }
        BTreeMap::new()
    }
}

fn parse_modules(data: &Value) -> BTreeMap<u64, String> {
    let tree = ["modules", "moduleTree"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_object));
    let Some(tree) = tree else {
        return BTreeMap::new();
    };
    tree.iter()
        .filter_map(|(id, name)| {
            let id = id.trim().parse::<u64>().ok().filter(|id| *id != 0)?;
            let name = name.as_str().filter(|n| !n.is_empty())?;
            Some((id, name.to_string()))
        })
        .collect()
}
