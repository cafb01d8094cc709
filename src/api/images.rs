use std::sync::LazyLock;

use base64::Engine;
use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use super::{Transport, ZentaoClient};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]+src="([^"]+)"[^>]*>"#).expect("valid img pattern")
});
static FILE_READ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"file-read-(\d+)").expect("valid file-read pattern"));

/// `src` of every `<img>` tag, in document order.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    IMG_SRC
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Attachment ids referenced as `file-read-<id>`.
pub fn extract_file_ids(html: &str) -> Vec<u64> {
    FILE_READ
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Absolute download URL for an image `src`.
///
/// Rich-text fields often store paths with the `/zentao/` deploy prefix,
/// which the configured base URL already carries.
pub fn resolve_image_url(base_url: &str, src: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = src.strip_prefix("/zentao/") {
        format!("{base}/{rest}")
    } else if src.starts_with('/') {
        format!("{base}{src}")
    } else {
        src.to_string()
    }
}

pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, ..] => "image/jpeg",
        [0x47, 0x49, ..] => "image/gif",
        [0x89, 0x50, ..] => "image/png",
        _ => "image/png",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedImage {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Transport> ZentaoClient<T> {
    /// Download every image in parallel. Each URL gets its own result; one
    /// failure does not affect the others.
    pub async fn download_images(&self, urls: &[String]) -> Vec<DownloadedImage> {
        let base = self.transport.base_url();
        join_all(urls.iter().map(|src| async move {
            let url = resolve_image_url(base, src);
            match self.transport.fetch_bytes(&url).await {
                Ok(bytes) => DownloadedImage {
                    url: src.clone(),
                    success: true,
                    mime_type: Some(sniff_mime(&bytes)),
                    base64: Some(base64::engine::general_purpose::STANDARD.encode(&bytes)),
                    size: Some(bytes.len()),
                    error: None,
                },
                Err(err) => {
                    warn!(url = %url, error = %err, "image download failed");
                    DownloadedImage {
                        url: src.clone(),
                        success: false,
                        mime_type: None,
                        base64: None,
                        size: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        }))
        .await
    }
}
