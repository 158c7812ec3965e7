use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use super::card::Card;

/// Checks card images ahead of rendering and swaps broken ones for the fallback
pub struct ImageResolver {
    client: reqwest::Client,
    site_root: PathBuf,
}

impl ImageResolver {
    pub fn new(client: reqwest::Client, site_root: impl AsRef<Path>) -> Self {
        Self {
            client,
            site_root: site_root.as_ref().to_path_buf(),
        }
    }

    /// Mark the card as fallback if its image cannot be loaded. Returns true if swapped.
    pub async fn resolve(&self, card: &mut Card) -> bool {
        if card.image.fallback {
            return false;
        }
        if self.is_loadable(&card.image.src).await {
            return false;
        }
        warn!(card = %card.id, src = %card.image.src, "image unavailable, using fallback");
        card.use_fallback_image()
    }

    pub async fn is_loadable(&self, src: &str) -> bool {
        let src = src.trim();
        if src.is_empty() {
            return false;
        }
        if let Some(rest) = src.strip_prefix("data:") {
            return data_url_is_image(rest);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return self.remote_is_image(src).await;
        }
        self.local_exists(src).await
    }

    async fn remote_is_image(&self, url: &str) -> bool {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(url, error = %err, "image request failed");
                return false;
            }
        };
        if !response.status().is_success() {
            debug!(url, status = response.status().as_u16(), "image request rejected");
            return false;
        }
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_image_content_type)
    }

    async fn local_exists(&self, src: &str) -> bool {
        // Site-absolute paths are relative to the site root, not the filesystem.
        let relative = src.trim_start_matches('/');
        let relative = relative.split(['?', '#']).next().unwrap_or(relative);
        let path = self.site_root.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }
}

fn is_image_content_type(value: &str) -> bool {
    value
        .parse::<mime::Mime>()
        .is_ok_and(|parsed| parsed.type_() == mime::IMAGE)
}

fn data_url_is_image(rest: &str) -> bool {
    let media_type = rest.split([';', ',']).next().unwrap_or_default();
    is_image_content_type(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("image/svg+xml; charset=utf-8"));
        assert!(!is_image_content_type("text/html"));
        assert!(!is_image_content_type("garbage"));
    }

    #[test]
    fn data_urls() {
        assert!(data_url_is_image("image/gif;base64,R0lGODlhAQABAAAAACw="));
        assert!(!data_url_is_image("text/plain,hello"));
        assert!(!data_url_is_image(""));
    }

    #[tokio::test]
    async fn local_paths_resolve_against_site_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/roof.jpg"), b"jpg").unwrap();

        let resolver = ImageResolver::new(reqwest::Client::new(), dir.path());
        assert!(resolver.is_loadable("assets/roof.jpg").await);
        assert!(resolver.is_loadable("/assets/roof.jpg?v=2").await);
        assert!(!resolver.is_loadable("assets/missing.jpg").await);
        assert!(!resolver.is_loadable("assets").await);
        assert!(!resolver.is_loadable("  ").await);
    }
}
