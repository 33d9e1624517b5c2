//! Catalogue mapping short image keys to fully-qualified provider image URLs.

use std::collections::HashMap;

const CENTOS_6: (&str, &str) = (
    "centos-6-v20131120",
    "https://www.googleapis.com/compute/v1/projects/centos-cloud/global/images/centos-6-v20131120",
);
const DEBIAN_7_BACKPORTS: (&str, &str) = (
    "backports-debian-7-wheezy-v20131127",
    "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/backports-debian-7-wheezy-v20131127",
);
const DEBIAN_7: (&str, &str) = (
    "debian-7-wheezy-v20131120",
    "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/debian-7-wheezy-v20131120",
);

/// Read-only mapping from short image keys to provider image URLs.
///
/// The catalogue is injected into the connector so deployments can extend it
/// without a rebuild. Unknown keys are not rejected locally: the disk insert
/// is issued without a source image and the provider rejects it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageCatalog {
    images: HashMap<String, String>,
}

impl ImageCatalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    /// Adds or replaces an image entry.
    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.images.insert(key.into(), url.into());
    }

    /// Resolves a short key to its image URL, when known.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.images.get(key).map(String::as_str)
    }

    /// Number of entries in the catalogue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the catalogue holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for ImageCatalog {
    /// Builds the stock catalogue shipped with the connector.
    fn default() -> Self {
        let mut catalog = Self::empty();
        for (key, url) in [CENTOS_6, DEBIAN_7_BACKPORTS, DEBIAN_7] {
            catalog.insert(key, url);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::ImageCatalog;

    #[test]
    fn default_catalogue_resolves_stock_images() {
        let catalog = ImageCatalog::default();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.resolve("debian-7-wheezy-v20131120"),
            Some(
                "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/debian-7-wheezy-v20131120"
            )
        );
    }

    #[test]
    fn unknown_key_resolves_to_none() {
        let catalog = ImageCatalog::default();
        assert_eq!(catalog.resolve("ubuntu-24-04"), None);
    }

    #[test]
    fn inserted_entries_extend_the_catalogue() {
        let mut catalog = ImageCatalog::default();
        catalog.insert("custom-image", "https://example.invalid/custom-image");
        assert_eq!(
            catalog.resolve("custom-image"),
            Some("https://example.invalid/custom-image")
        );
    }
}
