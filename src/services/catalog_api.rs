//! Trait and types for looking up the schedule archive in an open-data catalog.

use anyhow::Result;
use chrono::NaiveDateTime;
use gtfs_stop_summary::SummaryError;
use tracing::info;

/// One downloadable resource attached to a catalog package.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub format: String,
    pub url: String,
    /// True for resources served from the catalog's datastore (tabular previews),
    /// which are never the raw feed archive.
    pub datastore_active: bool,
    pub last_modified: Option<NaiveDateTime>,
}

impl Resource {
    /// Whether this resource is the raw GTFS zip.
    pub fn is_feed_archive(&self) -> bool {
        self.format.eq_ignore_ascii_case("ZIP") && !self.datastore_active
    }
}

/// Picks the first raw zip resource, in catalog order.
pub fn select_archive(resources: &[Resource]) -> Option<&Resource> {
    resources.iter().find(|r| r.is_feed_archive())
}

/// Abstraction over a package catalog provider (e.g., a CKAN portal).
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Returns every resource of the configured package.
    async fn list_resources(&self) -> Result<Vec<Resource>>;

    /// Resolves the download URL of the package's raw GTFS zip.
    ///
    /// # Errors
    ///
    /// [`SummaryError::MetadataLookup`] if the catalog cannot be queried,
    /// [`SummaryError::NoArchiveResource`] if the package has no raw zip.
    async fn find_archive_url(&self, package_id: &str) -> Result<String, SummaryError> {
        info!(package_id, "Fetching package metadata");
        let resources = self
            .list_resources()
            .await
            .map_err(|e| SummaryError::MetadataLookup(format!("{e:#}")))?;

        let archive = select_archive(&resources).ok_or_else(|| SummaryError::NoArchiveResource {
            package_id: package_id.to_string(),
        })?;

        info!(
            name = %archive.name,
            last_modified = ?archive.last_modified,
            "Found active dataset"
        );
        Ok(archive.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_stop_summary::FailureCategory;

    struct FixedCatalog(Option<Vec<Resource>>);

    #[async_trait::async_trait]
    impl CatalogApi for FixedCatalog {
        async fn list_resources(&self) -> Result<Vec<Resource>> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_find_archive_url() {
        let catalog = FixedCatalog(Some(vec![
            resource("Routes preview", "CSV", false),
            resource("Complete GTFS", "ZIP", false),
        ]));

        let url = catalog.find_archive_url("ttc").await.unwrap();

        assert_eq!(url, "https://example.org/Complete_GTFS");
    }

    #[tokio::test]
    async fn test_find_archive_url_without_zip() {
        let catalog = FixedCatalog(Some(vec![resource("Routes preview", "CSV", false)]));

        let err = catalog.find_archive_url("ttc").await.unwrap_err();

        assert!(matches!(err, SummaryError::NoArchiveResource { .. }));
        assert_eq!(err.category(), FailureCategory::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_metadata_lookup() {
        let err = FixedCatalog(None).find_archive_url("ttc").await.unwrap_err();

        assert!(matches!(err, SummaryError::MetadataLookup(_)));
    }

    #[test]
    fn test_select_first_raw_zip() {
        let resources = vec![
            resource("Routes preview", "CSV", false),
            resource("Schedule (datastore)", "zip", true),
            resource("Complete GTFS", "zip", false),
            resource("Older GTFS", "ZIP", false),
        ];

        let selected = select_archive(&resources).unwrap();

        assert_eq!(selected.name, "Complete GTFS");
    }

    #[test]
    fn test_select_none() {
        let resources = vec![resource("Readme", "PDF", false)];
        assert!(select_archive(&resources).is_none());
        assert!(select_archive(&[]).is_none());
    }

    fn resource(name: &str, format: &str, datastore_active: bool) -> Resource {
        Resource {
            name: name.to_string(),
            format: format.to_string(),
            url: format!("https://example.org/{}", name.replace(' ', "_")),
            datastore_active,
            last_modified: None,
        }
    }
}
