use tracing::info;

use crate::error::ScrapeError;
use crate::fetch::{self, Fetcher};
use crate::images::ImageStore;
use crate::parser::Extractor;
use crate::record::ProductRecord;
use crate::settings::Settings;

/// fetch → extract → acquire images, for one product URL at a time.
pub struct Pipeline {
    fetcher: Fetcher,
    extractor: Extractor,
    images: ImageStore,
}

impl Pipeline {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = fetch::build_client(settings)?;
        Ok(Self {
            fetcher: Fetcher::new(client.clone()),
            extractor: Extractor::new(&settings.selectors, &settings.site_origin)?,
            images: ImageStore::open(client, settings).await?,
        })
    }

    pub async fn run(&self, url: &str) -> Result<ProductRecord, ScrapeError> {
        let html = self
            .fetcher
            .fetch(url)
            .await
            .ok_or_else(|| ScrapeError::PageUnavailable {
                url: url.to_string(),
            })?;

        let extraction = self.extractor.extract(&html)?;
        let mut record = extraction.record;
        record.images = self
            .images
            .acquire(&extraction.image_urls, &record.title)
            .await;

        info!(
            "Extracted {:?} from {} ({} groups, {} images)",
            record.title,
            url,
            record.characteristics.len(),
            record.images.len()
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn settings(tmp: &TempDir, origin: &str) -> Settings {
        Settings {
            site_origin: origin.to_string(),
            public_dir: tmp.path().join("public"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn full_page_with_relative_images() {
        let server = MockServer::start();
        let html = std::fs::read_to_string("tests/fixtures/product.html").unwrap();
        server.mock(|when, then| {
            when.method(GET).path("/catalog/df333");
            then.status(200).body(html);
        });
        server.mock(|when, then| {
            when.method(GET).path("/upload/iblock/df333-1.jpg");
            then.status(200).body("jpg-bytes");
        });
        server.mock(|when, then| {
            when.method(GET).path("/upload/iblock/df333-2.webp");
            then.status(200).body("webp-bytes");
        });

        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(&settings(&tmp, &server.base_url())).await.unwrap();
        let record = pipeline.run(&server.url("/catalog/df333")).await.unwrap();

        assert_eq!(record.title, "Cordless Drill Driver DF333DWYE");
        assert_eq!(record.brand, "Makita");
        assert_eq!(record.characteristics.len(), 3);
        // Third thumbnail points at an unresolvable CDN host and is dropped.
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[0].source_url, server.url("/upload/iblock/df333-1.jpg"));
        assert!(record.images[1]
            .local_path
            .as_deref()
            .unwrap()
            .ends_with("_Cordless_Drill_Driver_DF333DWYE.webp"));
    }

    #[tokio::test]
    async fn unavailable_page_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/catalog/missing");
            then.status(404);
        });

        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(&settings(&tmp, &server.base_url())).await.unwrap();
        let err = pipeline.run(&server.url("/catalog/missing")).await.unwrap_err();
        assert!(matches!(err, ScrapeError::PageUnavailable { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn empty_page_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/catalog/blank");
            then.status(200).body("");
        });

        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(&settings(&tmp, &server.base_url())).await.unwrap();
        let err = pipeline.run(&server.url("/catalog/blank")).await.unwrap_err();
        assert!(matches!(err, ScrapeError::EmptyDocument));
    }
}
