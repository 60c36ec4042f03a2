use std::sync::Arc;

use super::{
    extract,
    fetcher::PageFetcher,
    shaper::RequestShaper,
    types::ExtractedReference,
};
use crate::target::{MediaTarget, ProviderEndpoints};

/// Best-effort direct extraction: shape, fetch once, extract.
pub struct ExtractionPipeline {
    endpoints: ProviderEndpoints,
    shaper: RequestShaper,
    fetcher: Arc<dyn PageFetcher>,
}

impl ExtractionPipeline {
    pub fn new(
        endpoints: ProviderEndpoints,
        shaper: RequestShaper,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            endpoints,
            shaper,
            fetcher,
        }
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Never fails; every fetch problem is logged and reported as `None`.
    pub async fn resolve_direct(&self, target: &MediaTarget) -> Option<ExtractedReference> {
        let url = self.endpoints.embed_url(target);
        let request = self.shaper.shape(url);

        log::info!(
            "extracting video url for {} from {}",
            target.cache_key(),
            request.url
        );

        let page = match self.fetcher.fetch(&request).await {
            Ok(page) => page,
            Err(err) => {
                log::warn!("{}: fetch failed: {err}", target.cache_key());
                return None;
            }
        };

        log::debug!("fetched {} ({} bytes)", page.url, page.html.len());

        let found = extract::extract_from_str(&page.html);
        if found.is_none() {
            log::warn!("no video url found for {}", target.cache_key());
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::scrape::{
        fetcher::{FetchError, Page},
        shaper::{FixedShape, ShapedRequest},
        types::Tier,
    };
    use crate::target::ContentId;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        html: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for Recorder {
        async fn fetch(&self, request: &ShapedRequest) -> Result<Page, FetchError> {
            self.seen.lock().unwrap().push(request.url.to_string());
            match &self.html {
                Some(html) => Ok(Page {
                    url: request.url.to_string(),
                    html: html.clone(),
                }),
                None => Err(FetchError::Timeout),
            }
        }
    }

    fn pipeline(fetcher: Arc<Recorder>) -> ExtractionPipeline {
        ExtractionPipeline::new(
            ProviderEndpoints::new("https://vidsrc.to").unwrap(),
            RequestShaper::from_config(&ScrapeConfig::default(), Arc::new(FixedShape::default())),
            fetcher,
        )
    }

    fn movie(id: &str) -> MediaTarget {
        MediaTarget::Movie(ContentId::parse(id).unwrap())
    }

    #[tokio::test]
    async fn fetches_canonical_embed_page() {
        let fetcher = Arc::new(Recorder {
            html: Some(r#"<video><source src="https://x/603.m3u8"></video>"#.into()),
            seen: Mutex::new(Vec::new()),
        });

        let found = pipeline(fetcher.clone()).resolve_direct(&movie("603")).await;

        let found = found.unwrap();
        assert_eq!(found.reference(), "https://x/603.m3u8");
        assert_eq!(found.tier(), Tier::Direct);
        assert_eq!(
            *fetcher.seen.lock().unwrap(),
            vec!["https://vidsrc.to/embed/movie/603".to_string()]
        );
    }

    #[tokio::test]
    async fn fetch_error_is_a_miss() {
        let fetcher = Arc::new(Recorder {
            html: None,
            seen: Mutex::new(Vec::new()),
        });

        assert_eq!(
            pipeline(fetcher.clone()).resolve_direct(&movie("1")).await,
            None
        );
        // no retries
        assert_eq!(fetcher.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_page_is_a_miss() {
        let fetcher = Arc::new(Recorder {
            html: Some("<html><body><p>nothing</p></body></html>".into()),
            seen: Mutex::new(Vec::new()),
        });

        assert_eq!(pipeline(fetcher).resolve_direct(&movie("1")).await, None);
    }
}
