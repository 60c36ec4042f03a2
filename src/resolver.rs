use std::sync::Arc;

use crate::{
    cache::ResolutionCache,
    scrape::{
        pipeline::ExtractionPipeline,
        types::{ExtractedReference, Resolution, ResolutionTier},
    },
    target::MediaTarget,
};

/// Cache first, then direct extraction, then the generic embed page.
pub struct VideoResolver {
    cache: Arc<ResolutionCache>,
    pipeline: ExtractionPipeline,
}

impl VideoResolver {
    pub fn new(cache: Arc<ResolutionCache>, pipeline: ExtractionPipeline) -> Self {
        Self { cache, pipeline }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Always yields a usable reference. The tier is the only signal of a
    /// degraded result.
    pub async fn resolve(&self, target: &MediaTarget) -> Resolution {
        let key = target.cache_key();

        if let Some(entry) = self.cache.get(&key) {
            log::info!("returning cached video url for {key}");
            return Resolution {
                reference: entry.reference,
                tier: ResolutionTier::Cached,
            };
        }

        let found = match self.pipeline.resolve_direct(target).await {
            Some(found) => {
                log::info!("extracted and cached video url for {key}: {}", found.reference());
                found
            }
            None => {
                let embed = ExtractedReference::embed(self.embed_url(target));
                log::warn!(
                    "direct video url not found for {key}, using embed url: {}",
                    embed.reference()
                );
                embed
            }
        };

        self.cache.put(&key, found.reference(), found.tier());

        Resolution {
            tier: found.tier().into(),
            reference: found.into_reference(),
        }
    }

    /// Extraction only: no cache, no embed fallback.
    pub async fn resolve_direct(&self, target: &MediaTarget) -> Option<ExtractedReference> {
        self.pipeline.resolve_direct(target).await
    }

    pub fn embed_url(&self, target: &MediaTarget) -> String {
        self.pipeline.endpoints().embed_url(target).to_string()
    }
}
