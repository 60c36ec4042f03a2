pub mod errors;

use std::sync::Arc;

use crate::{
    cache::ResolutionCache,
    config::Config,
    embed::{Catalog, EmbedService, MemoryCatalog},
    resolver::VideoResolver,
    scrape::{
        fetcher::PageFetcher,
        shaper::{RequestShaper, ShapeSource},
        ExtractionPipeline, HttpFetcher, RandomShape,
    },
    target::ProviderEndpoints,
};

pub use errors::AppError;

/// Everything a request handler needs, built once per process.
pub struct App {
    pub resolver: VideoResolver,
    pub embeds: EmbedService,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.scrape)?);
        let catalog = Arc::new(MemoryCatalog::load(&config.catalog_path())?);

        Self::new_with(config, fetcher, Arc::new(RandomShape), catalog)
    }

    pub fn new_with(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        shape: Arc<dyn ShapeSource>,
        catalog: Arc<dyn Catalog>,
    ) -> anyhow::Result<Self> {
        let endpoints = ProviderEndpoints::new(&config.provider_base_url)?;
        let cache = Arc::new(ResolutionCache::new(config.cache_ttl()));

        let pipeline = ExtractionPipeline::new(
            endpoints.clone(),
            RequestShaper::from_config(&config.scrape, shape),
            fetcher,
        );

        Ok(Self {
            resolver: VideoResolver::new(cache, pipeline),
            embeds: EmbedService::new(catalog, endpoints),
        })
    }
}
