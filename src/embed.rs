use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, sync::Arc};

use crate::{
    app::errors::AppError,
    target::{ContentId, MediaTarget, ProviderEndpoints},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRecord {
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub episodes: Vec<EpisodeRecord>,
}

impl SeriesRecord {
    pub fn find_episode(&self, season: u32, episode: u32) -> Option<&EpisodeRecord> {
        self.episodes
            .iter()
            .find(|e| e.season == season && e.episode == episode)
    }
}

/// Read-only view of the catalog store.
pub trait Catalog: Send + Sync {
    fn movie_exists(&self, id: u64) -> bool;

    fn series(&self, id: u64) -> Option<SeriesRecord>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    movies: Vec<u64>,
    #[serde(default)]
    series: Vec<SeriesRecord>,
}

/// Catalog listing held in memory, loaded from yaml.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    movies: HashSet<u64>,
    series: Vec<SeriesRecord>,
}

impl MemoryCatalog {
    pub fn new(movies: impl IntoIterator<Item = u64>, series: Vec<SeriesRecord>) -> Self {
        Self {
            movies: movies.into_iter().collect(),
            series,
        }
    }

    /// A missing file is an empty catalog.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::warn!("catalog {} not found, starting empty", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_yml::from_str(&raw)
            .map_err(|err| anyhow::anyhow!("{} is malformed: {err}", path.display()))?;

        log::info!(
            "loaded catalog: {} movies, {} series",
            file.movies.len(),
            file.series.len()
        );

        Ok(Self::new(file.movies, file.series))
    }
}

impl Catalog for MemoryCatalog {
    fn movie_exists(&self, id: u64) -> bool {
        self.movies.contains(&id)
    }

    fn series(&self, id: u64) -> Option<SeriesRecord> {
        self.series.iter().find(|s| s.id == id).cloned()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInfo {
    pub series_id: u64,
    pub series_name: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_title: Option<String>,
    pub episode_overview: Option<String>,
    pub embed_url: String,
}

pub fn parse_tmdb_id(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidParameters("Invalid TMDB ID".into())),
    }
}

pub fn parse_episode(season: &str, episode: &str) -> Result<(u32, u32), AppError> {
    match (season.trim().parse::<u32>(), episode.trim().parse::<u32>()) {
        (Ok(s), Ok(e)) if s > 0 && e > 0 => Ok((s, e)),
        _ => Err(AppError::InvalidParameters("Invalid parameters".into())),
    }
}

/// Embed urls for content the catalog knows about.
pub struct EmbedService {
    catalog: Arc<dyn Catalog>,
    endpoints: ProviderEndpoints,
}

impl EmbedService {
    pub fn new(catalog: Arc<dyn Catalog>, endpoints: ProviderEndpoints) -> Self {
        Self { catalog, endpoints }
    }

    fn url_for(&self, target: MediaTarget) -> String {
        self.endpoints.embed_url(&target).to_string()
    }

    fn content_id(id: u64) -> Result<ContentId, AppError> {
        ContentId::parse(&id.to_string())
    }

    pub fn movie_exists(&self, id: u64) -> bool {
        self.catalog.movie_exists(id)
    }

    pub fn series_exists(&self, id: u64) -> bool {
        self.catalog.series(id).is_some()
    }

    pub fn episode_exists(&self, id: u64, season: u32, episode: u32) -> bool {
        self.catalog
            .series(id)
            .is_some_and(|s| s.find_episode(season, episode).is_some())
    }

    pub fn movie_embed_url(&self, id: u64) -> Result<String, AppError> {
        if !self.movie_exists(id) {
            return Err(AppError::NotFoundInCatalog(format!("Movie not found with TMDB ID: {id}")));
        }

        Ok(self.url_for(MediaTarget::Movie(Self::content_id(id)?)))
    }

    pub fn series_embed_url(&self, id: u64) -> Result<String, AppError> {
        if !self.series_exists(id) {
            return Err(AppError::NotFoundInCatalog(format!("Series not found with TMDB ID: {id}")));
        }

        Ok(self.url_for(MediaTarget::Series(Self::content_id(id)?)))
    }

    pub fn episode_embed_url(&self, id: u64, season: u32, episode: u32) -> Result<String, AppError> {
        self.episode_info(id, season, episode).map(|info| info.embed_url)
    }

    pub fn episode_info(&self, id: u64, season: u32, episode: u32) -> Result<EpisodeInfo, AppError> {
        if season == 0 || episode == 0 {
            return Err(AppError::InvalidParameters("Invalid parameters".into()));
        }

        let not_found = || {
            AppError::NotFoundInCatalog(format!(
                "Episode not found: Series {id}, Season {season}, Episode {episode}"
            ))
        };

        let series = self.catalog.series(id).ok_or_else(not_found)?;
        let record = series.find_episode(season, episode).ok_or_else(not_found)?;

        Ok(EpisodeInfo {
            series_id: id,
            series_name: series.name.clone(),
            season_number: season,
            episode_number: episode,
            episode_title: record.title.clone(),
            episode_overview: record.overview.clone(),
            embed_url: self.url_for(MediaTarget::Episode {
                series: Self::content_id(id)?,
                season,
                episode,
            }),
        })
    }
}

pub fn iframe_html(embed_url: &str) -> String {
    format!(
        r#"<iframe src="{embed_url}" width="100%" height="100%" frameborder="0" allowfullscreen></iframe>"#
    )
}
