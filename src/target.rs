use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Deref};
use url::Url;

use crate::app::errors::AppError;

/// External catalog key naming one playable item. Never blank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::InvalidIdentifier);
        }

        Ok(ContentId(raw.to_string()))
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for ContentId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// What a lookup points at on the provider side.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MediaTarget {
    Movie(ContentId),
    Series(ContentId),
    Episode {
        series: ContentId,
        season: u32,
        episode: u32,
    },
}

impl MediaTarget {
    pub fn id(&self) -> &ContentId {
        match self {
            MediaTarget::Movie(id) | MediaTarget::Series(id) => id,
            MediaTarget::Episode { series, .. } => series,
        }
    }

    /// Key under which the resolution is cached. Movies use the bare id.
    pub fn cache_key(&self) -> String {
        match self {
            MediaTarget::Movie(id) => id.to_string(),
            MediaTarget::Series(id) => format!("tv/{id}"),
            MediaTarget::Episode {
                series,
                season,
                episode,
            } => format!("tv/{series}/{season}/{episode}"),
        }
    }

    fn path_segments(&self) -> Vec<String> {
        match self {
            MediaTarget::Movie(id) => vec!["movie".into(), id.to_string()],
            MediaTarget::Series(id) => vec!["tv".into(), id.to_string()],
            MediaTarget::Episode {
                series,
                season,
                episode,
            } => vec![
                "tv".into(),
                series.to_string(),
                season.to_string(),
                episode.to_string(),
            ],
        }
    }
}

/// Builds provider embed page urls: `{base}/embed/movie/{id}`,
/// `{base}/embed/tv/{id}` and `{base}/embed/tv/{id}/{season}/{episode}`.
#[derive(Clone, Debug)]
pub struct ProviderEndpoints {
    base: Url,
}

impl ProviderEndpoints {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)?;

        if !["http", "https"].contains(&base.scheme()) {
            anyhow::bail!("provider url scheme '{}' not allowed", base.scheme());
        }

        if base.cannot_be_a_base() {
            anyhow::bail!("provider url '{base_url}' cannot be a base");
        }

        Ok(Self { base })
    }

    pub fn embed_url(&self, target: &MediaTarget) -> Url {
        let mut url = self.base.clone();

        // checked in `new`, cannot fail
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("embed");
            segments.extend(target.path_segments());
        }

        url
    }
}
