use serde::{Deserialize, Serialize};

/// How a stored reference was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Scraped stream or file url
    Direct,
    /// Generic embeddable page url
    Embed,
}

/// Provenance of a single resolution call. `Cached` only describes the call,
/// the stored entry keeps its own `Tier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionTier {
    Cached,
    Direct,
    Embed,
}

impl From<Tier> for ResolutionTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Direct => ResolutionTier::Direct,
            Tier::Embed => ResolutionTier::Embed,
        }
    }
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Cached => "cached",
            ResolutionTier::Direct => "direct",
            ResolutionTier::Embed => "embed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReference {
    reference: String,
    tier: Tier,
}

impl ExtractedReference {
    /// Blank locators are not a result.
    pub fn direct(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return None;
        }

        Some(Self {
            reference,
            tier: Tier::Direct,
        })
    }

    pub fn embed(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            tier: Tier::Embed,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn into_reference(self) -> String {
        self.reference
    }
}

/// Outcome of `VideoResolver::resolve`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub reference: String,
    pub tier: ResolutionTier,
}
