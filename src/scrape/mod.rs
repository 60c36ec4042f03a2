pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod shaper;
pub mod types;

pub use fetcher::{FetchError, HttpFetcher, Page, PageFetcher};
pub use pipeline::ExtractionPipeline;
pub use shaper::{RandomShape, RequestShaper};
pub use types::{ExtractedReference, Resolution, ResolutionTier, Tier};
