use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::{ops::Range, sync::Arc, time::Duration};
use url::Url;

use crate::config::ScrapeConfig;

/// Pool of client identity strings presented to the provider.
#[derive(Clone, Debug)]
pub struct ClientProfile {
    identities: Arc<[String]>,
}

impl ClientProfile {
    pub fn new(identities: Vec<String>) -> Self {
        Self {
            identities: identities.into(),
        }
    }

    pub fn identities(&self) -> &[String] {
        &self.identities
    }
}

/// Source of the per-request random choices.
pub trait ShapeSource: Send + Sync {
    /// Index into a pool of `len` identities, `len > 0`
    fn pick_identity(&self, len: usize) -> usize;

    fn pre_delay(&self, range: &Range<Duration>) -> Duration;
}

/// Uniform choices from the thread-local rng.
pub struct RandomShape;

impl ShapeSource for RandomShape {
    fn pick_identity(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }

    fn pre_delay(&self, range: &Range<Duration>) -> Duration {
        if range.is_empty() {
            return range.start;
        }

        let ms = rand::rng().random_range(range.start.as_millis()..range.end.as_millis());
        Duration::from_millis(ms as u64)
    }
}

/// Always the same identity and delay.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct FixedShape {
    pub identity: usize,
    pub delay: Duration,
}

#[cfg(test)]
impl ShapeSource for FixedShape {
    fn pick_identity(&self, len: usize) -> usize {
        self.identity % len
    }

    fn pre_delay(&self, _range: &Range<Duration>) -> Duration {
        self.delay
    }
}

#[derive(Clone, Debug)]
pub struct ShapedRequest {
    pub url: Url,
    pub identity: String,
    pub headers: HeaderMap,
    pub pre_delay: Duration,
    pub timeout: Duration,
}

pub struct RequestShaper {
    profile: ClientProfile,
    delay: Range<Duration>,
    timeout: Duration,
    source: Arc<dyn ShapeSource>,
}

impl RequestShaper {
    pub fn new(
        profile: ClientProfile,
        delay: Range<Duration>,
        timeout: Duration,
        source: Arc<dyn ShapeSource>,
    ) -> Self {
        Self {
            profile,
            delay,
            timeout,
            source,
        }
    }

    pub fn from_config(config: &ScrapeConfig, source: Arc<dyn ShapeSource>) -> Self {
        Self::new(
            ClientProfile::new(config.user_agents.clone()),
            config.delay_range(),
            config.fetch_timeout(),
            source,
        )
    }

    pub fn shape(&self, url: Url) -> ShapedRequest {
        let identities = self.profile.identities();
        let identity = if identities.is_empty() {
            String::new()
        } else {
            identities[self.source.pick_identity(identities.len())].clone()
        };

        ShapedRequest {
            url,
            identity,
            headers: browser_headers(),
            pre_delay: self.source.pre_delay(&self.delay),
            timeout: self.timeout,
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ClientProfile {
        ClientProfile::new(ScrapeConfig::default().user_agents)
    }

    fn target() -> Url {
        Url::parse("https://vidsrc.to/embed/movie/603").unwrap()
    }

    #[test]
    fn random_delay_stays_in_range() {
        let range = Duration::from_millis(1000)..Duration::from_millis(3000);
        let shaper = RequestShaper::new(
            profile(),
            range.clone(),
            Duration::from_secs(30),
            Arc::new(RandomShape),
        );

        for _ in 0..200 {
            let req = shaper.shape(target());
            assert!(range.contains(&req.pre_delay), "{:?}", req.pre_delay);
            assert!(profile().identities().contains(&req.identity));
            assert_eq!(req.timeout, Duration::from_secs(30));
        }
    }

    #[test]
    fn empty_delay_range_uses_lower_bound() {
        let range = Duration::from_millis(0)..Duration::from_millis(0);
        assert_eq!(RandomShape.pre_delay(&range), Duration::ZERO);
    }

    #[test]
    fn fixed_source_is_deterministic() {
        let shaper = RequestShaper::new(
            profile(),
            Duration::from_millis(1000)..Duration::from_millis(3000),
            Duration::from_secs(30),
            Arc::new(FixedShape {
                identity: 2,
                delay: Duration::ZERO,
            }),
        );

        let req = shaper.shape(target());
        assert_eq!(req.identity, profile().identities()[2]);
        assert_eq!(req.pre_delay, Duration::ZERO);
        assert_eq!(req.url, target());
    }

    #[test]
    fn browser_like_headers() {
        let shaper = RequestShaper::from_config(&ScrapeConfig::default(), Arc::new(RandomShape));
        let req = shaper.shape(target());

        for name in [
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::ACCEPT_ENCODING,
            header::CONNECTION,
            header::UPGRADE_INSECURE_REQUESTS,
        ] {
            assert!(req.headers.contains_key(&name), "missing {name}");
        }
        assert_eq!(req.headers[header::ACCEPT_LANGUAGE], "en-US,en;q=0.5");
    }
}
