use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::types::ExtractedReference;

type Matcher = fn(&Html) -> Option<ExtractedReference>;

/// Tried in order, first hit wins.
const MATCHERS: [(&str, Matcher); 3] = [
    ("video-source", from_video_sources),
    ("iframe", from_iframes),
    ("script", from_scripts),
];

static VIDEO_SOURCE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("video source").expect("valid selector"));
static IFRAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("iframe").expect("valid selector"));
static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("valid selector"));

static SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)https://[^"']*\.m3u8[^"']*"#,
        r#"(?i)https://[^"']*\.mp4[^"']*"#,
        r#"(?i)blob:https://[^"']*"#,
        r#"(?i)src\s*:\s*['"]([^'"]*\.(?:m3u8|mp4))['"]"#,
        r#"(?i)url\s*:\s*['"]([^'"]*\.(?:m3u8|mp4))['"]"#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("Failed to compile video url regex"))
    .collect()
});

/// Search a provider page for a playable locator.
pub fn extract(document: &Html) -> Option<ExtractedReference> {
    MATCHERS.iter().find_map(|(name, matcher)| {
        let found = matcher(document)?;
        log::info!("found video url via {name}: {}", found.reference());
        Some(found)
    })
}

pub fn extract_from_str(html: &str) -> Option<ExtractedReference> {
    extract(&Html::parse_document(html))
}

pub fn is_valid_video_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }

    [".m3u8", ".mp4", "blob:", "video", "stream"]
        .into_iter()
        .any(|needle| url.contains(needle))
}

fn from_video_sources(document: &Html) -> Option<ExtractedReference> {
    document
        .select(&VIDEO_SOURCE_SELECTOR)
        .filter_map(|el| el.attr("src"))
        .find(|src| is_valid_video_url(src))
        .and_then(ExtractedReference::direct)
}

fn from_iframes(document: &Html) -> Option<ExtractedReference> {
    document
        .select(&IFRAME_SELECTOR)
        .filter_map(|el| el.attr("src"))
        .find(|src| ["m3u8", ".mp4", "blob:"].into_iter().any(|n| src.contains(n)))
        .and_then(ExtractedReference::direct)
}

fn from_scripts(document: &Html) -> Option<ExtractedReference> {
    document.select(&SCRIPT_SELECTOR).find_map(|el| {
        let content = el.text().collect::<String>();
        from_script_text(&content)
    })
}

fn from_script_text(content: &str) -> Option<ExtractedReference> {
    SCRIPT_PATTERNS
        .iter()
        .find_map(|re| re.find(content))
        .and_then(|m| ExtractedReference::direct(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::types::Tier;

    fn page(body: &str) -> String {
        format!(r#"<html><head><title>embed</title></head><body>{body}</body></html>"#)
    }

    fn found(html: &str) -> Option<String> {
        extract_from_str(html).map(|r| {
            assert_eq!(r.tier(), Tier::Direct);
            r.into_reference()
        })
    }

    #[test]
    fn test_video_source() {
        let html = page(r#"<video><source src="https://x/603.m3u8" type="application/x-mpegURL"></video>"#);
        assert_eq!(found(&html).as_deref(), Some("https://x/603.m3u8"));
    }

    #[test]
    fn test_video_source_wins_over_script() {
        let html = page(
            r#"<script>var player = { file: "https://cdn.example.com/other.m3u8" };</script>
            <video><source src="https://cdn.example.com/main.mp4"></video>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://cdn.example.com/main.mp4")
        );
    }

    #[test]
    fn test_video_source_wins_over_iframe() {
        let html = page(
            r#"<iframe src="https://player.example.com/a.m3u8"></iframe>
            <video><source src="https://cdn.example.com/b.m3u8"></video>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://cdn.example.com/b.m3u8")
        );
    }

    #[test]
    fn test_empty_source_never_matches() {
        let html = page(r#"<video><source src=""><source src="   "><source></video>"#);
        assert_eq!(found(&html), None);
    }

    #[test]
    fn test_empty_source_skipped_for_next() {
        let html = page(
            r#"<video><source src=""><source src="https://cdn.example.com/stream/1"></video>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://cdn.example.com/stream/1")
        );
    }

    #[test]
    fn test_source_without_video_parent_ignored() {
        let html = page(r#"<audio><source src="https://cdn.example.com/a.mp4"></audio>"#);
        assert_eq!(found(&html), None);
    }

    #[test]
    fn test_validity_predicate_is_case_sensitive() {
        assert!(is_valid_video_url("https://x/a.m3u8"));
        assert!(is_valid_video_url("blob:https://x/1"));
        assert!(is_valid_video_url("https://x/video/1"));
        assert!(!is_valid_video_url("https://x/VIDEO/1"));
        assert!(!is_valid_video_url("https://x/a.M3U8"));
        assert!(!is_valid_video_url(""));
        assert!(!is_valid_video_url(" \t"));
    }

    #[test]
    fn test_iframe_document_order() {
        let html = page(
            r#"<iframe src="https://ads.example.com/banner"></iframe>
            <iframe src="https://player.example.com/first.mp4"></iframe>
            <iframe src="blob:https://player.example.com/second"></iframe>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://player.example.com/first.mp4")
        );
    }

    #[test]
    fn test_iframe_wins_over_script() {
        let html = page(
            r#"<script>load("https://cdn.example.com/s.m3u8")</script>
            <iframe src="https://player.example.com/live.m3u8?token=1"></iframe>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://player.example.com/live.m3u8?token=1")
        );
    }

    #[test]
    fn test_script_m3u8() {
        let html = page(
            r#"<script>jwplayer("p").setup({ file: 'https://cdn.example.com/hls/603/index.m3u8?e=1', autostart: true });</script>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://cdn.example.com/hls/603/index.m3u8?e=1")
        );
    }

    #[test]
    fn test_script_pattern_order() {
        // m3u8 pattern is tried before mp4 even though mp4 appears first
        let html = page(
            r#"<script>var a = "https://cdn.example.com/a.mp4"; var b = "https://cdn.example.com/b.m3u8";</script>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://cdn.example.com/b.m3u8")
        );
    }

    #[test]
    fn test_script_blob() {
        let html = page(r#"<script>video.src = "blob:https://player.example.com/9f1c";</script>"#);
        assert_eq!(
            found(&html).as_deref(),
            Some("blob:https://player.example.com/9f1c")
        );
    }

    #[test]
    fn test_script_key_value_full_match() {
        let html = page(r#"<script>var cfg = { SRC : "/media/603.MP4" };</script>"#);
        assert_eq!(found(&html).as_deref(), Some(r#"SRC : "/media/603.MP4""#));

        let html = page(r#"<script>var cfg = { url: '//cdn.example.com/603.m3u8' };</script>"#);
        assert_eq!(
            found(&html).as_deref(),
            Some(r#"url: '//cdn.example.com/603.m3u8'"#)
        );
    }

    #[test]
    fn test_scripts_in_document_order() {
        let html = page(
            r#"<script>console.log("nothing here")</script>
            <script>var x = "https://one.example.com/a.mp4";</script>
            <script>var y = "https://two.example.com/b.m3u8";</script>"#,
        );
        assert_eq!(
            found(&html).as_deref(),
            Some("https://one.example.com/a.mp4")
        );
    }

    #[test]
    fn test_no_match() {
        let html = page(
            r#"<div class="player"></div>
            <iframe src="https://ads.example.com/banner"></iframe>
            <script>window.dataLayer = [];</script>"#,
        );
        assert_eq!(found(&html), None);
    }

    #[test]
    fn test_garbage_input() {
        assert_eq!(found("<<<not html"), None);
        assert_eq!(found(""), None);
    }
}
