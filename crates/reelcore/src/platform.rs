//! Supported-platform detection for incoming links
//!
//! A link is supported when its host is one of the known domains or a
//! subdomain of one. Detection and validation share the same table, so a
//! link is valid exactly when it maps to a platform other than `Unknown`.

use regex::Regex;
use std::sync::LazyLock;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use url::Url;

/// Cached regex for matching URLs in chat messages
#[allow(clippy::unwrap_used)]
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").unwrap());

/// Media platforms the extraction API handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Twitter,
    Youtube,
    Facebook,
    Reddit,
    Vimeo,
    Twitch,
    Snapchat,
    Soundcloud,
    Pinterest,
    Streamable,
    Dailymotion,
    Bilibili,
    Bluesky,
    Loom,
    #[strum(serialize = "ok")]
    Odnoklassniki,
    Newgrounds,
    Rutube,
    Tumblr,
    Vk,
    Xiaohongshu,
    Unknown,
}

impl Platform {
    /// Registrable domains; any subdomain of these matches too
    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            Platform::Instagram => &["instagram.com", "instagr.am"],
            Platform::Tiktok => &["tiktok.com"],
            Platform::Twitter => &["twitter.com", "x.com", "t.co"],
            Platform::Youtube => &["youtube.com", "youtu.be", "youtube-nocookie.com"],
            Platform::Facebook => &["facebook.com", "fb.com", "fb.watch"],
            Platform::Reddit => &["reddit.com"],
            Platform::Vimeo => &["vimeo.com"],
            Platform::Twitch => &["twitch.tv"],
            Platform::Snapchat => &["snapchat.com", "snap.com"],
            Platform::Soundcloud => &["soundcloud.com"],
            Platform::Pinterest => &["pinterest.com", "pin.it"],
            Platform::Streamable => &["streamable.com"],
            Platform::Dailymotion => &["dailymotion.com", "dai.ly"],
            Platform::Bilibili => &["bilibili.com", "b23.tv"],
            Platform::Bluesky => &["bsky.app", "bluesky.app"],
            Platform::Loom => &["loom.com"],
            Platform::Odnoklassniki => &["ok.ru", "odnoklassniki.ru"],
            Platform::Newgrounds => &["newgrounds.com"],
            Platform::Rutube => &["rutube.ru"],
            Platform::Tumblr => &["tumblr.com"],
            Platform::Vk => &["vk.com", "vkontakte.ru"],
            Platform::Xiaohongshu => &["xiaohongshu.com", "xhslink.com"],
            Platform::Unknown => &[],
        }
    }

    /// Name shown to users (captions, stats)
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Tiktok => "TikTok",
            Platform::Twitter => "Twitter/X",
            Platform::Youtube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::Reddit => "Reddit",
            Platform::Vimeo => "Vimeo",
            Platform::Twitch => "Twitch",
            Platform::Snapchat => "Snapchat",
            Platform::Soundcloud => "SoundCloud",
            Platform::Pinterest => "Pinterest",
            Platform::Streamable => "Streamable",
            Platform::Dailymotion => "Dailymotion",
            Platform::Bilibili => "Bilibili",
            Platform::Bluesky => "Bluesky",
            Platform::Loom => "Loom",
            Platform::Odnoklassniki => "OK.ru",
            Platform::Newgrounds => "Newgrounds",
            Platform::Rutube => "Rutube",
            Platform::Tumblr => "Tumblr",
            Platform::Vk => "VK",
            Platform::Xiaohongshu => "Xiaohongshu",
            Platform::Unknown => "Unknown",
        }
    }

    /// All supported platforms, `Unknown` excluded
    pub fn supported() -> impl Iterator<Item = Platform> {
        Platform::iter().filter(|p| *p != Platform::Unknown)
    }

    fn matches_host(&self, host: &str) -> bool {
        self.domains().iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Lowercased host of an http(s) URL
fn media_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(|h| h.trim_end_matches('.').to_lowercase())
}

/// Detect the platform of a link. Anything unparseable is `Unknown`.
pub fn detect_platform(url: &str) -> Platform {
    let Some(host) = media_host(url) else {
        return Platform::Unknown;
    };
    Platform::supported()
        .find(|platform| platform.matches_host(&host))
        .unwrap_or(Platform::Unknown)
}

/// True if the link points at a supported platform
pub fn is_valid_media_url(url: &str) -> bool {
    detect_platform(url) != Platform::Unknown
}

/// First http(s) URL in a chat message, without trailing punctuation
pub fn extract_first_url(text: &str) -> Option<&str> {
    URL_REGEX
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', '!', '?', ')', ']', '"', '\'', '»']))
        .filter(|url| Url::parse(url).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_detect_common_platforms() {
        let cases = [
            ("https://www.instagram.com/reel/C1a2b3c4d5e/", Platform::Instagram),
            ("https://instagr.am/p/abc/", Platform::Instagram),
            ("https://vm.tiktok.com/ZMabc123/", Platform::Tiktok),
            ("https://x.com/user/status/1", Platform::Twitter),
            ("https://mobile.twitter.com/user/status/1", Platform::Twitter),
            ("https://youtu.be/dQw4w9WgXcQ", Platform::Youtube),
            ("https://m.youtube.com/shorts/abc", Platform::Youtube),
            ("https://fb.watch/abc/", Platform::Facebook),
            ("https://clips.twitch.tv/SomeClip", Platform::Twitch),
            ("https://on.soundcloud.com/xyz", Platform::Soundcloud),
            ("https://b23.tv/abc", Platform::Bilibili),
            ("https://bsky.app/profile/a/post/b", Platform::Bluesky),
            ("https://ok.ru/video/123", Platform::Odnoklassniki),
            ("https://vk.com/video-1_2", Platform::Vk),
            ("https://xhslink.com/a/b", Platform::Xiaohongshu),
        ];
        for (url, expected) in cases {
            assert_eq!(detect_platform(url), expected, "{}", url);
            assert!(is_valid_media_url(url), "{}", url);
        }
    }

    #[test]
    fn test_host_matching_is_by_domain_boundary() {
        assert_eq!(detect_platform("https://notinstagram.com/reel/abc"), Platform::Unknown);
        assert_eq!(detect_platform("https://instagram.com.evil.org/reel/abc"), Platform::Unknown);
        assert_eq!(detect_platform("https://WWW.INSTAGRAM.COM/reel/abc"), Platform::Instagram);
        assert_eq!(detect_platform("https://www.instagram.com./reel/abc"), Platform::Instagram);
    }

    #[test]
    fn test_invalid_urls_are_unknown() {
        for url in ["", "instagram.com/reel/abc", "not a url", "ftp://instagram.com/x", "https://example.com/video"] {
            assert_eq!(detect_platform(url), Platform::Unknown, "{}", url);
            assert!(!is_valid_media_url(url), "{}", url);
        }
    }

    #[test]
    fn test_every_platform_is_detectable_from_its_domains() {
        for platform in Platform::supported() {
            for domain in platform.domains() {
                let url = format!("https://{}/some/path", domain);
                assert_eq!(detect_platform(&url), platform, "{}", url);
            }
        }
        assert_eq!(Platform::supported().count(), 22);
    }

    #[test]
    fn test_names() {
        assert_eq!(Platform::Tiktok.to_string(), "tiktok");
        assert_eq!(Platform::Tiktok.display_name(), "TikTok");
        assert_eq!(Platform::from_str("youtube").unwrap(), Platform::Youtube);
        assert_eq!(Platform::Unknown.as_ref(), "unknown");
    }

    #[test]
    fn test_extract_first_url() {
        assert_eq!(
            extract_first_url("look at this https://www.instagram.com/reel/abc/ and that https://youtu.be/x"),
            Some("https://www.instagram.com/reel/abc/")
        );
        assert_eq!(
            extract_first_url("(https://youtu.be/dQw4w9WgXcQ)."),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(extract_first_url("no links here"), None);
        assert_eq!(extract_first_url("https://"), None);
    }
}
