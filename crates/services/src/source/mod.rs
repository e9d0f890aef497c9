//! Finding a downloadable media link inside a chat message.
//!
//! Works with or without a leading command token (`/process_youtube <url>`),
//! and with links buried in surrounding prose. See [`matchers::MATCHERS`] for
//! the precedence rules.

mod matchers;

use serde::Serialize;
use tracing::debug;
use url::Url;

/// Hosts the downloader is expected to handle.
pub const SUPPORTED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

pub fn is_supported_host(host: &str) -> bool {
    SUPPORTED_HOSTS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(host))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Watch,
    ShortLink,
    Embed,
    Shorts,
    /// Any supported link that followed a command token.
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub url: String,
    pub kind: SourceKind,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SourceResolver;

impl SourceResolver {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when the text holds no supported link. Never fails on
    /// malformed input.
    pub fn resolve(&self, text: &str) -> Option<ResolvedSource> {
        for matcher in matchers::MATCHERS.iter() {
            let Some(candidate) = matcher.extract(text) else {
                continue;
            };
            if is_acceptable(&candidate) {
                debug!(kind = ?matcher.kind, url = %candidate, "Source resolved");
                return Some(ResolvedSource {
                    url: candidate,
                    kind: matcher.kind,
                });
            }
            debug!(kind = ?matcher.kind, %candidate, "Candidate rejected by validation");
        }
        None
    }
}

/// Well-formed http(s) URL whose host is on the allowlist.
fn is_acceptable(candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(is_supported_host)
}
