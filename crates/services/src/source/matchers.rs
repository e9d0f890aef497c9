use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{SourceKind, is_supported_host};

/// Start of text or any character that cannot be part of a hostname or path.
/// Stops `notyoutube.com`, `evil-youtube.com` or `evil.com/youtube.com` from
/// matching mid-host while still allowing `check:https://...` or `v,youtu.be/...`.
const BOUNDARY: &str = r"(?:^|[^\w./-])";

const YOUTUBE_HOST: &str = r"(?P<host>(?:(?:www|m|music)\.)?youtube\.com)";

/// One entry of the ordered matcher table: a pattern plus the normalizer that
/// turns its captures into a candidate URL.
pub(super) struct Matcher {
    pub kind: SourceKind,
    pattern: Regex,
    normalize: fn(&Captures<'_>) -> Option<String>,
}

impl Matcher {
    fn new(kind: SourceKind, pattern: &str, normalize: fn(&Captures<'_>) -> Option<String>) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("source pattern must compile"),
            normalize,
        }
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(text)
            .and_then(|caps| (self.normalize)(&caps))
    }
}

/// Evaluated top to bottom; the first entry whose candidate validates wins,
/// regardless of where in the text the match sits. Specific forms come first
/// so the command-token fallback only applies when none of them is present.
pub(super) static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher::new(
            SourceKind::Watch,
            &format!(
                r"(?i){BOUNDARY}(?P<scheme>https?://)?{YOUTUBE_HOST}/watch/?\?(?:[^\s#]*?&)?v=(?P<id>[\w-]+)"
            ),
            |c| Some(format!("{}/watch?v={}", origin(c), &c["id"])),
        ),
        Matcher::new(
            SourceKind::ShortLink,
            &format!(r"(?i){BOUNDARY}(?P<scheme>https?://)?(?P<host>youtu\.be)/(?P<id>[\w-]+)"),
            |c| Some(format!("{}/{}", origin(c), &c["id"])),
        ),
        Matcher::new(
            SourceKind::Embed,
            &format!(
                r"(?i){BOUNDARY}(?P<scheme>https?://)?(?P<host>(?:www\.)?youtube(?:-nocookie)?\.com)/embed/(?P<id>[\w-]+)"
            ),
            |c| Some(format!("{}/embed/{}", origin(c), &c["id"])),
        ),
        Matcher::new(
            SourceKind::Shorts,
            &format!(r"(?i){BOUNDARY}(?P<scheme>https?://)?{YOUTUBE_HOST}/shorts/(?P<id>[\w-]+)"),
            |c| Some(format!("{}/shorts/{}", origin(c), &c["id"])),
        ),
        Matcher::new(
            SourceKind::Generic,
            r"(?i)^\s*/[\w-]+(?:@\w+)?\s+(?P<candidate>\S+)",
            |c| normalize_generic(&c["candidate"]),
        ),
    ]
});

/// Lowercased scheme and host; the scheme defaults to https.
fn origin(caps: &Captures<'_>) -> String {
    let scheme = caps
        .name("scheme")
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "https://".to_string());
    format!("{}{}", scheme, caps["host"].to_ascii_lowercase())
}

/// Cleans up whatever followed a command token.
fn normalize_generic(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '>', '"', '\'']);
    let without_extra = trimmed.split('&').next().unwrap_or(trimmed);

    let (scheme, rest) = match without_extra.find("://") {
        Some(idx) => (
            without_extra[..idx + 3].to_ascii_lowercase(),
            &without_extra[idx + 3..],
        ),
        None => ("https://".to_string(), without_extra),
    };

    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = rest[..host_end].to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    // Only complete a missing scheme for hosts we would accept anyway.
    if !without_extra.contains("://") && !is_supported_host(&host) {
        return None;
    }

    Some(format!("{}{}{}", scheme, host, &rest[host_end..]))
}
