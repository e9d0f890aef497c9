//! Stitching decoder segments of a whole file into one transcript.

/// Whisper's own default `no_speech_thold`.
pub const NO_SPEECH_THRESHOLD: f32 = 0.6;

/// One decoded segment. Timestamps are in centiseconds, as whisper.cpp reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start_cs: i64,
    pub end_cs: i64,
    pub text: String,
    pub no_speech: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stitched {
    pub text: String,
    /// Mean speech probability over the kept segments.
    pub confidence: Option<f64>,
    pub kept: usize,
    pub spoken_secs: f64,
}

/// Joins speech segments in order, dropping silence and annotation-only
/// segments such as `[BLANK_AUDIO]` or `(music)`.
pub fn stitch(segments: &[Segment]) -> Stitched {
    let mut text = String::new();
    let mut speech_prob = 0.0f64;
    let mut kept = 0usize;
    let mut spoken_cs = 0i64;

    for segment in segments {
        let piece = segment.text.trim();
        if piece.is_empty() || is_annotation(piece) || segment.no_speech > NO_SPEECH_THRESHOLD {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(piece);
        speech_prob += f64::from(1.0 - segment.no_speech.clamp(0.0, 1.0));
        spoken_cs += (segment.end_cs - segment.start_cs).max(0);
        kept += 1;
    }

    Stitched {
        text,
        confidence: (kept > 0).then(|| speech_prob / kept as f64),
        kept,
        spoken_secs: spoken_cs as f64 / 100.0,
    }
}

fn is_annotation(piece: &str) -> bool {
    let bracketed = |open: char, close: char| {
        piece.starts_with(open) && piece.ends_with(close) && piece[1..].find(open).is_none()
    };
    bracketed('[', ']') || bracketed('(', ')')
}
