//! Video id extraction from input lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::VideoId;

/// `v=` query parameter, optionally preceded by `?` or `&`
static VIDEO_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]?v=([a-zA-Z0-9_-]{11})").expect("valid video id regex"));

/// How a single input line was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty after trimming; skipped silently
    Blank,

    /// Line carries a video id
    Video(VideoId),

    /// Non-blank line without a usable `v=` parameter (trimmed content)
    Invalid(String),
}

/// Extract the video id from the first `v=<11 chars>` occurrence in `line`
pub fn extract(line: &str) -> Option<VideoId> {
    VIDEO_PARAM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| VideoId::parse(m.as_str()).ok())
}

/// Classify one raw input line
pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    match extract(trimmed) {
        Some(id) => LineKind::Video(id),
        None => LineKind::Invalid(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(line: &str) -> Option<String> {
        extract(line).map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_extract_watch_url() {
        assert_eq!(
            extracted("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_ignores_other_params() {
        assert_eq!(
            extracted("https://www.youtube.com/watch?list=PL123&v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extracted("https://youtube.com/watch?v=a-b_c-d_e-f&feature=share"),
            Some("a-b_c-d_e-f".to_string())
        );
    }

    #[test]
    fn test_extract_takes_first_eleven_chars() {
        assert_eq!(
            extracted("https://youtube.com/watch?v=ABCDEFGHIJKLMN"),
            Some("ABCDEFGHIJK".to_string())
        );
    }

    #[test]
    fn test_extract_no_match() {
        assert_eq!(extracted("https://youtu.be/dQw4w9WgXcQ"), None);
        assert_eq!(extracted("https://youtube.com/watch?v=short"), None);
        assert_eq!(extracted("not a url at all"), None);
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), LineKind::Blank);
        assert_eq!(classify_line("   \t\r"), LineKind::Blank);
        assert_eq!(
            classify_line("  https://youtu.be/watch?v=ABCDEFGHIJK\r"),
            LineKind::Video(VideoId::parse("ABCDEFGHIJK").unwrap())
        );
        assert_eq!(
            classify_line("  garbage line  "),
            LineKind::Invalid("garbage line".to_string())
        );
    }
}
