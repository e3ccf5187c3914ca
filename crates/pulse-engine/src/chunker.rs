//! Long-Form Chunker
//!
//! Splits a [`ContentDocument`] into an ordered chain of post-sized segments.
//!
//! ```text
//! segment 0   🧵 <title>\n\n<first head_len chars>...
//! segment 1   <next window chars>            parent 0
//! segment 2   <next window chars>            parent 1
//! ```
//!
//! With `window <= ceiling - 3` no slice is ever truncated, so the head plus
//! every following slice reproduces the body exactly.

use crate::model::{char_len, ContentDocument, PostSegment};
use crate::policy::{truncate_to_ceiling, CEILING, ELLIPSIS};

pub const THREAD_MARKER: &str = "🧵";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkConfig {
    pub ceiling: usize,

    /// Body chars carried by the banner segment
    pub head_len: usize,

    /// Body chars per follow-up segment
    pub window: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            ceiling: CEILING,
            head_len: 200,
            window: CEILING - ELLIPSIS.len(),
        }
    }
}

fn banner_segment(title: &str, head: &str, continued: bool, ceiling: usize) -> String {
    let banner = format!("{THREAD_MARKER} {}", title.trim());
    if head.trim().is_empty() {
        return truncate_to_ceiling(&banner, ceiling);
    }

    let tail = if continued { ELLIPSIS } else { "" };
    let reserved = 2 + char_len(head) + char_len(tail);
    let banner = truncate_to_ceiling(&banner, ceiling.saturating_sub(reserved).max(char_len(THREAD_MARKER)));
    truncate_to_ceiling(&format!("{banner}\n\n{head}{tail}"), ceiling)
}

/// Split `document` into linked segments. Never returns an empty list.
pub fn chunk(document: &ContentDocument, config: &ChunkConfig) -> Vec<PostSegment> {
    let chars: Vec<char> = document.long_body.chars().collect();
    let head_end = config.head_len.min(chars.len());
    let head: String = chars[..head_end].iter().collect();
    let rest = &chars[head_end..];

    let mut bodies = vec![banner_segment(&document.title, &head, !rest.is_empty(), config.ceiling)];

    for slice in rest.chunks(config.window.max(1)) {
        let text: String = slice.iter().collect();
        if text.trim().is_empty() {
            continue;
        }
        bodies.push(truncate_to_ceiling(&text, config.ceiling));
    }

    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| PostSegment {
            body,
            parent: i.checked_sub(1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: String) -> ContentDocument {
        ContentDocument {
            title: "BTC breaks range high".into(),
            source_url: "https://example.com/btc".into(),
            long_body: body,
        }
    }

    /// Distinct, non-repeating body so ordering mistakes are visible
    fn body(len: usize) -> String {
        (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect()
    }

    fn assert_linked(segments: &[PostSegment], ceiling: usize) {
        for (i, segment) in segments.iter().enumerate() {
            assert!(char_len(&segment.body) <= ceiling, "segment {i} too long");
            assert!(!segment.body.trim().is_empty());
            assert_eq!(segment.parent, i.checked_sub(1));
        }
    }

    #[test]
    fn test_900_chars_default_window() {
        let segments = chunk(&document(body(900)), &ChunkConfig::default());
        assert_eq!(segments.len(), 4);
        assert_linked(&segments, CEILING);
        assert!(segments[0].body.starts_with("🧵 BTC breaks range high\n\n"));
        assert!(segments[0].body.ends_with("..."));
    }

    #[test]
    fn test_900_chars_wide_window() {
        let config = ChunkConfig {
            window: 300,
            ..Default::default()
        };
        let segments = chunk(&document(body(900)), &config);
        assert_eq!(segments.len(), 4);
        assert_linked(&segments, CEILING);
        assert!(segments[1].body.ends_with("..."));
        assert_eq!(char_len(&segments[1].body), CEILING);
    }

    #[test]
    fn test_lossless_ordering() {
        let config = ChunkConfig::default();
        let original = body(1234);
        let segments = chunk(&document(original.clone()), &config);

        let head = segments[0].body.split("\n\n").nth(1).unwrap();
        let mut rebuilt = head.strip_suffix("...").unwrap().to_string();
        for segment in &segments[1..] {
            rebuilt.push_str(&segment.body);
        }
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_short_body_single_segment() {
        let segments = chunk(&document("Short take.".into()), &ChunkConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].body, "🧵 BTC breaks range high\n\nShort take.");
        assert_eq!(segments[0].parent, None);
    }

    #[test]
    fn test_empty_body() {
        let segments = chunk(&document(String::new()), &ChunkConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].body, "🧵 BTC breaks range high");
    }

    #[test]
    fn test_long_title_is_shortened_to_fit() {
        let mut doc = document(body(600));
        doc.title = "T".repeat(300);
        let segments = chunk(&doc, &ChunkConfig::default());
        assert_linked(&segments, CEILING);
        assert!(segments[0].body.contains("\n\n"));
        assert!(segments[0].body.ends_with("..."));
    }

    #[test]
    fn test_whitespace_slices_skipped() {
        let mut text = body(200);
        text.push_str(&" ".repeat(277));
        text.push_str("final words");
        let segments = chunk(&document(text), &ChunkConfig::default());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].body, "final words");
        assert_eq!(segments[1].parent, Some(0));
    }
}
