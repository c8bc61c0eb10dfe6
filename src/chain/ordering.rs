//! Temporal reordering of retrieved chunks.

use crate::vector_store::SearchHit;

/// Convert a `MM:SS` (or `H:MM:SS`) timestamp to seconds.
///
/// Returns `None` for anything else, including out-of-range seconds.
pub fn timestamp_to_seconds(timestamp: &str) -> Option<u32> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    match numbers.as_slice() {
        [minutes, seconds] if *seconds < 60 => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => hours
            .checked_mul(3600)?
            .checked_add(minutes * 60 + seconds),
        _ => None,
    }
}

/// Sort hits by position in the episode, earliest first.
///
/// The sort is stable. Hits whose timestamp cannot be parsed keep their
/// relative order and go after every parsable one.
pub fn sort_by_timestamp(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.sort_by_key(|hit| match timestamp_to_seconds(&hit.chunk.timestamp) {
        Some(secs) => (0u8, secs),
        None => (1u8, 0),
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::TranscriptChunk;

    fn hit(ts: &str, text: &str) -> SearchHit {
        SearchHit {
            chunk: TranscriptChunk::new(ts, text),
            score: 0.5,
        }
    }

    #[test]
    fn test_timestamp_to_seconds() {
        assert_eq!(timestamp_to_seconds("00:00"), Some(0));
        assert_eq!(timestamp_to_seconds("02:05"), Some(125));
        assert_eq!(timestamp_to_seconds("75:30"), Some(4530));
        assert_eq!(timestamp_to_seconds("1:02:03"), Some(3723));
        assert_eq!(timestamp_to_seconds(" 3:07 "), Some(187));
    }

    #[test]
    fn test_invalid_timestamps() {
        assert_eq!(timestamp_to_seconds(""), None);
        assert_eq!(timestamp_to_seconds("12"), None);
        assert_eq!(timestamp_to_seconds("ab:cd"), None);
        assert_eq!(timestamp_to_seconds("01:75"), None);
        assert_eq!(timestamp_to_seconds("-1:10"), None);
    }

    #[test]
    fn test_sorts_numerically_not_lexically() {
        let sorted = sort_by_timestamp(vec![
            hit("10:00", "c"),
            hit("9:59", "b"),
            hit("00:30", "a"),
        ]);
        let order: Vec<&str> = sorted.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unparsable_go_last_in_original_order() {
        let sorted = sort_by_timestamp(vec![
            hit("??", "x"),
            hit("05:00", "b"),
            hit("", "y"),
            hit("01:00", "a"),
        ]);
        let order: Vec<&str> = sorted.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "x", "y"]);
    }

    #[test]
    fn test_equal_timestamps_keep_retrieval_order() {
        let sorted = sort_by_timestamp(vec![hit("04:00", "first"), hit("04:00", "second")]);
        assert_eq!(sorted[0].chunk.text, "first");
        assert_eq!(sorted[1].chunk.text, "second");
    }
}
