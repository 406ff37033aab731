#![forbid(unsafe_code)]

//! Sparse frame buffer.
//!
//! Frames arrive in forward ranges, so the buffer fills in left-to-right
//! runs even though the map itself is sparse. The contiguous-run scans
//! below rely on that fill pattern only for efficiency, not correctness.

use std::collections::BTreeMap;

/// Sparse mapping from frame index to rendered frame text.
///
/// Grows monotonically: an index, once filled, is never removed and never
/// overwritten with a different payload.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: BTreeMap<u64, String>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent fill: a later insert for an already-present index is
    /// ignored, keeping the first payload.
    pub fn insert(&mut self, index: u64, text: String) {
        self.frames.entry(index).or_insert(text);
    }

    /// Merge a fetched batch. Duplicate indices keep their existing payload.
    pub fn merge(&mut self, batch: BTreeMap<u64, String>) {
        for (index, text) in batch {
            self.insert(index, text);
        }
    }

    pub fn get(&self, index: u64) -> Option<&str> {
        self.frames.get(&index).map(String::as_str)
    }

    pub fn contains(&self, index: u64) -> bool {
        self.frames.contains_key(&index)
    }

    /// Length of the contiguous run of buffered frames starting exactly at
    /// `position`, scanning forward and stopping at the first gap or at
    /// `total`. 0 if `position` itself is missing or lies at or past
    /// `total`; seeks beyond the advisory frame count are valid reads.
    pub fn preloaded_from(&self, position: u64, total: u64) -> u64 {
        if position >= total {
            return 0;
        }
        let mut expected = position;
        for &index in self.frames.range(position..total).map(|(i, _)| i) {
            if index != expected {
                break;
            }
            expected += 1;
        }
        expected - position
    }

    /// First index at or after `position` that is not yet buffered, capped
    /// at `total` when the buffer is contiguously filled to the end.
    pub fn next_gap(&self, position: u64, total: u64) -> u64 {
        position + self.preloaded_from(position, total)
    }

    /// Best-effort window `[position, position + count)`; missing frames
    /// are holes the caller must tolerate.
    pub fn window(&self, position: u64, count: u64) -> Vec<Option<String>> {
        (position..position.saturating_add(count))
            .map(|i| self.frames.get(&i).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(range: std::ops::Range<u64>) -> FrameBuffer {
        let mut buf = FrameBuffer::new();
        for i in range {
            buf.insert(i, format!("frame {i}"));
        }
        buf
    }

    #[test]
    fn insert_is_idempotent() {
        let mut buf = FrameBuffer::new();
        buf.insert(7, "first".to_string());
        buf.insert(7, "second".to_string());
        assert_eq!(buf.get(7), Some("first"));
        assert_eq!(buf.preloaded_from(7, 100), 1);
    }

    #[test]
    fn merge_does_not_overwrite_existing_frames() {
        let mut buf = filled(0..3);
        let batch = BTreeMap::from([(2, "other".to_string()), (3, "frame 3".to_string())]);
        buf.merge(batch);
        assert_eq!(buf.get(2), Some("frame 2"));
        assert_eq!(buf.get(3), Some("frame 3"));
    }

    #[test]
    fn preloaded_is_zero_when_position_missing() {
        let buf = filled(10..20);
        assert_eq!(buf.preloaded_from(5, 100), 0);
        assert_eq!(buf.next_gap(5, 100), 5);
    }

    #[test]
    fn preloaded_counts_run_up_to_first_gap() {
        let mut buf = filled(0..50);
        buf.insert(60, "island".to_string());
        assert_eq!(buf.preloaded_from(0, 100), 50);
        assert_eq!(buf.preloaded_from(45, 100), 5);
        assert_eq!(buf.next_gap(45, 100), 50);
    }

    #[test]
    fn scan_stops_at_total_when_filled_to_end() {
        let buf = filled(90..100);
        assert_eq!(buf.preloaded_from(90, 100), 10);
        assert_eq!(buf.next_gap(90, 100), 100);
        // Frames past total are out of range for the scan.
        let over = filled(90..110);
        assert_eq!(over.preloaded_from(90, 100), 10);
    }

    #[test]
    fn scan_past_total_is_empty() {
        let buf = filled(0..50);
        assert_eq!(buf.preloaded_from(100, 100), 0);
        assert_eq!(buf.preloaded_from(150, 100), 0);
        assert_eq!(buf.next_gap(150, 100), 150);
    }

    #[test]
    fn window_marks_missing_frames_as_holes() {
        let buf = filled(0..3);
        let window = buf.window(1, 4);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].as_deref(), Some("frame 1"));
        assert_eq!(window[1].as_deref(), Some("frame 2"));
        assert_eq!(window[2], None);
        assert_eq!(window[3], None);
    }

    /// Reference implementation: linear index-by-index scan.
    fn reference_preloaded(buf: &FrameBuffer, position: u64, total: u64) -> u64 {
        if !buf.contains(position) {
            return 0;
        }
        let mut count = 0;
        for i in position..total {
            if !buf.contains(i) {
                break;
            }
            count += 1;
        }
        count
    }

    #[test]
    fn scan_matches_reference_on_randomly_punched_buffers() {
        // Deterministic LCG so failures are reproducible.
        let mut seed: u64 = 0x5DEECE66D;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        for _ in 0..200 {
            let total = 1 + next() % 128;
            let mut buf = FrameBuffer::new();
            for i in 0..total {
                // ~75% fill, punched with random holes.
                if next() % 4 != 0 {
                    buf.insert(i, format!("frame {i}"));
                }
            }

            for position in 0..total {
                let expected = reference_preloaded(&buf, position, total);
                assert_eq!(
                    buf.preloaded_from(position, total),
                    expected,
                    "position {position}, total {total}"
                );
                assert_eq!(buf.next_gap(position, total), position + expected);
            }
        }
    }
}
