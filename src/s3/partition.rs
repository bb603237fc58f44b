//! Splits a byte range into a fixed number of contiguous parts.

pub const TOTAL_PARTS: usize = 10;
// s3 rejects any part but the last below this size
pub const MIN_PART_SIZE_5MB: u64 = 5_242_880;

/// Half-open byte range `[start, end)` of the source file sent as one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    pub part_number: i32,
    pub start: u64,
    pub end: u64,
}

impl PartRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// Cuts `[0, file_size)` into `parts` ranges of `file_size / parts` bytes.
/// The last range absorbs the remainder. Files smaller than `parts` bytes get
/// zero-length leading ranges.
pub fn partition(file_size: u64, parts: usize) -> Vec<PartRange> {
    if parts == 0 {
        return Vec::new();
    }
    let part_size = file_size / parts as u64;

    (1..=parts)
        .map(|i| {
            let start = (i as u64 - 1) * part_size;
            let end = if i == parts {
                file_size
            } else {
                i as u64 * part_size
            };
            PartRange {
                part_number: i as i32,
                start,
                end,
            }
        })
        .collect()
}

/// Ranges other than the last that a strict store will refuse.
pub fn undersized_parts(ranges: &[PartRange]) -> Vec<PartRange> {
    match ranges.split_last() {
        Some((_, leading)) => leading
            .iter()
            .filter(|range| range.len() < MIN_PART_SIZE_5MB)
            .copied()
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[PartRange], file_size: u64) {
        assert_eq!(ranges.len(), TOTAL_PARTS);
        assert_eq!(ranges[0].start, 0);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].part_number + 1, pair[1].part_number);
        }
        assert_eq!(ranges.last().unwrap().end, file_size);
        assert_eq!(ranges.iter().map(PartRange::len).sum::<u64>(), file_size);
    }

    #[test]
    fn even_split() {
        let ranges = partition(100, TOTAL_PARTS);
        assert_covers(&ranges, 100);
        for (i, range) in ranges.iter().enumerate() {
            assert_eq!(range.part_number, i as i32 + 1);
            assert_eq!(range.start, i as u64 * 10);
            assert_eq!(range.end, (i as u64 + 1) * 10);
        }
    }

    #[test]
    fn last_part_takes_remainder() {
        let ranges = partition(105, TOTAL_PARTS);
        assert_covers(&ranges, 105);
        assert!(ranges[..9].iter().all(|r| r.len() == 10));
        assert_eq!((ranges[9].start, ranges[9].end), (90, 105));
    }

    #[test]
    fn coverage_holds_across_sizes() {
        for file_size in (0..300).chain([1 << 20, (1 << 30) + 7, u32::MAX as u64 * 3]) {
            assert_covers(&partition(file_size, TOTAL_PARTS), file_size);
        }
    }

    #[test]
    fn tiny_file_gets_empty_leading_parts() {
        let ranges = partition(7, TOTAL_PARTS);
        assert!(ranges[..9].iter().all(|r| r.len() == 0));
        assert_eq!((ranges[9].start, ranges[9].end), (0, 7));
    }

    #[test]
    fn zero_parts() {
        assert!(partition(100, 0).is_empty());
    }

    #[test]
    fn flags_parts_below_store_minimum() {
        assert_eq!(undersized_parts(&partition(100, TOTAL_PARTS)).len(), 9);
        assert!(undersized_parts(&partition(MIN_PART_SIZE_5MB * 10, TOTAL_PARTS)).is_empty());
        assert!(undersized_parts(&[]).is_empty());
    }
}
