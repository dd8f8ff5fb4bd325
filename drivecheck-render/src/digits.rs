//! Seven-segment digit layout.
//!
//! Segment bits, lowest first: a (top), b (upper right), c (lower right),
//! d (bottom), e (lower left), f (upper left), g (middle).

const SEGMENTS: [u8; 10] = [
    0b011_1111, // 0
    0b000_0110, // 1
    0b101_1011, // 2
    0b100_1111, // 3
    0b110_0110, // 4
    0b110_1101, // 5
    0b111_1101, // 6
    0b000_0111, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

pub fn mask(digit: u32) -> Option<u8> {
    SEGMENTS.get(digit as usize).copied()
}

/// Rectangles `(x, y, w, h)` of the lit segments of a digit cell at `(x, y)`
/// that is `w` wide and `2w` tall.
pub fn segment_rects(mask: u8, x: f32, y: f32, w: f32) -> Vec<(f32, f32, f32, f32)> {
    let h = w * 2.0;
    let t = w * 0.18;
    let half = h / 2.0;
    let bar = w - 2.0 * t;
    let post = half - 1.5 * t;
    let layout = [
        (x + t, y, bar, t),
        (x + w - t, y + t, t, post),
        (x + w - t, y + half + t / 2.0, t, post),
        (x + t, y + h - t, bar, t),
        (x, y + half + t / 2.0, t, post),
        (x, y + t, t, post),
        (x + t, y + half - t / 2.0, bar, t),
    ];
    layout
        .into_iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, rect)| rect)
        .collect()
}

/// Total width of `value` drawn with digit width `w`.
pub fn number_width(value: u32, w: f32) -> f32 {
    let count = value.to_string().len() as f32;
    count * w + (count - 1.0) * w * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_counts_match_the_usual_display() {
        let counts: Vec<usize> = (0..10)
            .map(|d| segment_rects(mask(d).unwrap(), 0.0, 0.0, 10.0).len())
            .collect();
        assert_eq!(counts, vec![6, 2, 5, 5, 4, 5, 6, 3, 7, 6]);
        assert_eq!(mask(10), None);
    }

    #[test]
    fn segments_stay_inside_the_cell() {
        for (x, y, w, h) in segment_rects(mask(8).unwrap(), 5.0, 7.0, 20.0) {
            assert!(x >= 5.0 && x + w <= 25.0 + 1e-4);
            assert!(y >= 7.0 && y + h <= 47.0 + 1e-4);
        }
    }

    #[test]
    fn width_grows_with_digit_count() {
        assert_eq!(number_width(7, 10.0), 10.0);
        assert_eq!(number_width(42, 10.0), 24.0);
    }
}
