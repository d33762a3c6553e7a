//! Template matching: locate a reference bitmap inside a captured image.
//!
//! Two search modes over the same pair of buffers:
//! - [`find_exact`]: byte-for-byte, zero tolerance. Used for model images
//!   captured from the same rendering pipeline as the screenshot.
//! - [`find_partial`]: zero-mean normalized cross-correlation on grayscale,
//!   with a fixed acceptance threshold. Tolerates antialiasing and minor
//!   rendering differences.
//!
//! Both are pure functions. Absence is `Ok(None)`, never an error: the
//! caller decides whether a miss is fatal. Haystacks are bounded by a single
//! application window, so the quadratic scans are acceptable; any shortcut
//! must preserve first-match order and the center-point result.

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::pixel::PixelBuffer;

/// Minimum correlation score for a partial match, on the [-1, 1] scale.
const PARTIAL_MATCH_THRESHOLD: f32 = 0.7;

/// Byte-exact search for `needle` inside `haystack`.
///
/// Candidate top-left offsets are scanned column-band first (outer loop over
/// x, inner over y); the first candidate whose rows all compare equal wins.
/// Returns the needle's *center* at that offset.
pub fn find_exact(haystack: &PixelBuffer, needle: &PixelBuffer) -> Result<Option<Point>> {
    if !search_is_possible(haystack, needle)? {
        return Ok(None);
    }

    let (nw, nh) = (needle.width(), needle.height());
    for i in 0..=haystack.width() - nw {
        'candidate: for j in 0..=haystack.height() - nh {
            for k in 0..nh {
                if haystack.row_window(i, j + k, nw) != needle.row(k) {
                    continue 'candidate;
                }
            }
            return Ok(Some(center_at(i, j, needle)));
        }
    }
    Ok(None)
}

/// Correlation search for `needle` inside `haystack`.
///
/// Both buffers are converted to grayscale; the offset with the best
/// zero-mean normalized cross-correlation wins, and is accepted only when
/// its score exceeds [`PARTIAL_MATCH_THRESHOLD`]. Returns the needle's
/// center at that offset.
pub fn find_partial(haystack: &PixelBuffer, needle: &PixelBuffer) -> Result<Option<Point>> {
    if !search_is_possible(haystack, needle)? {
        return Ok(None);
    }

    match best_correlation(haystack, needle) {
        Some((top_left, score)) if score > PARTIAL_MATCH_THRESHOLD => Ok(Some(center_at(
            top_left.x as u32,
            top_left.y as u32,
            needle,
        ))),
        _ => Ok(None),
    }
}

/// Validate the pair and report whether any candidate offset exists.
///
/// A needle that cannot fit is a well-formed search with no candidates, not
/// an input error.
fn search_is_possible(haystack: &PixelBuffer, needle: &PixelBuffer) -> Result<bool> {
    if haystack.format() != needle.format() {
        return Err(Error::FormatMismatch {
            left: haystack.format(),
            right: needle.format(),
        });
    }
    if haystack.width() == 0 || haystack.height() == 0 || needle.width() == 0 || needle.height() == 0
    {
        return Err(Error::InvalidInput("empty pixel buffer".into()));
    }
    Ok(needle.width() <= haystack.width() && needle.height() <= haystack.height())
}

#[inline]
fn center_at(x: u32, y: u32, needle: &PixelBuffer) -> Point {
    Point::new(
        (x + needle.width() / 2) as i32,
        (y + needle.height() / 2) as i32,
    )
}

/// Best-scoring top-left offset and its correlation score.
///
/// Zero-variance windows carry no signal and are skipped; a zero-variance
/// needle therefore never matches anything.
pub(crate) fn best_correlation(
    haystack: &PixelBuffer,
    needle: &PixelBuffer,
) -> Option<(Point, f32)> {
    let hay = haystack.to_gray_image();
    let ndl = needle.to_gray_image();
    let (hw, hh) = (hay.width() as usize, hay.height() as usize);
    let (nw, nh) = (ndl.width() as usize, ndl.height() as usize);
    let hay = hay.as_raw();
    let ndl = ndl.as_raw();

    let n = (nw * nh) as f64;
    let ndl_mean = ndl.iter().map(|&v| v as f64).sum::<f64>() / n;
    let ndl_dev: Vec<f64> = ndl.iter().map(|&v| v as f64 - ndl_mean).collect();
    let ndl_sq: f64 = ndl_dev.iter().map(|d| d * d).sum();
    if ndl_sq == 0.0 {
        return None;
    }

    let mut best: Option<(Point, f32)> = None;
    for j in 0..=hh - nh {
        for i in 0..=hw - nw {
            let mut sum = 0.0f64;
            for k in 0..nh {
                for l in 0..nw {
                    sum += hay[(j + k) * hw + i + l] as f64;
                }
            }
            let mean = sum / n;

            let mut cross = 0.0f64;
            let mut win_sq = 0.0f64;
            for k in 0..nh {
                for l in 0..nw {
                    let d = hay[(j + k) * hw + i + l] as f64 - mean;
                    cross += d * ndl_dev[k * nw + l];
                    win_sq += d * d;
                }
            }
            if win_sq == 0.0 {
                continue;
            }

            let score = (cross / (win_sq * ndl_sq).sqrt()) as f32;
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((Point::new(i as i32, j as i32), score));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;

    /// Rgb24 buffer with equal channels, so luma equals the given value.
    fn gray_buffer(width: u32, height: u32, values: &[u8]) -> PixelBuffer {
        assert_eq!(values.len(), (width * height) as usize);
        let data = values.iter().flat_map(|&v| [v, v, v]).collect();
        PixelBuffer::new(width, height, PixelFormat::Rgb24, data).unwrap()
    }

    fn embed(base: &mut Vec<u8>, width: u32, needle: &[u8], nw: u32, at: (u32, u32)) {
        for (idx, &v) in needle.iter().enumerate() {
            let (dx, dy) = (idx as u32 % nw, idx as u32 / nw);
            base[((at.1 + dy) * width + at.0 + dx) as usize] = v;
        }
    }

    const NEEDLE: [u8; 4] = [200, 60, 60, 200];

    #[test]
    fn exact_match_returns_needle_center() {
        let mut pixels = vec![30u8; 8 * 6];
        embed(&mut pixels, 8, &NEEDLE, 2, (3, 1));
        let haystack = gray_buffer(8, 6, &pixels);
        let needle = gray_buffer(2, 2, &NEEDLE);

        let hit = find_exact(&haystack, &needle).unwrap();
        assert_eq!(hit, Some(Point::new(4, 2)));
    }

    #[test]
    fn exact_match_scans_column_bands_first() {
        // Copies at (2, 0) and (0, 2). A row-major scan would find the first;
        // the column-band scan reaches x=0 before x=2.
        let mut pixels = vec![30u8; 8 * 8];
        embed(&mut pixels, 8, &NEEDLE, 2, (2, 0));
        embed(&mut pixels, 8, &NEEDLE, 2, (0, 2));
        let haystack = gray_buffer(8, 8, &pixels);
        let needle = gray_buffer(2, 2, &NEEDLE);

        let hit = find_exact(&haystack, &needle).unwrap();
        assert_eq!(hit, Some(Point::new(1, 3)));
    }

    #[test]
    fn exact_match_never_reports_a_near_miss() {
        let mut pixels = vec![30u8; 8 * 6];
        let mut off_by_one = NEEDLE;
        off_by_one[3] = 201;
        embed(&mut pixels, 8, &off_by_one, 2, (3, 1));
        let haystack = gray_buffer(8, 6, &pixels);
        let needle = gray_buffer(2, 2, &NEEDLE);

        assert_eq!(find_exact(&haystack, &needle).unwrap(), None);
    }

    #[test]
    fn oversized_needle_is_a_miss_not_an_error() {
        let haystack = gray_buffer(2, 2, &[0; 4]);
        let needle = gray_buffer(4, 4, &[0; 16]);
        assert_eq!(find_exact(&haystack, &needle).unwrap(), None);
        assert_eq!(find_partial(&haystack, &needle).unwrap(), None);
    }

    #[test]
    fn mismatched_formats_are_rejected() {
        let rgb = gray_buffer(4, 4, &[0; 16]);
        let rgba = PixelBuffer::from_rgba(4, 4, vec![0; 64]).unwrap();
        let err = find_exact(&rgb, &rgba).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { .. }));
        let err = find_partial(&rgba, &rgb).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { .. }));
    }

    #[test]
    fn empty_buffers_are_invalid_input() {
        let empty = gray_buffer(0, 4, &[]);
        let needle = gray_buffer(2, 2, &NEEDLE);
        let err = find_exact(&empty, &needle).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn partial_match_finds_an_embedded_copy() {
        let mut pixels = vec![30u8; 10 * 8];
        embed(&mut pixels, 10, &NEEDLE, 2, (4, 4));
        let haystack = gray_buffer(10, 8, &pixels);
        let needle = gray_buffer(2, 2, &NEEDLE);

        let hit = find_partial(&haystack, &needle).unwrap();
        assert_eq!(hit, Some(Point::new(5, 5)));
    }

    #[test]
    fn partial_score_degrades_as_the_copy_is_corrupted() {
        let needle = gray_buffer(2, 2, &NEEDLE);
        let score_with_corner = |corner: u8| {
            let mut pixels = vec![30u8; 10 * 8];
            let mut copy = NEEDLE;
            copy[0] = corner;
            embed(&mut pixels, 10, &copy, 2, (4, 4));
            let haystack = gray_buffer(10, 8, &pixels);
            best_correlation(&haystack, &needle).unwrap().1
        };

        let clean = score_with_corner(200);
        let mild = score_with_corner(180);
        let heavy = score_with_corner(160);
        assert!(clean > 0.999, "undamaged copy should score ~1, got {clean}");
        assert!(clean >= mild && mild >= heavy, "{clean} {mild} {heavy}");
        assert!(heavy > PARTIAL_MATCH_THRESHOLD);
    }

    #[test]
    fn partial_match_rejects_a_flat_haystack() {
        // Every window has zero variance, so nothing correlates.
        let haystack = gray_buffer(10, 8, &[50; 80]);
        let needle = gray_buffer(2, 2, &NEEDLE);
        assert_eq!(find_partial(&haystack, &needle).unwrap(), None);
    }
}
