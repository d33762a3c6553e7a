//! Label reconstruction from OCR word geometry.
//!
//! The OCR engine reports individual word boxes; on-screen captions are
//! usually several words. Words on one line are merged back into labels by
//! gap width: a gap wider than the configured word spacing means a new UI
//! string, anything tighter is the same caption continuing.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{Error, Result};
use crate::geom::{Point, Rect};
use crate::hocr;

/// One merged run of OCR words: a single on-screen caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub bounds: Rect,
    pub text: String,
}

/// Merge one line's words into labels.
///
/// Words are processed in ordinal order. A word whose left edge, less the
/// word spacing, exceeds the current label's right edge starts a new label;
/// otherwise its text is appended and the box widens to cover it at the
/// current label's height.
pub fn merge_words(words: &[hocr::Word], word_spacing: u32) -> Vec<Label> {
    let mut words: Vec<&hocr::Word> = words.iter().collect();
    words.sort_by_key(|w| w.ordinal);

    let mut labels: Vec<Label> = Vec::new();
    for word in words {
        match labels.last_mut() {
            Some(current) if word.bounds.x - word_spacing as i32 <= current.bounds.right() => {
                current.text = format!("{} {}", current.text, word.text);
                current.bounds.width = word.bounds.right() - current.bounds.x;
            }
            _ => labels.push(Label {
                bounds: word.bounds,
                text: word.text.clone(),
            }),
        }
    }
    labels
}

/// Merge every line of a parsed document.
pub fn labels_from_lines(lines: &[hocr::Line], word_spacing: u32) -> Vec<Label> {
    lines
        .iter()
        .flat_map(|line| merge_words(&line.words, word_spacing))
        .collect()
}

/// Center-point index over the labels of one OCR pass.
///
/// Keys are label centers in OCR-image space; `multiplier` records the
/// upscale factor that space was produced at, so consumers can map points
/// back to screen coordinates. Entries keep insertion order (line by line,
/// left to right), which is what makes "the Nth matching label" meaningful.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    entries: Vec<(Point, String)>,
    multiplier: u32,
}

impl Default for LabelIndex {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LabelIndex {
    pub fn new(multiplier: u32) -> Self {
        Self {
            entries: Vec::new(),
            multiplier,
        }
    }

    pub fn from_labels(labels: Vec<Label>, multiplier: u32) -> Self {
        let mut index = Self::new(multiplier);
        for label in labels {
            index.insert(label.bounds.center(), label.text);
        }
        index
    }

    /// Insert a label at its center point.
    ///
    /// On a key collision the incoming x is nudged by +1 so both labels stay
    /// retrievable. A further collision at the nudged point is last-write-
    /// wins.
    pub fn insert(&mut self, mut center: Point, text: String) {
        if self.get(center).is_some() {
            center.x += 1;
        }
        match self.entries.iter_mut().find(|(p, _)| *p == center) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((center, text)),
        }
    }

    pub fn get(&self, center: Point) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == center)
            .map(|(_, t)| t.as_str())
    }

    /// The upscale factor the OCR input image was produced at.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point, &str)> {
        self.entries.iter().map(|(p, t)| (*p, t.as_str()))
    }

    /// Center points whose label matches the pattern, in insertion order.
    pub fn matching_points<'a>(&'a self, re: &'a regex::Regex) -> impl Iterator<Item = Point> + 'a {
        self.iter()
            .filter(|(_, text)| label_matches(re, text))
            .map(|(p, _)| p)
    }

    /// Diagnostic dump: every label longer than two characters, one per line.
    pub fn dump(&self) -> String {
        self.entries
            .iter()
            .filter(|(_, t)| t.chars().count() > 2)
            .map(|(_, t)| t.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lowercase and strip combining diacritical marks (canonical decomposition,
/// then drop non-spacing marks). Applied to both labels and patterns so
/// matching ignores case and accents.
pub fn fold_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Compile a label pattern, folded the same way labels are.
pub fn label_pattern(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(&fold_text(pattern))
        .map_err(|e| Error::InvalidInput(format!("bad label pattern {pattern:?}: {e}")))
}

pub fn label_matches(re: &regex::Regex, label: &str) -> bool {
    re.is_match(&fold_text(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(ordinal: u32, x: i32, y: i32, w: i32, h: i32, text: &str) -> hocr::Word {
        hocr::Word {
            ordinal,
            bounds: Rect::new(x, y, w, h),
            text: text.to_string(),
        }
    }

    #[test]
    fn close_words_merge_into_one_label() {
        let words = [word(1, 10, 0, 40, 10, "Hello"), word(2, 52, 0, 30, 10, "World")];
        let labels = merge_words(&words, 25);
        assert_eq!(
            labels,
            vec![Label {
                bounds: Rect::new(10, 0, 72, 10),
                text: "Hello World".to_string(),
            }]
        );
    }

    #[test]
    fn a_visible_gap_starts_a_new_label() {
        let words = [word(1, 10, 0, 40, 10, "Hello"), word(2, 100, 0, 30, 10, "World")];
        let labels = merge_words(&words, 25);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text, "Hello");
        assert_eq!(labels[1].text, "World");
        assert_ne!(labels[0].bounds.center(), labels[1].bounds.center());
    }

    #[test]
    fn gap_equal_to_the_spacing_still_merges() {
        // Left edge minus spacing must *exceed* the right edge to split.
        let words = [word(1, 0, 0, 50, 10, "a"), word(2, 75, 0, 10, 10, "b")];
        assert_eq!(merge_words(&words, 25).len(), 1);

        let words = [word(1, 0, 0, 50, 10, "a"), word(2, 76, 0, 10, 10, "b")];
        assert_eq!(merge_words(&words, 25).len(), 2);
    }

    #[test]
    fn words_merge_in_ordinal_order_not_input_order() {
        let words = [word(2, 52, 0, 30, 10, "World"), word(1, 10, 0, 40, 10, "Hello")];
        let labels = merge_words(&words, 25);
        assert_eq!(labels[0].text, "Hello World");
    }

    #[test]
    fn merge_is_idempotent_over_its_own_output() {
        let words = [
            word(1, 10, 0, 40, 10, "Hello"),
            word(2, 52, 0, 30, 10, "World"),
            word(3, 200, 0, 30, 10, "Quit"),
        ];
        let first = merge_words(&words, 25);

        let refed: Vec<hocr::Word> = first
            .iter()
            .enumerate()
            .map(|(i, label)| hocr::Word {
                ordinal: i as u32 + 1,
                bounds: label.bounds,
                text: label.text.clone(),
            })
            .collect();
        let second = merge_words(&refed, 25);
        assert_eq!(first, second);
    }

    #[test]
    fn colliding_centers_are_nudged_right() {
        let mut index = LabelIndex::new(1);
        index.insert(Point::new(5, 5), "first".into());
        index.insert(Point::new(5, 5), "second".into());
        assert_eq!(index.get(Point::new(5, 5)), Some("first"));
        assert_eq!(index.get(Point::new(6, 5)), Some("second"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn a_third_collision_is_last_write_wins() {
        let mut index = LabelIndex::new(1);
        index.insert(Point::new(5, 5), "first".into());
        index.insert(Point::new(5, 5), "second".into());
        index.insert(Point::new(5, 5), "third".into());
        assert_eq!(index.get(Point::new(5, 5)), Some("first"));
        assert_eq!(index.get(Point::new(6, 5)), Some("third"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn matching_ignores_case_and_diacritics() {
        let re = label_pattern("ulozit").unwrap();
        assert!(label_matches(&re, "Uložit"));
        assert!(label_matches(&re, "ULOŽIT soubor"));
        assert!(!label_matches(&re, "Storno"));

        // The pattern side is folded too.
        let re = label_pattern("ULOŽIT").unwrap();
        assert!(label_matches(&re, "ulozit"));
    }

    #[test]
    fn dump_skips_short_labels() {
        let mut index = LabelIndex::new(1);
        index.insert(Point::new(0, 0), "OK".into());
        index.insert(Point::new(10, 0), "Cancel".into());
        index.insert(Point::new(20, 0), "Apply".into());
        assert_eq!(index.dump(), "Cancel\nApply");
    }

    #[test]
    fn bad_pattern_is_invalid_input() {
        assert!(matches!(label_pattern("("), Err(Error::InvalidInput(_))));
    }
}
