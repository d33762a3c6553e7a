//! hOCR output parsing.
//!
//! The OCR tool writes an HTML-like document where recognized text hangs off
//! `<span>` elements: `class="ocr_line"` opens a line, `class="ocrx_word"`
//! carries one word with its bounding box. Because every word span follows
//! its line span in document order, a single linear scan over the span tags
//! is enough; no HTML tree is built.
//!
//! Element ids end in `_<ordinal>` (exactly one underscore), which encodes a
//! word's position within its line. The `title` attribute carries the pixel
//! bounding box: `bbox x1 y1 x2 y2`, optionally followed by `;`-separated
//! engine extras.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::geom::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub ordinal: u32,
    pub bounds: Rect,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub ordinal: u32,
    pub words: Vec<Word>,
}

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span\b[^>]*\bclass=['"](ocr_line|ocrx_word)['"][^>]*>"#).expect("span regex")
});
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid=['"]([^'"]*)['"]"#).expect("id regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\btitle=['"]([^'"]*)['"]"#).expect("title regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// Parse a whole hOCR document into its line/word hierarchy.
///
/// An empty document (or one without any line span) parses to an empty list;
/// "no text found" is a valid OCR outcome, not an error.
pub fn parse_document(hocr: &str) -> Result<Vec<Line>> {
    let mut lines: Vec<Line> = Vec::new();

    for caps in SPAN_RE.captures_iter(hocr) {
        let tag = caps.get(0).expect("whole match");
        let class = caps.get(1).expect("class group").as_str();
        let id = attr(tag.as_str(), &ID_RE)
            .ok_or_else(|| Error::InvalidInput(format!("{class} span without id")))?;
        let ordinal = parse_ordinal(id)?;

        match class {
            "ocr_line" => lines.push(Line {
                ordinal,
                words: Vec::new(),
            }),
            "ocrx_word" => {
                let title = attr(tag.as_str(), &TITLE_RE)
                    .ok_or_else(|| Error::InvalidInput(format!("word {id:?} without title")))?;
                let bounds = parse_bbox(title)?;
                let text = inner_text(&hocr[tag.end()..]);
                let Some(line) = lines.last_mut() else {
                    return Err(Error::InvalidInput(format!(
                        "word {id:?} appears before any line"
                    )));
                };
                line.words.push(Word {
                    ordinal,
                    bounds,
                    text,
                });
            }
            _ => unreachable!("regex only matches the two classes"),
        }
    }

    Ok(lines)
}

/// Extract the trailing ordinal from an element id of the form
/// `<name>_<ordinal>`. Anything else (no separator, extra segments, or a
/// non-numeric tail) is malformed.
pub fn parse_ordinal(id: &str) -> Result<u32> {
    let mut parts = id.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(tail), None) => tail.parse().map_err(|_| {
            Error::InvalidInput(format!("id {id:?} has a non-numeric ordinal {tail:?}"))
        }),
        _ => Err(Error::InvalidInput(format!(
            "id {id:?} is not of the form <name>_<ordinal>"
        ))),
    }
}

fn attr<'a>(tag: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(tag).map(|c| c.get(1).expect("attr group").as_str())
}

/// `bbox x1 y1 x2 y2` from a title attribute, ignoring `;`-separated extras.
fn parse_bbox(title: &str) -> Result<Rect> {
    let bbox = title.split(';').next().unwrap_or_default();
    let parts: Vec<&str> = bbox.split_whitespace().collect();
    if parts.len() != 5 || parts[0] != "bbox" {
        return Err(Error::InvalidInput(format!(
            "invalid box coordinates {title:?}"
        )));
    }

    let mut nums = [0i32; 4];
    for (slot, part) in nums.iter_mut().zip(&parts[1..]) {
        *slot = part
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid box coordinates {title:?}")))?;
    }
    let [x1, y1, x2, y2] = nums;
    Ok(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

/// Text content of a word span: everything up to the closing tag, with any
/// nested markup stripped and basic entities decoded.
fn inner_text(rest: &str) -> String {
    let end = rest.find("</span>").unwrap_or(rest.len());
    let stripped = TAG_RE.replace_all(&rest[..end], "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_parses_the_trailing_number() {
        assert_eq!(parse_ordinal("line_7").unwrap(), 7);
        assert_eq!(parse_ordinal("word_123").unwrap(), 123);
    }

    #[test]
    fn ordinal_rejects_malformed_ids() {
        assert!(matches!(parse_ordinal("line"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_ordinal("a_b_c"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_ordinal("line_x"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn bbox_parses_corner_coordinates_into_a_rect() {
        assert_eq!(parse_bbox("bbox 10 0 50 10").unwrap(), Rect::new(10, 0, 40, 10));
        assert_eq!(
            parse_bbox("bbox 5 6 25 16; x_wconf 96").unwrap(),
            Rect::new(5, 6, 20, 10)
        );
        assert!(parse_bbox("bbox 10 0 50").is_err());
        assert!(parse_bbox("10 0 50 10 20").is_err());
    }

    #[test]
    fn document_scan_attaches_words_to_their_line() {
        let doc = r#"
            <div class='ocr_page' id='page_1'>
              <span class='ocr_line' id='line_1' title='bbox 0 0 100 12'>
                <span class='ocrx_word' id='word_1' title='bbox 10 0 50 10'>Hello</span>
                <span class='ocrx_word' id='word_2' title='bbox 52 0 82 10'><strong>W&amp;rld</strong></span>
              </span>
              <span class='ocr_line' id='line_2' title='bbox 0 20 100 32'>
                <span class='ocrx_word' id='word_3' title='bbox 4 20 40 30'>Quit</span>
              </span>
            </div>"#;

        let lines = parse_document(doc).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].words.len(), 2);
        assert_eq!(lines[0].words[0].text, "Hello");
        assert_eq!(lines[0].words[1].text, "W&rld");
        assert_eq!(lines[0].words[1].bounds, Rect::new(52, 0, 30, 10));
        assert_eq!(lines[1].ordinal, 2);
        assert_eq!(lines[1].words[0].text, "Quit");
    }

    #[test]
    fn empty_document_parses_to_no_lines() {
        assert!(parse_document("").unwrap().is_empty());
        assert!(parse_document("<div class='ocr_page' id='page_1'></div>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn word_before_any_line_is_malformed() {
        let doc = r#"<span class='ocrx_word' id='word_1' title='bbox 0 0 5 5'>x</span>"#;
        assert!(matches!(parse_document(doc), Err(Error::InvalidInput(_))));
    }
}
