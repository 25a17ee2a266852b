//! Streaming tag-depth scanner for anchor safety.
//!
//! One linear pass over an HTML fragment records two kinds of protected byte
//! spans:
//!
//! - **markup**: every tag (`<...>`, quote-aware), comment, and declaration,
//!   plus the whole body of raw-text elements (`script`, `style`, `textarea`,
//!   `title`) up to their closing tag;
//! - **anchored**: everything between an `<a ...>` that opens anchor depth
//!   and the `</a>` that closes it again.
//!
//! A candidate match overlapping either kind must never be wrapped. Anchor
//! depth never goes below zero, so stray `</a>` tags are ignored, and a
//! self-closing `<a/>` leaves depth unchanged. A `<` that cannot start a tag
//! is treated as literal text. An unterminated tag swallows the rest of the
//! input.

use std::ops::Range;

/// What kind of markup a scanned tag is, as far as anchor depth cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    AnchorOpen,
    AnchorClose,
    /// Opening tag of an element whose body is not text content.
    RawText,
    Other,
}

#[derive(Debug, Clone)]
struct Tag {
    end: usize,
    kind: TagKind,
    name: Range<usize>,
}

/// Protected spans of one content string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorMap {
    markup: Vec<Range<usize>>,
    anchored: Vec<Range<usize>>,
}

impl AnchorMap {
    /// Scan `content` once and build the protected-span map.
    pub fn scan(content: &str) -> Self {
        let bytes = content.as_bytes();
        let mut map = Self::default();
        let mut depth = 0usize;
        let mut anchored_start = 0usize;
        let mut i = 0usize;

        while i < bytes.len() {
            if bytes[i] != b'<' {
                i += 1;
                continue;
            }
            let Some(tag) = read_tag(bytes, i) else {
                i += 1;
                continue;
            };

            if tag.kind == TagKind::RawText {
                let end = raw_text_end(bytes, tag.end, &bytes[tag.name.clone()]);
                map.markup.push(i..end);
                i = end;
                continue;
            }

            map.markup.push(i..tag.end);
            match tag.kind {
                TagKind::AnchorOpen => {
                    if depth == 0 {
                        anchored_start = tag.end;
                    }
                    depth += 1;
                }
                TagKind::AnchorClose if depth > 0 => {
                    depth -= 1;
                    if depth == 0 && anchored_start < i {
                        map.anchored.push(anchored_start..i);
                    }
                }
                _ => {}
            }
            i = tag.end;
        }

        if depth > 0 && anchored_start < bytes.len() {
            map.anchored.push(anchored_start..bytes.len());
        }

        map
    }

    /// Whether `offset` lies inside the content of an open anchor.
    pub fn inside_anchor(&self, offset: usize) -> bool {
        contains(&self.anchored, offset)
    }

    /// Whether `range` touches markup or existing anchor content.
    pub fn is_protected(&self, range: &Range<usize>) -> bool {
        overlaps(&self.markup, range) || overlaps(&self.anchored, range)
    }

    /// Whether `range` touches tag markup. Anchor text is not considered.
    pub fn overlaps_markup(&self, range: &Range<usize>) -> bool {
        overlaps(&self.markup, range)
    }
}

/// Convenience check: is `offset` inside an existing anchor in `content`?
pub fn is_inside_existing_anchor(content: &str, offset: usize) -> bool {
    AnchorMap::scan(content).inside_anchor(offset)
}

fn contains(spans: &[Range<usize>], offset: usize) -> bool {
    let idx = spans.partition_point(|s| s.end <= offset);
    spans.get(idx).is_some_and(|s| s.start <= offset)
}

fn overlaps(spans: &[Range<usize>], range: &Range<usize>) -> bool {
    let idx = spans.partition_point(|s| s.end <= range.start);
    spans.get(idx).is_some_and(|s| s.start < range.end)
}

/// Try to read a tag starting at `start` (which holds `<`).
fn read_tag(bytes: &[u8], start: usize) -> Option<Tag> {
    let next = *bytes.get(start + 1)?;
    match next {
        b'!' => {
            if bytes[start..].starts_with(b"<!--") {
                let end = find(bytes, start + 4, b"-->")
                    .map(|p| p + 3)
                    .unwrap_or(bytes.len());
                Some(Tag {
                    end,
                    kind: TagKind::Other,
                    name: start..start,
                })
            } else {
                Some(Tag {
                    end: tag_end(bytes, start + 2),
                    kind: TagKind::Other,
                    name: start..start,
                })
            }
        }
        b'?' => Some(Tag {
            end: tag_end(bytes, start + 2),
            kind: TagKind::Other,
            name: start..start,
        }),
        b'/' => {
            let name_start = start + 2;
            if !bytes.get(name_start)?.is_ascii_alphabetic() {
                return None;
            }
            let name_end = name_end(bytes, name_start);
            let kind = if is_anchor_name(&bytes[name_start..name_end]) {
                TagKind::AnchorClose
            } else {
                TagKind::Other
            };
            Some(Tag {
                end: tag_end(bytes, name_end),
                kind,
                name: name_start..name_end,
            })
        }
        c if c.is_ascii_alphabetic() => {
            let name_start = start + 1;
            let name_end = name_end(bytes, name_start);
            let end = tag_end(bytes, name_end);
            let self_closing = end >= 2 && bytes[end - 1] == b'>' && bytes[end - 2] == b'/';
            let name = &bytes[name_start..name_end];
            let kind = if self_closing {
                TagKind::Other
            } else if is_anchor_name(name) {
                TagKind::AnchorOpen
            } else if is_raw_text_name(name) {
                TagKind::RawText
            } else {
                TagKind::Other
            };
            Some(Tag {
                end,
                kind,
                name: name_start..name_end,
            })
        }
        _ => None,
    }
}

fn is_anchor_name(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"a")
}

fn is_raw_text_name(name: &[u8]) -> bool {
    [&b"script"[..], b"style", b"textarea", b"title"]
        .iter()
        .any(|raw| name.eq_ignore_ascii_case(raw))
}

/// End of a raw-text element whose body starts at `from`: one past the `>`
/// of the first matching close tag, or the end of input if it never closes.
fn raw_text_end(bytes: &[u8], from: usize, name: &[u8]) -> usize {
    let mut at = from;
    while let Some(close) = find(bytes, at, b"</") {
        let name_start = close + 2;
        let name_stop = name_end(bytes, name_start);
        if bytes[name_start..name_stop].eq_ignore_ascii_case(name) {
            return tag_end(bytes, name_stop);
        }
        at = name_start;
    }
    bytes.len()
}

fn name_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'_')))
        .map(|p| from + p)
        .unwrap_or(bytes.len())
}

/// Index one past the closing `>`, skipping `>` inside quoted attribute values.
fn tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return from + offset + 1,
            None => {}
        }
    }
    bytes.len()
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap()
    }

    #[test]
    fn plain_text_has_no_protected_spans() {
        let map = AnchorMap::scan("Visit Claridge's and Sketch.");
        assert_eq!(map, AnchorMap::default());
        assert!(!map.is_protected(&(0..5)));
    }

    #[test]
    fn anchor_text_is_protected() {
        let html = r#"<p>Book <a href="https://x.example">Sketch</a> now, Sketch.</p>"#;
        let map = AnchorMap::scan(html);
        let first = offset_of(html, "Sketch");
        let second = html.rfind("Sketch").unwrap();
        assert!(map.inside_anchor(first));
        assert!(!map.inside_anchor(second));
        assert!(map.is_protected(&(first..first + 6)));
        assert!(!map.is_protected(&(second..second + 6)));
    }

    #[test]
    fn nested_markup_inside_anchor_stays_protected() {
        let html = r#"<a href="/x"><strong>The Shard</strong> tour</a> The Shard"#;
        let map = AnchorMap::scan(html);
        assert!(map.inside_anchor(offset_of(html, "The Shard")));
        assert!(map.inside_anchor(offset_of(html, "tour")));
        assert!(!map.inside_anchor(html.rfind("The Shard").unwrap()));
    }

    #[test]
    fn attribute_values_are_markup() {
        let html = r#"<img alt="Sketch > gallery" src="s.png"> Sketch"#;
        let map = AnchorMap::scan(html);
        let inside_attr = offset_of(html, "Sketch");
        assert!(map.overlaps_markup(&(inside_attr..inside_attr + 6)));
        let gallery = offset_of(html, "gallery");
        assert!(map.overlaps_markup(&(gallery..gallery + 7)));
        let text = html.rfind("Sketch").unwrap();
        assert!(!map.overlaps_markup(&(text..text + 6)));
    }

    #[test]
    fn attribute_containing_anchor_literal_does_not_open_depth() {
        let html = r#"<span title="<a href=x>">Hakkasan</span> Hakkasan"#;
        let map = AnchorMap::scan(html);
        assert!(!map.inside_anchor(offset_of(html, "Hakkasan")));
        assert!(!map.inside_anchor(html.rfind("Hakkasan").unwrap()));
    }

    #[test]
    fn abbr_and_article_are_not_anchors() {
        let html = "<abbr>V&amp;A</abbr> <article>Tate Modern</article>";
        let map = AnchorMap::scan(html);
        assert!(!map.inside_anchor(offset_of(html, "V&amp;A")));
        assert!(!map.inside_anchor(offset_of(html, "Tate")));
    }

    #[test]
    fn self_closing_anchor_leaves_depth_unchanged() {
        let html = r#"<a name="top"/> Somerset House"#;
        let map = AnchorMap::scan(html);
        assert!(!map.inside_anchor(offset_of(html, "Somerset")));
    }

    #[test]
    fn uppercase_anchor_tags_count() {
        let html = r#"<A HREF="/x">Mayfair</A> Mayfair"#;
        let map = AnchorMap::scan(html);
        assert!(map.inside_anchor(offset_of(html, "Mayfair")));
        assert!(!map.inside_anchor(html.rfind("Mayfair").unwrap()));
    }

    #[test]
    fn stray_close_tag_is_ignored() {
        let html = "</a> Soho <a href=\"/x\">Soho</a>";
        let map = AnchorMap::scan(html);
        assert!(!map.inside_anchor(offset_of(html, "Soho")));
        assert!(map.inside_anchor(html.rfind("Soho").unwrap()));
    }

    #[test]
    fn unclosed_anchor_protects_rest_of_content() {
        let html = r#"<a href="/x">Borough Market and Shoreditch"#;
        let map = AnchorMap::scan(html);
        assert!(map.inside_anchor(offset_of(html, "Shoreditch")));
    }

    #[test]
    fn comments_are_markup() {
        let html = "<!-- Sketch --> Sketch";
        let map = AnchorMap::scan(html);
        let comment = offset_of(html, "Sketch");
        assert!(map.overlaps_markup(&(comment..comment + 6)));
        let text = html.rfind("Sketch").unwrap();
        assert!(!map.overlaps_markup(&(text..text + 6)));
    }

    #[test]
    fn script_and_style_bodies_are_markup() {
        let html = r#"<script type="application/ld+json">{"name":"Sketch"}</script><STYLE>.Sketch{}</Style><p>Sketch</p>"#;
        let map = AnchorMap::scan(html);
        let json = offset_of(html, "Sketch");
        let css = offset_of(html, ".Sketch") + 1;
        let text = html.rfind("Sketch").unwrap();
        assert!(map.overlaps_markup(&(json..json + 6)));
        assert!(map.overlaps_markup(&(css..css + 6)));
        assert!(!map.is_protected(&(text..text + 6)));
    }

    #[test]
    fn raw_text_ignores_tags_until_its_own_close() {
        let html = "<textarea><a href=\"/x\"></b></textarea> Soho <title>Soho";
        let map = AnchorMap::scan(html);
        let open = offset_of(html, " Soho ") + 1;
        assert!(!map.is_protected(&(open..open + 4)));
        assert!(!map.inside_anchor(open));
        let unclosed = html.rfind("Soho").unwrap();
        assert!(map.overlaps_markup(&(unclosed..unclosed + 4)));
    }

    #[test]
    fn literal_less_than_is_text() {
        let html = "prices < £50 at Dishoom";
        let map = AnchorMap::scan(html);
        assert!(!map.is_protected(&(0..html.len())));
    }

    #[test]
    fn free_function_matches_map() {
        let html = r#"<a href="/x">Annabel's</a> Annabel's"#;
        assert!(is_inside_existing_anchor(html, offset_of(html, "Annabel's")));
        assert!(!is_inside_existing_anchor(html, html.rfind("Annabel's").unwrap()));
    }
}
