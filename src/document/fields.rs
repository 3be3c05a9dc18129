use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{Html, Selector};

use super::{collapse_whitespace, collapsed_text, detach, element, BLOCKS};

static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static BYLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^by[:\s]+([\w\-'".\s]+)"#).unwrap());

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
/// Paragraphs after the title that may hold a byline.
const BYLINE_SCAN: usize = 3;

/// Remove and return the first heading, or failing that the first non-blank paragraph.
pub fn take_title(doc: &mut Html, root: NodeId) -> Option<String> {
    let root_el = element(doc, root)?;
    let (id, text) = root_el
        .select(&HEADINGS)
        .next()
        .or_else(|| {
            root_el
                .select(&PARAGRAPH)
                .find(|p| !collapsed_text(*p).is_empty())
        })
        .map(|el| (el.id(), collapsed_text(el)))?;

    detach(doc, id);
    (!text.is_empty()).then_some(text)
}

/// A heading that opens the remaining body. It stays in place.
pub fn find_subtitle(doc: &Html, root: NodeId) -> Option<String> {
    let first = element(doc, root)?
        .select(&BLOCKS)
        .find(|el| !collapsed_text(*el).is_empty())?;
    if !HEADING_TAGS.contains(&first.value().name()) {
        return None;
    }
    Some(collapsed_text(first))
}

/// Remove and return a "By <name>" line from the first few paragraphs.
pub fn take_author(doc: &mut Html, root: NodeId) -> Option<String> {
    let (id, name) = element(doc, root)?
        .select(&PARAGRAPH)
        .take(BYLINE_SCAN)
        .find_map(|p| {
            let text = collapsed_text(p);
            let caps = BYLINE_RE.captures(&text)?;
            Some((p.id(), clean_author(&caps[1])))
        })?;

    detach(doc, id);
    (!name.is_empty()).then_some(name)
}

fn clean_author(raw: &str) -> String {
    collapse_whitespace(raw)
        .trim_matches(|c: char| " .,:;'\"".contains(c))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byline_variants() {
        for (line, expected) in [
            ("By Jane Smith", "Jane Smith"),
            ("by: John  Q. Public.", "John Q. Public"),
            ("BY   Mary-Kate O'Hara, Staff Writer", "Mary-Kate O'Hara"),
        ] {
            let caps = BYLINE_RE.captures(line).expect(line);
            assert_eq!(clean_author(&caps[1]), expected, "line: {}", line);
        }
    }

    #[test]
    fn byline_needs_separator() {
        assert!(BYLINE_RE.captures("Byron Hill spoke first").is_none());
        assert!(BYLINE_RE.captures("Written by Jane").is_none());
    }

    #[test]
    fn blank_heading_is_consumed_but_not_a_title() {
        let mut doc = Html::parse_document("<body><h1> </h1><p>Text</p></body>");
        let root = doc.select(&Selector::parse("body").unwrap()).next().unwrap().id();
        assert_eq!(take_title(&mut doc, root), None);
        assert_eq!(element(&doc, root).unwrap().inner_html(), "<p>Text</p>");
    }
}
