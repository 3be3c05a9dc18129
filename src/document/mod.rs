pub mod clean;
pub mod fields;

use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, h1, h2, h3, h4, h5, h6").unwrap());

/// Cleaned article body plus the fields lifted out of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub body_html: String,
    pub plain_paragraphs: Vec<String>,
}

/// Four passes over converter HTML: clean → title → byline → prune.
pub fn normalize_html(html: &str) -> NormalizedContent {
    let mut doc = Html::parse_document(html);
    let root = content_root(&doc);

    clean::strip_presentation(&mut doc, root);
    let title = fields::take_title(&mut doc, root);
    let subtitle = fields::find_subtitle(&doc, root);
    let author = fields::take_author(&mut doc, root);
    clean::drop_empty_paragraphs(&mut doc, root);

    let body_html = element(&doc, root)
        .map(|el| el.inner_html().trim().to_string())
        .unwrap_or_default();

    NormalizedContent {
        title,
        subtitle,
        author,
        body_html,
        plain_paragraphs: plain_paragraphs(&doc, root),
    }
}

/// `<body>` when the parser produced one, the whole document otherwise.
fn content_root(doc: &Html) -> NodeId {
    doc.select(&BODY)
        .next()
        .map(|b| b.id())
        .unwrap_or_else(|| doc.root_element().id())
}

fn plain_paragraphs(doc: &Html, root: NodeId) -> Vec<String> {
    let Some(root_el) = element(doc, root) else {
        return Vec::new();
    };
    root_el
        .select(&BLOCKS)
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
        .collect()
}

pub(crate) fn element(doc: &Html, id: NodeId) -> Option<ElementRef<'_>> {
    doc.tree.get(id).and_then(ElementRef::wrap)
}

/// Ids of every element under `root` matching `selector`, in document order.
pub(crate) fn select_ids(doc: &Html, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    element(doc, root)
        .map(|el| el.select(selector).map(|m| m.id()).collect())
        .unwrap_or_default()
}

pub(crate) fn detach(doc: &mut Html, id: NodeId) {
    if let Some(mut node) = doc.tree.get_mut(id) {
        node.detach();
    }
}

/// Text nodes trimmed and joined with single spaces.
pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    let joined = el
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}
