use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::{Html, Node, Selector};

use super::{detach, element, select_ids};

static STYLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("style").unwrap());
static WRAPPERS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("font, span").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

const PRESENTATION_ATTRS: &[&str] = &["style", "face", "size", "align"];

/// Drop `<style>` blocks, unwrap font-styling wrappers and strip presentation
/// attributes from everything under `root`.
pub fn strip_presentation(doc: &mut Html, root: NodeId) {
    for id in select_ids(doc, root, &STYLE) {
        detach(doc, id);
    }

    // Outer wrappers come first in document order, so nested ones still have
    // a parent when their turn comes.
    for id in select_ids(doc, root, &WRAPPERS) {
        unwrap_element(doc, id);
    }

    let ids: Vec<NodeId> = doc
        .tree
        .get(root)
        .map(|n| n.descendants().map(|d| d.id()).collect())
        .unwrap_or_default();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                el.attrs
                    .retain(|name, _| !PRESENTATION_ATTRS.contains(&&*name.local));
            }
        }
    }
}

/// Move an element's children in front of it, then remove the element.
fn unwrap_element(doc: &mut Html, id: NodeId) {
    let children: Vec<NodeId> = match doc.tree.get(id) {
        Some(node) if node.parent().is_some() => node.children().map(|c| c.id()).collect(),
        _ => return,
    };
    for child in children {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.insert_id_before(child);
        }
    }
    detach(doc, id);
}

/// Remove `<p>` elements whose text is blank.
pub fn drop_empty_paragraphs(doc: &mut Html, root: NodeId) {
    let empty: Vec<NodeId> = element(doc, root)
        .map(|r| {
            r.select(&PARAGRAPH)
                .filter(|p| p.text().all(|t| t.trim().is_empty()))
                .map(|p| p.id())
                .collect()
        })
        .unwrap_or_default();
    for id in empty {
        detach(doc, id);
    }
}
