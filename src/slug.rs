use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\- ]+").unwrap());
static HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

const MAX_SLUG_LEN: usize = 72;

/// Articles, coordinating conjunctions and common prepositions.
const SLUG_STOPWORDS: &[&str] = &[
    "a", "an", "the",
    "and", "but", "or", "nor", "for", "so", "yet",
    "at", "by", "in", "of", "on", "to", "up", "with", "as", "from", "into", "like",
    "near", "off", "over", "past", "per", "than", "till", "upon", "via", "without",
    "about", "after", "against", "along", "among", "around", "before", "behind",
    "below", "beneath", "beside", "between", "beyond", "during", "except", "inside",
    "onto", "outside", "since", "through", "toward", "under", "underneath", "until",
    "within",
];

/// Turn an article title into a URL slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = DISALLOWED_RE.replace_all(&lowered, "");

    let joined = cleaned
        .split_whitespace()
        .filter(|w| !SLUG_STOPWORDS.contains(w))
        .collect::<Vec<_>>()
        .join("-");
    let collapsed = HYPHENS_RE.replace_all(&joined, "-");

    // Only ASCII survives the filter, so byte truncation is safe.
    let end = collapsed.len().min(MAX_SLUG_LEN);
    collapsed[..end].trim_end_matches('-').to_string()
}
