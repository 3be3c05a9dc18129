pub mod keywords;
pub mod model;
mod stopwords;

use tracing::{debug, warn};

pub use model::{CommandPipeline, NlpPipeline};

pub const DEFAULT_TAG_COUNT: usize = 5;
pub const MAX_TAGS: usize = 5;
/// Characters of article text handed to the model.
pub const MODEL_TEXT_BUDGET: usize = 10_000;

/// Tagging strategy, chosen once per batch.
pub enum TagExtractor {
    Model(Box<dyn NlpPipeline>),
    Keywords,
}

impl TagExtractor {
    /// Model mode when a pipeline is available, keyword mode otherwise.
    pub fn select(pipeline: Option<Box<dyn NlpPipeline>>) -> Self {
        match pipeline {
            Some(p) => TagExtractor::Model(p),
            None => TagExtractor::Keywords,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            TagExtractor::Model(_) => "model",
            TagExtractor::Keywords => "keywords",
        }
    }

    pub fn extract(&self, text: &str, top_n: usize) -> Vec<String> {
        let top_n = top_n.min(MAX_TAGS);
        let tags = match self {
            TagExtractor::Keywords => keywords::keyword_tags(text, top_n),
            TagExtractor::Model(_) if text.trim().is_empty() => Vec::new(),
            TagExtractor::Model(pipeline) => {
                let budgeted: String = text.chars().take(MODEL_TEXT_BUDGET).collect();
                match pipeline.analyze(&budgeted) {
                    Ok(analysis) => {
                        let tags = model::model_tags(&analysis);
                        if tags.is_empty() {
                            debug!("Model produced no tags, using keyword fallback");
                            keywords::keyword_tags(text, top_n)
                        } else {
                            tags
                        }
                    }
                    Err(e) => {
                        warn!("Entity extraction failed: {}", e);
                        keywords::keyword_tags(text, top_n)
                    }
                }
            }
        };
        dedupe(tags)
    }
}

/// Trimmed, case-insensitively unique, at most `MAX_TAGS`.
fn dedupe(tags: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        let key = trimmed.to_lowercase();
        if trimmed.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::model::{Entity, EntityKind, TextAnalysis};
    use super::*;
    use crate::error::NlpError;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakePipeline {
        result: fn() -> Result<TextAnalysis, NlpError>,
        seen_chars: Rc<Cell<usize>>,
    }

    impl NlpPipeline for FakePipeline {
        fn analyze(&self, text: &str) -> Result<TextAnalysis, NlpError> {
            self.seen_chars.set(text.chars().count());
            (self.result)()
        }
    }

    fn model(result: fn() -> Result<TextAnalysis, NlpError>) -> (TagExtractor, Rc<Cell<usize>>) {
        let seen_chars = Rc::new(Cell::new(0));
        let tagger = TagExtractor::select(Some(Box::new(FakePipeline {
            result,
            seen_chars: Rc::clone(&seen_chars),
        })));
        (tagger, seen_chars)
    }

    fn parse_failure() -> Result<TextAnalysis, NlpError> {
        Err(NlpError::Parse(serde_json::from_str::<u8>("x").unwrap_err()))
    }

    #[test]
    fn keyword_mode_without_pipeline() {
        let tagger = TagExtractor::select(None);
        assert_eq!(tagger.mode(), "keywords");
        assert_eq!(
            tagger.extract("Storm storm storm flood flood city", 5),
            vec!["storm", "flood"]
        );
    }

    #[test]
    fn model_mode_uses_entities() {
        let (tagger, _) = model(|| {
            Ok(TextAnalysis {
                entities: vec![Entity {
                    text: "Ana Ruiz".into(),
                    kind: EntityKind::Person,
                }],
                phrases: vec!["river cleanup".into()],
            })
        });
        assert_eq!(tagger.mode(), "model");
        assert_eq!(tagger.extract("whatever", 5), vec!["ana ruiz", "river cleanup"]);
    }

    #[test]
    fn empty_model_result_falls_back() {
        let (tagger, _) = model(|| Ok(TextAnalysis::default()));
        assert_eq!(
            tagger.extract("tide tide tide pier pier", 5),
            vec!["tide", "pier"]
        );
    }

    #[test]
    fn model_failure_falls_back() {
        let (tagger, _) = model(parse_failure);
        assert_eq!(tagger.extract("dune dune grass", 5), vec!["dune"]);
    }

    #[test]
    fn model_text_is_budgeted() {
        let (tagger, seen_chars) = model(|| Ok(TextAnalysis::default()));
        let text = "word ".repeat(5_000);
        tagger.extract(&text, 5);
        assert_eq!(seen_chars.get(), MODEL_TEXT_BUDGET);
    }

    #[test]
    fn blank_text_skips_model() {
        let (tagger, seen_chars) = model(parse_failure);
        assert!(tagger.extract("   ", 5).is_empty());
        assert_eq!(seen_chars.get(), 0);
    }

    #[test]
    fn dedupe_enforces_tagset_rules() {
        let tags = vec![
            " Harbor ".to_string(),
            "harbor".to_string(),
            "".to_string(),
            "a".into(),
            "b".into(),
            "c".into(),
            "d".into(),
            "e".into(),
        ];
        assert_eq!(dedupe(tags), vec!["Harbor", "a", "b", "c", "d"]);
    }
}
