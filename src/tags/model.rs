use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::stopwords::is_stopword;
use crate::error::NlpError;

const SECONDARY_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Organization,
    Event,
    Location,
    Product,
    Law,
    Other,
}

impl EntityKind {
    /// Kinds that may contribute secondary tags.
    fn is_secondary(self) -> bool {
        matches!(
            self,
            EntityKind::Organization
                | EntityKind::Event
                | EntityKind::Location
                | EntityKind::Product
                | EntityKind::Law
        )
    }
}

impl From<String> for EntityKind {
    fn from(label: String) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => EntityKind::Person,
            "ORG" | "ORGANIZATION" => EntityKind::Organization,
            "EVENT" => EntityKind::Event,
            "GPE" | "LOC" | "LOCATION" => EntityKind::Location,
            "PRODUCT" => EntityKind::Product,
            "LAW" => EntityKind::Law,
            _ => EntityKind::Other,
        }
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(EntityKind::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "label")]
    pub kind: EntityKind,
}

/// Output of a model pass: entities in document order and ranked keyphrases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextAnalysis {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

/// A model-backed text analyzer.
pub trait NlpPipeline {
    fn analyze(&self, text: &str) -> Result<TextAnalysis, NlpError>;
}

/// Runs an external NLP program: text on stdin, `TextAnalysis` JSON on stdout.
pub struct CommandPipeline {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandPipeline {
    /// Resolve a command line like `python3 nlp_tags.py` into a pipeline.
    ///
    /// Returns `None` when the program cannot be found, which callers treat as
    /// "no NLP capability" for the whole batch.
    pub fn detect(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = resolve_program(parts.next()?)?;
        Some(CommandPipeline {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl NlpPipeline for CommandPipeline {
    fn analyze(&self, text: &str) -> Result<TextAnalysis, NlpError> {
        let launch_err = |source| NlpError::Launch {
            program: self.program.display().to_string(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(launch_err)?;
        }

        let output = child.wait_with_output().map_err(launch_err)?;
        if !output.status.success() {
            return Err(NlpError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn resolve_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

/// Lowercased candidate, or `None` if it is a stop word, too short, or has no
/// alphanumeric character.
fn normalize_candidate(raw: &str) -> Option<String> {
    let norm = raw.trim().to_lowercase();
    if norm.chars().count() <= 2
        || is_stopword(&norm)
        || !norm.chars().any(char::is_alphanumeric)
    {
        return None;
    }
    Some(norm)
}

/// First person entity, then up to three keyphrases / non-person entities.
pub fn model_tags(analysis: &TextAnalysis) -> Vec<String> {
    let person = analysis
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Person)
        .find_map(|e| normalize_candidate(&e.text));

    let phrases = analysis.phrases.iter().map(String::as_str);
    let entities = analysis
        .entities
        .iter()
        .filter(|e| e.kind.is_secondary())
        .map(|e| e.text.as_str());

    let mut secondary: Vec<String> = Vec::new();
    for candidate in phrases.chain(entities).filter_map(normalize_candidate) {
        if person.as_deref() == Some(candidate.as_str()) || secondary.contains(&candidate) {
            continue;
        }
        secondary.push(candidate);
    }

    person
        .into_iter()
        .chain(secondary.into_iter().take(SECONDARY_LIMIT))
        .collect()
}
