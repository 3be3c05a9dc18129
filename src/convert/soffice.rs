use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{html_output_path, DocumentConverter, SourceDocument};
use crate::error::ConversionError;

pub const DEFAULT_SOFFICE: &str = "soffice";

/// LibreOffice in headless mode. Invoked once per document, never in parallel.
pub struct SofficeConverter {
    program: String,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        SofficeConverter {
            program: program.into(),
        }
    }
}

impl DocumentConverter for SofficeConverter {
    fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let html_path = html_output_path(doc, out_dir);
        if html_path.exists() {
            std::fs::remove_file(&html_path).map_err(|source| ConversionError::Io {
                path: html_path.clone(),
                source,
            })?;
        }

        debug!("{} --convert-to html {}", self.program, doc.path.display());
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("html")
            .arg("--outdir")
            .arg(out_dir)
            .arg(&doc.path)
            .output()
            .map_err(|source| ConversionError::Launch {
                program: self.program.clone(),
                path: doc.path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConversionError::Failed {
                program: self.program.clone(),
                path: doc.path.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !html_path.exists() {
            return Err(ConversionError::NoOutput(doc.path.clone()));
        }
        Ok(html_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = SourceDocument::from_path(Path::new("story.doc")).unwrap();
        let converter = SofficeConverter::new("no-such-office-suite-binary");
        let err = converter.convert(&doc, dir.path()).unwrap_err();
        assert!(matches!(err, ConversionError::Launch { .. }), "{err}");
    }
}
