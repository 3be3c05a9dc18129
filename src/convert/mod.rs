mod docx;
mod soffice;

use std::path::{Path, PathBuf};

use crate::error::ConversionError;

pub use docx::DocxConverter;
pub use soffice::{SofficeConverter, DEFAULT_SOFFICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    /// Word 97-2003 `.doc`
    LegacyBinary,
    /// Office Open XML `.docx`
    XmlBased,
}

impl FormatClass {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "doc" => Some(FormatClass::LegacyBinary),
            "docx" => Some(FormatClass::XmlBased),
            _ => None,
        }
    }
}

/// A word-processor document found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub stem: String,
    pub format: FormatClass,
}

impl SourceDocument {
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = FormatClass::from_path(path)?;
        let stem = path.file_stem()?.to_string_lossy().to_string();
        Some(SourceDocument {
            path: path.to_path_buf(),
            stem,
            format,
        })
    }
}

/// Turns a source document into an HTML file inside `out_dir`.
pub trait DocumentConverter {
    fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError>;
}

/// `<out_dir>/<stem>.html`, the name every converter writes to.
pub fn html_output_path(doc: &SourceDocument, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}.html", doc.stem))
}

/// Sends `.doc` to LibreOffice and `.docx` to the native reader, unless
/// `soffice_for_docx` routes both through LibreOffice.
pub struct RoutingConverter {
    soffice: SofficeConverter,
    docx: DocxConverter,
    soffice_for_docx: bool,
}

impl RoutingConverter {
    pub fn new(soffice: SofficeConverter, soffice_for_docx: bool) -> Self {
        RoutingConverter {
            soffice,
            docx: DocxConverter,
            soffice_for_docx,
        }
    }
}

impl DocumentConverter for RoutingConverter {
    fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        match doc.format {
            FormatClass::XmlBased if !self.soffice_for_docx => self.docx.convert(doc, out_dir),
            _ => self.soffice.convert(doc, out_dir),
        }
    }
}
