use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::convert::SourceDocument;
use crate::error::InputError;
use crate::images::ImageAsset;

/// Where the batch reads from. An archive is unpacked into a scratch
/// directory that lives exactly as long as this value.
pub enum InputRoot {
    Directory(PathBuf),
    Archive { source: PathBuf, extracted: TempDir },
}

impl InputRoot {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        if !path.exists() {
            return Err(InputError::NotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Ok(InputRoot::Directory(path.to_path_buf()));
        }
        if !is_zip(path) {
            return Err(InputError::Unsupported(path.to_path_buf()));
        }

        let archive_err = |source| InputError::Archive {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|e| archive_err(zip::result::ZipError::Io(e)))?;
        let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
        let extracted = tempfile::tempdir().map_err(InputError::Scratch)?;
        info!(
            "Extracting {} entries from {}",
            archive.len(),
            path.display()
        );
        archive.extract(extracted.path()).map_err(archive_err)?;

        Ok(InputRoot::Archive {
            source: path.to_path_buf(),
            extracted,
        })
    }

    /// Directory to walk.
    pub fn path(&self) -> &Path {
        match self {
            InputRoot::Directory(dir) => dir,
            InputRoot::Archive { extracted, .. } => extracted.path(),
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            InputRoot::Directory(dir) => dir,
            InputRoot::Archive { source, .. } => source,
        }
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

#[derive(Debug, Default)]
pub struct Inventory {
    pub documents: Vec<SourceDocument>,
    pub images: Vec<ImageAsset>,
}

/// Office lock files (`~$x.docx`), macOS resource forks (`._x.jpg`) and the
/// `__MACOSX` folder some archivers add.
fn is_junk(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with("~$") || name.starts_with("._") || name == "__MACOSX"
}

/// Documents and images under `root`, walked in file-name order.
pub fn discover(root: &Path) -> Inventory {
    let mut inventory = Inventory::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_junk(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if let Some(doc) = SourceDocument::from_path(path) {
            inventory.documents.push(doc);
        } else if let Some(img) = ImageAsset::from_path(path) {
            inventory.images.push(img);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    info!(
        "Found {} Word documents, {} images",
        inventory.documents.len(),
        inventory.images.len()
    );
    inventory
}
