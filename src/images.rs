use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_MATCH_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl ImageAsset {
    /// Returns `None` unless the path carries one of the raster extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        let stem = path.file_stem()?.to_string_lossy().to_string();
        Some(ImageAsset {
            path: path.to_path_buf(),
            stem,
            extension,
        })
    }
}

/// Images whose leading `match_length` stem characters occur in the article id.
///
/// Discovery order is preserved; the first entry is the featured image.
pub fn find_matching_images<'a>(
    article_id: &str,
    images: &'a [ImageAsset],
    match_length: usize,
) -> Vec<&'a ImageAsset> {
    let article = article_id.to_lowercase();
    images
        .iter()
        .filter(|img| {
            let prefix: String = img.stem.to_lowercase().chars().take(match_length).collect();
            article.contains(&prefix)
        })
        .collect()
}
