use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Days, Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::convert::{DocumentConverter, SourceDocument};
use crate::document::{normalize_html, NormalizedContent};
use crate::error::{ConversionError, InputError};
use crate::images::{find_matching_images, ImageAsset, DEFAULT_MATCH_LENGTH};
use crate::input::{discover, InputRoot};
use crate::record::{meta_description, ArticleRecord};
use crate::slug::slugify;
use crate::tags::{TagExtractor, DEFAULT_TAG_COUNT};
use crate::upload::{MediaUploader, UploadCache};

const CAPTION_SUFFIX: &str = "caption";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PublishDateMode {
    /// Leave Publish Date blank
    #[default]
    #[serde(alias = "null")]
    #[value(alias = "null")]
    None,
    /// Next Sunday on or after the document's last-modified date
    Modified,
}

/// Every switch that shapes a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub category: Option<String>,
    pub author: Option<String>,
    pub publish_date_mode: PublishDateMode,
    pub upload_destination_id: Option<String>,
    pub upload_enabled: bool,
    pub match_length: usize,
    pub tag_count: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            category: None,
            author: None,
            publish_date_mode: PublishDateMode::None,
            upload_destination_id: None,
            upload_enabled: true,
            match_length: DEFAULT_MATCH_LENGTH,
            tag_count: DEFAULT_TAG_COUNT,
        }
    }
}

#[derive(Debug)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<ArticleRecord>,
    pub documents_found: usize,
    pub images_found: usize,
    pub captions_skipped: usize,
    pub failures: Vec<SkippedDocument>,
    pub uploads: usize,
    pub uploads_reused: usize,
}

impl BatchReport {
    pub fn print(&self) {
        println!(
            "Wrote {} records ({} documents, {} images found; {} captions ignored, {} failed).",
            self.records.len(),
            self.documents_found,
            self.images_found,
            self.captions_skipped,
            self.failures.len(),
        );
        if self.uploads + self.uploads_reused > 0 {
            println!(
                "Images: {} uploaded, {} reused from this run.",
                self.uploads, self.uploads_reused
            );
        }
        for skipped in &self.failures {
            println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}

/// Run one batch over a directory or `.zip` archive.
///
/// Only input problems abort the run. A document that fails to convert is
/// logged, reported and skipped; everything else degrades to blank fields.
pub fn run_batch(
    input: &Path,
    config: &BatchConfig,
    converter: &dyn DocumentConverter,
    uploader: Option<&dyn MediaUploader>,
    tagger: &TagExtractor,
) -> Result<BatchReport, InputError> {
    let root = InputRoot::open(input)?;
    let scratch = tempfile::tempdir().map_err(InputError::Scratch)?;
    let inventory = discover(root.path());

    let uploader = uploader.filter(|_| config.upload_enabled);
    let mut cache = UploadCache::new();
    let mut report = BatchReport {
        documents_found: inventory.documents.len(),
        images_found: inventory.images.len(),
        ..Default::default()
    };
    info!(
        "Processing {} (tags: {}, uploads: {})",
        root.source().display(),
        tagger.mode(),
        if uploader.is_some() { "on" } else { "off" }
    );

    let pb = ProgressBar::new(inventory.documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    for doc in &inventory.documents {
        pb.set_message(doc.stem.clone());
        pb.inc(1);

        if doc.stem.to_lowercase().ends_with(CAPTION_SUFFIX) {
            debug!("Skipping caption file: {}", doc.path.display());
            report.captions_skipped += 1;
            continue;
        }

        let content = match convert_and_normalize(converter, doc, scratch.path()) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", doc.path.display(), e);
                report.failures.push(SkippedDocument {
                    path: doc.path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let candidates = find_matching_images(&doc.stem, &inventory.images, config.match_length);
        let featured = match (uploader, candidates.first()) {
            (Some(uploader), Some(image)) => cache.resolve(
                uploader,
                &image.path,
                config.upload_destination_id.as_deref(),
            ),
            (None, Some(image)) => {
                debug!("Upload disabled, would use {}", image.path.display());
                None
            }
            (_, None) => {
                debug!("No matching images for {}", doc.stem);
                None
            }
        };

        let record = assemble_record(doc, content, &candidates, featured, config, tagger);
        report.records.push(record);
    }
    pb.finish_and_clear();

    report.uploads = cache.uploads();
    report.uploads_reused = cache.reused();
    Ok(report)
}

fn convert_and_normalize(
    converter: &dyn DocumentConverter,
    doc: &SourceDocument,
    out_dir: &Path,
) -> Result<NormalizedContent, ConversionError> {
    let html_path = converter.convert(doc, out_dir)?;
    let bytes = std::fs::read(&html_path).map_err(|source| ConversionError::Io {
        path: html_path.clone(),
        source,
    })?;
    Ok(normalize_html(&String::from_utf8_lossy(&bytes)))
}

fn assemble_record(
    doc: &SourceDocument,
    content: NormalizedContent,
    candidates: &[&ImageAsset],
    featured: Option<String>,
    config: &BatchConfig,
    tagger: &TagExtractor,
) -> ArticleRecord {
    let title = content
        .title
        .clone()
        .or_else(|| content.plain_paragraphs.first().cloned())
        .unwrap_or_else(|| doc.stem.clone());
    let tags = tagger.extract(&content.plain_paragraphs.join(" "), config.tag_count);
    let author = content
        .author
        .clone()
        .or_else(|| config.author.clone())
        .unwrap_or_default();
    let publish_date = match config.publish_date_mode {
        PublishDateMode::None => None,
        PublishDateMode::Modified => modified_publish_date(&doc.path),
    };

    debug!(
        "{}: title={:?} subtitle={:?} images={} tags={:?}",
        doc.stem,
        title,
        content.subtitle,
        candidates.len(),
        tags
    );

    ArticleRecord {
        slug: slugify(&title),
        publish_date,
        scheduled_date: String::new(),
        meta_description: meta_description(&content.plain_paragraphs, &title),
        featured_image_url: featured,
        alt_text: title.clone(),
        title,
        author,
        category: config.category.clone().unwrap_or_default(),
        tags,
        body_html: content.body_html,
    }
}

fn modified_publish_date(path: &Path) -> Option<String> {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(e) => {
            warn!("No modification time for {}: {}", path.display(), e);
            return None;
        }
    };
    let local: DateTime<Local> = modified.into();
    Some(next_sunday(local.date_naive()).format("%Y-%m-%d").to_string())
}

/// The given date if it is a Sunday, otherwise the following Sunday.
pub fn next_sunday(date: NaiveDate) -> NaiveDate {
    let days_ahead = 6 - date.weekday().num_days_from_monday();
    date + Days::new(u64::from(days_ahead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::write_csv;
    use crate::upload::tests::RecordingUploader;
    use chrono::Weekday;
    use std::cell::RefCell;
    use std::io::Write;

    /// Writes a fixed article for every stem. "blank" stems get an empty body,
    /// "broken" stems fail.
    struct FakeConverter;

    impl DocumentConverter for FakeConverter {
        fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError> {
            if doc.stem.contains("broken") {
                return Err(ConversionError::NoOutput(doc.path.clone()));
            }
            let html = if doc.stem.contains("blank") {
                "<html><body><p>&nbsp;</p></body></html>".to_string()
            } else {
                format!(
                    "<html><body><h1>Story {}</h1><p>Lighthouse keepers met on Monday.</p>\
                     <p>The lighthouse lighthouse board voted.</p><p>Repairs start in May.</p></body></html>",
                    doc.stem
                )
            };
            let path = out_dir.join(format!("{}.html", doc.stem));
            std::fs::write(&path, html).unwrap();
            Ok(path)
        }
    }

    /// Remembers each document path and output directory it was handed.
    #[derive(Default)]
    struct PathRecordingConverter {
        seen: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl DocumentConverter for PathRecordingConverter {
        fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError> {
            self.seen
                .borrow_mut()
                .push((doc.path.clone(), out_dir.to_path_buf()));
            FakeConverter.convert(doc, out_dir)
        }
    }

    fn input_dir(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        dir
    }

    fn run(dir: &Path, config: &BatchConfig, uploader: Option<&dyn MediaUploader>) -> BatchReport {
        run_batch(dir, config, &FakeConverter, uploader, &TagExtractor::Keywords).unwrap()
    }

    #[test]
    fn shared_featured_image_is_uploaded_once() {
        let dir = input_dir(&["harbor-lights-1.docx", "harbor-lights-2.docx", "harbor-lights.jpg"]);
        let uploader = RecordingUploader::default();
        let report = run(dir.path(), &BatchConfig::default(), Some(&uploader));

        assert_eq!(report.records.len(), 2);
        assert_eq!(uploader.calls.borrow().len(), 1);
        let urls: Vec<_> = report.records.iter().map(|r| r.featured_image_url.clone()).collect();
        assert_eq!(urls[0].as_deref(), Some("https://cdn.test/harbor-lights.jpg"));
        assert_eq!(urls[0], urls[1]);
        assert_eq!((report.uploads, report.uploads_reused), (1, 1));
    }

    #[test]
    fn caption_documents_are_never_emitted() {
        let dir = input_dir(&["event-photo-caption.docx", "event-photo.docx"]);
        let report = run(dir.path(), &BatchConfig::default(), None);

        assert_eq!(report.captions_skipped, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "Story event-photo");
    }

    #[test]
    fn record_fields_are_assembled() {
        let dir = input_dir(&["pier.docx"]);
        let config = BatchConfig {
            category: Some("News".into()),
            author: Some("Staff".into()),
            ..Default::default()
        };
        let report = run(dir.path(), &config, None);
        let record = &report.records[0];

        assert_eq!(record.title, "Story pier");
        assert_eq!(record.alt_text, "Story pier");
        assert_eq!(record.slug, "story-pier");
        assert_eq!(record.meta_description, "Repairs start in May.");
        assert_eq!(record.author, "Staff");
        assert_eq!(record.category, "News");
        assert_eq!(record.tags, vec!["lighthouse"]);
        assert_eq!(record.publish_date, None);
        assert_eq!(record.featured_image_url, None);
        assert!(record.scheduled_date.is_empty());
        assert!(!record.body_html.contains("Story pier"));
    }

    #[test]
    fn empty_document_is_titled_by_file_name() {
        let dir = input_dir(&["blank-notes.docx"]);
        let report = run(dir.path(), &BatchConfig::default(), None);
        let record = &report.records[0];

        assert_eq!(record.title, "blank-notes");
        assert_eq!(record.slug, "blank-notes");
        assert_eq!(record.meta_description, "blank-notes");
        assert!(record.tags.is_empty());
        assert!(record.body_html.is_empty());
    }

    #[test]
    fn conversion_failure_skips_only_that_document() {
        let dir = input_dir(&["a-broken.docx", "b-fine.doc"]);
        let report = run(dir.path(), &BatchConfig::default(), None);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("a-broken.docx"));
    }

    #[test]
    fn disabled_upload_leaves_image_blank() {
        let dir = input_dir(&["harbor-lights.docx", "harbor-lights.png"]);
        let uploader = RecordingUploader::default();
        let config = BatchConfig {
            upload_enabled: false,
            ..Default::default()
        };
        let report = run(dir.path(), &config, Some(&uploader));

        assert!(uploader.calls.borrow().is_empty());
        assert_eq!(report.records[0].featured_image_url, None);
    }

    #[test]
    fn modified_mode_schedules_a_sunday() {
        let dir = input_dir(&["pier.docx"]);
        let config = BatchConfig {
            publish_date_mode: PublishDateMode::Modified,
            ..Default::default()
        };
        let report = run(dir.path(), &config, None);

        let date = report.records[0].publish_date.as_deref().unwrap();
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        assert_eq!(parsed.weekday(), Weekday::Sun);
    }

    #[test]
    fn zero_documents_still_produce_header_only_csv() {
        let dir = input_dir(&["only-a-photo.jpg"]);
        let report = run(dir.path(), &BatchConfig::default(), None);
        assert!(report.records.is_empty());

        let out = dir.path().join("out.csv");
        write_csv(&out, &report.records).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("URL Slug,"));
    }

    #[test]
    fn missing_input_aborts() {
        let err = run_batch(
            Path::new("/no/such/batch"),
            &BatchConfig::default(),
            &FakeConverter,
            None,
            &TagExtractor::Keywords,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn zip_input_is_processed() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("week.zip");
        {
            let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
            zip.start_file("week/tide-report.docx", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }
        let report = run(&zip_path, &BatchConfig::default(), None);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "Story tide-report");
    }

    #[test]
    fn scratch_space_is_removed_after_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("week.zip");
        {
            let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
            for name in ["week/tide-report.docx", "week/broken-notes.docx"] {
                zip.start_file(name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(b"x").unwrap();
            }
            zip.finish().unwrap();
        }

        let converter = PathRecordingConverter::default();
        let report = run_batch(
            &zip_path,
            &BatchConfig::default(),
            &converter,
            None,
            &TagExtractor::Keywords,
        )
        .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.failures.len(), 1);

        let seen = converter.seen.borrow();
        assert_eq!(seen.len(), 2);
        for (doc_path, out_dir) in seen.iter() {
            assert!(!doc_path.starts_with(dir.path()), "{}", doc_path.display());
            assert!(!doc_path.exists(), "extracted {} left behind", doc_path.display());
            assert!(!out_dir.exists(), "scratch {} left behind", out_dir.display());
        }
        let extracted_week = seen[0].0.parent().unwrap();
        assert!(!extracted_week.exists());
        assert!(zip_path.exists());
    }

    #[test]
    fn next_sunday_rolls_forward() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(next_sunday(d("2024-06-05")), d("2024-06-09"));
        assert_eq!(next_sunday(d("2024-06-09")), d("2024-06-09"));
        assert_eq!(next_sunday(d("2024-06-10")), d("2024-06-16"));
        assert_eq!(next_sunday(d("2024-12-30")), d("2025-01-05"));
    }
}
