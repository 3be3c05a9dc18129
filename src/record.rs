use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::OutputError;

/// Import columns, in order. `Category ` really has a trailing space.
pub const COLUMNS: [&str; 11] = [
    "URL Slug",
    "Publish Date",
    "Scheduled Date",
    "Blog Post Title",
    "Meta description",
    "Meta Image",
    "Meta Image Alt text",
    "Author",
    "Category ",
    "Blog Post Tags",
    "Blog Post Content",
];

pub const META_DESCRIPTION_LEN: usize = 160;

/// One CSV row. Field order is column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleRecord {
    #[serde(rename = "URL Slug")]
    pub slug: String,
    #[serde(rename = "Publish Date")]
    pub publish_date: Option<String>,
    #[serde(rename = "Scheduled Date")]
    pub scheduled_date: String,
    #[serde(rename = "Blog Post Title")]
    pub title: String,
    #[serde(rename = "Meta description")]
    pub meta_description: String,
    #[serde(rename = "Meta Image")]
    pub featured_image_url: Option<String>,
    #[serde(rename = "Meta Image Alt text")]
    pub alt_text: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Category ")]
    pub category: String,
    #[serde(rename = "Blog Post Tags", serialize_with = "join_tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Blog Post Content")]
    pub body_html: String,
}

fn join_tags<S: Serializer>(tags: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&tags.join(", "))
}

/// Paragraph 3, else paragraph 2, else the title; at most 160 characters.
pub fn meta_description(paragraphs: &[String], title: &str) -> String {
    let source = paragraphs
        .get(2)
        .or_else(|| paragraphs.get(1))
        .map(String::as_str)
        .unwrap_or(title);
    source.chars().take(META_DESCRIPTION_LEN).collect()
}

/// Write the header row and every record. An empty batch still gets the header.
pub fn write_csv(path: &Path, records: &[ArticleRecord]) -> Result<(), OutputError> {
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
