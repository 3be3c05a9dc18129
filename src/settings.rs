use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::batch::{BatchConfig, PublishDateMode};
use crate::convert::DEFAULT_SOFFICE;
use crate::images::DEFAULT_MATCH_LENGTH;
use crate::tags::DEFAULT_TAG_COUNT;
use crate::upload::DEFAULT_API_BASE;

pub const DEFAULT_CONFIG_FILE: &str = "article_import.toml";
pub const ENV_PREFIX: &str = "ARTICLE_IMPORT";
pub const DEFAULT_OUTPUT: &str = "articles_import.csv";

/// File and environment settings. Command-line flags are applied on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub category: Option<String>,
    pub author: Option<String>,
    pub publish_date: PublishDateMode,
    pub upload_parent_id: Option<String>,
    pub no_image_upload: bool,
    pub match_length: usize,
    pub tag_count: usize,
    pub output: PathBuf,
    pub soffice: String,
    pub soffice_for_docx: bool,
    pub nlp_command: Option<String>,
    pub api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            category: None,
            author: None,
            publish_date: PublishDateMode::None,
            upload_parent_id: None,
            no_image_upload: false,
            match_length: DEFAULT_MATCH_LENGTH,
            tag_count: DEFAULT_TAG_COUNT,
            output: PathBuf::from(DEFAULT_OUTPUT),
            soffice: DEFAULT_SOFFICE.to_string(),
            soffice_for_docx: false,
            nlp_command: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Settings {
    /// Layer `ARTICLE_IMPORT_*` variables over a TOML file. An explicit
    /// `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        Config::builder()
            .add_source(File::from(file).format(FileFormat::Toml).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            category: self.category.clone(),
            author: self.author.clone(),
            publish_date_mode: self.publish_date,
            upload_destination_id: self.upload_parent_id.clone(),
            upload_enabled: !self.no_image_upload,
            match_length: self.match_length,
            tag_count: self.tag_count,
        }
    }
}
