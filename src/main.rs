mod batch;
mod convert;
mod document;
mod error;
mod images;
mod input;
mod record;
mod settings;
mod slug;
mod tags;
mod upload;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::batch::{run_batch, PublishDateMode};
use crate::convert::{RoutingConverter, SofficeConverter};
use crate::settings::Settings;
use crate::tags::{CommandPipeline, NlpPipeline, TagExtractor};
use crate::upload::{GhlClient, MediaUploader};

#[derive(Parser)]
#[command(
    name = "article_import",
    about = "Generate a bulk article import CSV from Word documents and images"
)]
struct Cli {
    /// Input directory or .zip archive
    input: PathBuf,
    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Leading image-name characters that must appear in the document name
    #[arg(short = 'm', long)]
    match_length: Option<usize>,
    /// Publish Date column
    #[arg(long, value_enum)]
    publish_date: Option<PublishDateMode>,
    /// Media storage folder id for uploaded images
    #[arg(long, alias = "ghl-parent-id")]
    parent_id: Option<String>,
    /// Category for every article
    #[arg(long)]
    category: Option<String>,
    /// Author for articles without a byline
    #[arg(long)]
    author: Option<String>,
    /// Do not upload images; leave Meta Image empty
    #[arg(long)]
    no_image_upload: bool,
    /// NLP command for entity tags (reads text on stdin, prints JSON)
    #[arg(long)]
    nlp_command: Option<String>,
    /// Settings file (default: article_import.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(len) = self.match_length {
            settings.match_length = len;
        }
        if let Some(mode) = self.publish_date {
            settings.publish_date = mode;
        }
        if self.parent_id.is_some() {
            settings.upload_parent_id = self.parent_id.clone();
        }
        if self.category.is_some() {
            settings.category = self.category.clone();
        }
        if self.author.is_some() {
            settings.author = self.author.clone();
        }
        if self.no_image_upload {
            settings.no_image_upload = true;
        }
        if self.nlp_command.is_some() {
            settings.nlp_command = self.nlp_command.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    cli.apply(&mut settings);
    let config = settings.batch_config();

    let tagger = TagExtractor::select(detect_nlp(settings.nlp_command.as_deref()));
    let converter = RoutingConverter::new(
        SofficeConverter::new(settings.soffice.clone()),
        settings.soffice_for_docx,
    );
    let client = if config.upload_enabled {
        let client = GhlClient::from_env(settings.api_base.clone())
            .context("Failed to build media upload client")?;
        if client.has_token() {
            Some(client)
        } else {
            warn!("GHL_TOKEN is not set; Meta Image will be left empty");
            None
        }
    } else {
        None
    };
    let uploader = client.as_ref().map(|c| c as &dyn MediaUploader);

    let report = run_batch(&cli.input, &config, &converter, uploader, &tagger)
        .with_context(|| format!("Cannot process {}", cli.input.display()))?;

    record::write_csv(&settings.output, &report.records)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    report.print();
    println!("CSV created: {}", settings.output.display());

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

/// Model tagging only when the configured command resolves.
fn detect_nlp(command: Option<&str>) -> Option<Box<dyn NlpPipeline>> {
    let command = command.filter(|c| !c.trim().is_empty())?;
    match CommandPipeline::detect(command) {
        Some(pipeline) => {
            info!("Entity tagging via {}", pipeline.program().display());
            Some(Box::new(pipeline))
        }
        None => {
            warn!("NLP command not found ({}); using keyword tags", command);
            None
        }
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "article_import",
            "batch.zip",
            "-o",
            "out.csv",
            "-m",
            "6",
            "--publish-date",
            "modified",
            "--ghl-parent-id",
            "folder-1",
            "--no-image-upload",
        ]);
        let mut settings = Settings {
            category: Some("From file".into()),
            ..Default::default()
        };
        cli.apply(&mut settings);

        assert_eq!(cli.input, PathBuf::from("batch.zip"));
        assert_eq!(settings.output, PathBuf::from("out.csv"));
        assert_eq!(settings.match_length, 6);
        assert_eq!(settings.publish_date, PublishDateMode::Modified);
        assert_eq!(settings.upload_parent_id.as_deref(), Some("folder-1"));
        assert_eq!(settings.category.as_deref(), Some("From file"));
        assert!(settings.no_image_upload);
    }

    #[test]
    fn publish_date_accepts_null() {
        let cli = Cli::parse_from(["article_import", "in", "--publish-date", "null"]);
        assert_eq!(cli.publish_date, Some(PublishDateMode::None));
    }

    #[test]
    fn unresolvable_nlp_command_means_keywords() {
        assert!(detect_nlp(Some("no-such-nlp-binary --json")).is_none());
        assert!(detect_nlp(Some("   ")).is_none());
        assert!(detect_nlp(None).is_none());
    }

    #[test]
    fn durations() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
