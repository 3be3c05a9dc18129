use std::path::PathBuf;

use thiserror::Error;

/// A single document could not be turned into intermediate HTML.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to launch {program} for {path}: {source}")]
    Launch {
        program: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status} for {path}: {stderr}")]
    Failed {
        program: String,
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("no HTML produced for {0}")]
    NoOutput(PathBuf),
    #[error("unreadable docx package {path}: {source}")]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("malformed document.xml in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level input problems. These abort the batch before any document is read.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input path does not exist: {0}")]
    NotFound(PathBuf),
    #[error("input must be a directory or a .zip archive: {0}")]
    Unsupported(PathBuf),
    #[error("cannot open archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("cannot create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("GHL_TOKEN is not set")]
    MissingToken,
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload rejected with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("upload response carried no url")]
    MissingUrl,
}

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("failed to run NLP command {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("NLP command exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("unparseable NLP output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot flush {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
