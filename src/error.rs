use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("failed to read input file {0}")]
    InputRead(Utf8PathBuf),

    #[error("input file is empty: {0}")]
    EmptyInput(Utf8PathBuf),

    #[error("unknown record type: {0} (use NM, NG, or NM,NG)")]
    InvalidRecordType(String),

    #[error("no record types given")]
    EmptyRecordTypes,

    #[error("E-utilities request failed: {0}")]
    Http(String),

    #[error("E-utilities {endpoint} returned status {status}: {snippet}")]
    Status {
        endpoint: &'static str,
        status: u16,
        snippet: String,
    },

    #[error("expected XML from {endpoint} but got Content-Type {content_type}: {snippet}")]
    ContentType {
        endpoint: &'static str,
        content_type: String,
        snippet: String,
    },

    #[error("malformed XML response: {0}")]
    Xml(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
