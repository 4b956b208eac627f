//! Artifact packaging: filename, in-memory blob and the save capability.

mod sink;

use chrono::{DateTime, FixedOffset, Local, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::dom::DocumentError;
use crate::engine::Page;

pub use sink::{AnchorDownloadSink, ArtifactSink, DirectorySink};

pub const ARTIFACT_EXTENSION: &str = ".html";
pub const HTML_MIME_TYPE: &str = "text/html";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),
    #[error("Failed to write artifact {path}: {message}")]
    Io { path: String, message: String },
    #[error("Download failed: {0}")]
    Download(#[from] DocumentError),
}

/// Source of the current time, used for the save-date suffix.
pub trait Clock: Send + Sync {
    /// Current local time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// `<title>[ (<UTC date> <local time>)].html`
///
/// The date is the calendar date of the UTC timestamp while the time is the
/// local wall-clock time, so the two can disagree around midnight.
pub fn build_filename(title: &str, append_save_date: bool, clock: &dyn Clock) -> String {
    if !append_save_date {
        return format!("{title}{ARTIFACT_EXTENSION}");
    }
    let now = clock.now();
    let date = now.with_timezone(&Utc).format("%Y-%m-%d");
    let time = now.format("%H:%M:%S");
    format!("{title} ({date} {time}){ARTIFACT_EXTENSION}")
}

/// In-memory binary object with a transient reference URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub url: String,
}

impl Blob {
    pub fn html(content: &str) -> Self {
        Self {
            bytes: content.as_bytes().to_vec(),
            mime: HTML_MIME_TYPE.to_string(),
            url: format!("blob:{}", Uuid::new_v4()),
        }
    }
}

/// A packaged page ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub blob: Blob,
}

/// Compute the filename and object URL of `page` and wrap its content.
pub fn package(page: &mut Page, append_save_date: bool, clock: &dyn Clock) -> Artifact {
    let filename = build_filename(&page.title, append_save_date, clock);
    let blob = Blob::html(&page.content);
    page.filename = Some(filename.clone());
    page.url = Some(blob.url.clone());
    Artifact { filename, blob }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(rfc3339: &str) -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339(rfc3339).unwrap())
    }

    #[test]
    fn test_filename_without_date() {
        let clock = clock("2024-03-05T10:00:00+00:00");
        assert_eq!(build_filename("Example", false, &clock), "Example.html");
    }

    #[test]
    fn test_filename_with_date() {
        let clock = clock("2024-03-05T14:07:09+00:00");
        assert_eq!(
            build_filename("Example", true, &clock),
            "Example (2024-03-05 14:07:09).html"
        );
    }

    #[test]
    fn test_filename_date_is_utc_time_is_local() {
        // 00:30 local on the 6th is still the 5th in UTC
        let clock = clock("2024-03-06T00:30:15+02:00");
        assert_eq!(
            build_filename("Example", true, &clock),
            "Example (2024-03-05 00:30:15).html"
        );
    }

    #[test]
    fn test_package_sets_page_fields() {
        let mut page = Page::new("Example", "<html></html>");
        let artifact = package(&mut page, false, &SystemClock);

        assert_eq!(page.filename.as_deref(), Some("Example.html"));
        assert_eq!(page.url.as_deref(), Some(artifact.blob.url.as_str()));
        assert!(artifact.blob.url.starts_with("blob:"));
        assert_eq!(artifact.blob.mime, "text/html");
        assert_eq!(artifact.blob.bytes, b"<html></html>");
    }

    #[test]
    fn test_blob_urls_are_unique() {
        assert_ne!(Blob::html("a").url, Blob::html("a").url);
    }
}
