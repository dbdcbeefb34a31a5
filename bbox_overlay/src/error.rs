// THEORY:
// Every failure in this crate is scoped to a single card, a single probe, or a
// single dashboard action. The enums below are split by concern so callers can
// match on exactly the failures their stage can produce. None of them is fatal
// to an overlay pass: the pipeline converts them into per-card outcomes.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A `BBox` field that could not be read as `left,top,right,bottom`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected 4 comma-separated coordinates, found {found}")]
    TooFewFields { found: usize },

    #[error("coordinate {index} is not a number: {token:?}")]
    NotNumeric { index: usize, token: String },

    #[error("coordinate {index} is not finite")]
    NotFinite { index: usize },
}

/// A probe load that reached a terminal, unsuccessful state.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image header for {src}: {source}")]
    Decode {
        src: String,
        #[source]
        source: image::ImageError,
    },

    #[cfg(feature = "http")]
    #[error("request for {src} failed: {source}")]
    Http {
        src: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("probe for {src} did not settle within {after:?}")]
    Timeout { src: String, after: Duration },

    #[error("probe worker stopped before {src} settled")]
    WorkerStopped { src: String },

    #[error("image source is empty")]
    EmptySource,
}

/// Natural or displayed dimensions are missing, zero or not finite, so no
/// scale factor can be derived yet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("image dimensions are not resolved yet")]
pub struct NotReady;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid stroke color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("invalid date {value:?}, expected yyyy-MM-dd")]
    InvalidDate { value: String },

    #[error("date range starts after it ends: {start} > {end}")]
    InvertedRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("chart backend failed for canvas {canvas}: {reason}")]
    Backend { canvas: String, reason: String },

    #[error("report feed is malformed: {0}")]
    Feed(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),
}
