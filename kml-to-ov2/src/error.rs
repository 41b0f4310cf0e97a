use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a conversion. None of these are recoverable; the run produces no
/// output files once one happens during conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("can't find KML file at {}", .path.display())]
    InputNotFound { path: PathBuf },
    #[error("can't read {}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a valid KML file")]
    InvalidXml(#[from] roxmltree::Error),
    #[error("KML must contain at least 1 Document")]
    MissingDocument,
    #[error("placemark {placemark} has neither a Point nor a LineString")]
    MissingGeometry { placemark: String },
    #[error("placemark {placemark} has invalid coordinates {coordinates:?}")]
    InvalidCoordinate {
        placemark: String,
        coordinates: String,
    },
    #[error("can't encode layer {layer:?}")]
    Encoding {
        layer: String,
        #[source]
        source: ov2::EncodeError,
    },
    #[error("can't write {}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    /// The process exit status for this error. 1 is left for unexpected failures and 2 for usage
    /// errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::InputNotFound { .. } => 3,
            ConvertError::InputUnreadable { .. } => 4,
            ConvertError::InvalidXml(_) => 5,
            ConvertError::MissingDocument => 6,
            ConvertError::MissingGeometry { .. } => 7,
            ConvertError::InvalidCoordinate { .. } => 8,
            ConvertError::Encoding { .. } => 9,
            ConvertError::OutputUnwritable { .. } => 10,
        }
    }
}

/// How a placemark is named in error messages
pub(crate) fn describe_placemark(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{name:?}"),
        _ => "<unnamed>".to_string(),
    }
}
