use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two swap inputs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSide {
    A,
    B,
}

impl fmt::Display for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSide::A => write!(f, "image A"),
            ImageSide::B => write!(f, "image B"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("no face detected in {image}")]
    NoFaceDetected { image: ImageSide },

    #[error("expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("ill-conditioned input: {0}")]
    IllConditionedInput(String),

    #[error("point sets differ in length: source has {source_len}, target has {target_len}")]
    PointCountMismatch { source_len: usize, target_len: usize },

    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        expected.0,
        expected.1,
        actual.0,
        actual.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("swap worker disconnected")]
    WorkerDisconnected,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with [`Error::DimensionMismatch`] unless `actual` equals `expected`.
pub(crate) fn ensure_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch { expected, actual });
    }
    Ok(())
}
