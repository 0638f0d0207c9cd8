//! Error types for WAV file operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for WAV operations.
pub type WavResult<T> = Result<T, WavError>;

/// Errors that can occur while reading, writing, converting, or merging
/// WAV files.
#[derive(Debug, Error)]
pub enum WavError {
    /// The file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file is not a RIFF/WAVE container.
    #[error("not a WAV file: {}", path.display())]
    NotWaveFormat {
        /// The offending path.
        path: PathBuf,
    },

    /// Bits per sample outside the supported set.
    #[error("unsupported bits per sample: {bits}")]
    UnsupportedBitsPerSample {
        /// The unsupported bit depth.
        bits: u16,
    },

    /// Sample rate outside the supported set.
    #[error("unsupported sample rate: {rate} Hz")]
    UnsupportedSampleRate {
        /// The unsupported sample rate.
        rate: u32,
    },

    /// Operation attempted in the wrong mode or on a closed handle.
    #[error("invalid state: {message}")]
    InvalidState {
        /// What went wrong.
        message: String,
    },

    /// Invalid parameter value (wrong sample byte length, blank path, ...).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What went wrong.
        message: String,
    },

    /// Underlying read error.
    #[error("read failed: {source}")]
    Read {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Underlying write error.
    #[error("write failed: {source}")]
    Write {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Underlying seek error.
    #[error("seek failed: {source}")]
    Seek {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Merge inputs disagree on sample rate.
    #[error("sample rate mismatch between merge inputs: {expected} Hz vs {found} Hz")]
    FormatMismatch {
        /// Sample rate of the first input.
        expected: u32,
        /// The disagreeing sample rate.
        found: u32,
    },

    /// The merge gain multiplier came out zero or non-finite.
    #[error("could not calculate volume multiplier: {value}")]
    VolumeCalculationFailure {
        /// The rejected multiplier value.
        value: f64,
    },

    /// Removing merge scratch files or the scratch directory failed.
    #[error("cleanup failed for {}: {source}", path.display())]
    Cleanup {
        /// The path that could not be removed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl WavError {
    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wraps an I/O error from a read.
    pub fn read(source: io::Error) -> Self {
        Self::Read { source }
    }

    /// Wraps an I/O error from a write.
    pub fn write(source: io::Error) -> Self {
        Self::Write { source }
    }

    /// Wraps an I/O error from a seek.
    pub fn seek(source: io::Error) -> Self {
        Self::Seek { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_helper() {
        let err = WavError::invalid_state("read attempted on closed handle");
        assert!(err.to_string().contains("closed handle"));
    }

    #[test]
    fn test_read_wraps_source() {
        let err = WavError::read(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(err.to_string().starts_with("read failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_format_mismatch_message() {
        let err = WavError::FormatMismatch {
            expected: 16000,
            found: 44100,
        };
        assert!(err.to_string().contains("16000"));
        assert!(err.to_string().contains("44100"));
    }
}
