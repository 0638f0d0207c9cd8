//! wavkit
//!
//! A small codec and mixing engine for canonical PCM WAV files, built for
//! producing and manipulating audio test fixtures:
//!
//! - **Sequential sample I/O** - [`WavFile`] parses and writes the
//!   44-byte PCM header and streams samples one at a time in either
//!   direction, back-patching the header size fields on close.
//! - **Conversion** - [`convert`] rescales volume and bit depth and
//!   remaps channel layouts, file to file or in place.
//! - **Merging** - [`merge_audio_files`] overlays N tracks into one
//!   normalized output with peak-based gain staging.
//!
//! Supported formats are deliberately narrow: 8- or 16-bit PCM, mono or
//! stereo, and a fixed set of sample rates (see
//! [`format::SUPPORTED_SAMPLE_RATES`]).
//!
//! # Example
//!
//! ```ignore
//! use wavkit::{AudioFormat, OpenMode, WavFile};
//!
//! let mut out = WavFile::create("tone.wav", AudioFormat::mono(16000, 16), false)?;
//! for i in 0..16000i16 {
//!     out.write_sample_i16((i % 256) * 64)?;
//! }
//! out.close()?;
//!
//! let mut back = WavFile::open("tone.wav", OpenMode::Read)?;
//! assert_eq!(back.num_samples(), 16000);
//! ```
//!
//! # Crate Structure
//!
//! - [`format`] - [`AudioFormat`] value type and the supported sets
//! - [`file`] - the [`WavFile`] handle
//! - [`sample`] - pure per-sample rescale/remap primitives
//! - [`convert`] - whole-file converters
//! - [`merge`] - the N-track merge engine
//! - [`error`] - the [`WavError`] taxonomy

pub mod convert;
pub mod error;
pub mod file;
pub mod format;
pub mod merge;
pub mod sample;

// Re-export main types at crate root
pub use error::{WavError, WavResult};
pub use file::{is_wave_file, probe_format, OpenMode, WavFile};
pub use format::AudioFormat;
pub use merge::{merge_audio_files, MergeReport};
