//! Audio format description and validation.
//!
//! [`AudioFormat`] is an immutable value describing channel count, sample
//! rate, and bit depth. All three fields must come from the supported sets
//! below for a format to be valid.

use crate::error::{WavError, WavResult};

/// Size of the canonical PCM WAV header in bytes.
pub const HEADER_SIZE: u32 = 44;

/// Sample rates (Hz) the codec accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 10] = [
    8000, 11025, 16000, 18900, 22050, 32000, 37800, 44056, 44100, 48000,
];

/// Bit depths the codec accepts.
pub const SUPPORTED_BITS_PER_SAMPLE: [u16; 2] = [8, 16];

/// Returns whether a sample rate is supported.
pub fn is_supported_sample_rate(rate: u32) -> bool {
    SUPPORTED_SAMPLE_RATES.contains(&rate)
}

/// Returns whether a bit depth is supported.
pub fn is_supported_bits_per_sample(bits: u16) -> bool {
    SUPPORTED_BITS_PER_SAMPLE.contains(&bits)
}

/// WAV audio format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample (8 or 16).
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// Creates a format from raw fields. No validation is performed;
    /// call [`AudioFormat::validate`] before trusting the value.
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
        }
    }

    /// Creates a mono format.
    pub fn mono(sample_rate: u32, bits_per_sample: u16) -> Self {
        Self::new(1, sample_rate, bits_per_sample)
    }

    /// Creates a stereo format.
    pub fn stereo(sample_rate: u32, bits_per_sample: u16) -> Self {
        Self::new(2, sample_rate, bits_per_sample)
    }

    /// Returns whether all three fields are within their supported sets.
    pub fn is_supported(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks the format, reporting the precise error kind for the first
    /// field that is out of range.
    pub fn validate(&self) -> WavResult<()> {
        if !is_supported_sample_rate(self.sample_rate) {
            return Err(WavError::UnsupportedSampleRate {
                rate: self.sample_rate,
            });
        }
        if !is_supported_bits_per_sample(self.bits_per_sample) {
            return Err(WavError::UnsupportedBitsPerSample {
                bits: self.bits_per_sample,
            });
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(WavError::invalid_argument(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        Ok(())
    }

    /// Returns true for two-channel formats.
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Bytes per sample value (per channel).
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Block align (bytes per multi-channel sample group).
    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    /// Byte rate (bytes per second of audio).
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_format() {
        let fmt = AudioFormat::mono(16000, 16);
        assert_eq!(fmt.channels, 1);
        assert!(!fmt.is_stereo());
        assert_eq!(fmt.bytes_per_sample(), 2);
        assert_eq!(fmt.block_align(), 2);
        assert_eq!(fmt.byte_rate(), 32000);
    }

    #[test]
    fn test_stereo_format() {
        let fmt = AudioFormat::stereo(44100, 16);
        assert!(fmt.is_stereo());
        assert_eq!(fmt.block_align(), 4);
        assert_eq!(fmt.byte_rate(), 176400);
    }

    #[test]
    fn test_supported_formats() {
        for rate in SUPPORTED_SAMPLE_RATES {
            assert!(AudioFormat::mono(rate, 8).is_supported());
            assert!(AudioFormat::stereo(rate, 16).is_supported());
        }
    }

    #[test]
    fn test_unsupported_sample_rate() {
        let err = AudioFormat::mono(12345, 16).validate().unwrap_err();
        assert!(matches!(
            err,
            WavError::UnsupportedSampleRate { rate: 12345 }
        ));
    }

    #[test]
    fn test_unsupported_bits_per_sample() {
        let err = AudioFormat::mono(16000, 12).validate().unwrap_err();
        assert!(matches!(err, WavError::UnsupportedBitsPerSample { bits: 12 }));
    }

    #[test]
    fn test_sample_rate_checked_before_bit_depth() {
        // Both fields invalid: the sample rate is reported first.
        let err = AudioFormat::mono(12345, 12).validate().unwrap_err();
        assert!(matches!(err, WavError::UnsupportedSampleRate { .. }));
    }

    #[test]
    fn test_unsupported_channel_count() {
        let err = AudioFormat::new(3, 16000, 16).validate().unwrap_err();
        assert!(matches!(err, WavError::InvalidArgument { .. }));
    }

    #[test]
    fn test_equality_is_field_wise() {
        assert_eq!(AudioFormat::mono(16000, 16), AudioFormat::new(1, 16000, 16));
        assert_ne!(AudioFormat::mono(16000, 16), AudioFormat::mono(16000, 8));
        assert_ne!(AudioFormat::mono(16000, 16), AudioFormat::stereo(16000, 16));
    }
}
