//! Multi-track merge with peak-based gain staging.
//!
//! [`merge_audio_files`] overlays N WAV files into one output: the inputs
//! are scaled down into a scratch directory so their sum cannot clip,
//! mixed sample-by-sample, and the result is renormalized back up to the
//! target peak.
//!
//! Two observed behaviors are preserved deliberately rather than "fixed":
//! the mixing loop divides by the total track count even after shorter
//! tracks run out, which fades the tail of a mix whenever input lengths
//! differ, and the 8-bit gain constants are derived from the unsigned
//! byte maximum. See DESIGN.md.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::{adjust_volume_in_place, copy_and_convert, read_native, write_native};
use crate::error::{WavError, WavResult};
use crate::file::{probe_format, OpenMode, WavFile};
use crate::format::{
    is_supported_bits_per_sample, is_supported_sample_rate, AudioFormat,
};

/// Renormalization peak target for 8-bit output: three quarters of the
/// unsigned byte maximum, computed with integer division (189).
const RENORMALIZE_TARGET_8: i32 = (u8::MAX / 4 * 3) as i32;

/// Outcome of a successful merge.
#[derive(Debug)]
pub struct MergeReport {
    /// Path of the merged output file.
    pub output: PathBuf,
    /// Format of the merged output file.
    pub format: AudioFormat,
    /// Gain applied to every input during the scale-down pass.
    pub gain: f64,
    /// Set when the merge succeeded but scratch-file or scratch-directory
    /// removal did not. The merged output is still valid.
    pub cleanup_warning: Option<WavError>,
}

/// Merges a set of WAV files into a single file with their audio
/// overlaid.
///
/// All inputs must share one sample rate; bit depths and channel layouts
/// may differ and are converted up to the widest input (`max` bit depth,
/// stereo if any input is stereo). Scaled working copies live in
/// `temp_dir` for the duration of the call; if `temp_dir` did not exist
/// beforehand it is removed again afterward.
pub fn merge_audio_files<P: AsRef<Path>>(
    inputs: &[P],
    output: impl AsRef<Path>,
    temp_dir: impl AsRef<Path>,
) -> WavResult<MergeReport> {
    let output = output.as_ref();
    let temp_dir = temp_dir.as_ref();
    if inputs.is_empty() {
        return Err(WavError::invalid_argument("no input files to merge"));
    }

    // All pre-checks run before any file or directory is touched.
    let formats: Vec<AudioFormat> = inputs
        .iter()
        .map(|p| probe_format(p))
        .collect::<WavResult<_>>()?;
    let first = formats[0];
    for format in &formats[1..] {
        if format.sample_rate != first.sample_rate {
            return Err(WavError::FormatMismatch {
                expected: first.sample_rate,
                found: format.sample_rate,
            });
        }
    }
    if !is_supported_bits_per_sample(first.bits_per_sample) {
        return Err(WavError::UnsupportedBitsPerSample {
            bits: first.bits_per_sample,
        });
    }
    if !is_supported_sample_rate(first.sample_rate) {
        return Err(WavError::UnsupportedSampleRate {
            rate: first.sample_rate,
        });
    }

    let temp_dir_existed = temp_dir.is_dir();
    if !temp_dir_existed {
        fs::create_dir_all(temp_dir).map_err(WavError::write)?;
    }

    let target_bits = formats.iter().map(|f| f.bits_per_sample).max().unwrap_or(16);
    let target_stereo = formats.iter().any(|f| f.is_stereo());
    let target_format = AudioFormat::new(
        if target_stereo { 2 } else { 1 },
        first.sample_rate,
        target_bits,
    );

    let result = merge_into(inputs, output, temp_dir, target_format);
    match result {
        Ok((gain, mut cleanup_warning)) => {
            if !temp_dir_existed {
                if let Err(e) = remove_dir_recursive(temp_dir) {
                    cleanup_warning.get_or_insert(e);
                }
            }
            Ok(MergeReport {
                output: output.to_path_buf(),
                format: target_format,
                gain,
                cleanup_warning,
            })
        }
        Err(e) => {
            // The merge failed; scratch state has nowhere to be reported,
            // so remove a directory we created on a best-effort basis.
            if !temp_dir_existed {
                let _ = remove_dir_recursive(temp_dir);
            }
            Err(e)
        }
    }
}

/// Scale-down, mix, and renormalize phases. Returns the applied gain and
/// any scratch-file cleanup warning.
fn merge_into<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    temp_dir: &Path,
    target_format: AudioFormat,
) -> WavResult<(f64, Option<WavError>)> {
    let target_bits = target_format.bits_per_sample;
    let gain = scale_down_gain(inputs, target_bits)?;

    // Scale every input into the scratch directory at the target format,
    // then reopen the copies for the mixing pass.
    let mut scaled: Vec<WavFile> = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let name = input
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("track.wav"));
        let scratch = temp_dir.join(format!("{index:02}_{name}"));
        copy_and_convert(
            input,
            &scratch,
            target_bits,
            target_format.is_stereo(),
            gain,
        )?;
        scaled.push(WavFile::open(&scratch, OpenMode::Read)?);
    }

    mix_tracks(&mut scaled, output, target_format)?;

    // Scratch copies are no longer needed. A removal failure is only a
    // warning; the mixed output already exists.
    let mut cleanup_warning = None;
    for mut file in scaled {
        let path = file.path().to_path_buf();
        file.close()?;
        if let Err(source) = fs::remove_file(&path) {
            cleanup_warning.get_or_insert(WavError::Cleanup { path, source });
        }
    }

    renormalize(output, target_bits)?;
    Ok((gain, cleanup_warning))
}

/// Computes the gain that scales every input down far enough that the sum
/// of N tracks stays representable.
///
/// `gain = 1 - (peak - maxRepresentable/N) / peak`, taken as an absolute
/// value, where the peak is searched across all inputs and
/// `maxRepresentable` is the unsigned byte maximum for 8-bit targets or
/// the signed short maximum for 16-bit targets.
fn scale_down_gain<P: AsRef<Path>>(inputs: &[P], target_bits: u16) -> WavResult<f64> {
    let mut peak: i32 = 0;
    for input in inputs {
        peak = peak.max(peak_magnitude(input.as_ref(), target_bits)?);
    }

    let max_representable: i32 = if target_bits == 8 {
        u8::MAX as i32
    } else {
        i16::MAX as i32
    };
    let headroom = max_representable / inputs.len() as i32;
    let difference = peak - headroom;
    let gain = 1.0 - difference as f64 / peak as f64;
    if !gain.is_finite() || gain == 0.0 {
        return Err(WavError::VolumeCalculationFailure { value: gain });
    }
    Ok(gain.abs())
}

/// Highest absolute sample magnitude in one file, compared at the target
/// bit depth (8-bit samples are rescaled up when the target is 16-bit).
fn peak_magnitude(path: &Path, target_bits: u16) -> WavResult<i32> {
    let mut file = WavFile::open(path, OpenMode::Read)?;
    let mut peak: i32 = 0;
    while file.num_samples_remaining() > 0 {
        let value = if target_bits == 16 {
            file.read_sample_as_i16()? as i32
        } else {
            file.read_sample_i8()? as i32
        };
        peak = peak.max(value.abs());
    }
    file.close()?;
    Ok(peak)
}

/// The mixing loop: one accumulator tick per output sample.
///
/// Exhausted tracks contribute zero, but the divisor stays the total
/// track count.
fn mix_tracks(
    tracks: &mut [WavFile],
    output: &Path,
    target_format: AudioFormat,
) -> WavResult<()> {
    let divisor = tracks.len() as i32;
    let mut out = WavFile::create(output, target_format, true)?;
    while tracks.iter().any(|t| t.num_samples_remaining() > 0) {
        let mut accumulator: i32 = 0;
        for track in tracks.iter_mut() {
            if track.num_samples_remaining() > 0 {
                accumulator += read_native(track)?;
            }
        }
        write_native(&mut out, accumulator / divisor)?;
    }
    out.close()
}

/// Scales the mixed output so its peak hits the target for its depth:
/// the signed short maximum for 16-bit, three quarters of the unsigned
/// byte maximum for 8-bit. A silent mix is left as-is.
fn renormalize(output: &Path, target_bits: u16) -> WavResult<()> {
    let peak = peak_magnitude(output, target_bits)?;
    if peak == 0 {
        return Ok(());
    }
    let target: i32 = if target_bits == 8 {
        RENORMALIZE_TARGET_8
    } else {
        i16::MAX as i32
    };
    let multiplier = target as f64 / peak as f64;
    adjust_volume_in_place(output, multiplier.abs())
}

/// Removes a directory and everything in it. Missing directories are not
/// an error.
fn remove_dir_recursive(path: &Path) -> WavResult<()> {
    if !path.is_dir() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|source| WavError::Cleanup {
        path: path.to_path_buf(),
        source,
    })
}
