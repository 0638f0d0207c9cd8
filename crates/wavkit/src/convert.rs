//! Stateless conversions over whole WAV files: volume scaling, bit-depth
//! rescaling, and channel remapping.
//!
//! [`copy_and_convert`] covers the full bit-depth x channel-layout matrix
//! as two composed stages: channel remap at the source depth (stereo
//! pairs fold with a truncating average, mono duplicates), then bit-depth
//! rescale (rounding), then the volume multiplier. Multipliers of exactly
//! 1.0 are skipped everywhere so a pure copy never picks up rounding
//! noise.

use std::path::Path;

use crate::error::{WavError, WavResult};
use crate::file::{OpenMode, WavFile};
use crate::format::AudioFormat;
use crate::sample::{apply_multiplier, clamp_to_depth, fold_stereo_pair, rescale};

/// Reads the next sample at the file's native depth, widened to i32.
pub(crate) fn read_native(file: &mut WavFile) -> WavResult<i32> {
    match file.format().bits_per_sample {
        8 => Ok(file.read_sample_i8()? as i32),
        _ => Ok(file.read_sample_i16()? as i32),
    }
}

/// Writes a sample value at the file's native depth, clamping into range.
pub(crate) fn write_native(file: &mut WavFile, value: i32) -> WavResult<()> {
    match file.format().bits_per_sample {
        8 => file.write_sample_i8(clamp_to_depth(value, 8) as i8),
        _ => file.write_sample_i16(clamp_to_depth(value, 16) as i16),
    }
}

fn require_nonblank(path: &Path, what: &str) -> WavResult<()> {
    if path.as_os_str().is_empty() {
        return Err(WavError::invalid_argument(format!("blank {what} path")));
    }
    Ok(())
}

/// Rescales every sample of a file in place.
///
/// A multiplier of exactly 1.0 is a no-op: the file is not even opened,
/// so no rounding noise can creep in. Each sample is read, multiplied
/// and rounded, then written back over its own position.
pub fn adjust_volume_in_place(path: impl AsRef<Path>, multiplier: f64) -> WavResult<()> {
    let path = path.as_ref();
    require_nonblank(path, "input")?;
    if multiplier == 1.0 {
        return Ok(());
    }

    let mut file = WavFile::open(path, OpenMode::ReadWrite)?;
    file.format().validate()?;
    let bits = file.format().bits_per_sample;
    let num_samples = file.num_samples() as u64;

    for sample_index in 0..num_samples {
        let scaled = apply_multiplier(read_native(&mut file)?, multiplier);
        file.seek_to_sample(sample_index)?;
        write_native(&mut file, clamp_to_depth(scaled, bits))?;
    }
    file.close()
}

/// Copies a file while applying a volume multiplier, keeping the format.
pub fn adjust_volume_copy(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    multiplier: f64,
) -> WavResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    require_nonblank(src, "source")?;
    require_nonblank(dst, "destination")?;

    let mut src_file = WavFile::open(src, OpenMode::Read)?;
    src_file.format().validate()?;
    let bits = src_file.format().bits_per_sample;
    let mut dst_file = WavFile::create(dst, src_file.format(), true)?;

    while src_file.num_samples_remaining() > 0 {
        let mut sample = read_native(&mut src_file)?;
        if multiplier != 1.0 {
            sample = apply_multiplier(sample, multiplier);
        }
        write_native(&mut dst_file, clamp_to_depth(sample, bits))?;
    }
    dst_file.close()?;
    src_file.close()
}

/// Copies an 8-bit file into a new 16-bit file, applying a volume
/// multiplier after the upscale.
pub fn adjust_volume_copy_upscale(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    multiplier: f64,
) -> WavResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    require_nonblank(src, "source")?;
    require_nonblank(dst, "destination")?;

    let mut src_file = WavFile::open(src, OpenMode::Read)?;
    if src_file.format().bits_per_sample != 8 {
        return Err(WavError::invalid_argument(format!(
            "8-bit source required, {} has {} bits per sample",
            src.display(),
            src_file.format().bits_per_sample
        )));
    }

    let dst_format = AudioFormat::new(src_file.format().channels, src_file.format().sample_rate, 16);
    let mut dst_file = WavFile::create(dst, dst_format, true)?;

    while src_file.num_samples_remaining() > 0 {
        let mut sample = src_file.read_sample_as_i16()? as i32;
        if multiplier != 1.0 {
            sample = apply_multiplier(sample, multiplier);
        }
        dst_file.write_sample_i16(clamp_to_depth(sample, 16) as i16)?;
    }
    dst_file.close()?;
    src_file.close()
}

/// Copies an 8-bit file into a new 16-bit file without touching levels.
pub fn convert_8_to_16_copy(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> WavResult<()> {
    adjust_volume_copy_upscale(src, dst, 1.0)
}

/// Copies a file while converting bit depth and channel layout, with an
/// optional volume multiplier.
///
/// Stereo folds to mono by truncating-averaging each consecutive pair;
/// mono expands to stereo by duplicating each sample. The remap happens
/// at the source bit depth, then each emitted sample is rescaled to the
/// target depth and scaled by the multiplier.
pub fn copy_and_convert(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    target_bits: u16,
    target_stereo: bool,
    multiplier: f64,
) -> WavResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    require_nonblank(src, "source")?;
    require_nonblank(dst, "destination")?;

    let mut src_file = WavFile::open(src, OpenMode::Read)?;
    let src_bits = src_file.format().bits_per_sample;
    let src_stereo = src_file.format().is_stereo();
    let dst_format = AudioFormat::new(
        if target_stereo { 2 } else { 1 },
        src_file.format().sample_rate,
        target_bits,
    );
    dst_format.validate()?;
    let mut dst_file = WavFile::create(dst, dst_format, true)?;

    while src_file.num_samples_remaining() > 0 {
        // Stage 1: channel remap at the source depth.
        let (sample, emit_twice) = match (src_stereo, target_stereo) {
            (true, false) => {
                let first = read_native(&mut src_file)?;
                let second = read_native(&mut src_file)?;
                (fold_stereo_pair(first, second), false)
            }
            (false, true) => (read_native(&mut src_file)?, true),
            _ => (read_native(&mut src_file)?, false),
        };

        // Stage 2: bit-depth rescale, then volume.
        let mut converted = rescale(sample, src_bits, target_bits);
        if multiplier != 1.0 {
            converted = apply_multiplier(converted, multiplier);
        }
        let converted = clamp_to_depth(converted, target_bits);

        write_native(&mut dst_file, converted)?;
        if emit_twice {
            write_native(&mut dst_file, converted)?;
        }
    }
    dst_file.close()?;
    src_file.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::scale_8_to_16;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_wav_16(path: &Path, format: AudioFormat, samples: &[i16]) {
        let mut file = WavFile::create(path, format, true).unwrap();
        for &s in samples {
            file.write_sample_i16(s).unwrap();
        }
        file.close().unwrap();
    }

    fn write_wav_8(path: &Path, format: AudioFormat, samples: &[i8]) {
        let mut file = WavFile::create(path, format, true).unwrap();
        for &s in samples {
            file.write_sample_i8(s).unwrap();
        }
        file.close().unwrap();
    }

    fn read_all_16(path: &Path) -> Vec<i16> {
        let mut file = WavFile::open(path, OpenMode::Read).unwrap();
        (0..file.num_samples())
            .map(|_| file.read_sample_i16().unwrap())
            .collect()
    }

    fn read_all_8(path: &Path) -> Vec<i8> {
        let mut file = WavFile::open(path, OpenMode::Read).unwrap();
        (0..file.num_samples())
            .map(|_| file.read_sample_i8().unwrap())
            .collect()
    }

    #[test]
    fn test_stereo_to_mono_truncating_average() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("st.wav");
        let dst = dir.path().join("mono.wav");
        write_wav_16(&src, AudioFormat::stereo(16000, 16), &[3, 4, -3, -4]);

        copy_and_convert(&src, &dst, 16, false, 1.0).unwrap();

        // (3 + 4) / 2 truncates to 3; (-3 + -4) / 2 truncates to -3.
        assert_eq!(read_all_16(&dst), vec![3, -3]);
        assert!(!probe_is_stereo(&dst));
    }

    fn probe_is_stereo(path: &Path) -> bool {
        crate::file::probe_format(path).unwrap().is_stereo()
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("mono.wav");
        let dst = dir.path().join("st.wav");
        write_wav_16(&src, AudioFormat::mono(16000, 16), &[7, -9]);

        copy_and_convert(&src, &dst, 16, true, 1.0).unwrap();

        assert_eq!(read_all_16(&dst), vec![7, 7, -9, -9]);
        assert!(probe_is_stereo(&dst));
    }

    #[test]
    fn test_copy_and_convert_8_to_16() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("lo.wav");
        let dst = dir.path().join("hi.wav");
        let samples = [0i8, 1, -1, i8::MAX, i8::MIN];
        write_wav_8(&src, AudioFormat::mono(16000, 8), &samples);

        copy_and_convert(&src, &dst, 16, false, 1.0).unwrap();

        let expected: Vec<i16> = samples.iter().map(|&s| scale_8_to_16(s)).collect();
        assert_eq!(read_all_16(&dst), expected);
    }

    #[test]
    fn test_copy_and_convert_16_to_8_stereo_to_mono() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("wide.wav");
        let dst = dir.path().join("narrow.wav");
        // Two stereo pairs of full-scale samples.
        write_wav_16(
            &src,
            AudioFormat::stereo(16000, 16),
            &[i16::MAX, i16::MAX, i16::MIN, i16::MIN],
        );

        copy_and_convert(&src, &dst, 8, false, 1.0).unwrap();

        // Pairs fold first (at 16-bit), then rescale down. (MIN + MIN)/2
        // truncates to MIN, which maps onto i8::MIN exactly.
        assert_eq!(read_all_8(&dst), vec![i8::MAX, i8::MIN]);
    }

    #[test]
    fn test_copy_and_convert_applies_multiplier() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("loud.wav");
        let dst = dir.path().join("quiet.wav");
        write_wav_16(&src, AudioFormat::mono(16000, 16), &[1000, -501]);

        copy_and_convert(&src, &dst, 16, false, 0.5).unwrap();

        // round(1000 * 0.5) = 500; round(-501 * 0.5) = -251.
        assert_eq!(read_all_16(&dst), vec![500, -251]);
    }

    #[test]
    fn test_adjust_volume_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vol.wav");
        write_wav_16(&path, AudioFormat::mono(16000, 16), &[100, -100, 7]);

        adjust_volume_in_place(&path, 2.0).unwrap();
        assert_eq!(read_all_16(&path), vec![200, -200, 14]);
    }

    #[test]
    fn test_adjust_volume_in_place_unity_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unity.wav");
        write_wav_16(&path, AudioFormat::mono(16000, 16), &[321, -321]);
        let before = std::fs::read(&path).unwrap();

        adjust_volume_in_place(&path, 1.0).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_adjust_volume_in_place_saturates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav_16(&path, AudioFormat::mono(16000, 16), &[30000, -30000]);

        adjust_volume_in_place(&path, 2.0).unwrap();
        assert_eq!(read_all_16(&path), vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_adjust_volume_copy() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.wav");
        let dst = dir.path().join("dst.wav");
        write_wav_16(&src, AudioFormat::mono(16000, 16), &[10, -10]);

        adjust_volume_copy(&src, &dst, 0.5).unwrap();
        assert_eq!(read_all_16(&dst), vec![5, -5]);
        // Source untouched.
        assert_eq!(read_all_16(&src), vec![10, -10]);
    }

    #[test]
    fn test_adjust_volume_copy_blank_path() {
        let err = adjust_volume_copy("", "out.wav", 0.5).unwrap_err();
        assert!(matches!(err, WavError::InvalidArgument { .. }));
    }

    #[test]
    fn test_upscale_copy_requires_8_bit_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("already16.wav");
        let dst = dir.path().join("out.wav");
        write_wav_16(&src, AudioFormat::mono(16000, 16), &[1]);

        let err = adjust_volume_copy_upscale(&src, &dst, 1.0).unwrap_err();
        assert!(matches!(err, WavError::InvalidArgument { .. }));
    }

    #[test]
    fn test_convert_8_to_16_copy() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("n.wav");
        let dst = dir.path().join("w.wav");
        write_wav_8(&src, AudioFormat::mono(16000, 8), &[64, -64]);

        convert_8_to_16_copy(&src, &dst).unwrap();
        assert_eq!(
            read_all_16(&dst),
            vec![scale_8_to_16(64), scale_8_to_16(-64)]
        );
    }
}
