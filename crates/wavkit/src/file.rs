//! Stateful WAV file handle with sequential sample I/O.
//!
//! [`WavFile`] wraps one on-disk file behind the canonical 44-byte PCM
//! header. A handle is created by [`WavFile::open`] (parses an existing
//! header) or [`WavFile::create`] (writes a fresh zero-sized header), is
//! mutated by sequential sample reads and writes, and is finished by
//! [`WavFile::close`], which back-patches the two header size fields in
//! write-capable modes. Dropping an unclosed handle performs a
//! best-effort close so the back-patch runs on every exit path.
//!
//! Every multi-byte header and sample field is little-endian on disk and
//! is byte-order-normalized through `byteorder` regardless of host
//! endianness.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{WavError, WavResult};
use crate::format::{AudioFormat, HEADER_SIZE};
use crate::sample::{scale_16_to_8, scale_8_to_16};

/// File opening modes supported by [`WavFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access to an existing file.
    Read,
    /// Write-only access; only entered through [`WavFile::create`].
    Write,
    /// Read and write access to an existing file.
    ReadWrite,
}

impl OpenMode {
    fn is_readable(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    fn is_writable(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::ReadWrite)
    }
}

/// Handle over one WAV file.
#[derive(Debug)]
pub struct WavFile {
    stream: Option<File>,
    path: PathBuf,
    mode: OpenMode,
    format: AudioFormat,
    data_size_bytes: u32,
    num_samples_remaining: u32,
}

impl WavFile {
    /// Opens an existing WAV file and parses its header.
    ///
    /// `mode` must be [`OpenMode::Read`] or [`OpenMode::ReadWrite`];
    /// write-only handles are created through [`WavFile::create`].
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> WavResult<Self> {
        let path = path.as_ref();
        if mode == OpenMode::Write {
            return Err(WavError::invalid_argument(
                "open requires Read or ReadWrite mode; use create for write-only",
            ));
        }
        if !path.exists() {
            return Err(WavError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if !is_wave_file(path)? {
            return Err(WavError::NotWaveFormat {
                path: path.to_path_buf(),
            });
        }

        let mut stream = OpenOptions::new()
            .read(true)
            .write(mode == OpenMode::ReadWrite)
            .open(path)
            .map_err(WavError::read)?;
        let file_size = stream.metadata().map_err(WavError::read)?.len();

        // RIFF chunk: tag, declared file size, RIFF type. The tags were
        // already checked by is_wave_file; skip over them here.
        let mut tag = [0u8; 4];
        stream.read_exact(&mut tag).map_err(WavError::read)?;
        let _declared_file_size = stream.read_u32::<LittleEndian>().map_err(WavError::read)?;
        stream.read_exact(&mut tag).map_err(WavError::read)?;

        // Format chunk: "fmt ", chunk length (16), PCM tag (1), then the
        // audio format fields.
        stream.read_exact(&mut tag).map_err(WavError::read)?;
        let _fmt_length = stream.read_u32::<LittleEndian>().map_err(WavError::read)?;
        let _audio_format = stream.read_u16::<LittleEndian>().map_err(WavError::read)?;
        let channels = stream.read_u16::<LittleEndian>().map_err(WavError::read)?;
        let sample_rate = stream.read_u32::<LittleEndian>().map_err(WavError::read)?;
        let _byte_rate = stream.read_u32::<LittleEndian>().map_err(WavError::read)?;
        let _block_align = stream.read_u16::<LittleEndian>().map_err(WavError::read)?;
        let bits_per_sample = stream.read_u16::<LittleEndian>().map_err(WavError::read)?;

        // Data chunk: "data" then the data size.
        stream.read_exact(&mut tag).map_err(WavError::read)?;
        let mut data_size_bytes = stream.read_u32::<LittleEndian>().map_err(WavError::read)?;

        // 44 bytes read up to this point. If the declared data size
        // disagrees with the actual file size, trust the file size.
        let actual_data_size = file_size.saturating_sub(HEADER_SIZE as u64) as u32;
        if data_size_bytes != actual_data_size {
            data_size_bytes = actual_data_size;
        }

        let format = AudioFormat::new(channels, sample_rate, bits_per_sample);
        let num_samples = data_size_bytes / format.bytes_per_sample().max(1) as u32;

        Ok(Self {
            stream: Some(stream),
            path: path.to_path_buf(),
            mode,
            format,
            data_size_bytes,
            num_samples_remaining: num_samples,
        })
    }

    /// Creates a new WAV file and writes a header with zeroed size fields.
    ///
    /// The size fields are back-patched by [`WavFile::close`]. With
    /// `overwrite` false, an existing target is an error rather than a
    /// silent truncation.
    pub fn create(
        path: impl AsRef<Path>,
        format: AudioFormat,
        overwrite: bool,
    ) -> WavResult<Self> {
        let path = path.as_ref();
        format.validate()?;
        if !overwrite && path.exists() {
            return Err(WavError::invalid_argument(format!(
                "output file already exists: {}",
                path.display()
            )));
        }

        let mut stream = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(WavError::write)?;

        // RIFF chunk. The file size field stays zero until close().
        stream.write_all(b"RIFF").map_err(WavError::write)?;
        stream.write_u32::<LittleEndian>(0).map_err(WavError::write)?;
        stream.write_all(b"WAVE").map_err(WavError::write)?;

        // Format chunk.
        stream.write_all(b"fmt ").map_err(WavError::write)?;
        stream.write_u32::<LittleEndian>(16).map_err(WavError::write)?;
        stream.write_u16::<LittleEndian>(1).map_err(WavError::write)?; // PCM
        stream
            .write_u16::<LittleEndian>(format.channels)
            .map_err(WavError::write)?;
        stream
            .write_u32::<LittleEndian>(format.sample_rate)
            .map_err(WavError::write)?;
        stream
            .write_u32::<LittleEndian>(format.byte_rate())
            .map_err(WavError::write)?;
        stream
            .write_u16::<LittleEndian>(format.block_align())
            .map_err(WavError::write)?;
        stream
            .write_u16::<LittleEndian>(format.bits_per_sample)
            .map_err(WavError::write)?;

        // Data chunk. The data size field stays zero until close().
        stream.write_all(b"data").map_err(WavError::write)?;
        stream.write_u32::<LittleEndian>(0).map_err(WavError::write)?;

        Ok(Self {
            stream: Some(stream),
            path: path.to_path_buf(),
            mode: OpenMode::Write,
            format,
            data_size_bytes: 0,
            num_samples_remaining: 0,
        })
    }

    /// Closes the file.
    ///
    /// In write-capable modes this first seeks back into the header and
    /// patches the RIFF size (offset 4, `fileSize - 8`) and the data size
    /// (offset 40, `fileSize - 44`) from the final stream length. The
    /// handle is reset to a closed state afterward on all paths.
    pub fn close(&mut self) -> WavResult<()> {
        let result = match self.stream.as_mut() {
            Some(stream) if self.mode.is_writable() => patch_header_sizes(stream),
            _ => Ok(()),
        };
        self.stream = None;
        self.data_size_bytes = 0;
        self.num_samples_remaining = 0;
        self.mode = OpenMode::Read;
        result
    }

    /// Reads the next sample as raw little-endian bytes (one byte for
    /// 8-bit audio, two for 16-bit).
    pub fn read_sample_bytes(&mut self) -> WavResult<Vec<u8>> {
        let len = self.format.bytes_per_sample() as usize;
        let stream = self.reader()?;
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).map_err(WavError::read)?;
        self.num_samples_remaining = self.num_samples_remaining.saturating_sub(1);
        Ok(buf)
    }

    /// Reads the next sample from an 8-bit file.
    pub fn read_sample_i8(&mut self) -> WavResult<i8> {
        self.require_bits(8, "read")?;
        let stream = self.reader()?;
        let sample = stream.read_i8().map_err(WavError::read)?;
        self.num_samples_remaining = self.num_samples_remaining.saturating_sub(1);
        Ok(sample)
    }

    /// Reads the next sample from a 16-bit file.
    pub fn read_sample_i16(&mut self) -> WavResult<i16> {
        self.require_bits(16, "read")?;
        let stream = self.reader()?;
        let sample = stream.read_i16::<LittleEndian>().map_err(WavError::read)?;
        self.num_samples_remaining = self.num_samples_remaining.saturating_sub(1);
        Ok(sample)
    }

    /// Reads the next sample as a 16-bit value regardless of the file's
    /// bit depth, rescaling 8-bit samples up.
    pub fn read_sample_as_i16(&mut self) -> WavResult<i16> {
        match self.format.bits_per_sample {
            8 => Ok(scale_8_to_16(self.read_sample_i8()?)),
            _ => self.read_sample_i16(),
        }
    }

    /// Reads the next sample as an 8-bit value regardless of the file's
    /// bit depth, rescaling 16-bit samples down.
    pub fn read_sample_as_i8(&mut self) -> WavResult<i8> {
        match self.format.bits_per_sample {
            8 => self.read_sample_i8(),
            _ => Ok(scale_16_to_8(self.read_sample_i16()?)),
        }
    }

    /// Appends a sample given as raw little-endian bytes. The slice
    /// length must match the file's bit depth.
    pub fn write_sample_bytes(&mut self, sample: &[u8]) -> WavResult<()> {
        let expected = self.format.bytes_per_sample() as usize;
        if sample.len() != expected {
            return Err(WavError::invalid_argument(format!(
                "sample is {} bytes, expected {expected}",
                sample.len()
            )));
        }
        let stream = self.writer()?;
        stream.write_all(sample).map_err(WavError::write)?;
        Ok(())
    }

    /// Appends a sample to an 8-bit file.
    pub fn write_sample_i8(&mut self, sample: i8) -> WavResult<()> {
        self.require_bits(8, "write")?;
        let stream = self.writer()?;
        stream.write_i8(sample).map_err(WavError::write)?;
        Ok(())
    }

    /// Appends a sample to a 16-bit file.
    pub fn write_sample_i16(&mut self, sample: i16) -> WavResult<()> {
        self.require_bits(16, "write")?;
        let stream = self.writer()?;
        stream
            .write_i16::<LittleEndian>(sample)
            .map_err(WavError::write)?;
        Ok(())
    }

    /// Moves the cursor to a given sample index.
    ///
    /// Does not recompute `num_samples_remaining`; use
    /// [`WavFile::seek_to_audio_start`] to rewind for a fresh read pass.
    pub fn seek_to_sample(&mut self, sample_index: u64) -> WavResult<()> {
        let offset =
            HEADER_SIZE as u64 + sample_index * self.format.bytes_per_sample() as u64;
        let stream = self.stream.as_mut().ok_or_else(|| {
            WavError::invalid_state("seek attempted on closed handle")
        })?;
        stream
            .seek(SeekFrom::Start(offset))
            .map_err(WavError::seek)?;
        Ok(())
    }

    /// Moves the cursor back to the first sample and, in read-capable
    /// modes, resets `num_samples_remaining`.
    pub fn seek_to_audio_start(&mut self) -> WavResult<()> {
        self.seek_to_sample(0)?;
        if self.mode.is_readable() {
            self.num_samples_remaining = self.num_samples();
        }
        Ok(())
    }

    /// The audio format parsed from or written to the header.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// The size of the data chunk in bytes, as known at open time.
    pub fn data_size_bytes(&self) -> u32 {
        self.data_size_bytes
    }

    /// Total number of samples (individual channel values) in the file.
    pub fn num_samples(&self) -> u32 {
        self.data_size_bytes / self.format.bytes_per_sample().max(1) as u32
    }

    /// Number of samples left to read sequentially.
    pub fn num_samples_remaining(&self) -> u32 {
        self.num_samples_remaining
    }

    /// The mode the file was opened in.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// The path of the open file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current byte position of the cursor.
    pub fn position(&mut self) -> WavResult<u64> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            WavError::invalid_state("position queried on closed handle")
        })?;
        stream.stream_position().map_err(WavError::seek)
    }

    /// Whether the handle currently has an open stream.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn reader(&mut self) -> WavResult<&mut File> {
        let mode = self.mode;
        let stream = self.stream.as_mut().ok_or_else(|| {
            WavError::invalid_state("read attempted on closed handle")
        })?;
        if !mode.is_readable() {
            return Err(WavError::invalid_state(
                "read attempted on write-only handle",
            ));
        }
        Ok(stream)
    }

    fn writer(&mut self) -> WavResult<&mut File> {
        let mode = self.mode;
        let stream = self.stream.as_mut().ok_or_else(|| {
            WavError::invalid_state("write attempted on closed handle")
        })?;
        if !mode.is_writable() {
            return Err(WavError::invalid_state(
                "write attempted on read-only handle",
            ));
        }
        Ok(stream)
    }

    fn require_bits(&self, bits: u16, what: &str) -> WavResult<()> {
        if self.format.bits_per_sample != bits {
            return Err(WavError::invalid_argument(format!(
                "{bits}-bit sample {what} on a {}-bit file",
                self.format.bits_per_sample
            )));
        }
        Ok(())
    }
}

impl Drop for WavFile {
    fn drop(&mut self) {
        // Best-effort close so the header back-patch runs even when the
        // handle leaves scope on an error path. Errors here have nowhere
        // to go; callers that care invoke close() themselves.
        if self.stream.is_some() {
            let _ = self.close();
        }
    }
}

/// Back-patches the RIFF and data chunk size fields from the final
/// stream length.
fn patch_header_sizes(stream: &mut File) -> WavResult<()> {
    let file_size = stream.metadata().map_err(WavError::write)?.len();
    stream.seek(SeekFrom::Start(4)).map_err(WavError::seek)?;
    stream
        .write_u32::<LittleEndian>(file_size.saturating_sub(8) as u32)
        .map_err(WavError::write)?;
    stream.seek(SeekFrom::Start(40)).map_err(WavError::seek)?;
    stream
        .write_u32::<LittleEndian>(file_size.saturating_sub(HEADER_SIZE as u64) as u32)
        .map_err(WavError::write)?;
    Ok(())
}

/// Returns whether a file starts with the RIFF/WAVE container tags.
pub fn is_wave_file(path: impl AsRef<Path>) -> WavResult<bool> {
    let mut stream = File::open(path.as_ref()).map_err(WavError::read)?;
    let mut prologue = [0u8; 12];
    match stream.read_exact(&mut prologue) {
        Ok(()) => Ok(&prologue[0..4] == b"RIFF" && &prologue[8..12] == b"WAVE"),
        // A file shorter than the RIFF prologue is not a WAV file.
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(WavError::read(e)),
    }
}

/// Opens a file just long enough to read its audio format.
pub fn probe_format(path: impl AsRef<Path>) -> WavResult<AudioFormat> {
    let file = WavFile::open(path, OpenMode::Read)?;
    Ok(file.format())
}
