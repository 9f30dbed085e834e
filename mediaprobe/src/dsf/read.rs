use super::{DATA_MAGIC, DSF_MAGIC, DsfProperties, FMT_CHUNK_SIZE, FMT_MAGIC, HEADER_SIZE};
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::ReadBlock;
use crate::macros::{corrupt_err, err};
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

struct FmtChunk {
	sample_rate: u32,
	channels: u8,
	bits_per_sample: u8,
	sample_count: u64,
}

/// Read the DSD header (28 bytes, little-endian)
fn read_header<R: Read + Seek>(reader: &mut R) -> Result<()> {
	// Magic number (4 bytes): "DSD "
	let magic = reader.read_block(4)?;
	if !magic.starts_with(DSF_MAGIC) {
		err!(SignatureMismatch(FileType::Dsf));
	}

	// Chunk size (8 bytes): should be 28
	let chunk_size = reader.read_u64::<LittleEndian>()?;
	if chunk_size != HEADER_SIZE {
		corrupt_err!(@BAIL Dsf, 4, "Invalid DSD header chunk size");
	}

	// File size (8 bytes)
	let _file_size = reader.read_u64::<LittleEndian>()?;

	// Metadata pointer (8 bytes) - 0 if no trailing metadata. The metadata is
	// a tag, which properties have no use for.
	let _metadata_pointer = reader.read_u64::<LittleEndian>()?;

	Ok(())
}

/// Read the format chunk (52 bytes, little-endian)
fn read_format_chunk<R: Read + Seek>(reader: &mut R) -> Result<FmtChunk> {
	let chunk_start = reader.stream_position()?;

	// Chunk ID (4 bytes): "fmt "
	let mut magic = [0u8; 4];
	reader.read_exact(&mut magic)?;
	if &magic != FMT_MAGIC {
		corrupt_err!(@BAIL Dsf, chunk_start, "Expected fmt chunk");
	}

	// Chunk size (8 bytes): should be 52
	let chunk_size = reader.read_u64::<LittleEndian>()?;
	if chunk_size != FMT_CHUNK_SIZE {
		corrupt_err!(@BAIL Dsf, chunk_start, "Invalid fmt chunk size");
	}

	// Format version (4 bytes): should be 1
	let format_version = reader.read_u32::<LittleEndian>()?;
	if format_version != 1 {
		corrupt_err!(@BAIL Dsf, chunk_start, "Unsupported DSF format version");
	}

	// Format ID (4 bytes): 0 = DSD Raw
	let format_id = reader.read_u32::<LittleEndian>()?;
	if format_id != 0 {
		corrupt_err!(@BAIL Dsf, chunk_start, "Only DSD Raw format supported");
	}

	// Channel type (4 bytes): 1=mono, 2=stereo, etc.
	let _channel_type = reader.read_u32::<LittleEndian>()?;

	// Channel count (4 bytes)
	let channel_count = reader.read_u32::<LittleEndian>()?;
	if !(1..=6).contains(&channel_count) {
		corrupt_err!(@BAIL Dsf, chunk_start, "Invalid channel count");
	}

	// Sampling frequency (4 bytes)
	let sample_rate = reader.read_u32::<LittleEndian>()?;
	if !matches!(sample_rate, 2_822_400 | 5_644_800 | 11_289_600 | 22_579_200) {
		corrupt_err!(@BAIL Dsf, chunk_start, "Invalid sample rate");
	}

	// Bits per sample (4 bytes): 1 or 8
	let bits_per_sample = reader.read_u32::<LittleEndian>()?;
	if bits_per_sample != 1 && bits_per_sample != 8 {
		corrupt_err!(@BAIL Dsf, chunk_start, "Invalid bits per sample");
	}

	// Sample count (8 bytes)
	let sample_count = reader.read_u64::<LittleEndian>()?;

	// Block size per channel (4 bytes)
	let _block_size = reader.read_u32::<LittleEndian>()?;

	// Reserved (4 bytes)
	let _reserved = reader.read_u32::<LittleEndian>()?;

	Ok(FmtChunk {
		sample_rate,
		channels: channel_count as u8,
		bits_per_sample: bits_per_sample as u8,
		sample_count,
	})
}

/// Read the data chunk header, returning the audio stream's byte length
fn read_data_chunk_header<R: Read + Seek>(reader: &mut R) -> Result<u64> {
	let chunk_start = reader.stream_position()?;

	// Chunk ID (4 bytes): "data"
	let mut magic = [0u8; 4];
	reader.read_exact(&mut magic)?;
	if &magic != DATA_MAGIC {
		corrupt_err!(@BAIL Dsf, chunk_start, "Expected data chunk");
	}

	// Chunk size (8 bytes), including the 12 byte chunk header
	let chunk_size = reader.read_u64::<LittleEndian>()?;

	Ok(chunk_size.saturating_sub(12))
}

pub(crate) fn read_from<R>(
	reader: &mut R,
	options: ProbeOptions,
) -> Result<Option<StreamProperties>>
where
	R: Read + Seek,
{
	pipeline::read_file(
		reader,
		FileType::Dsf,
		options.read_style,
		|reader, _style| {
			read_header(reader)?;
			let fmt = read_format_chunk(reader)?;
			let stream_length = read_data_chunk_header(reader)?;

			Ok((fmt, stream_length))
		},
		// The only trailing structure is an optional metadata (tag) block,
		// which carries no stream description
		|_reader, _start, _style| Ok(()),
		|_reader, (fmt, stream_length), ()| {
			let mut properties = DsfProperties {
				sample_rate: fmt.sample_rate,
				channels: fmt.channels,
				bits_per_sample: fmt.bits_per_sample,
				sample_count: fmt.sample_count,
				..DsfProperties::default()
			};

			if fmt.sample_rate > 0 && fmt.sample_count > 0 {
				let duration_seconds = fmt.sample_count as f64 / f64::from(fmt.sample_rate);

				properties.duration = Duration::from_secs_f64(duration_seconds);
				properties.audio_bitrate =
					((stream_length as f64 * 8.0 / duration_seconds) as u64 / 1000) as u32;
			}

			Ok(properties.into())
		},
	)
}

#[cfg(test)]
mod tests {
	use crate::config::ProbeOptions;

	use std::io::Cursor;

	fn dsf_file() -> Vec<u8> {
		let mut data = Vec::new();

		// DSD header
		data.extend_from_slice(b"DSD ");
		data.extend_from_slice(&28u64.to_le_bytes());
		data.extend_from_slice(&0u64.to_le_bytes()); // file size, patched below
		data.extend_from_slice(&0u64.to_le_bytes()); // no metadata

		// fmt chunk
		data.extend_from_slice(b"fmt ");
		data.extend_from_slice(&52u64.to_le_bytes());
		data.extend_from_slice(&1u32.to_le_bytes()); // version
		data.extend_from_slice(&0u32.to_le_bytes()); // DSD Raw
		data.extend_from_slice(&2u32.to_le_bytes()); // channel type: stereo
		data.extend_from_slice(&2u32.to_le_bytes()); // channel count
		data.extend_from_slice(&2_822_400u32.to_le_bytes()); // DSD64
		data.extend_from_slice(&1u32.to_le_bytes()); // bits per sample
		data.extend_from_slice(&2_822_400u64.to_le_bytes()); // 1 second of samples
		data.extend_from_slice(&4096u32.to_le_bytes()); // block size
		data.extend_from_slice(&0u32.to_le_bytes()); // reserved

		// data chunk: header only, the samples themselves are irrelevant
		data.extend_from_slice(b"data");
		data.extend_from_slice(&(12u64 + 705_600).to_le_bytes());

		let file_size = data.len() as u64;
		data[12..20].copy_from_slice(&file_size.to_le_bytes());
		data
	}

	#[test_log::test]
	fn read_valid_dsf() {
		let mut reader = Cursor::new(dsf_file());
		let properties = super::read_from(&mut reader, ProbeOptions::new())
			.unwrap()
			.unwrap();

		assert_eq!(properties.sample_rate(), 2_822_400);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.bit_depth(), 1);
		assert_eq!(properties.duration().as_secs(), 1);

		// floor(705600 * 8 / 1.0) / 1000 = 5644 kbps
		assert_eq!(properties.audio_bitrate(), 5644);
	}

	#[test_log::test]
	fn bad_fmt_chunk_size() {
		let mut data = dsf_file();
		data[32..40].copy_from_slice(&53u64.to_le_bytes());

		let mut reader = Cursor::new(data);
		assert!(super::read_from(&mut reader, ProbeOptions::new()).is_err());
	}
}
