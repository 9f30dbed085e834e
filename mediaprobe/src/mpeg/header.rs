use super::constants::{BITRATES, PADDING_SIZES, SAMPLE_RATES, SAMPLES, SIDE_INFORMATION_SIZES};
use crate::error::Result;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

pub(crate) fn verify_frame_sync(frame_sync: [u8; 2]) -> bool {
	frame_sync[0] == 0xFF && frame_sync[1] >> 5 == 0b111
}

// Searches for a frame sync (11 set bits) in the reader.
// The search starts at the beginning of the reader and returns the index relative to this beginning.
// This will return the first match, if one is found.
//
// Note that the search searches in 8 bit steps, i.e. the first 8 bits need to be byte aligned.
pub(crate) fn search_for_frame_sync<R>(input: &mut R) -> std::io::Result<Option<u64>>
where
	R: Read,
{
	let mut iterator = input.bytes();
	let mut buffer = [0u8; 2];
	// Read the first byte, as each iteration expects that buffer 0 was set from a previous iteration.
	// This is not the case in the first iteration, which is therefore a special case.
	if let Some(byte) = iterator.next() {
		buffer[0] = byte?;
	}
	// Create a stream of overlapping 2 byte pairs
	//
	// Example:
	// [0x01, 0x02, 0x03, 0x04] should be analyzed as
	// [0x01, 0x02], [0x02, 0x03], [0x03, 0x04]
	for (index, byte) in iterator.enumerate() {
		buffer[1] = byte?;
		// Check the two bytes in the buffer
		if verify_frame_sync(buffer) {
			return Ok(Some(index as u64));
		}
		// If they do not match, copy the last byte in the buffer to the front for the next iteration
		buffer[0] = buffer[1];
	}
	Ok(None)
}

// If we need to find the last frame offset (the stream has no Xing/Info/VBRI header)
//
// This will search up to 1024 bytes preceding the trailing tag/EOF.
// Unlike `search_for_frame_sync`, since this has the `Seek` bound, it will seek the reader
// back to the start of the header.
const REV_FRAME_SEARCH_BOUNDS: u64 = 1024;
pub(super) fn rev_search_for_frame_header<R>(
	input: &mut R,
	pos: &mut u64,
) -> Result<Option<FrameHeader>>
where
	R: Read + Seek,
{
	let search_bounds = std::cmp::min(*pos, REV_FRAME_SEARCH_BOUNDS);

	*pos -= search_bounds;
	input.seek(SeekFrom::Start(*pos))?;

	let mut buf = Vec::with_capacity(search_bounds as usize);
	input.take(search_bounds).read_to_end(&mut buf)?;

	let mut frame_sync = [0u8; 2];
	for (i, byte) in buf.iter().rev().enumerate() {
		frame_sync[1] = frame_sync[0];
		frame_sync[0] = *byte;
		if !verify_frame_sync(frame_sync) {
			continue;
		}

		let relative_frame_start = (search_bounds as usize) - (i + 1);
		if relative_frame_start + 4 > buf.len() {
			continue;
		}

		let header = FrameHeader::read(u32::from_be_bytes([
			frame_sync[0],
			frame_sync[1],
			buf[relative_frame_start + 2],
			buf[relative_frame_start + 3],
		]));

		// We need to check if the header is actually valid. For
		// all we know, we could be in some junk (ex. 0xFF_FF_FF_FF).
		if header.is_none() {
			continue;
		}

		// Seek to the start of the frame sync
		*pos += relative_frame_start as u64;
		input.seek(SeekFrom::Start(*pos))?;

		return Ok(header);
	}

	Ok(None)
}

/// See [`cmp_header()`].
pub(crate) enum HeaderCmpResult {
	Equal,
	Undetermined,
	NotEqual,
}

// Used to compare the versions, layers, and sample rates of two frame headers.
// If they aren't equal, something is broken.
pub(super) const HEADER_MASK: u32 = 0xFFFE_0C00;

/// Compares the versions, layers, and sample rates of two frame headers.
///
/// A lone frame sync could easily be part of junk data; a matching frame
/// where the first one claims to end is what makes a candidate trustworthy.
///
/// ## Returns
///
/// - [`HeaderCmpResult::Equal`] if the headers are equal.
/// - [`HeaderCmpResult::NotEqual`] if the headers are not equal.
/// - [`HeaderCmpResult::Undetermined`] if the comparison could not be made (Some IO error occurred).
pub(crate) fn cmp_header<R>(
	reader: &mut R,
	header_size: u32,
	first_header_len: u32,
	first_header_bytes: u32,
	header_mask: u32,
) -> HeaderCmpResult
where
	R: Read + Seek,
{
	// Read the next header and see if they are the same
	let res = reader.seek(SeekFrom::Current(i64::from(
		first_header_len.saturating_sub(header_size),
	)));
	if res.is_err() {
		return HeaderCmpResult::Undetermined;
	}

	let second_header_data = reader.read_u32::<BigEndian>();
	if second_header_data.is_err() {
		return HeaderCmpResult::Undetermined;
	}

	if reader.seek(SeekFrom::Current(-4)).is_err() {
		return HeaderCmpResult::Undetermined;
	}

	match second_header_data {
		Ok(second_header_data)
			if first_header_bytes & header_mask == second_header_data & header_mask =>
		{
			HeaderCmpResult::Equal
		},
		_ => HeaderCmpResult::NotEqual,
	}
}

/// MPEG Audio version
#[derive(Default, PartialEq, Eq, Copy, Clone, Debug)]
#[allow(missing_docs)]
pub enum MpegVersion {
	#[default]
	V1,
	V2,
	V2_5,
	/// Exclusive to AAC
	V4,
}

/// MPEG layer
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Layer {
	Layer1 = 1,
	Layer2 = 2,
	#[default]
	Layer3 = 3,
}

/// Channel mode
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum ChannelMode {
	#[default]
	Stereo = 0,
	JointStereo = 1,
	/// Two independent mono channels
	DualChannel = 2,
	SingleChannel = 3,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct FrameHeader {
	pub(crate) sample_rate: u32,
	pub(crate) len: u32,
	pub(crate) data_start: u32,
	pub(crate) samples: u16,
	pub(crate) bitrate: u32,
	pub(crate) version: MpegVersion,
	pub(crate) layer: Layer,
	pub(crate) channel_mode: ChannelMode,
}

impl FrameHeader {
	pub(super) fn read(data: u32) -> Option<Self> {
		let version = match (data >> 19) & 0b11 {
			0b00 => MpegVersion::V2_5,
			0b10 => MpegVersion::V2,
			0b11 => MpegVersion::V1,
			_ => return None,
		};

		let version_index = if version == MpegVersion::V1 { 0 } else { 1 };

		let layer = match (data >> 17) & 0b11 {
			0b01 => Layer::Layer3,
			0b10 => Layer::Layer2,
			0b11 => Layer::Layer1,
			_ => {
				log::debug!("MPEG: Frame header uses a reserved layer");
				return None;
			},
		};

		let layer_index = (layer as usize).saturating_sub(1);

		let bitrate_index = (data >> 12) & 0xF;
		let bitrate = BITRATES[version_index][layer_index][bitrate_index as usize];
		if bitrate == 0 {
			return None;
		}

		// Sample rate index
		let sample_rate_index = (data >> 10) & 0b11;
		let sample_rate = match sample_rate_index {
			// This is invalid
			0b11 => return None,
			_ => SAMPLE_RATES[version as usize][sample_rate_index as usize],
		};

		let has_padding = ((data >> 9) & 1) == 1;
		let mut padding = 0;

		if has_padding {
			padding = u32::from(PADDING_SIZES[layer_index]);
		}

		let channel_mode = match (data >> 6) & 0b11 {
			0b00 => ChannelMode::Stereo,
			0b01 => ChannelMode::JointStereo,
			0b10 => ChannelMode::DualChannel,
			0b11 => ChannelMode::SingleChannel,
			_ => unreachable!(),
		};

		let data_start = SIDE_INFORMATION_SIZES[version_index][channel_mode as usize] + 4;
		let samples = SAMPLES[layer_index][version_index];
		let len = (u32::from(samples) * bitrate * 125 / sample_rate) + padding;

		Some(Self {
			sample_rate,
			len,
			data_start,
			samples,
			bitrate,
			version,
			layer,
			channel_mode,
		})
	}

	/// Equivalent of [`cmp_header()`], but for an already constructed `FrameHeader`.
	pub(super) fn cmp(self, other: &Self) -> bool {
		self.version == other.version
			&& self.layer == other.layer
			&& self.sample_rate == other.sample_rate
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum VbrHeaderType {
	Xing,
	Info,
	Vbri,
}

/// A Xing/Info/VBRI header describing a stream's totals
///
/// For Xing/Info, a flags field selects which of the two totals follow; a
/// VBRI header always carries both at fixed offsets.
#[derive(Copy, Clone, Debug)]
pub(super) struct VbrHeader {
	pub ty: VbrHeaderType,
	pub frames: Option<u32>,
	pub size: Option<u32>,
}

impl VbrHeader {
	pub(super) fn read(reader: &mut &[u8]) -> Result<Option<Self>> {
		let mut header = [0; 4];
		reader.read_exact(&mut header)?;

		match &header {
			b"Xing" | b"Info" => {
				let flags = reader.read_u32::<BigEndian>()?;

				// Flag 0x0001: a frame count field follows
				// Flag 0x0002: a byte count field follows
				let mut frames = None;
				if flags & 0x0001 != 0 {
					frames = Some(reader.read_u32::<BigEndian>()?);
				}

				let mut size = None;
				if flags & 0x0002 != 0 {
					size = Some(reader.read_u32::<BigEndian>()?);
				}

				let ty = match &header {
					b"Xing" => VbrHeaderType::Xing,
					b"Info" => VbrHeaderType::Info,
					_ => unreachable!(),
				};

				if frames.is_none() && size.is_none() {
					log::debug!("MPEG: Xing header carries no usable fields");
				}

				Ok(Some(Self { ty, frames, size }))
			},
			b"VBRI" => {
				// Skip 6 bytes
				// Version ID (2)
				// Delay float (2)
				// Quality indicator (2)
				let _info = reader.read_uint::<BigEndian>(6)?;

				let size = reader.read_u32::<BigEndian>()?;
				let frames = reader.read_u32::<BigEndian>()?;

				Ok(Some(Self {
					ty: VbrHeaderType::Vbri,
					frames: Some(frames),
					size: Some(size),
				}))
			},
			_ => Ok(None),
		}
	}

	/// Whether the header can stand in for a full stream scan
	pub(super) fn is_valid(&self) -> bool {
		matches!((self.frames, self.size), (Some(f), Some(s)) if f > 0 && s > 0)
	}
}

/// Searches for the next verified frame header
///
/// A candidate sync position only counts if the header parses and the frame
/// that follows it agrees under [`HEADER_MASK`]. Returns the header and its
/// absolute stream offset.
pub(super) fn find_next_frame<R>(
	reader: &mut R,
	search_bounds: u64,
) -> Result<Option<(FrameHeader, u64)>>
where
	R: Read + Seek,
{
	let mut pos = reader.stream_position()?;
	let search_end = pos + search_bounds;

	while pos < search_end {
		let remaining = search_end - pos;
		let Some(frame_start_relative) =
			search_for_frame_sync(&mut reader.by_ref().take(remaining))?
		else {
			break;
		};

		let frame_start_absolute = pos + frame_start_relative;

		// Seek back to the start of the frame and read the header
		reader.seek(SeekFrom::Start(frame_start_absolute))?;
		let header_data = reader.read_u32::<BigEndian>()?;

		if let Some(header) = FrameHeader::read(header_data) {
			match cmp_header(reader, 4, header.len, header_data, HEADER_MASK) {
				HeaderCmpResult::Equal => {
					return Ok(Some((header, frame_start_absolute)));
				},
				HeaderCmpResult::Undetermined => return Ok(None),
				HeaderCmpResult::NotEqual => {},
			}
		}

		pos = reader.stream_position()?;
	}

	Ok(None)
}

#[cfg(test)]
mod tests {
	use std::io::{Cursor, Read, Seek, SeekFrom};

	#[test_log::test]
	fn search_for_frame_sync() {
		fn test(data: &[u8], expected_result: Option<u64>) {
			use super::search_for_frame_sync;
			assert_eq!(search_for_frame_sync(&mut &*data).unwrap(), expected_result);
		}

		test(&[0xFF, 0xFB, 0x00], Some(0));
		test(&[0x00, 0x00, 0x01, 0xFF, 0xFB], Some(3));
		test(&[0x01, 0xFF], None);
	}

	#[test_log::test]
	#[rustfmt::skip]
	fn rev_search_for_frame_header() {
		fn test<R: Read + Seek>(reader: &mut R, expected_reader_position: Option<u64>) {
			// We have to start these at the end to do a reverse search, of course :)
			let mut pos = reader.seek(SeekFrom::End(0)).unwrap();

			let ret = super::rev_search_for_frame_header(reader, &mut pos);

			if expected_reader_position.is_some() {
				assert!(ret.is_ok());
				assert!(ret.unwrap().is_some());
				assert_eq!(Some(pos), expected_reader_position);
				return;
			}

			assert!(ret.unwrap().is_none());
		}

		test(&mut Cursor::new([0xFF, 0xFB, 0x52, 0xC4]), Some(0));
		test(&mut Cursor::new([0x00, 0x00, 0x01, 0xFF, 0xFB, 0x52, 0xC4]), Some(3));
		test(&mut Cursor::new([0x01, 0xFF]), None);
	}

	#[test_log::test]
	fn frame_header_decoding() {
		// MPEG 1 Layer 3, 128 kbps, 44.1 kHz, joint stereo
		let header = super::FrameHeader::read(0xFFFB_9064).unwrap();

		assert_eq!(header.version, super::MpegVersion::V1);
		assert_eq!(header.layer, super::Layer::Layer3);
		assert_eq!(header.channel_mode, super::ChannelMode::JointStereo);
		assert_eq!(header.bitrate, 128);
		assert_eq!(header.sample_rate, 44100);
		assert_eq!(header.samples, 1152);
		// Side information (32) + header (4)
		assert_eq!(header.data_start, 36);
		assert_eq!(header.len, 417);
	}

	#[test_log::test]
	fn xing_presence_flags() {
		// Flags 0x03: both the frame count and byte count follow
		let mut data = Vec::new();
		data.extend_from_slice(b"Xing");
		data.extend_from_slice(&3u32.to_be_bytes());
		data.extend_from_slice(&1000u32.to_be_bytes());
		data.extend_from_slice(&417_000u32.to_be_bytes());

		let header = super::VbrHeader::read(&mut &data[..]).unwrap().unwrap();

		assert_eq!(header.ty, super::VbrHeaderType::Xing);
		assert_eq!(header.frames, Some(1000));
		assert_eq!(header.size, Some(417_000));
		assert!(header.is_valid());

		// Flags 0x01: only the frame count follows
		let mut data = Vec::new();
		data.extend_from_slice(b"Xing");
		data.extend_from_slice(&1u32.to_be_bytes());
		data.extend_from_slice(&1000u32.to_be_bytes());

		let header = super::VbrHeader::read(&mut &data[..]).unwrap().unwrap();
		assert_eq!(header.frames, Some(1000));
		assert_eq!(header.size, None);
		assert!(!header.is_valid());
	}

	#[test_log::test]
	fn vbri_fixed_offsets() {
		let mut data = Vec::new();
		data.extend_from_slice(b"VBRI");
		data.extend_from_slice(&1u16.to_be_bytes()); // version
		data.extend_from_slice(&0u16.to_be_bytes()); // delay
		data.extend_from_slice(&75u16.to_be_bytes()); // quality
		data.extend_from_slice(&417_000u32.to_be_bytes()); // byte count at offset 10
		data.extend_from_slice(&1000u32.to_be_bytes()); // frame count at offset 14

		let header = super::VbrHeader::read(&mut &data[..]).unwrap().unwrap();

		assert_eq!(header.ty, super::VbrHeaderType::Vbri);
		assert_eq!(header.frames, Some(1000));
		assert_eq!(header.size, Some(417_000));
	}
}
