use super::constants::VIDEO_FRAME_RATES;
use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::macros::corrupt_err;
use crate::properties::{StreamProperties, VideoCodec};
use crate::util::bits::BitReader;

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

// The sequence header may be preceded by pack and system headers in a
// program stream; 32 KiB of leading material is plenty for those.
pub(super) const SEQUENCE_HEADER_SEARCH_BOUNDS: u64 = 0x8000;

const SEQUENCE_HEADER_CODE: [u8; 4] = [0x00, 0x00, 0x01, 0xB3];

// Width (12) + height (12) + aspect ratio (4) + frame rate (4) + bitrate (18)
const SEQUENCE_HEADER_LEN: usize = 7;

/// An MPEG stream's video properties, from its sequence header
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[non_exhaustive]
pub struct MpegVideoProperties {
	pub(crate) width: u32,
	pub(crate) height: u32,
	pub(crate) frame_rate: f32,
	/// The raw 18 bit bitrate field, in units of 400 bits per second
	pub(crate) bitrate: u32,
}

impl MpegVideoProperties {
	/// Frame width in pixels
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Frame height in pixels
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Frame rate (frames per second)
	pub fn frame_rate(&self) -> f32 {
		self.frame_rate
	}

	/// The raw bitrate field, in units of 400 bits per second
	pub fn bitrate(&self) -> u32 {
		self.bitrate
	}
}

impl VideoCodec for MpegVideoProperties {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn frame_rate(&self) -> f32 {
		self.frame_rate
	}

	fn video_bitrate(&self) -> u32 {
		// The field counts 400 bit/s units
		self.bitrate * 400 / 1000
	}

	fn description(&self) -> Cow<'static, str> {
		Cow::Borrowed("MPEG Video")
	}
}

impl From<MpegVideoProperties> for StreamProperties {
	fn from(input: MpegVideoProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_video(&input);
		properties
	}
}

/// Search for a sequence header start code (00 00 01 B3) within `max_bytes`
///
/// Returns the absolute offset of the byte following the start code.
pub(super) fn find_sequence_header<R>(reader: &mut R, max_bytes: u64) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let start = reader.stream_position()?;

	let mut window = [0u8; 4];
	let mut bytes = reader.by_ref().take(max_bytes).bytes();

	let mut index: u64 = 0;
	for byte in &mut bytes {
		window.rotate_left(1);
		window[3] = byte?;
		index += 1;

		if index >= 4 && window == SEQUENCE_HEADER_CODE {
			return Ok(Some(start + index));
		}
	}

	Ok(None)
}

/// Decode the fixed-width fields following a sequence header start code
pub(super) fn parse_sequence_header(buf: &ByteBuffer, offset: u64) -> Result<MpegVideoProperties> {
	let mut bits = BitReader::new(buf.mid(0, SEQUENCE_HEADER_LEN)?);

	let width = bits.read_bits(12)?;
	let height = bits.read_bits(12)?;

	let _aspect_ratio = bits.read_bits(4)?;

	let frame_rate_index = bits.read_bits(4)? as usize;
	if frame_rate_index >= VIDEO_FRAME_RATES.len() {
		corrupt_err!(@BAIL Mpeg, offset, "Sequence header has an invalid frame rate index");
	}

	let frame_rate = VIDEO_FRAME_RATES[frame_rate_index];

	let bitrate = bits.read_bits(18)?;

	Ok(MpegVideoProperties {
		width,
		height,
		frame_rate,
		bitrate,
	})
}

pub(super) fn read_video<R>(
	reader: &mut R,
	max_bytes: u64,
) -> Result<Option<MpegVideoProperties>>
where
	R: Read + Seek,
{
	use crate::io::ReadBlock;

	let Some(header_offset) = find_sequence_header(reader, max_bytes)? else {
		return Ok(None);
	};

	reader.seek(SeekFrom::Start(header_offset))?;
	let buf = reader.read_block(SEQUENCE_HEADER_LEN)?;
	if buf.len() < SEQUENCE_HEADER_LEN {
		corrupt_err!(@BAIL Mpeg, header_offset, "Truncated sequence header");
	}

	log::debug!("MPEG: Found a video sequence header");
	parse_sequence_header(&buf, header_offset).map(Some)
}

#[cfg(test)]
mod tests {
	use super::{find_sequence_header, parse_sequence_header};
	use crate::buffer::ByteBuffer;

	use std::io::Cursor;

	// 720x576, 25 fps (index 3), bitrate field 28125 (= 11250 kbps)
	fn sequence_header_fields() -> Vec<u8> {
		let mut bits: u64 = 0;
		bits = (bits << 12) | 720;
		bits = (bits << 12) | 576;
		bits = (bits << 4) | 3; // aspect ratio 4:3
		bits = (bits << 4) | 3; // frame rate index
		bits = (bits << 18) | 28125;
		bits <<= 6; // marker + vbv padding

		bits.to_be_bytes()[1..].to_vec()
	}

	#[test_log::test]
	fn sequence_header_decoding() {
		let fields = sequence_header_fields();
		let properties = parse_sequence_header(&ByteBuffer::new(fields), 0).unwrap();

		assert_eq!(properties.width(), 720);
		assert_eq!(properties.height(), 576);
		assert!((properties.frame_rate() - 25.0).abs() < f32::EPSILON);
		assert_eq!(properties.bitrate(), 28125);
	}

	#[test_log::test]
	fn start_code_search() {
		let mut data = vec![0u8; 16];
		data.extend_from_slice(&[0x00, 0x00, 0x01, 0xB3]);
		data.extend_from_slice(&sequence_header_fields());

		let mut reader = Cursor::new(data);
		let offset = find_sequence_header(&mut reader, 0x8000).unwrap();
		assert_eq!(offset, Some(20));

		let mut reader = Cursor::new(vec![0u8; 64]);
		assert_eq!(find_sequence_header(&mut reader, 0x8000).unwrap(), None);
	}
}
