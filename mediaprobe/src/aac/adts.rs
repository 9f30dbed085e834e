use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::macros::{corrupt_err, err};
use crate::mpeg::MpegVersion;
use crate::probe::FileType;
use crate::util::bits::BitReader;

// Used to compare the headers up to the home bit.
// If they aren't equal, something is broken.
pub(super) const HEADER_MASK: u32 = 0xFFFF_FFE0;

/// The ADTS header is 7 bytes, or 9 bytes with a CRC
pub(super) const ADTS_HEADER_LEN: usize = 7;

// https://wiki.multimedia.cx/index.php?title=MPEG-4_Audio#Sampling_Frequencies
const SAMPLE_RATES: [u32; 15] = [
	96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350, 0, 0,
];

/// The MPEG-4 audio object type, from the ADTS profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioObjectType {
	/// AAC Main Profile
	AacMain,
	/// AAC Low Complexity
	#[default]
	AacLowComplexity,
	/// AAC Scalable Sample Rate
	AacScalableSampleRate,
	/// AAC Long Term Prediction
	AacLongTermPrediction,
}

impl AudioObjectType {
	pub(crate) fn as_str(self) -> &'static str {
		match self {
			Self::AacMain => "AAC (Main)",
			Self::AacLowComplexity => "AAC (LC)",
			Self::AacScalableSampleRate => "AAC (SSR)",
			Self::AacLongTermPrediction => "AAC (LTP)",
		}
	}
}

#[derive(Copy, Clone, Debug)]
pub(super) struct AdtsHeader {
	pub(super) version: MpegVersion,
	pub(super) audio_object_ty: AudioObjectType,
	pub(super) sample_rate: u32,
	pub(super) channels: u8,
	/// Frame length in bytes, including the header and CRC
	pub(super) len: u16,
	/// Bitrate in bits per second
	pub(super) bitrate: u32,
	pub(super) has_crc: bool,
	pub(super) bytes: [u8; ADTS_HEADER_LEN],
}

impl AdtsHeader {
	/// Decode an ADTS header from the 7 bytes at a candidate sync position
	///
	/// Construction fails up front if `buf` holds fewer than 7 bytes; the
	/// bit-level reads can never run past a candidate buffer.
	///
	/// Field layout:
	///
	/// Letter 	Length (bits) 	Description
	/// A 	    12 	Syncword, all bits must be set to 1.
	/// B 	    1 	MPEG Version, set to 0 for MPEG-4 and 1 for MPEG-2.
	/// C 	    2 	Layer, always set to 0.
	/// D 	    1 	Protection absence, set to 1 if there is no CRC and 0 if there is CRC.
	/// E 	    2 	Profile, the MPEG-4 Audio Object Type minus 1.
	/// F 	    4 	MPEG-4 Sampling Frequency Index (15 is forbidden).
	/// G 	    1 	Private bit, guaranteed never to be used by MPEG, set to 0 when encoding, ignore when decoding.
	/// H 	    3 	MPEG-4 Channel Configuration.
	/// I 	    1 	Originality.
	/// J 	    1 	Home.
	/// K 	    1 	Copyright ID bit.
	/// L 	    1 	Copyright ID start.
	/// M 	    13 	Frame length, length of the ADTS frame including headers and CRC check.
	/// O 	    11 	Buffer fullness, states the bit-reservoir per frame.
	/// P 	    2 	Number of AAC frames (RDBs) in the ADTS frame minus 1.
	pub(super) fn parse(buf: &ByteBuffer, frame_offset: u64) -> Result<Self> {
		if buf.len() < ADTS_HEADER_LEN {
			err!(InsufficientData);
		}

		let header_buf = buf.mid(0, ADTS_HEADER_LEN)?;

		let mut bytes = [0; ADTS_HEADER_LEN];
		bytes.copy_from_slice(&header_buf);

		let mut bits = BitReader::new(header_buf);

		let sync = bits.read_bits(12)?;
		if sync != 0xFFF {
			err!(SignatureMismatch(FileType::Aac));
		}

		let version = match bits.read_bits(1)? {
			0 => MpegVersion::V4,
			_ => MpegVersion::V2,
		};

		let layer = bits.read_bits(2)?;
		if layer != 0 {
			corrupt_err!(@BAIL Aac, frame_offset, "Frame uses a non-zero layer");
		}

		let protection_absent = bits.read_bits(1)? == 1;

		let audio_object_ty = match bits.read_bits(2)? + 1 {
			1 => AudioObjectType::AacMain,
			2 => AudioObjectType::AacLowComplexity,
			3 => AudioObjectType::AacScalableSampleRate,
			4 => AudioObjectType::AacLongTermPrediction,
			_ => unreachable!(),
		};

		let sample_rate_idx = bits.read_bits(4)? as usize;
		if sample_rate_idx == 15 {
			// 15 is forbidden
			corrupt_err!(@BAIL Aac, frame_offset, "Frame contains an invalid sample frequency index");
		}

		let sample_rate = SAMPLE_RATES[sample_rate_idx];

		let _private = bits.read_bits(1)?;

		let channel_configuration = bits.read_bits(3)? as u8;

		// Originality, home, copyright ID bit, copyright ID start
		bits.skip_bits(4)?;

		let len = bits.read_bits(13)? as u16;

		let _buffer_fullness = bits.read_bits(11)?;

		let frames_in_packet = bits.read_bits(2)? + 1;

		let bitrate = u32::from(len) * 8 * sample_rate / (frames_in_packet * 1024);

		Ok(Self {
			version,
			audio_object_ty,
			sample_rate,
			channels: channel_configuration,
			len,
			bitrate,
			has_crc: !protection_absent,
			bytes,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::{ADTS_HEADER_LEN, AdtsHeader, AudioObjectType};
	use crate::buffer::ByteBuffer;
	use crate::error::ErrorKind;
	use crate::mpeg::MpegVersion;

	// An MPEG-4 AAC LC header: 44.1 kHz (index 4), 2 channels,
	// frame length 416, one RDB
	fn adts_header_bytes(frame_len: u16) -> [u8; ADTS_HEADER_LEN] {
		let mut bits: u64 = 0;
		bits = (bits << 12) | 0xFFF; // sync
		bits = (bits << 1) | 0; // MPEG-4
		bits = (bits << 2) | 0; // layer
		bits = (bits << 1) | 1; // no CRC
		bits = (bits << 2) | 1; // profile: LC - 1
		bits = (bits << 4) | 4; // sample rate index
		bits = (bits << 1) | 0; // private
		bits = (bits << 3) | 2; // channels
		bits = (bits << 4) | 0; // originality/home/copyright
		bits = (bits << 13) | u64::from(frame_len);
		bits = (bits << 11) | 0x7FF; // buffer fullness
		bits <<= 2; // one RDB

		let mut bytes = [0; ADTS_HEADER_LEN];
		bytes.copy_from_slice(&bits.to_be_bytes()[1..]);
		bytes
	}

	#[test_log::test]
	fn header_decoding() {
		let bytes = adts_header_bytes(416);
		let header = AdtsHeader::parse(&ByteBuffer::new(bytes.to_vec()), 0).unwrap();

		assert_eq!(header.version, MpegVersion::V4);
		assert_eq!(header.audio_object_ty, AudioObjectType::AacLowComplexity);
		assert_eq!(header.sample_rate, 44100);
		assert_eq!(header.channels, 2);
		assert_eq!(header.len, 416);
		assert!(!header.has_crc);

		// 416 * 8 * 44100 / 1024 = 143325 bps
		assert_eq!(header.bitrate, 143_325);
	}

	#[test_log::test]
	fn truncated_buffer_is_rejected() {
		// Fewer than 7 bytes at a candidate sync position must fail up
		// front, not read past the buffer
		let buf = ByteBuffer::new(vec![0xFF, 0xF1, 0x50]);
		let result = AdtsHeader::parse(&buf, 0);

		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::InsufficientData
		));
	}

	#[test_log::test]
	fn forbidden_sample_rate_index() {
		let mut bytes = adts_header_bytes(416);
		bytes[2] |= 0b0011_1100; // sample rate index 15

		let result = AdtsHeader::parse(&ByteBuffer::new(bytes.to_vec()), 0);
		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::CorruptStream(_)
		));
	}
}
