use crate::error::Result;
use crate::io::ReadBlock;
use crate::macros::{corrupt_err, err};
use crate::probe::FileType;
use crate::properties::{AudioCodec, LosslessAudioCodec, StreamProperties};

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

/// A WavPack stream's audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct WavPackProperties {
	pub(crate) version: u16,
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
	pub(crate) bit_depth: u8,
	pub(crate) lossless: bool,
}

impl WavPackProperties {
	/// Duration of the audio
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Audio bitrate (kbps)
	pub fn audio_bitrate(&self) -> u32 {
		self.audio_bitrate
	}

	/// Sample rate (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Channel count
	pub fn channels(&self) -> u8 {
		self.channels
	}

	/// WavPack version
	pub fn version(&self) -> u16 {
		self.version
	}

	/// Bits per sample
	pub fn bit_depth(&self) -> u8 {
		self.bit_depth
	}

	/// Whether the audio is lossless
	pub fn is_lossless(&self) -> bool {
		self.lossless
	}
}

impl AudioCodec for WavPackProperties {
	fn duration(&self) -> Duration {
		self.duration
	}

	fn audio_bitrate(&self) -> u32 {
		self.audio_bitrate
	}

	fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	fn channels(&self) -> u8 {
		self.channels
	}

	fn description(&self) -> Cow<'static, str> {
		if self.lossless {
			Cow::Borrowed("WavPack")
		} else {
			Cow::Borrowed("WavPack (hybrid lossy)")
		}
	}
}

impl LosslessAudioCodec for WavPackProperties {
	fn bit_depth(&self) -> u8 {
		self.bit_depth
	}
}

impl From<WavPackProperties> for StreamProperties {
	fn from(input: WavPackProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_lossless_audio(&input);
		properties
	}
}

// Thanks MultimediaWiki :)

// https://wiki.multimedia.cx/index.php?title=WavPack#Block_structure

const BYTES_PER_SAMPLE_MASK: u32 = 3;
const BIT_DEPTH_SHL: u32 = 13;
const BIT_DEPTH_SHIFT_MASK: u32 = 0x1F << BIT_DEPTH_SHL;
const FLAG_MONO: u32 = 0x0004;
const FLAG_HYBRID_COMPRESSION: u32 = 8; // Hybrid profile (lossy compression)

const MIN_STREAM_VERSION: u16 = 0x402;
const MAX_STREAM_VERSION: u16 = 0x410;

// According to the spec, the max block size is 1MB
const WV_BLOCK_MAX_SIZE: u32 = 1_048_576;

// Sample count of !0 means "unknown", and stays unknown in a single header read
const SAMPLE_COUNT_UNKNOWN: u32 = !0;

const SAMPLE_RATES: [u32; 16] = [
	6000, 8000, 9600, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000, 64000, 88200, 96000,
	192_000, 0,
];

#[derive(Debug)]
pub(super) struct WvHeader {
	pub(super) version: u16,
	pub(super) total_samples: u32,
	pub(super) flags: u32,
}

pub(super) fn parse_wv_header<R>(reader: &mut R) -> Result<WvHeader>
where
	R: Read + Seek,
{
	let header_start = reader.stream_position()?;

	let wv_ident = reader.read_block(4)?;
	if !wv_ident.starts_with(b"wvpk") {
		err!(SignatureMismatch(FileType::WavPack));
	}

	let block_size = reader.read_u32::<LittleEndian>()?;
	if !(24..=WV_BLOCK_MAX_SIZE).contains(&block_size) {
		corrupt_err!(@BAIL WavPack, header_start, "Block has an invalid size");
	}

	let version = reader.read_u16::<LittleEndian>()?;
	if !(MIN_STREAM_VERSION..=MAX_STREAM_VERSION).contains(&version) {
		corrupt_err!(@BAIL WavPack, header_start, "Unsupported stream version encountered");
	}

	// Skip 2 bytes
	//
	// Track number (1)
	// Track sub index (1)
	reader.seek(SeekFrom::Current(2))?;

	let total_samples = reader.read_u32::<LittleEndian>()?;
	let _block_idx = reader.seek(SeekFrom::Current(4))?;
	let _samples = reader.seek(SeekFrom::Current(4))?;
	let flags = reader.read_u32::<LittleEndian>()?;

	let _crc = reader.seek(SeekFrom::Current(4))?;

	Ok(WvHeader {
		version,
		total_samples,
		flags,
	})
}

pub(super) fn read_properties(header: &WvHeader, stream_length: u64) -> WavPackProperties {
	let flags = header.flags;

	let sample_rate_idx = ((flags >> 23) & 0xF) as usize;
	let is_mono = flags & FLAG_MONO > 0;

	let mut properties = WavPackProperties {
		version: header.version,
		sample_rate: SAMPLE_RATES[sample_rate_idx],
		channels: if is_mono { 1 } else { 2 },
		bit_depth: (((flags & BYTES_PER_SAMPLE_MASK) + 1) * 8)
			.saturating_sub((flags & BIT_DEPTH_SHIFT_MASK) >> BIT_DEPTH_SHL) as u8,
		lossless: flags & FLAG_HYBRID_COMPRESSION == 0,
		..WavPackProperties::default()
	};

	if header.total_samples == SAMPLE_COUNT_UNKNOWN {
		log::warn!("WavPack: Unknown sample count, unable to calculate duration");
		return properties;
	}

	if header.total_samples == 0 || properties.sample_rate == 0 {
		log::warn!("WavPack: Unable to calculate duration (sample count == 0 || sample rate == 0)");
		return properties;
	}

	let duration_seconds =
		f64::from(header.total_samples) / f64::from(properties.sample_rate);

	properties.duration = Duration::from_secs_f64(duration_seconds);
	properties.audio_bitrate =
		((stream_length as f64 * 8.0 / duration_seconds) as u64 / 1000) as u32;

	properties
}

#[cfg(test)]
mod tests {
	use super::{WvHeader, read_properties};

	#[test_log::test]
	fn sample_count_based_derivation() {
		// 44100 Hz (index 9), stereo, 16 bit (2 bytes per sample)
		let header = WvHeader {
			version: 0x410,
			total_samples: 44100,
			flags: (9 << 23) | 1,
		};

		let properties = read_properties(&header, 176_400);

		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.bit_depth(), 16);
		assert!(properties.is_lossless());

		assert_eq!(properties.duration(), std::time::Duration::from_secs(1));

		// floor(176400 * 8 / 1.0) / 1000 = 1411 kbps
		assert_eq!(properties.audio_bitrate(), 1411);
	}

	#[test_log::test]
	fn unknown_sample_count() {
		let header = WvHeader {
			version: 0x410,
			total_samples: !0,
			flags: (9 << 23) | 1,
		};

		let properties = read_properties(&header, 176_400);
		assert_eq!(properties.duration().as_millis(), 0);
		assert_eq!(properties.audio_bitrate(), 0);
	}
}
