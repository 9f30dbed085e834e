use crate::error::Result;
use crate::properties::{AudioCodec, LosslessAudioCodec, StreamProperties};

use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt};

/// A FLAC stream's audio properties
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct FlacProperties {
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) bit_depth: u8,
	pub(crate) channels: u8,
	pub(crate) total_samples: u64,
}

impl FlacProperties {
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

	/// Bits per sample (usually 16 or 24 bit)
	pub fn bit_depth(&self) -> u8 {
		self.bit_depth
	}

	/// Channel count
	pub fn channels(&self) -> u8 {
		self.channels
	}

	/// Total number of samples in the stream
	pub fn total_samples(&self) -> u64 {
		self.total_samples
	}
}

impl AudioCodec for FlacProperties {
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
		Cow::Borrowed("FLAC")
	}
}

impl LosslessAudioCodec for FlacProperties {
	fn bit_depth(&self) -> u8 {
		self.bit_depth
	}
}

impl From<FlacProperties> for StreamProperties {
	fn from(input: FlacProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_lossless_audio(&input);
		properties
	}
}

pub(super) fn read_properties<R>(stream_info: &mut R, stream_length: u64) -> Result<FlacProperties>
where
	R: Read,
{
	// Skip 4 bytes
	// Minimum block size (2)
	// Maximum block size (2)
	stream_info.read_u32::<BigEndian>()?;

	// Skip 6 bytes
	// Minimum frame size (3)
	// Maximum frame size (3)
	stream_info.read_uint::<BigEndian>(6)?;

	// Read 4 bytes
	// Sample rate (20 bits)
	// Number of channels (3 bits)
	// Bits per sample (5 bits)
	// Total samples (first 4 bits)
	let info = stream_info.read_u32::<BigEndian>()?;

	let sample_rate = info >> 12;
	let bits_per_sample = ((info >> 4) & 0b11111) + 1;
	let channels = ((info >> 9) & 7) + 1;

	// Read the remaining 32 bits of the total samples
	let total_samples =
		u64::from(stream_info.read_u32::<BigEndian>()?) | (u64::from(info & 0xF) << 32);

	let mut properties = FlacProperties {
		sample_rate,
		bit_depth: bits_per_sample as u8,
		channels: channels as u8,
		total_samples,
		..FlacProperties::default()
	};

	if sample_rate > 0 && total_samples > 0 {
		let length = (total_samples * 1000) / u64::from(sample_rate);
		properties.duration = Duration::from_millis(length);

		if length > 0 && stream_length > 0 {
			properties.audio_bitrate = ((stream_length * 8) / length) as u32;
		}
	}

	Ok(properties)
}

#[cfg(test)]
mod tests {
	use super::read_properties;

	// A STREAMINFO block describing a 44.1 kHz, stereo, 16 bit stream of
	// exactly 88200 samples (2 seconds)
	fn stream_info() -> Vec<u8> {
		let mut info = Vec::new();
		info.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]); // min/max block size
		info.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]); // min/max frame size

		// Sample rate 44100 (20 bits), channels - 1 = 1 (3 bits),
		// bits per sample - 1 = 15 (5 bits), high 4 bits of total samples = 0
		let packed: u32 = (44100 << 12) | (1 << 9) | (15 << 4);
		info.extend_from_slice(&packed.to_be_bytes());

		info.extend_from_slice(&88200u32.to_be_bytes()); // low 32 bits of total samples
		info.extend_from_slice(&[0; 16]); // MD5 signature
		info
	}

	#[test_log::test]
	fn stream_info_decoding() {
		let info = stream_info();
		let properties = read_properties(&mut &info[..], 320_000).unwrap();

		assert_eq!(properties.sample_rate(), 44100);
		assert!(properties.sample_rate() < (1 << 20));
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.bit_depth(), 16);
		assert_eq!(properties.total_samples(), 88200);
		assert_eq!(properties.duration().as_secs(), 2);

		// The duration must round back to the encoded sample count
		let recovered =
			(properties.duration().as_secs_f64() * f64::from(properties.sample_rate())).round();
		assert_eq!(recovered as u64, properties.total_samples());

		// floor(320000 * 8 / 2000ms) = 1280 kbps
		assert_eq!(properties.audio_bitrate(), 1280);
	}

	#[test_log::test]
	fn zero_sample_rate_yields_empty_duration() {
		let mut info = stream_info();
		// Zero out the packed sample rate field (keep channels/bit depth bits)
		info[10] = 0;
		info[11] = 0;
		info[12] &= 0x0F;

		let properties = read_properties(&mut &info[..], 320_000).unwrap();
		assert_eq!(properties.sample_rate(), 0);
		assert_eq!(properties.duration().as_millis(), 0);
		assert_eq!(properties.audio_bitrate(), 0);
	}
}
