use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::macros::corrupt_err;
use crate::properties::{AudioCodec, LosslessAudioCodec, StreamProperties};

use std::borrow::Cow;
use std::time::Duration;

// The COMM sample rate is an 80 bit extended-precision float, but only a
// handful of rates ever occur in the wild. Bytes 1-3 of the field (the low
// exponent byte and the two leading mantissa bytes) are enough to tell them
// apart, so the raw bytes are resolved through this table instead of
// decoding the float.
#[rustfmt::skip]
const SAMPLE_RATES: [([u8; 3], u32); 10] = [
	([0x0E, 0xAC, 0x44], 44100),
	([0x0D, 0xAC, 0x44], 22050),
	([0x0C, 0xAC, 0x44], 11025),
	([0x0E, 0xBB, 0x80], 48000),
	([0x0D, 0xBB, 0x80], 24000),
	([0x0E, 0xFA, 0x00], 32000),
	([0x0D, 0xFA, 0x00], 16000),
	([0x0C, 0xFA, 0x00], 8000),
	([0x0D, 0xAD, 0xDD], 22255), // The Macintosh 22 kHz rate (22254.54...)
	([0x0C, 0xAD, 0xDD], 11127), // The Macintosh 11 kHz rate (11127.27...)
];

/// An AIFF stream's audio properties
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[non_exhaustive]
pub struct AiffProperties {
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) sample_size: u16,
	pub(crate) channels: u16,
}

impl AiffProperties {
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

	/// Bits per sample
	pub fn sample_size(&self) -> u16 {
		self.sample_size
	}

	/// Channel count
	pub fn channels(&self) -> u16 {
		self.channels
	}
}

impl AudioCodec for AiffProperties {
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
		self.channels as u8
	}

	fn description(&self) -> Cow<'static, str> {
		Cow::Borrowed("AIFF (PCM)")
	}
}

impl LosslessAudioCodec for AiffProperties {
	fn bit_depth(&self) -> u8 {
		self.sample_size as u8
	}
}

impl From<AiffProperties> for StreamProperties {
	fn from(input: AiffProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_lossless_audio(&input);
		properties
	}
}

/// Decode a COMM chunk's content
///
/// Field offsets within the chunk content: channels at 0 (2 bytes BE), total
/// sample frames at 2 (4 bytes BE), bits per sample at 6 (2 bytes BE), the
/// sample rate key at 9-11.
pub(super) fn read_properties(
	comm: &ByteBuffer,
	comm_start: u64,
	stream_len: u32,
) -> Result<AiffProperties> {
	let channels = comm.mid(0, 2)?.to_u16(true)?;

	if channels == 0 {
		corrupt_err!(@BAIL Aiff, comm_start, "Stream contains 0 channels");
	}

	let sample_frames = comm.mid(2, 4)?.to_u32(true)?;
	let sample_size = comm.mid(6, 2)?.to_u16(true)?;

	let rate_key = comm.mid(9, 3)?;
	let Some(&(_, sample_rate)) = SAMPLE_RATES.iter().find(|(key, _)| rate_key.starts_with(key))
	else {
		corrupt_err!(@BAIL Aiff, comm_start, "Invalid sample rate");
	};

	let mut properties = AiffProperties {
		sample_rate,
		sample_size,
		channels,
		..AiffProperties::default()
	};

	if sample_rate > 0 && sample_frames > 0 {
		let duration_seconds = f64::from(sample_frames) / f64::from(sample_rate);

		properties.duration = Duration::from_secs_f64(duration_seconds);
		properties.audio_bitrate =
			((f64::from(stream_len) * 8.0 / duration_seconds) as u64 / 1000) as u32;
	}

	Ok(properties)
}

#[cfg(test)]
mod tests {
	use super::read_properties;
	use crate::buffer::ByteBuffer;
	use crate::error::ErrorKind;

	fn comm_chunk(channels: u16, sample_frames: u32, sample_size: u16, rate: [u8; 3]) -> ByteBuffer {
		let mut content = Vec::new();
		content.extend_from_slice(&channels.to_be_bytes());
		content.extend_from_slice(&sample_frames.to_be_bytes());
		content.extend_from_slice(&sample_size.to_be_bytes());

		// The 80 bit sample rate field: sign + exponent high byte, then the
		// three key bytes, then mantissa padding
		content.push(0x40);
		content.extend_from_slice(&rate);
		content.extend_from_slice(&[0; 6]);

		ByteBuffer::new(content)
	}

	#[test_log::test]
	fn comm_decoding() {
		let comm = comm_chunk(2, 88200, 16, [0x0E, 0xAC, 0x44]);
		let properties = read_properties(&comm, 12, 352_800).unwrap();

		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.sample_size(), 16);
		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.duration().as_secs(), 2);

		// floor(352800 * 8 / 2.0) / 1000 = 1411 kbps
		assert_eq!(properties.audio_bitrate(), 1411);
	}

	#[test_log::test]
	fn unknown_sample_rate_is_rejected() {
		let comm = comm_chunk(2, 88200, 16, [0x0E, 0x12, 0x34]);
		let result = read_properties(&comm, 12, 352_800);

		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::CorruptStream(_)
		));
	}

	#[test_log::test]
	fn zero_channels_is_rejected() {
		let comm = comm_chunk(0, 88200, 16, [0x0E, 0xAC, 0x44]);
		assert!(read_properties(&comm, 12, 352_800).is_err());
	}
}
