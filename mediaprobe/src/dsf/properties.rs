use crate::properties::{AudioCodec, LosslessAudioCodec, StreamProperties};

use std::borrow::Cow;
use std::time::Duration;

/// A DSF stream's audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct DsfProperties {
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	/// Sample rate (2822400 for DSD64, etc.)
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
	/// Bits per sample (1 or 8)
	pub(crate) bits_per_sample: u8,
	/// Total samples per channel
	pub(crate) sample_count: u64,
}

impl DsfProperties {
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

	/// Number of channels
	pub fn channels(&self) -> u8 {
		self.channels
	}

	/// Bits per sample
	pub fn bits_per_sample(&self) -> u8 {
		self.bits_per_sample
	}

	/// Total samples per channel
	pub fn sample_count(&self) -> u64 {
		self.sample_count
	}
}

impl AudioCodec for DsfProperties {
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
		Cow::Borrowed("DSD (DSF)")
	}
}

impl LosslessAudioCodec for DsfProperties {
	fn bit_depth(&self) -> u8 {
		self.bits_per_sample
	}
}

impl From<DsfProperties> for StreamProperties {
	fn from(input: DsfProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_lossless_audio(&input);
		properties
	}
}
