use super::adts::{AdtsHeader, AudioObjectType};
use crate::mpeg::MpegVersion;
use crate::properties::{AudioCodec, StreamProperties};

use std::borrow::Cow;
use std::time::Duration;

/// An AAC (ADTS) stream's audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct AacProperties {
	pub(crate) version: MpegVersion,
	pub(crate) audio_object_type: AudioObjectType,
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
}

impl AacProperties {
	/// MPEG version
	///
	/// The only possible variants are:
	///
	/// * [MpegVersion::V2]
	/// * [MpegVersion::V4]
	pub fn version(&self) -> MpegVersion {
		self.version
	}

	/// Audio object type
	pub fn audio_object_type(&self) -> AudioObjectType {
		self.audio_object_type
	}

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
}

impl AudioCodec for AacProperties {
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
		Cow::Borrowed(self.audio_object_type.as_str())
	}
}

impl From<AacProperties> for StreamProperties {
	fn from(input: AacProperties) -> Self {
		let mut properties = Self::default();
		properties.fold_audio(&input);
		properties
	}
}

pub(super) fn read_properties(first_frame: &AdtsHeader, stream_len: u64) -> AacProperties {
	let mut properties = AacProperties {
		version: first_frame.version,
		audio_object_type: first_frame.audio_object_ty,
		sample_rate: first_frame.sample_rate,
		channels: first_frame.channels,
		..AacProperties::default()
	};

	// The representative frame's bitrate stands in for the whole stream
	let bitrate_kbps = first_frame.bitrate / 1000;
	if bitrate_kbps > 0 {
		properties.audio_bitrate = bitrate_kbps;
		properties.duration = Duration::from_millis((stream_len * 8) / u64::from(bitrate_kbps));
	}

	properties
}
