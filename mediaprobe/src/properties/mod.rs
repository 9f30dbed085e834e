//! The normalized property result and codec capability traits

mod codec;

pub use codec::{AudioCodec, LosslessAudioCodec, VideoCodec};

use std::time::Duration;

/// The kinds of media found in a stream
///
/// A stream may carry audio, video, both (an MPEG program stream), or, when
/// properties were skipped, neither.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct MediaKinds(u8);

impl MediaKinds {
	/// The stream carries an audio track
	pub const AUDIO: Self = Self(0b01);
	/// The stream carries a video track
	pub const VIDEO: Self = Self(0b10);

	/// Whether an audio track was recognized
	pub fn has_audio(self) -> bool {
		self.0 & Self::AUDIO.0 != 0
	}

	/// Whether a video track was recognized
	pub fn has_video(self) -> bool {
		self.0 & Self::VIDEO.0 != 0
	}

	/// Whether no track was recognized
	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub(crate) fn insert(&mut self, other: Self) {
		self.0 |= other.0;
	}
}

/// Various *immutable* stream properties
///
/// This is the one result shape every container format is normalized into.
/// Numeric fields default to zero when the source format does not carry
/// them; zero is a valid "not present" sentinel, not an error.
#[derive(Debug, PartialEq, Clone, Default)]
#[non_exhaustive]
pub struct StreamProperties {
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
	pub(crate) bit_depth: u8,
	pub(crate) video_width: u32,
	pub(crate) video_height: u32,
	pub(crate) video_bitrate: u32,
	pub(crate) video_frame_rate: f32,
	pub(crate) kinds: MediaKinds,
	pub(crate) codec_description: String,
}

impl StreamProperties {
	/// Duration of the stream
	///
	/// A zero duration means the format did not allow it to be determined.
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

	/// Bits per sample
	///
	/// Only meaningful for lossless audio codecs; 0 otherwise.
	pub fn bit_depth(&self) -> u8 {
		self.bit_depth
	}

	/// Video frame width in pixels
	pub fn video_width(&self) -> u32 {
		self.video_width
	}

	/// Video frame height in pixels
	pub fn video_height(&self) -> u32 {
		self.video_height
	}

	/// Video bitrate (kbps)
	pub fn video_bitrate(&self) -> u32 {
		self.video_bitrate
	}

	/// Video frame rate (frames per second)
	pub fn video_frame_rate(&self) -> f32 {
		self.video_frame_rate
	}

	/// The kinds of media present in the stream
	pub fn media_kinds(&self) -> MediaKinds {
		self.kinds
	}

	/// A human-readable description of the stream's codec(s)
	pub fn codec_description(&self) -> &str {
		&self.codec_description
	}

	/// Fold an audio track's properties into the result
	pub(crate) fn fold_audio(&mut self, codec: &dyn AudioCodec) {
		self.duration = codec.duration();
		self.audio_bitrate = codec.audio_bitrate();
		self.sample_rate = codec.sample_rate();
		self.channels = codec.channels();
		self.kinds.insert(MediaKinds::AUDIO);
		self.push_description(&codec.description());
	}

	/// Fold a lossless audio track's properties into the result
	pub(crate) fn fold_lossless_audio(&mut self, codec: &dyn LosslessAudioCodec) {
		self.fold_audio(codec);
		self.bit_depth = codec.bit_depth();
	}

	/// Fold a video track's properties into the result
	///
	/// Video fields never collide with audio fields, so folding both into one
	/// result is always safe.
	pub(crate) fn fold_video(&mut self, codec: &dyn VideoCodec) {
		self.video_width = codec.width();
		self.video_height = codec.height();
		self.video_bitrate = codec.video_bitrate();
		self.video_frame_rate = codec.frame_rate();
		self.kinds.insert(MediaKinds::VIDEO);
		self.push_description(&codec.description());
	}

	fn push_description(&mut self, description: &str) {
		if self.codec_description.is_empty() {
			self.codec_description.push_str(description);
			return;
		}

		self.codec_description.push_str(" / ");
		self.codec_description.push_str(description);
	}
}
