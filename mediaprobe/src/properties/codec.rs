use std::borrow::Cow;
use std::time::Duration;

/// The audio capability of a format's properties
///
/// A format recognizer may expose zero, one, or two capabilities; MPEG
/// streams, for example, can expose both an audio and a video track.
pub trait AudioCodec {
	/// Duration of the audio track
	fn duration(&self) -> Duration;

	/// Audio bitrate (kbps)
	fn audio_bitrate(&self) -> u32;

	/// Sample rate (Hz)
	fn sample_rate(&self) -> u32;

	/// Channel count
	fn channels(&self) -> u8;

	/// A human-readable codec description
	fn description(&self) -> Cow<'static, str>;
}

/// The video capability of a format's properties
pub trait VideoCodec {
	/// Frame width in pixels
	fn width(&self) -> u32;

	/// Frame height in pixels
	fn height(&self) -> u32;

	/// Frame rate (frames per second)
	fn frame_rate(&self) -> f32;

	/// Video bitrate (kbps)
	fn video_bitrate(&self) -> u32;

	/// A human-readable codec description
	fn description(&self) -> Cow<'static, str>;
}

/// Marker capability for lossless audio codecs
///
/// For these formats the bit depth is meaningful, and the bitrate is derived
/// from real stream sizes rather than a lossy encoder's rate estimate.
pub trait LosslessAudioCodec: AudioCodec {
	/// Bits per sample
	fn bit_depth(&self) -> u8;
}
