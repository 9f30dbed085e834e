use super::header::{ChannelMode, FrameHeader, Layer, MpegVersion, VbrHeader, VbrHeaderType};
use super::header::rev_search_for_frame_header;
use crate::error::Result;
use crate::properties::AudioCodec;
use crate::util::math::RoundedDivision;

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

/// An MPEG stream's audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MpegAudioProperties {
	pub(crate) version: MpegVersion,
	pub(crate) layer: Layer,
	pub(crate) channel_mode: ChannelMode,
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
}

impl MpegAudioProperties {
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

	/// MPEG version
	pub fn version(&self) -> &MpegVersion {
		&self.version
	}

	/// MPEG layer
	pub fn layer(&self) -> &Layer {
		&self.layer
	}

	/// MPEG channel mode
	pub fn channel_mode(&self) -> &ChannelMode {
		&self.channel_mode
	}
}

impl AudioCodec for MpegAudioProperties {
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
		let version = match self.version {
			MpegVersion::V1 => "MPEG-1",
			MpegVersion::V2 => "MPEG-2",
			MpegVersion::V2_5 => "MPEG-2.5",
			MpegVersion::V4 => "MPEG-4",
		};

		Cow::Owned(format!("{} Layer {}", version, self.layer as u8))
	}
}

pub(super) fn read_properties<R>(
	properties: &mut MpegAudioProperties,
	reader: &mut R,
	first_frame: (FrameHeader, u64),
	mut last_frame_offset: u64,
	vbr_header: Option<VbrHeader>,
) -> Result<()>
where
	R: Read + Seek,
{
	let first_frame_header = first_frame.0;
	let first_frame_offset = first_frame.1;

	properties.version = first_frame_header.version;
	properties.layer = first_frame_header.layer;
	properties.channel_mode = first_frame_header.channel_mode;
	properties.sample_rate = first_frame_header.sample_rate;
	properties.channels = if first_frame_header.channel_mode == ChannelMode::SingleChannel {
		1
	} else {
		2
	};

	if let Some(vbr_header) = vbr_header {
		if first_frame_header.sample_rate > 0 && vbr_header.is_valid() {
			log::debug!("MPEG: Valid VBR header; using it to calculate duration");

			let sample_rate = u64::from(first_frame_header.sample_rate);
			let samples_per_frame = u64::from(first_frame_header.samples);

			// `is_valid` checked both fields
			let total_frames = u64::from(vbr_header.frames.unwrap_or_default());
			let stream_size = u64::from(vbr_header.size.unwrap_or_default());

			let length = (samples_per_frame * 1000 * total_frames).div_round(sample_rate);

			properties.duration = Duration::from_millis(length);
			properties.audio_bitrate = ((stream_size * 8) / length) as u32;

			return Ok(());
		}
	}

	// Nothing more we can do
	if first_frame_header.bitrate == 0 {
		return Ok(());
	}

	log::warn!("MPEG: Using bitrate to estimate duration");

	// http://gabriel.mp3-tech.org/mp3infotag.html:
	//
	// "In the Info Tag, the "Xing" identification string (mostly at 0x24) of the header is replaced by "Info" in case of a CBR file."
	if matches!(vbr_header.map(|h| h.ty), Some(VbrHeaderType::Info)) {
		log::debug!("MPEG: CBR detected");
	}

	properties.audio_bitrate = first_frame_header.bitrate;

	// Search for the last frame, starting at the end of the frames
	reader.seek(SeekFrom::Start(last_frame_offset))?;

	let mut last_frame = None;
	let mut pos = last_frame_offset;
	while pos > 0 {
		match rev_search_for_frame_header(reader, &mut pos) {
			// Found a frame header
			Ok(Some(header)) => {
				// Move `last_frame_offset` back to the actual position
				last_frame_offset = pos;

				if header.cmp(&first_frame_header) {
					last_frame = Some(header);
					break;
				}
			},
			// Encountered some IO error, just break
			Err(_) => break,
			// No frame sync found, continue further back in the file
			_ => {},
		}
	}

	let Some(last_frame_header) = last_frame else {
		log::warn!("MPEG: Could not find last frame, properties will be incomplete");
		return Ok(());
	};

	let stream_end = last_frame_offset + u64::from(last_frame_header.len);
	if stream_end < first_frame_offset {
		// Something is incredibly wrong with this stream, just give up
		return Ok(());
	}

	let stream_len = stream_end - first_frame_offset;

	let length = (stream_len * 8).div_round(u64::from(properties.audio_bitrate));
	if length > 0 {
		properties.duration = Duration::from_millis(length);
	}

	Ok(())
}
