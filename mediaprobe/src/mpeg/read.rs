use super::header::{FrameHeader, VbrHeader, find_next_frame};
use super::properties::MpegAudioProperties;
use super::video::{MpegVideoProperties, SEQUENCE_HEADER_SEARCH_BOUNDS, read_video};
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::{skip_id3v2, trailing_id3v1_len};
use crate::macros::{corrupt_err, err};
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek, SeekFrom};

struct MpegStart {
	audio: Option<(FrameHeader, u64)>,
	video: Option<MpegVideoProperties>,
}

pub(crate) fn read_from<R>(
	reader: &mut R,
	options: ProbeOptions,
) -> Result<Option<StreamProperties>>
where
	R: Read + Seek,
{
	pipeline::read_file(
		reader,
		FileType::Mpeg,
		options.read_style,
		|reader, _style| {
			skip_id3v2(reader)?;

			let search_start = reader.stream_position()?;

			let audio = find_next_frame(reader, options.max_junk_bytes as u64)?;

			// A video sequence header can only precede the audio frames; the
			// audio payload itself must not be scanned for start codes
			let video_search_bounds = match audio {
				Some((_, audio_offset)) => audio_offset - search_start,
				None => SEQUENCE_HEADER_SEARCH_BOUNDS,
			};

			reader.seek(SeekFrom::Start(search_start))?;
			let video = read_video(reader, video_search_bounds)?;

			if audio.is_none() && video.is_none() {
				err!(SignatureMismatch(FileType::Mpeg));
			}

			Ok(MpegStart { audio, video })
		},
		|reader, _start, _style| {
			// The audio frames stop where the trailing tag (if any) begins
			let tag_len = trailing_id3v1_len(reader)?;
			let end = reader.seek(SeekFrom::End(0))?;

			Ok(end.saturating_sub(tag_len))
		},
		|reader, start, audio_end| {
			let mut stream_properties = StreamProperties::default();

			if let Some(video) = start.video {
				stream_properties.fold_video(&video);
			}

			if let Some((first_frame_header, first_frame_offset)) = start.audio {
				if first_frame_header.sample_rate == 0 {
					corrupt_err!(@BAIL Mpeg, first_frame_offset, "Sample rate is 0");
				}

				// Try to read a Xing/Info/VBRI header; its offset within the
				// frame depends on the version and channel mode
				let vbr_header_location =
					first_frame_offset + u64::from(first_frame_header.data_start);
				reader.seek(SeekFrom::Start(vbr_header_location))?;

				let mut vbr_reader = [0; 32];
				reader.read_exact(&mut vbr_reader)?;

				let vbr_header = VbrHeader::read(&mut &vbr_reader[..])?;

				let mut properties = MpegAudioProperties::default();
				super::properties::read_properties(
					&mut properties,
					reader,
					(first_frame_header, first_frame_offset),
					audio_end,
					vbr_header,
				)?;

				stream_properties.fold_audio(&properties);
			}

			Ok(stream_properties)
		},
	)
}

#[cfg(test)]
mod tests {
	use crate::config::ProbeOptions;
	use crate::properties::StreamProperties;

	use std::io::Cursor;

	// An MPEG 1 Layer 3, 128 kbps, 44.1 kHz joint stereo frame header
	const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
	const FRAME_LEN: usize = 417;

	fn frame() -> Vec<u8> {
		let mut frame = vec![0u8; FRAME_LEN];
		frame[..4].copy_from_slice(&FRAME_HEADER);
		frame
	}

	fn xing_file(frames: u32) -> Vec<u8> {
		let mut first_frame = frame();

		// The Xing header sits after 32 bytes of side information
		let xing_offset = 36;
		first_frame[xing_offset..xing_offset + 4].copy_from_slice(b"Xing");
		first_frame[xing_offset + 4..xing_offset + 8].copy_from_slice(&3u32.to_be_bytes());
		first_frame[xing_offset + 8..xing_offset + 12].copy_from_slice(&frames.to_be_bytes());
		first_frame[xing_offset + 12..xing_offset + 16]
			.copy_from_slice(&(frames * FRAME_LEN as u32).to_be_bytes());

		let mut data = first_frame;
		// A second frame so the first header can be verified
		data.extend_from_slice(&frame());
		data
	}

	fn read(data: Vec<u8>) -> StreamProperties {
		let mut reader = Cursor::new(data);
		super::read_from(&mut reader, ProbeOptions::new())
			.unwrap()
			.unwrap()
	}

	#[test_log::test]
	fn xing_based_duration() {
		// 1000 frames * 1152 samples / 44100 Hz = 26.122... seconds
		let properties = read(xing_file(1000));

		assert!(properties.media_kinds().has_audio());
		assert!(!properties.media_kinds().has_video());
		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.duration().as_millis(), 26122);

		// (1000 * 417 * 8) / 26122ms = 127 kbps
		assert_eq!(properties.audio_bitrate(), 127);
	}

	#[test_log::test]
	fn cbr_fallback_duration() {
		// Two plain frames, no VBR header
		let mut data = frame();
		data.extend_from_slice(&frame());

		let properties = read(data);

		assert_eq!(properties.audio_bitrate(), 128);
		assert_eq!(properties.sample_rate(), 44100);

		// 834 bytes * 8 / 128 kbps = 52ms
		assert_eq!(properties.duration().as_millis(), 52);
	}

	#[test_log::test]
	fn video_sequence_header() {
		let mut data = Vec::new();
		data.extend_from_slice(&[0x00, 0x00, 0x01, 0xB3]);

		// 640x480, 29.97 fps (index 4), bitrate field 2500
		let mut bits: u64 = 0;
		bits = (bits << 12) | 640;
		bits = (bits << 12) | 480;
		bits = (bits << 4) | 2;
		bits = (bits << 4) | 4;
		bits = (bits << 18) | 2500;
		bits <<= 6;
		data.extend_from_slice(&bits.to_be_bytes()[1..]);

		// Pad the stream out
		data.extend(std::iter::repeat_n(0u8, 64));

		let properties = read(data);

		assert!(properties.media_kinds().has_video());
		assert!(!properties.media_kinds().has_audio());
		assert_eq!(properties.video_width(), 640);
		assert_eq!(properties.video_height(), 480);
		assert!((properties.video_frame_rate() - 29.97).abs() < f32::EPSILON);

		// 2500 * 400 / 1000 = 1000 kbps
		assert_eq!(properties.video_bitrate(), 1000);
	}
}
