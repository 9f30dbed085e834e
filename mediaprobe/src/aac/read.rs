use super::adts::{ADTS_HEADER_LEN, AdtsHeader, HEADER_MASK};
use crate::config::ProbeOptions;
use crate::error::{ErrorKind, Result};
use crate::io::{ReadBlock, skip_id3v2, trailing_id3v1_len};
use crate::macros::err;
use crate::mpeg::header::{HeaderCmpResult, cmp_header, search_for_frame_sync};
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek, SeekFrom};

// A valid frame must appear within this many bytes of the stream start,
// which caps the scan cost on corrupt input
const ADTS_SEARCH_BOUNDS: u64 = 0x4000;

pub(crate) fn read_from<R>(
	reader: &mut R,
	options: ProbeOptions,
) -> Result<Option<StreamProperties>>
where
	R: Read + Seek,
{
	pipeline::read_file(
		reader,
		FileType::Aac,
		options.read_style,
		|reader, _style| {
			skip_id3v2(reader)?;

			match find_next_frame(reader)? {
				Some(frame) => Ok(frame),
				None => err!(SignatureMismatch(FileType::Aac)),
			}
		},
		|reader, start, _style| {
			// The frames run to the end of the stream, minus any trailing tag
			let first_frame_offset = start.1;

			let tag_len = trailing_id3v1_len(reader)?;
			let end = reader.seek(SeekFrom::End(0))?;

			Ok(end.saturating_sub(tag_len).saturating_sub(first_frame_offset))
		},
		|_reader, (first_frame_header, _), stream_len| {
			Ok(super::properties::read_properties(&first_frame_header, stream_len).into())
		},
	)
}

// Searches for the next frame within the scan bound, comparing it to the following one
fn find_next_frame<R>(reader: &mut R) -> Result<Option<(AdtsHeader, u64)>>
where
	R: Read + Seek,
{
	let mut pos = reader.stream_position()?;
	let search_end = pos + ADTS_SEARCH_BOUNDS;

	while pos < search_end {
		let remaining = search_end - pos;
		let frame_start_relative =
			match search_for_frame_sync(&mut reader.by_ref().take(remaining))? {
				Some(relative) => relative,
				None => break,
			};

		let frame_start_absolute = pos + frame_start_relative;

		// Seek back to the start of the frame and read the header
		reader.seek(SeekFrom::Start(frame_start_absolute))?;

		let header_block = reader.read_block(ADTS_HEADER_LEN)?;
		match AdtsHeader::parse(&header_block, frame_start_absolute) {
			Ok(header) => {
				let header_len: u8 = if header.has_crc { 9 } else { 7 };

				// `parse` only consumed the block; put the reader behind the header
				reader.seek(SeekFrom::Start(frame_start_absolute + u64::from(header_len)))?;

				match cmp_header(
					reader,
					u32::from(header_len),
					u32::from(header.len),
					u32::from_be_bytes(header.bytes[..4].try_into().unwrap()),
					HEADER_MASK,
				) {
					HeaderCmpResult::Equal => {
						return Ok(Some((header, frame_start_absolute)));
					},
					HeaderCmpResult::Undetermined => return Ok(None),
					HeaderCmpResult::NotEqual => {},
				}
			},
			// A sync position with too little data behind it can never
			// become a frame
			Err(e) if matches!(e.kind(), ErrorKind::InsufficientData) => return Ok(None),
			// Junk that happened to contain sync bytes; keep searching
			Err(_) => {
				reader.seek(SeekFrom::Start(frame_start_absolute + 1))?;
			},
		}

		pos = reader.stream_position()?;
	}

	Ok(None)
}
