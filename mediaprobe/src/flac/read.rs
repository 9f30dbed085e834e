use super::block::{BLOCK_ID_STREAMINFO, Block};
use super::properties::FlacProperties;
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::{ReadBlock, skip_id3v2};
use crate::macros::{corrupt_err, err};
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek, SeekFrom};

const STREAMINFO_SIZE_MIN: u32 = 18;

fn verify_flac<R>(data: &mut R) -> Result<Block>
where
	R: Read + Seek,
{
	let marker = data.read_block(4)?;

	if !marker.starts_with(b"fLaC") {
		err!(SignatureMismatch(FileType::Flac));
	}

	let block = Block::read(data, |_| true)?;

	if block.header.ty != BLOCK_ID_STREAMINFO {
		corrupt_err!(@BAIL Flac, block.start, "Stream missing mandatory STREAMINFO block");
	}

	log::debug!("Stream verified to be FLAC");
	Ok(block)
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
		FileType::Flac,
		options.read_style,
		|reader, _style| {
			// It is possible for a FLAC file to contain an ID3v2 tag
			skip_id3v2(reader)?;

			let stream_info = verify_flac(reader)?;
			if stream_info.header.size < STREAMINFO_SIZE_MIN {
				corrupt_err!(@BAIL Flac, stream_info.start, "Stream has an invalid STREAMINFO block size (< 18)");
			}

			// Walk the remaining metadata blocks; only their sizes matter here
			let mut last_block = stream_info.header.last;
			while !last_block {
				let block = Block::read(reader, |_| false)?;
				last_block = block.header.last;
			}

			Ok(stream_info)
		},
		|reader, _stream_info, _style| {
			// Everything from here to the end of the stream is audio frames
			let current = reader.stream_position()?;
			let end = reader.seek(SeekFrom::End(0))?;

			// In the event that a block lies about its size, the current position
			// could be completely wrong.
			if current > end {
				corrupt_err!(@BAIL Flac, current, "Metadata block goes past the end of the stream");
			}

			Ok(end - current)
		},
		|_reader, stream_info, stream_length| {
			let properties: FlacProperties =
				super::properties::read_properties(&mut &*stream_info.content, stream_length)?;

			Ok(properties.into())
		},
	)
}
